use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures of an API call, split by the HTTP status the server answered
/// with. Envelope error lists are kept in server order.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized: {}", .0.join("; "))]
    Unauthorized(Vec<String>),
    #[error("forbidden: {}", .0.join("; "))]
    Forbidden(Vec<String>),
    #[error("not found: {}", .0.join("; "))]
    NotFound(Vec<String>),
    #[error("conflict: {}", .0.join("; "))]
    Conflict(Vec<String>),
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("server error ({status}): {}", .errors.join("; "))]
    Server { status: u16, errors: Vec<String> },
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn from_status(status: u16, errors: Vec<String>) -> Self {
        match status {
            400 | 422 => Self::Validation(errors),
            401 => Self::Unauthorized(errors),
            403 => Self::Forbidden(errors),
            404 => Self::NotFound(errors),
            409 => Self::Conflict(errors),
            _ => Self::Server { status, errors },
        }
    }

    /// The server's messages, if the failure came from an envelope.
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Unauthorized(errors)
            | Self::Forbidden(errors)
            | Self::NotFound(errors)
            | Self::Conflict(errors)
            | Self::Validation(errors)
            | Self::Server { errors, .. } => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_variants() {
        let errors = vec!["x".to_string()];
        assert!(matches!(
            ClientError::from_status(422, errors.clone()),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from_status(400, errors.clone()),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from_status(409, errors.clone()),
            ClientError::Conflict(_)
        ));
        assert!(matches!(
            ClientError::from_status(503, errors),
            ClientError::Server { status: 503, .. }
        ));
    }
}
