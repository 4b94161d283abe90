use api_types::result::ServiceResult;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use auth::{Actor, Claims, TokenIssuer};
pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod auth;
mod cars;
mod convert;
mod depots;
mod receipts;
mod rents;
mod server;
mod statistics;
mod users;
mod waiting_list;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Unauthorized(String),
    Token(jsonwebtoken::errors::Error),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::ExistingKey(_) | EngineError::Overlap(_) | EngineError::InUse(_) => {
            StatusCode::CONFLICT
        }
        EngineError::InvalidId(_) | EngineError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
        EngineError::Password(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_)
        | EngineError::InvalidTransition(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn messages_for_engine_error(err: EngineError) -> Vec<String> {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            vec!["internal server error".to_string()]
        }
        EngineError::Password(msg) => {
            tracing::error!("password hashing error: {msg}");
            vec!["internal server error".to_string()]
        }
        other => other.messages(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, errors) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), messages_for_engine_error(err)),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, vec![err]),
            ServerError::Token(err) => {
                tracing::error!("token error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec!["internal server error".to_string()],
                )
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, vec![err]),
        };

        (status, Json(ServiceResult::failure(errors))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<jsonwebtoken::errors::Error> for ServerError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Token(value)
    }
}
