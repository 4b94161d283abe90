//! The module contains the error the engine can throw.
//!
//! Expected business failures are split by kind so callers can map them to
//! their own channel:
//!
//! - [`Validation`] carries every violated field rule, in rule order.
//! - [`InvalidTransition`] is a rent/queue state machine violation.
//! - [`Overlap`] is a booking that collides with an open rent of the same car.
//! - [`InvalidCredentials`] is a failed login.
//!
//! [`Validation`]: EngineError::Validation
//! [`InvalidTransition`]: EngineError::InvalidTransition
//! [`Overlap`]: EngineError::Overlap
//! [`InvalidCredentials`]: EngineError::InvalidCredentials
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Overlapping rent: {0}")]
    Overlap(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("\"{0}\" is still in use")]
    InUse(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Password hashing failed: {0}")]
    Password(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Human readable messages for result envelopes.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors.clone(),
            Self::InvalidTransition(msg)
            | Self::Overlap(msg)
            | Self::InvalidAmount(msg)
            | Self::Forbidden(msg)
            | Self::InvalidId(msg)
            | Self::InvalidCursor(msg) => vec![msg.clone()],
            other => vec![other.to_string()],
        }
    }

    /// Report a write that lost the SQLite lock to a concurrent booking as an
    /// [`Overlap`](EngineError::Overlap).
    pub(crate) fn lock_contention_as_overlap(self) -> Self {
        match self {
            Self::Database(err) if is_lock_contention(&err) => {
                Self::Overlap("car is being booked concurrently, try again".to_string())
            }
            other => other,
        }
    }
}

fn is_lock_contention(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("SQLITE_BUSY")
}

impl From<bcrypt::BcryptError> for EngineError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::Password(value.to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::Overlap(a), Self::Overlap(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InUse(a), Self::InUse(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Password(a), Self::Password(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::RuntimeErr;

    use super::*;

    #[test]
    fn busy_database_becomes_overlap() {
        let busy = EngineError::Database(DbErr::Exec(RuntimeErr::Internal(
            "error returned from database: (code: 5) database is locked".to_string(),
        )));
        assert_eq!(
            busy.lock_contention_as_overlap(),
            EngineError::Overlap("car is being booked concurrently, try again".to_string())
        );

        let other = EngineError::Database(DbErr::RecordNotFound("rent".to_string()));
        assert_eq!(
            other.lock_contention_as_overlap(),
            EngineError::Database(DbErr::RecordNotFound("rent".to_string()))
        );
        assert_eq!(
            EngineError::InvalidCredentials.lock_contention_as_overlap(),
            EngineError::InvalidCredentials
        );
    }
}
