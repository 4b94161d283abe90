//! Persisted login session.
//!
//! The token is kept in a small JSON file so a restarted client resumes the
//! session. Claims are decoded locally without verifying the signature.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClientError, Result};

/// Claims read from the bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub nameid: String,
    pub email: String,
    pub role: String,
    pub unique_name: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
}

#[derive(Clone, Debug)]
struct ActiveSession {
    token: String,
    claims: SessionClaims,
}

#[derive(Clone, Debug)]
pub struct Session {
    path: PathBuf,
    active: Option<ActiveSession>,
}

fn decode_claims(token: &str) -> Option<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // Expiry is checked against the caller's clock in `is_live`.
    validation.validate_exp = false;
    decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

fn is_live(claims: &SessionClaims, now: DateTime<Utc>) -> bool {
    claims.exp > now.timestamp()
}

fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl Session {
    /// An empty session persisted at `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: None,
        }
    }

    /// Load the stored token, dropping it when it cannot be decoded or has
    /// expired.
    pub fn init(path: impl Into<PathBuf>, now: DateTime<Utc>) -> Result<Self> {
        let mut session = Self::empty(path);
        let content = match fs::read_to_string(&session.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(session),
            Err(err) => return Err(err.into()),
        };

        let claims = serde_json::from_str::<StoredSession>(&content)
            .ok()
            .and_then(|stored| decode_claims(&stored.token).map(|claims| (stored.token, claims)));
        match claims {
            Some((token, claims)) if is_live(&claims, now) => {
                tracing::debug!(user = %claims.unique_name, "session restored");
                session.active = Some(ActiveSession { token, claims });
            }
            _ => {
                tracing::debug!("stored session discarded");
                remove_file(&session.path)?;
            }
        }
        Ok(session)
    }

    /// Keep `token` in memory and on disk.
    pub fn store(&mut self, token: &str, now: DateTime<Utc>) -> Result<&SessionClaims> {
        let claims = decode_claims(token)
            .ok_or_else(|| ClientError::Config("token cannot be decoded".to_string()))?;
        if !is_live(&claims, now) {
            return Err(ClientError::Config("token already expired".to_string()));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&StoredSession {
            token: token.to_string(),
        })?;
        fs::write(&self.path, payload)?;

        let active = self.active.insert(ActiveSession {
            token: token.to_string(),
            claims,
        });
        Ok(&active.claims)
    }

    /// Forget the session in memory and on disk.
    pub fn logout(&mut self) -> Result<()> {
        self.active = None;
        remove_file(&self.path)
    }

    pub fn token(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.token.as_str())
    }

    pub fn claims(&self) -> Option<&SessionClaims> {
        self.active.as_ref().map(|active| &active.claims)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.claims()
            .and_then(|claims| Uuid::parse_str(&claims.nameid).ok())
    }

    pub fn is_staff(&self) -> bool {
        self.claims()
            .is_some_and(|claims| matches!(claims.role.as_str(), "Staff" | "Admin"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    fn token(exp: DateTime<Utc>, role: &str) -> String {
        let claims = SessionClaims {
            nameid: Uuid::new_v4().to_string(),
            email: "rita@rent.example".to_string(),
            role: role.to_string(),
            unique_name: "rita".to_string(),
            iat: (exp - Duration::hours(1)).timestamp(),
            exp: exp.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server side secret"),
        )
        .unwrap()
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("rental-session-{}", Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn missing_file_means_no_session() {
        let session = Session::init(temp_path(), Utc::now()).unwrap();
        assert_eq!(session.token(), None);
    }

    #[test]
    fn stored_token_survives_a_restart() {
        let path = temp_path();
        let now = Utc::now();
        let token = token(now + Duration::hours(1), "Staff");

        let mut session = Session::empty(&path);
        let claims = session.store(&token, now).unwrap();
        assert_eq!(claims.unique_name, "rita");

        let restored = Session::init(&path, now).unwrap();
        assert_eq!(restored.token(), Some(token.as_str()));
        assert!(restored.is_staff());
        assert!(restored.user_id().is_some());
    }

    #[test]
    fn expired_token_is_discarded_on_init() {
        let path = temp_path();
        let now = Utc::now();
        let mut session = Session::empty(&path);
        session
            .store(&token(now + Duration::minutes(5), "Renter"), now)
            .unwrap();

        let later = Session::init(&path, now + Duration::minutes(10)).unwrap();
        assert_eq!(later.token(), None);
        assert!(!path.exists());
    }

    #[test]
    fn garbage_is_discarded_on_init() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"token":"not.a.jwt"}"#).unwrap();

        let session = Session::init(&path, Utc::now()).unwrap();
        assert_eq!(session.token(), None);
        assert!(!path.exists());
    }

    #[test]
    fn logout_clears_memory_and_disk() {
        let path = temp_path();
        let now = Utc::now();
        let mut session = Session::empty(&path);
        session
            .store(&token(now + Duration::hours(1), "Renter"), now)
            .unwrap();
        assert!(!session.is_staff());

        session.logout().unwrap();
        assert_eq!(session.token(), None);
        assert!(!path.exists());
        session.logout().unwrap();
    }

    #[test]
    fn expired_token_is_not_stored() {
        let now = Utc::now();
        let mut session = Session::empty(temp_path());
        assert!(session.store(&token(now - Duration::hours(1), "Renter"), now).is_err());
        assert_eq!(session.token(), None);
    }
}
