//! Bearer token issuing and checking.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use engine::User;

use crate::{ServerError, convert};

/// JWT payload. Claim names follow the ones the web frontend reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub nameid: String,
    pub email: String,
    pub role: String,
    /// Username, or the display name for accounts without one.
    pub unique_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, inserted into request extensions by the auth
/// middleware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
}

/// Signs and verifies HS256 tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, ServerError> {
        let claims = Claims {
            nameid: user.id.to_string(),
            email: user.email.clone(),
            role: convert::role_to_api(user.role).as_str().to_string(),
            unique_name: user.username.clone().unwrap_or_else(|| user.name.clone()),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Decode and check signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Actor, ServerError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|err| {
                tracing::debug!("token rejected: {err}");
                ServerError::Unauthorized("invalid or expired token".to_string())
            })?;
        let id = Uuid::parse_str(&data.claims.nameid)
            .map_err(|_| ServerError::Unauthorized("invalid token subject".to_string()))?;
        Ok(Actor { id })
    }
}

#[cfg(test)]
mod tests {
    use engine::{Role, UserRegistration};

    use super::*;

    fn user() -> User {
        let mut user = User::registered(
            &UserRegistration {
                name: "Rita".to_string(),
                username: "rita".to_string(),
                email: "rita@rent.example".to_string(),
                password: "unused".to_string(),
                phone_number: "123456".to_string(),
                licence_id: None,
                address: None,
            },
            "hash".to_string(),
        );
        user.role = Role::Staff;
        user
    }

    #[test]
    fn issued_token_verifies_to_its_user() {
        let issuer = TokenIssuer::new("secret", Duration::hours(1));
        let user = user();
        let token = issuer.issue(&user, Utc::now()).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), Actor { id: user.id });
    }

    #[test]
    fn claims_carry_identity_and_role() {
        let issuer = TokenIssuer::new("secret", Duration::hours(1));
        let user = user();
        let token = issuer.issue(&user, Utc::now()).unwrap();
        let claims = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.role, "Staff");
        assert_eq!(claims.unique_name, "rita");
        assert_eq!(claims.email, "rita@rent.example");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let issuer = TokenIssuer::new("secret", Duration::hours(1));
        let stale = issuer
            .issue(&user(), Utc::now() - Duration::hours(3))
            .unwrap();
        assert!(matches!(
            issuer.verify(&stale),
            Err(ServerError::Unauthorized(_))
        ));

        let other = TokenIssuer::new("other secret", Duration::hours(1));
        let foreign = other.issue(&user(), Utc::now()).unwrap();
        assert!(matches!(
            issuer.verify(&foreign),
            Err(ServerError::Unauthorized(_))
        ));
    }
}
