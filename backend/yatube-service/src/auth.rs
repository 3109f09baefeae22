//! Passwords and access tokens
//!
//! Passwords are stored as Argon2id PHC strings. Access tokens are HS256
//! JWTs carrying the user id and username, sent as `Authorization: Bearer`.
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Passwords
// ============================================================================

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(rand::thread_rng());

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash format".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid username or password".to_string()))
}

lazy_static! {
    /// Stand-in hash checked when the username does not exist, so that path
    /// costs the same Argon2 work as a wrong password.
    static ref ABSENT_USER_HASH: Option<String> = hash_password("absent-user").ok();
}

/// Spend a password verification for a user that does not exist and return
/// the same error a wrong password gives.
pub fn reject_absent_user(password: &str) -> AppError {
    if let Some(hash) = ABSENT_USER_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AppError::Unauthorized("Invalid username or password".to_string())
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

/// Issues and validates access tokens with a shared secret
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate access token: {e}")))
    }

    /// Checks signature and expiry
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Token validation failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
    }

    #[test]
    fn test_absent_user_check_runs_argon2() {
        let hash = ABSENT_USER_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(hash).is_ok());

        // Even the stand-in's own password is refused.
        let err = reject_absent_user("absent-user");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_wrong_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_token_round_trip() {
        let tokens = TokenService::new("test-secret", 3600);
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "leo").unwrap();

        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.username, "leo");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_with_other_secret_rejected() {
        let token = TokenService::new("secret-a", 3600)
            .issue(Uuid::new_v4(), "leo")
            .unwrap();
        assert!(TokenService::new("secret-b", 3600).validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // beyond the default 60s leeway
        let tokens = TokenService::new("test-secret", -120);
        let token = tokens.issue(Uuid::new_v4(), "leo").unwrap();
        assert!(tokens.validate(&token).is_err());
    }
}
