//! JWT token service
//!
//! Issues and validates the access/refresh token pair. Both tokens are
//! HS256; the `token_type` claim keeps them from being swapped for each
//! other.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret (at least 32 bytes)
    pub secret: String,
    /// Access token lifetime in minutes
    pub access_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_days: i64,
    pub issuer: String,
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        let secret = match load_jwt_secret() {
            Ok(secret) => secret,
            Err(e) => {
                #[cfg(debug_assertions)]
                {
                    tracing::warn!("JWT configuration error: {}, using a generated key", e);
                    generate_printable_jwt_secret()
                }
                #[cfg(not(debug_assertions))]
                {
                    panic!("FATAL: JWT_SECRET configuration failed: {}", e);
                }
            }
        };

        Self {
            secret,
            access_minutes: std::env::var("JWT_ACCESS_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
            refresh_days: std::env::var("JWT_REFRESH_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "ozkw-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "ozkw-clients".to_string()),
        }
    }
}

/// Claims carried by both token types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User record id (Subject)
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    /// "access" or "refresh"
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// Tokens returned to the client after login/register/refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Wrong token type: expected {expected}")]
    WrongTokenType { expected: &'static str },

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Printable random secret for development runs without JWT_SECRET
pub fn generate_printable_jwt_secret() -> String {
    let allowed_chars =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

    let rng = SystemRandom::new();
    let mut key = String::new();
    for _ in 0..64 {
        let mut byte = [0u8; 1];
        if rng.fill(&mut byte).is_err() {
            return "OzkwServerDevelopmentSecureKey2026!".to_string();
        }
        let idx = (byte[0] as usize) % allowed_chars.len();
        key.push(allowed_chars.as_bytes()[idx] as char);
    }
    key
}

fn load_jwt_secret() -> Result<String, JwtError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) => {
            if secret.len() < 32 {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET must be at least 32 characters long".to_string(),
                ));
            }
            Ok(secret)
        }
        Err(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!("JWT_SECRET not set! Generating a temporary key for development.");
                Ok(generate_printable_jwt_secret())
            }
            #[cfg(not(debug_assertions))]
            {
                Err(JwtError::ConfigError(
                    "JWT_SECRET environment variable must be set in production!".to_string(),
                ))
            }
        }
    }
}

/// JWT token service
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new() -> Self {
        Self::with_config(JwtConfig::default())
    }

    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn generate_token(
        &self,
        user_id: &str,
        name: &str,
        email: &str,
        role: &str,
        token_type: &str,
        lifetime: Duration,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            token_type: token_type.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Issue a fresh access + refresh pair for a user
    pub fn generate_pair(
        &self,
        user_id: &str,
        name: &str,
        email: &str,
        role: &str,
    ) -> Result<TokenPair, JwtError> {
        let access = self.generate_token(
            user_id,
            name,
            email,
            role,
            "access",
            Duration::minutes(self.config.access_minutes),
        )?;
        let refresh = self.generate_token(
            user_id,
            name,
            email,
            role,
            "refresh",
            Duration::days(self.config.refresh_days),
        )?;
        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
            expires_in: self.config.access_minutes * 60,
        })
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;
        Ok(token_data.claims)
    }

    /// Validate an access token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.decode_claims(token)?;
        if claims.token_type != "access" {
            return Err(JwtError::WrongTokenType { expected: "access" });
        }
        Ok(claims)
    }

    /// Validate a refresh token
    pub fn validate_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.decode_claims(token)?;
        if claims.token_type != "refresh" {
            return Err(JwtError::WrongTokenType {
                expected: "refresh",
            });
        }
        Ok(claims)
    }

    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new()
    }
}

/// Current user context, parsed from validated JWT claims
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User record id ("user:key")
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-which-is-long-enough-0123456789".to_string(),
            access_minutes: 15,
            refresh_days: 7,
            issuer: "ozkw-server".to_string(),
            audience: "ozkw-clients".to_string(),
        })
    }

    #[test]
    fn pair_generation_and_validation() {
        let service = test_service();
        let pair = service
            .generate_pair("user:abc", "Ali", "ali@example.com", "customer")
            .expect("Failed to generate pair");

        let claims = service
            .validate_token(&pair.access_token)
            .expect("Failed to validate access token");
        assert_eq!(claims.sub, "user:abc");
        assert_eq!(claims.email, "ali@example.com");
        assert_eq!(claims.token_type, "access");
        assert_eq!(pair.expires_in, 15 * 60);

        let refresh_claims = service
            .validate_refresh(&pair.refresh_token)
            .expect("Failed to validate refresh token");
        assert_eq!(refresh_claims.token_type, "refresh");
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let service = test_service();
        let pair = service
            .generate_pair("user:abc", "Ali", "ali@example.com", "customer")
            .unwrap();

        assert!(matches!(
            service.validate_token(&pair.refresh_token),
            Err(JwtError::WrongTokenType { expected: "access" })
        ));
        assert!(matches!(
            service.validate_refresh(&pair.access_token),
            Err(JwtError::WrongTokenType {
                expected: "refresh"
            })
        ));
    }

    #[test]
    fn foreign_signature_rejected() {
        let service = test_service();
        let other = JwtService::with_config(JwtConfig {
            secret: "another-secret-which-is-long-enough-9876543210".to_string(),
            ..test_service().config
        });
        let pair = other
            .generate_pair("user:abc", "Ali", "ali@example.com", "customer")
            .unwrap();
        assert!(service.validate_token(&pair.access_token).is_err());
    }

    #[test]
    fn admin_flag_follows_role() {
        let user = CurrentUser {
            id: "user:1".into(),
            name: "Ops".into(),
            email: "ops@example.com".into(),
            role: "admin".into(),
        };
        assert!(user.is_admin());

        let customer = CurrentUser {
            role: "customer".into(),
            ..user
        };
        assert!(!customer.is_admin());
    }
}
