//! JWT utilities for token generation and validation
//!
//! Tokens are signed with HS256 and carry the user id and role. A single
//! token type is issued, valid for 7 days by default.

use chrono::{Duration, Utc};
use derive_more::Display;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default token expiration time (7 days)
const TOKEN_EXPIRATION_DAYS: i64 = 7;

/// Subject used for the environment-configured superadmin
pub const SUPERADMIN_SUBJECT: &str = "superadmin";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration in days
    pub expiration_days: i64,
    /// Token issuer
    pub issuer: String,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_days: TOKEN_EXPIRATION_DAYS,
            issuer: "smartlms".to_string(),
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, JwtError> {
        let secret = std::env::var("JWT_SECRET")
            .or_else(|_| std::env::var("NEXTAUTH_SECRET"))
            .map_err(|_| JwtError::MissingSecret)?;

        let expiration_days = std::env::var("JWT_EXPIRATION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(TOKEN_EXPIRATION_DAYS);

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "smartlms".to_string());

        Ok(Self {
            secret,
            expiration_days,
            issuer,
        })
    }

    /// Set token expiration
    pub fn expiration(mut self, days: i64) -> Self {
        self.expiration_days = days;
        self
    }

    /// Set issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT_SECRET environment variable not set")]
    MissingSecret,

    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token decoding failed: {0}")]
    DecodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                JwtError::InvalidToken
            }
            _ => JwtError::DecodingError(err.to_string()),
        }
    }
}

/// Role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[display("student")]
    Student,
    /// Lecturer accounts; the wire value is `lecture`
    #[display("lecture")]
    Lecture,
    #[display("superadmin")]
    Superadmin,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID, or `superadmin`)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role
    pub user_role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    pub fn is_superadmin(&self) -> bool {
        self.user_role == UserRole::Superadmin
    }

    pub fn is_student(&self) -> bool {
        self.user_role == UserRole::Student
    }

    pub fn is_lecturer(&self) -> bool {
        self.user_role == UserRole::Lecture
    }

    /// Get user ID as UUID. Fails for the superadmin subject.
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Create JWT service from environment variables
    pub fn from_env() -> Result<Self, JwtError> {
        let config = JwtConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Generate a token for `subject`, returning it with its expiry timestamp
    pub fn generate_token(
        &self,
        subject: &str,
        email: &str,
        role: UserRole,
    ) -> Result<(String, i64), JwtError> {
        let now = Utc::now();
        let exp = now + Duration::days(self.config.expiration_days);

        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            user_role: role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, exp.timestamp()))
    }

    /// Generate a token for a database user
    pub fn generate_user_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<String, JwtError> {
        self.generate_token(&user_id.to_string(), email, role)
            .map(|(token, _)| token)
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        // Set leeway to 0 for strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    pub fn expiration_days(&self) -> i64 {
        self.config.expiration_days
    }
}
