pub mod cookies;
pub mod password;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id inside the university schema
    pub sub: i64,
    /// University schema the user belongs to
    pub university: String,
    pub role: Role,
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, university: &str, role: Role, token_type: TokenType) -> Self {
        let now = Utc::now();
        let security = &config::config().security;
        let lifetime = match token_type {
            TokenType::Access => Duration::minutes(security.access_token_expiry_minutes),
            TokenType::Refresh => Duration::days(security.refresh_token_expiry_days),
        };

        Self {
            sub: user_id,
            university: university.to_string(),
            role,
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Expected a {0:?} token")]
    WrongTokenType(TokenType),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// A freshly signed token and the claims inside it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

fn secret_for(token_type: TokenType) -> Result<&'static str, AuthError> {
    let security = &config::config().security;
    let secret = match token_type {
        TokenType::Access => &security.jwt_access_secret,
        TokenType::Refresh => &security.jwt_refresh_secret,
    };

    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret.as_str())
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = secret_for(claims.token_type)?;
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Decode a token signed with the secret of `expected` and check its type
pub fn verify_jwt(token: &str, expected: TokenType) -> Result<Claims, AuthError> {
    let secret = secret_for(expected)?;
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let claims = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

    if claims.token_type != expected {
        return Err(AuthError::WrongTokenType(expected));
    }
    Ok(claims)
}

pub fn issue_access_token(user_id: i64, university: &str, role: Role) -> Result<IssuedToken, AuthError> {
    let claims = Claims::new(user_id, university, role, TokenType::Access);
    let token = generate_jwt(&claims)?;
    Ok(IssuedToken { token, claims })
}

pub fn issue_refresh_token(user_id: i64, university: &str, role: Role) -> Result<IssuedToken, AuthError> {
    let claims = Claims::new(user_id, university, role, TokenType::Refresh);
    let token = generate_jwt(&claims)?;
    Ok(IssuedToken { token, claims })
}

/// Hex SHA-256 of a refresh token, the only form persisted server-side
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
