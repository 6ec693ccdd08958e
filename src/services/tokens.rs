use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies the stateless bearer tokens handed out at register and
/// login. Nothing is stored server side, so a token stays valid until `exp`
/// no matter what happens to the account in between.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, user_id: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Checks signature and expiry and returns the embedded user id. The
    /// caller still has to look the account up; a vanished user is its own
    /// 401, not a token problem.
    pub fn validate(&self, token: &str) -> AppResult<i64> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::InvalidOrExpiredToken)?;
        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::InvalidOrExpiredToken)
    }
}
