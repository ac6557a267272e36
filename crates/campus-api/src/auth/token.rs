// CampusHub
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Signed-token issuance and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ApiError, ApiResult};

/// Identity claims embedded in every access token.
///
/// Immutable once issued; the shape is fixed so downstream code never
/// fishes fields out of an untyped claim map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Role granted at login
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a subject, expiring `ttl` from now
    pub fn new(subject: String, role: String, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Check if the claims are past their expiry
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Token validation failures.
///
/// All variants surface as an authentication failure to the client; the
/// distinction exists for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Authorization header absent or not a bearer token.
    #[error("missing or malformed authorization header")]
    MissingToken,

    /// Token structure cannot be parsed.
    #[error("malformed token")]
    MalformedToken,

    /// Signature check failed.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token is past its expiry.
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::MalformedToken,
        }
    }
}

/// Issues and validates HS256-signed identity tokens.
///
/// The signing secret is process-wide configuration, read-only after
/// startup. Rotating it invalidates every previously issued token; there
/// is no dual-secret grace window.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the configured secret.
    ///
    /// An empty secret is a misconfiguration and is rejected here so it
    /// fails at startup rather than on the first login.
    pub fn new(secret: &str) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::InternalServerError {
                message: "JWT secret must not be empty".to_string(),
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token is invalid the instant its expiry passes.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        })
    }

    /// Issue a signed token for a subject
    pub fn issue(&self, subject: &str, role: &str, ttl: Duration) -> ApiResult<String> {
        let claims = Claims::new(subject.to_string(), role.to_string(), ttl);
        let header = Header::new(Algorithm::HS256);

        encode(&header, &claims, &self.encoding_key).map_err(|e| ApiError::InternalServerError {
            message: format!("token signing failed: {}", e),
        })
    }

    /// Validate a token and return its claims.
    ///
    /// Pure function of (token, current time, secret); no side effects.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        let claims = token_data.claims;
        if claims.is_expired() {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenService::new("").is_err());
    }

    #[test]
    fn test_issue_then_validate_round_trips_claims() {
        let tokens = service("test-secret");

        let token = tokens.issue("user-1", "teacher", Duration::hours(1)).unwrap();
        let claims = tokens.validate(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, "teacher");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_fails_with_expired() {
        let tokens = service("test-secret");

        // Hand-craft claims whose expiry is already in the past.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            role: "student".to_string(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();

        assert_eq!(tokens.validate(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret_fails_with_invalid_signature() {
        let issuer = service("secret-a");
        let verifier = service("secret-b");

        let token = issuer.issue("user-1", "teacher", Duration::hours(1)).unwrap();

        assert_eq!(verifier.validate(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_garbage_fails_with_malformed_token() {
        let tokens = service("test-secret");

        assert_eq!(tokens.validate("not-a-token"), Err(AuthError::MalformedToken));
        assert_eq!(tokens.validate(""), Err(AuthError::MalformedToken));
        assert_eq!(tokens.validate("a.b.c"), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let tokens = service("test-secret");
        let token = tokens.issue("user-1", "teacher", Duration::hours(1)).unwrap();

        let first = tokens.validate(&token).unwrap();
        let second = tokens.validate(&token).unwrap();

        assert_eq!(first, second);
    }
}
