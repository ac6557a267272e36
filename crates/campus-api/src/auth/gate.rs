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

//! Per-request authentication/authorization pipeline
//!
//! A request moves token extraction -> token validation -> policy check.
//! Any failure short-circuits with a typed reason before the next stage
//! runs, so an expired token never reaches the policy engine and a denied
//! request never reaches a handler.

use std::sync::Arc;

use metrics::increment_counter;
use tracing::{debug, warn};

use crate::auth::policy::{Decision, PolicyEngine};
use crate::auth::token::{AuthError, TokenService};
use crate::error::ApiError;

/// Identity attached to a request once it clears the gate.
///
/// Request-scoped; nothing here is shared across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Subject (user ID) from the validated token
    pub subject: String,

    /// Role the policy decision was made against
    pub role: String,
}

/// Reason a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No bearer token on the request
    MissingToken,
    /// Token structure unparseable
    MalformedToken,
    /// Token signature did not verify
    InvalidSignature,
    /// Token past expiry
    Expired,
    /// Token fine, but no policy rule grants the request
    PolicyDenied,
}

impl DenyReason {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::MissingToken => "missing_token",
            DenyReason::MalformedToken => "malformed_token",
            DenyReason::InvalidSignature => "invalid_signature",
            DenyReason::Expired => "expired",
            DenyReason::PolicyDenied => "policy_denied",
        }
    }
}

impl From<AuthError> for DenyReason {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => DenyReason::MissingToken,
            AuthError::MalformedToken => DenyReason::MalformedToken,
            AuthError::InvalidSignature => DenyReason::InvalidSignature,
            AuthError::Expired => DenyReason::Expired,
        }
    }
}

/// Denials map to a response without leaking which stage failed: every
/// token problem reads the same to the client, and a policy denial is a
/// bare 403. Logs and metrics keep the precise reason.
impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::PolicyDenied => ApiError::Forbidden {
                message: "access denied".to_string(),
            },
            _ => ApiError::Unauthorized {
                message: "invalid or expired token".to_string(),
            },
        }
    }
}

/// Extract the token from a bearer-style Authorization header value
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    header.strip_prefix("Bearer ").ok_or(AuthError::MissingToken)
}

/// Stateless request gate combining token validation and policy checks
pub struct AuthGate {
    tokens: Arc<TokenService>,
    policy: Arc<PolicyEngine>,
}

impl AuthGate {
    /// Create a new gate
    pub fn new(tokens: Arc<TokenService>, policy: Arc<PolicyEngine>) -> Self {
        Self { tokens, policy }
    }

    /// Run the pipeline for one request.
    ///
    /// `resource` is the request path and `action` the HTTP method; both
    /// feed the policy check once the token is validated.
    pub fn authorize(&self, auth_header: Option<&str>, resource: &str, action: &str) -> Result<AuthContext, DenyReason> {
        let result = self.check(auth_header, resource, action);

        if let Err(reason) = &result {
            warn!(resource, action, reason = reason.as_str(), "request denied");
            increment_counter!("auth_denied_total", "reason" => reason.as_str());
        }

        result
    }

    fn check(&self, auth_header: Option<&str>, resource: &str, action: &str) -> Result<AuthContext, DenyReason> {
        let header = auth_header.ok_or(DenyReason::MissingToken)?;
        let token = extract_bearer_token(header)?;
        let claims = self.tokens.validate(token)?;

        match self.policy.enforce(&claims.role, resource, action) {
            Decision::Allow => {
                debug!(subject = %claims.sub, role = %claims.role, resource, action, "request authorized");
                Ok(AuthContext {
                    subject: claims.sub,
                    role: claims.role,
                })
            }
            Decision::Deny => Err(DenyReason::PolicyDenied),
        }
    }
}
