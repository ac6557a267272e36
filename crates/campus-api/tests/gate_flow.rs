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

//! End-to-end auth gate scenarios

use std::sync::Arc;

use campus_api::auth::gate::{AuthGate, DenyReason};
use campus_api::auth::policy::{PolicyEngine, RuleSet};
use campus_api::auth::token::{Claims, TokenService};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

const SECRET: &str = "gate-flow-secret";

fn gate(policy_source: &str) -> (AuthGate, Arc<TokenService>) {
    let tokens = Arc::new(TokenService::new(SECRET).unwrap());
    let policy = Arc::new(PolicyEngine::new(RuleSet::parse(policy_source).unwrap()));
    (AuthGate::new(tokens.clone(), policy), tokens)
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[test]
fn teacher_token_with_matching_rule_is_authorized() {
    let (gate, tokens) = gate("p, teacher, /courses/*, GET\n");
    let token = tokens.issue("T1", "teacher", Duration::hours(1)).unwrap();

    let context = gate.authorize(Some(&bearer(&token)), "/courses/123", "GET").unwrap();

    assert_eq!(context.subject, "T1");
    assert_eq!(context.role, "teacher");
}

#[test]
fn student_token_without_rule_is_policy_denied() {
    let (gate, tokens) = gate("p, teacher, /courses/*, GET\n");
    let token = tokens.issue("S1", "student", Duration::hours(1)).unwrap();

    let denied = gate.authorize(Some(&bearer(&token)), "/courses/123", "GET").unwrap_err();

    assert_eq!(denied, DenyReason::PolicyDenied);
}

#[test]
fn expired_token_is_denied_before_the_policy_check() {
    // The wildcard rule would allow anything, so a PolicyDenied here
    // would mean the policy engine ran; the expired token must short-
    // circuit first.
    let (gate, _) = gate("p, *, /courses/*, GET\n");

    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "T1".to_string(),
        role: "teacher".to_string(),
        iat: now - 120,
        exp: now - 60,
    };
    let stale = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

    let denied = gate.authorize(Some(&bearer(&stale)), "/courses/123", "GET").unwrap_err();

    assert_eq!(denied, DenyReason::Expired);
}

#[test]
fn foreign_signature_is_denied_before_the_policy_check() {
    let (gate, _) = gate("p, *, /courses/*, GET\n");

    let foreign = TokenService::new("some-other-secret").unwrap();
    let token = foreign.issue("T1", "teacher", Duration::hours(1)).unwrap();

    let denied = gate.authorize(Some(&bearer(&token)), "/courses/123", "GET").unwrap_err();

    assert_eq!(denied, DenyReason::InvalidSignature);
}

#[test]
fn missing_header_is_denied_without_touching_the_token_service() {
    let (gate, _) = gate("p, *, /courses/*, GET\n");

    assert_eq!(gate.authorize(None, "/courses/123", "GET").unwrap_err(), DenyReason::MissingToken);
}
