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

//! HTTP routing for the campus API

use std::collections::HashMap;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::{Method, Request, Response};
use tracing::warn;

use crate::auth::gate::AuthGate;
use crate::error::ApiError;
use crate::handlers::{auth, course, health};
use crate::services::{AccountService, CourseService};

/// Paths reachable without a token
const PUBLIC_PATHS: [&str; 3] = ["/api/health", "/api/auth/login", "/api/auth/register"];

/// HTTP router for the campus API
pub struct Router {
    gate: Arc<AuthGate>,
    accounts: Arc<AccountService>,
    courses: Arc<CourseService>,
}

impl Router {
    /// Create a new router
    pub fn new(gate: Arc<AuthGate>, accounts: Arc<AccountService>, courses: Arc<CourseService>) -> Self {
        Self { gate, accounts, courses }
    }

    /// Route a request to the appropriate handler.
    ///
    /// Every non-public path goes through the auth gate first; a denial
    /// short-circuits here and no handler runs.
    pub async fn route(&self, mut req: Request<Incoming>) -> Result<Response<Full<Bytes>>, ApiError> {
        let path = req.uri().path().to_string();
        let method = req.method().clone();

        let requires_auth = !PUBLIC_PATHS.contains(&path.as_str());

        if requires_auth {
            let auth_header = req.headers().get("authorization").and_then(|h| h.to_str().ok()).map(|s| s.to_string());

            let context = self.gate.authorize(auth_header.as_deref(), &path, method.as_str())?;
            req.extensions_mut().insert(context);
        }

        let query = req.uri().query().unwrap_or("").to_string();

        match (&method, path.as_str()) {
            (&Method::GET, "/api/health") => health::health_check().await,

            (&Method::POST, "/api/auth/register") => auth::register(req, self.accounts.clone()).await,
            (&Method::POST, "/api/auth/login") => auth::login(req, self.accounts.clone()).await,
            (&Method::GET, "/api/auth/me") => auth::me(req, self.accounts.clone()).await,

            (&Method::GET, "/api/courses") => {
                let params = parse_query_params(&query);
                course::list_courses(req, params, self.courses.clone()).await
            }
            (&Method::POST, "/api/courses") => course::create_course(req, self.courses.clone()).await,

            _ => {
                warn!("Route not found: {} {}", method, path);
                Err(ApiError::NotFound {
                    message: format!("Route not found: {} {}", method, path),
                })
            }
        }
    }
}

/// Parse query parameters from a query string
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            let key = percent_encoding::percent_decode_str(key).decode_utf8().unwrap_or_default().to_string();
            let value = percent_encoding::percent_decode_str(value).decode_utf8().unwrap_or_default().to_string();
            params.insert(key, value);
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("page=2&page_size=10");

        assert_eq!(params.get("page").map(String::as_str), Some("2"));
        assert_eq!(params.get("page_size").map(String::as_str), Some("10"));
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_parse_query_params_percent_decodes() {
        let params = parse_query_params("name=intro%20to%20rust");
        assert_eq!(params.get("name").map(String::as_str), Some("intro to rust"));
    }

    #[test]
    fn test_public_paths_cover_login_and_health() {
        assert!(PUBLIC_PATHS.contains(&"/api/health"));
        assert!(PUBLIC_PATHS.contains(&"/api/auth/login"));
        assert!(PUBLIC_PATHS.contains(&"/api/auth/register"));
        assert!(!PUBLIC_PATHS.contains(&"/api/courses"));
    }
}
