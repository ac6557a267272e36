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

//! Request logging and metrics middleware

use std::time::Instant;

use hyper::{Request, Response};
use metrics::{histogram, increment_counter};
use tower::{Layer, Service};
use tracing::{error, info};
use uuid::Uuid;

/// Request logging and metrics middleware
#[derive(Clone)]
pub struct TelemetryMiddleware<S> {
    inner: S,
}

impl<S> TelemetryMiddleware<S> {
    /// Create a new telemetry middleware
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TelemetryMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let inner = self.inner.clone();
        let method = req.method().clone();
        let uri = req.uri().clone();
        let start_time = Instant::now();

        Box::pin(async move {
            info!("Request: {} {}", method, uri);

            let mut inner_service = inner;
            let result = inner_service.call(req).await;

            let duration = start_time.elapsed();
            let path_label = sanitize_path(uri.path());

            match &result {
                Ok(response) => {
                    info!("Response: {} {} - {} in {:?}", method, uri, response.status(), duration);
                    increment_counter!(
                        "http_requests_total",
                        "method" => method.to_string(),
                        "path" => path_label.clone(),
                        "status" => response.status().as_u16().to_string()
                    );
                }
                Err(_) => {
                    error!("Error: {} {} in {:?}", method, uri, duration);
                    increment_counter!(
                        "http_requests_total",
                        "method" => method.to_string(),
                        "path" => path_label.clone(),
                        "status" => "error"
                    );
                }
            }

            histogram!(
                "http_request_duration_seconds",
                duration.as_secs_f64(),
                "method" => method.to_string(),
                "path" => path_label
            );

            result.map_err(Into::into)
        })
    }
}

/// Telemetry middleware layer
#[derive(Clone)]
pub struct TelemetryLayer;

impl TelemetryLayer {
    /// Create a new telemetry layer
    pub fn new() -> Self {
        Self
    }
}

impl Default for TelemetryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for TelemetryLayer {
    type Service = TelemetryMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TelemetryMiddleware::new(inner)
    }
}

/// Replace variable path segments (numeric ids, UUIDs, long opaque
/// strings) with `:id` so metric labels stay low-cardinality.
fn sanitize_path(path: &str) -> String {
    let sanitized: Vec<&str> = path
        .split('/')
        .map(|segment| {
            if segment.is_empty() {
                return segment;
            }
            let numeric = segment.chars().all(|c| c.is_ascii_digit());
            if numeric || Uuid::parse_str(segment).is_ok() || segment.len() > 40 { ":id" } else { segment }
        })
        .collect();

    let joined = sanitized.join("/");
    if joined.starts_with('/') { joined } else { format!("/{}", joined) }
}
