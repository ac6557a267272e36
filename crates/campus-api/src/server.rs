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

//! HTTP server implementation using Hyper

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use campus_cache::{Cache, DisabledCache, MemoryCache};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{error, info};

use crate::auth::gate::AuthGate;
use crate::auth::policy::PolicyEngine;
use crate::auth::token::TokenService;
use crate::config::{CacheBackendKind, Config};
use crate::error::{ApiError, ApiResult};
use crate::middleware::TelemetryLayer;
use crate::query::QueryCache;
use crate::router::Router;
use crate::services::{AccountService, CourseService};
use crate::store::{CourseStore, UserStore};

/// How often the in-process cache sweeps expired entries
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// API server using Hyper
pub struct ApiServer {
    bind_address: SocketAddr,
    listener: TcpListener,
    router: Arc<Router>,
}

impl ApiServer {
    /// Wire up every service from configuration and bind the listener.
    ///
    /// Construction fails on a bad bind address, an empty signing secret,
    /// or an unloadable policy file; the process never reaches `run` with
    /// a half-configured core.
    pub async fn new(config: Config) -> ApiResult<Self> {
        let requested_address: SocketAddr = config.bind_address.parse().map_err(|e| ApiError::BadRequest {
            message: format!("Invalid bind address: {}", e),
        })?;

        let tokens = Arc::new(TokenService::new(&config.jwt_secret)?);
        let policy = Arc::new(PolicyEngine::from_file(&config.policy_path)?);

        // The one place a backend is chosen; everything downstream sees
        // the trait object.
        let cache: Arc<dyn Cache> = match config.cache_backend {
            CacheBackendKind::Memory => {
                let cache = Arc::new(MemoryCache::new());
                MemoryCache::start_cleanup_task(cache.clone(), CACHE_SWEEP_INTERVAL);
                cache
            }
            CacheBackendKind::Disabled => Arc::new(DisabledCache),
        };

        let queries = Arc::new(QueryCache::new(
            cache,
            Duration::from_secs(config.cache_ttl_secs),
            Duration::from_secs(config.query_timeout_secs),
        ));

        let users = Arc::new(UserStore::new());
        let courses = Arc::new(CourseStore::new());

        let accounts = Arc::new(AccountService::new(
            users,
            tokens.clone(),
            chrono::Duration::seconds(config.token_ttl_secs as i64),
        ));
        let course_service = Arc::new(CourseService::new(courses, queries));

        let gate = Arc::new(AuthGate::new(tokens, policy));
        let router = Arc::new(Router::new(gate, accounts, course_service));

        let listener = TcpListener::bind(requested_address).await.map_err(ApiError::IoError)?;
        let bind_address = listener.local_addr().map_err(ApiError::IoError)?;

        info!("API server created successfully");

        Ok(Self {
            bind_address,
            listener,
            router,
        })
    }

    /// Get the bound address
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Start serving connections
    pub async fn run(self) -> ApiResult<()> {
        info!("CampusHub API listening on http://{}", self.bind_address);

        loop {
            let (stream, remote_addr) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::task::spawn(async move {
                let service = ServiceBuilder::new().layer(TelemetryLayer::new()).service(tower::service_fn(move |req: Request<Incoming>| {
                    let router = router.clone();
                    async move {
                        match router.route(req).await {
                            Ok(response) => Ok::<_, Infallible>(response),
                            Err(e) => Ok(Response::from(e)),
                        }
                    }
                }));

                if let Err(err) = http1::Builder::new().serve_connection(io, TowerToHyperService::new(service)).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}
