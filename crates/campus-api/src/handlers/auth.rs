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

//! Authentication handlers

use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode, body::Bytes, body::Incoming};
use tracing::info;

use crate::auth::gate::AuthContext;
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest};
use crate::services::AccountService;

/// Register handler
/// POST /api/auth/register
pub async fn register(req: Request<Incoming>, accounts: Arc<AccountService>) -> Result<Response<Full<Bytes>>, ApiError> {
    let body = req.into_body().collect().await?.to_bytes();
    let register_request: RegisterRequest = serde_json::from_slice(&body)?;

    let profile = accounts.register(register_request)?;

    info!(username = %profile.username, "user registered");

    let response_json = serde_json::to_string(&profile)?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(response_json)))?)
}

/// Login handler
/// POST /api/auth/login
pub async fn login(req: Request<Incoming>, accounts: Arc<AccountService>) -> Result<Response<Full<Bytes>>, ApiError> {
    let body = req.into_body().collect().await?.to_bytes();
    let login_request: LoginRequest = serde_json::from_slice(&body)?;

    let token_response = accounts.login(login_request)?;

    let response_json = serde_json::to_string(&token_response)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(response_json)))?)
}

/// Current-user handler
/// GET /api/auth/me
pub async fn me(req: Request<Incoming>, accounts: Arc<AccountService>) -> Result<Response<Full<Bytes>>, ApiError> {
    let context = req.extensions().get::<AuthContext>().ok_or_else(|| ApiError::Unauthorized {
        message: "no authentication information found".to_string(),
    })?;

    let profile = accounts.profile(&context.subject)?;

    let response_json = serde_json::to_string(&profile)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(response_json)))?)
}
