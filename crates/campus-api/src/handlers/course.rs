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

//! Course handlers

use std::collections::HashMap;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode, body::Bytes, body::Incoming};

use crate::auth::gate::AuthContext;
use crate::error::ApiError;
use crate::models::CreateCourseRequest;
use crate::services::CourseService;

/// Largest accepted page size; bigger requests are clamped, not rejected
const MAX_PAGE_SIZE: usize = 100;

fn auth_context(req: &Request<Incoming>) -> Result<AuthContext, ApiError> {
    req.extensions().get::<AuthContext>().cloned().ok_or_else(|| ApiError::Unauthorized {
        message: "no authentication information found".to_string(),
    })
}

fn page_param(params: &HashMap<String, String>, name: &str, default: usize) -> Result<usize, ApiError> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => raw.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| ApiError::BadRequest {
            message: format!("'{}' must be a positive integer", name),
        }),
    }
}

/// Teacher course listing
/// GET /api/courses?page=1&page_size=20
pub async fn list_courses(req: Request<Incoming>, params: HashMap<String, String>, courses: Arc<CourseService>) -> Result<Response<Full<Bytes>>, ApiError> {
    let context = auth_context(&req)?;

    let page = page_param(&params, "page", 1)?;
    let page_size = page_param(&params, "page_size", 20)?.min(MAX_PAGE_SIZE);

    let listing = courses.teacher_courses(&context.subject, page, page_size).await?;

    let response_json = serde_json::to_string(&listing)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(response_json)))?)
}

/// Course creation
/// POST /api/courses
pub async fn create_course(req: Request<Incoming>, courses: Arc<CourseService>) -> Result<Response<Full<Bytes>>, ApiError> {
    let context = auth_context(&req)?;

    let body = req.into_body().collect().await?.to_bytes();
    let create_request: CreateCourseRequest = serde_json::from_slice(&body)?;

    let course = courses.create(&context.subject, create_request)?;

    let response_json = serde_json::to_string(&course)?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(response_json)))?)
}
