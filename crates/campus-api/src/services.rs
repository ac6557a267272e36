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

//! Account and course services
//!
//! Handlers stay thin; the service layer owns the login/registration flow
//! and the cached course listing.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenService;
use crate::error::{ApiError, ApiResult};
use crate::models::{CourseList, CourseSummary, CreateCourseRequest, LoginRequest, RegisterRequest, TokenResponse, UserProfile};
use crate::query::QueryCache;
use crate::store::{CourseStore, UserRecord, UserStore};

/// Default role assigned at registration
const DEFAULT_ROLE: &str = "student";

fn profile_of(user: &UserRecord) -> UserProfile {
    UserProfile {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
        created_at: user.created_at,
    }
}

/// Registration, login, and profile lookups
pub struct AccountService {
    users: Arc<UserStore>,
    tokens: Arc<TokenService>,
    token_ttl: Duration,
}

impl AccountService {
    /// Create the service
    pub fn new(users: Arc<UserStore>, tokens: Arc<TokenService>, token_ttl: Duration) -> Self {
        Self { users, tokens, token_ttl }
    }

    /// Register a new user with the default role
    pub fn register(&self, request: RegisterRequest) -> ApiResult<UserProfile> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(ApiError::BadRequest {
                message: "username and password are required".to_string(),
            });
        }

        let password_hash = hash_password(&request.password)?;
        let user = self.users.create(&request.username, &request.email, &password_hash, DEFAULT_ROLE)?;

        Ok(profile_of(&user))
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown usernames and wrong passwords produce the same response so
    /// the login endpoint does not reveal which usernames exist.
    pub fn login(&self, request: LoginRequest) -> ApiResult<TokenResponse> {
        let invalid = || ApiError::Unauthorized {
            message: "invalid username or password".to_string(),
        };

        let user = self.users.find_by_username(&request.username).ok_or_else(invalid)?;

        if !verify_password(&user.password_hash, &request.password) {
            warn!(username = %request.username, "failed login attempt");
            return Err(invalid());
        }

        let access_token = self.tokens.issue(&user.id, &user.role, self.token_ttl)?;
        info!(user_id = %user.id, role = %user.role, "user authenticated");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl.num_seconds() as u64,
        })
    }

    /// Look up the profile behind a validated subject id
    pub fn profile(&self, subject: &str) -> ApiResult<UserProfile> {
        let user = self.users.find(subject).ok_or_else(|| ApiError::NotFound {
            message: "user not found".to_string(),
        })?;

        Ok(profile_of(&user))
    }
}

/// Course listing and creation
pub struct CourseService {
    courses: Arc<CourseStore>,
    queries: Arc<QueryCache>,
}

impl CourseService {
    /// Create the service
    pub fn new(courses: Arc<CourseStore>, queries: Arc<QueryCache>) -> Self {
        Self { courses, queries }
    }

    /// A teacher's courses, paginated, through the cache-aside read path
    pub async fn teacher_courses(&self, teacher_id: &str, page: usize, page_size: usize) -> ApiResult<CourseList> {
        let courses = self.courses.clone();
        let teacher = teacher_id.to_string();
        let page_param = page.to_string();
        let page_size_param = page_size.to_string();

        self.queries
            .fetch("teacher_courses", teacher_id, &[page_param.as_str(), page_size_param.as_str()], move || async move {
                let (records, total) = courses.find_by_teacher(&teacher, page, page_size);
                Ok(CourseList {
                    data: records.iter().map(summary_of).collect(),
                    total,
                    page,
                    page_size,
                })
            })
            .await
    }

    /// Create a course owned by the calling teacher.
    ///
    /// Listings are not invalidated here; cached pages age out within the
    /// configured TTL.
    pub fn create(&self, teacher_id: &str, request: CreateCourseRequest) -> ApiResult<CourseSummary> {
        if request.name.is_empty() {
            return Err(ApiError::BadRequest {
                message: "course name is required".to_string(),
            });
        }

        let record = self.courses.insert(&request.name, teacher_id, request.capacity);
        Ok(summary_of(&record))
    }
}

fn summary_of(record: &crate::store::CourseRecord) -> CourseSummary {
    CourseSummary {
        id: record.id.clone(),
        name: record.name.clone(),
        teacher_id: record.teacher_id.clone(),
        capacity: record.capacity,
        created_at: record.created_at,
    }
}
