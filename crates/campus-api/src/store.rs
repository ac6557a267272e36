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

//! In-memory persistence collaborators
//!
//! Keyed maps standing in for the relational store. The cached read path
//! only sees these through lookup closures, so swapping in a real
//! persistence client changes nothing upstream.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Stored user row
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// User store keyed by id, with a username index for login
#[derive(Debug, Default)]
pub struct UserStore {
    users: DashMap<String, UserRecord>,
    by_username: DashMap<String, String>,
}

impl UserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user; usernames are unique
    pub fn create(&self, username: &str, email: &str, password_hash: &str, role: &str) -> ApiResult<UserRecord> {
        let id = Uuid::new_v4().to_string();

        // Reserve the username first so two concurrent registrations
        // cannot both claim it.
        match self.by_username.entry(username.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(ApiError::Conflict {
                    message: format!("username '{}' already exists", username),
                });
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }

        let record = UserRecord {
            id: id.clone(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(id, record.clone());

        info!(username, role, "created user");
        Ok(record)
    }

    /// Look up a user by id
    pub fn find(&self, id: &str) -> Option<UserRecord> {
        self.users.get(id).map(|u| u.clone())
    }

    /// Look up a user by username
    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        let id = self.by_username.get(username)?.clone();
        self.find(&id)
    }
}

/// Stored course row
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
}

/// Course store keyed by id
#[derive(Debug, Default)]
pub struct CourseStore {
    courses: DashMap<String, CourseRecord>,
}

impl CourseStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new course for a teacher
    pub fn insert(&self, name: &str, teacher_id: &str, capacity: u32) -> CourseRecord {
        let record = CourseRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            teacher_id: teacher_id.to_string(),
            capacity,
            created_at: Utc::now(),
        };
        self.courses.insert(record.id.clone(), record.clone());

        info!(course = name, teacher_id, "created course");
        record
    }

    /// Page through a teacher's courses, ordered by name.
    ///
    /// Returns the page plus the total match count. `page` is 1-based.
    pub fn find_by_teacher(&self, teacher_id: &str, page: usize, page_size: usize) -> (Vec<CourseRecord>, usize) {
        let mut matches: Vec<CourseRecord> = self.courses.iter().filter(|c| c.teacher_id == teacher_id).map(|c| c.clone()).collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        let total = matches.len();
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let page_items = if start >= total {
            Vec::new()
        } else {
            matches.into_iter().skip(start).take(page_size).collect()
        };

        (page_items, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_username_conflicts() {
        let store = UserStore::new();

        store.create("ada", "ada@campus.edu", "hash", "student").unwrap();
        let err = store.create("ada", "other@campus.edu", "hash", "student").unwrap_err();

        assert!(matches!(err, ApiError::Conflict { .. }));
        // The original user is still reachable.
        assert_eq!(store.find_by_username("ada").unwrap().email, "ada@campus.edu");
    }

    #[test]
    fn test_find_by_username_round_trips() {
        let store = UserStore::new();
        let created = store.create("grace", "grace@campus.edu", "hash", "teacher").unwrap();

        let found = store.find_by_username("grace").unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, "teacher");

        assert!(store.find_by_username("nobody").is_none());
    }

    #[test]
    fn test_teacher_course_pagination() {
        let store = CourseStore::new();
        for name in ["algebra", "biology", "chemistry", "drama", "english"] {
            store.insert(name, "T1", 30);
        }
        store.insert("other teacher's course", "T2", 30);

        let (page_one, total) = store.find_by_teacher("T1", 1, 2);
        assert_eq!(total, 5);
        assert_eq!(page_one.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["algebra", "biology"]);

        let (page_three, _) = store.find_by_teacher("T1", 3, 2);
        assert_eq!(page_three.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["english"]);

        let (past_the_end, total) = store.find_by_teacher("T1", 9, 2);
        assert_eq!(total, 5);
        assert!(past_the_end.is_empty());
    }
}
