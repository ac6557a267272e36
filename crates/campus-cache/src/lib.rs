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

//! Expiring key/value cache used as a read accelerator by the campus API.
//!
//! Backends are interchangeable behind the [`Cache`] trait and are picked
//! once at construction time. Values are opaque byte strings; encoding is
//! the caller's concern. A `get` on an absent or expired key is a miss,
//! never an error, and `delete` is idempotent.

pub mod disabled;
pub mod memory;

pub use disabled::DisabledCache;
pub use memory::{CacheStats, MemoryCache};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a cache backend.
///
/// An in-process backend never fails; network-backed implementations map
/// connection and protocol failures here. Callers are expected to treat a
/// failed cache call as a miss, not as a request failure.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or refused the operation.
    #[error("cache backend unavailable: {message}")]
    Unavailable { message: String },
}

/// Capability interface shared by every cache backend.
///
/// Callers must not assume atomicity across a get-then-set sequence:
/// concurrent fillers for the same key may both reach the data source and
/// both write, with the last write winning.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a key. Absent and expired entries both return `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value under a key, unconditionally replacing any previous
    /// entry, for at most `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
