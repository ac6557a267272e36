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

//! Configuration management for the campus API
//!
//! Everything is read from the environment once at startup. The signing
//! secret and the policy file have no defaults: without either the
//! process must not serve traffic, so loading fails instead.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading failures, all fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    Missing { name: &'static str },

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Which cache backend serves the read path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// In-process concurrent map
    Memory,
    /// No caching; every read goes to the data source
    Disabled,
}

/// Configuration for the campus API
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// JWT signing secret, configured out-of-band
    pub jwt_secret: String,

    /// Path to the policy rule file
    pub policy_path: PathBuf,

    /// Lifetime of issued tokens in seconds
    pub token_ttl_secs: u64,

    /// Cache backend selection
    pub cache_backend: CacheBackendKind,

    /// TTL for cached query results in seconds
    pub cache_ttl_secs: u64,

    /// Deadline for cache and data-source calls in seconds
    pub query_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("CAMPUS_JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing { name: "CAMPUS_JWT_SECRET" })?;

        let policy_path = lookup("CAMPUS_POLICY_PATH")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing { name: "CAMPUS_POLICY_PATH" })?;

        let cache_backend = match lookup("CAMPUS_CACHE_BACKEND").as_deref() {
            None | Some("memory") => CacheBackendKind::Memory,
            Some("disabled") => CacheBackendKind::Disabled,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "CAMPUS_CACHE_BACKEND",
                    reason: format!("unknown backend '{}', expected 'memory' or 'disabled'", other),
                });
            }
        };

        Ok(Self {
            bind_address: lookup("CAMPUS_BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            jwt_secret,
            policy_path,
            cache_backend,
            token_ttl_secs: parse_secs(&lookup, "CAMPUS_TOKEN_TTL_SECS", 24 * 60 * 60)?,
            cache_ttl_secs: parse_secs(&lookup, "CAMPUS_CACHE_TTL_SECS", 300)?,
            query_timeout_secs: parse_secs(&lookup, "CAMPUS_QUERY_TIMEOUT_SECS", 5)?,
        })
    }
}

fn parse_secs(lookup: impl Fn(&str) -> Option<String>, name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("'{}' is not a number of seconds", raw),
        }),
    }
}
