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

//! Authentication and authorization core
//!
//! - Token issuance/validation over a process-wide signing secret
//! - Rule-file policy engine with first-match-wins, default-deny semantics
//! - Per-request gate composing the two
//! - Credential verification primitive consumed before a token is issued

pub mod gate;
pub mod password;
pub mod policy;
pub mod token;

pub use gate::*;
pub use password::*;
pub use policy::*;
pub use token::*;
