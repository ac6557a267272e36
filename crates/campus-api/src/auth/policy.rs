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

//! Rule-file policy engine
//!
//! Authorization is driven by an ordered list of (role, resource, action)
//! grants loaded from a file at startup. Rules are scanned in file order
//! and the first match wins; a request no rule matches is denied. Every
//! new resource is therefore inaccessible until a rule grants it.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

/// Policy loading failures. Fatal at startup: the process must not serve
/// traffic without a loaded rule set.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed policy rule at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// A single (role, resource, action) grant.
///
/// `*` as the role or action matches anything. The resource is a
/// `/`-separated template where a `*` or `:name` segment matches exactly
/// one path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub role: String,
    pub resource: String,
    pub action: String,
}

impl PolicyRule {
    /// Check whether this rule grants the given request
    fn matches(&self, role: &str, resource: &str, action: &str) -> bool {
        (self.role == "*" || self.role == role)
            && (self.action == "*" || self.action.eq_ignore_ascii_case(action))
            && resource_matches(&self.resource, resource)
    }
}

/// Match a resource template against a concrete path, segment by segment.
///
/// Segment counts must agree: a placeholder stands in for exactly one
/// segment, never a subtree.
fn resource_matches(pattern: &str, resource: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let resource_segments: Vec<&str> = resource.trim_matches('/').split('/').collect();

    if pattern_segments.len() != resource_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(resource_segments.iter())
        .all(|(pattern_segment, resource_segment)| *pattern_segment == "*" || pattern_segment.starts_with(':') || pattern_segment == resource_segment)
}

/// Immutable, ordered collection of policy rules
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<PolicyRule>,
}

impl RuleSet {
    /// Load a rule set from a policy file
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let source = std::fs::read_to_string(path).map_err(|e| PolicyError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&source)
    }

    /// Parse rules from policy-file text.
    ///
    /// One rule per line: `p, <role>, <resource>, <action>`. Blank lines
    /// and `#` comments are skipped. Any other line is malformed.
    pub fn parse(source: &str) -> Result<Self, PolicyError> {
        let mut rules = Vec::new();

        for (index, raw_line) in source.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != 4 || fields[0] != "p" {
                return Err(PolicyError::Malformed {
                    line: index + 1,
                    reason: format!("expected `p, <role>, <resource>, <action>`, got `{}`", line),
                });
            }

            if fields[1..].iter().any(|field| field.is_empty()) {
                return Err(PolicyError::Malformed {
                    line: index + 1,
                    reason: "empty field".to_string(),
                });
            }

            rules.push(PolicyRule {
                role: fields[1].to_string(),
                resource: fields[2].to_string(),
                action: fields[3].to_string(),
            });
        }

        Ok(Self { rules })
    }

    /// Number of loaded rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule set grants nothing
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Process-wide policy engine, shared read-only by all request handlers.
///
/// Reload builds a complete replacement rule set and swaps it in one
/// assignment; in-flight checks keep scanning the set they started with.
pub struct PolicyEngine {
    rules: RwLock<Arc<RuleSet>>,
}

impl PolicyEngine {
    /// Create an engine over an already-parsed rule set
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: RwLock::new(Arc::new(rules)),
        }
    }

    /// Load the policy file and create the engine
    pub fn from_file(path: &Path) -> Result<Self, PolicyError> {
        let rules = RuleSet::load(path)?;
        info!(path = %path.display(), rules = rules.len(), "loaded policy rules");
        Ok(Self::new(rules))
    }

    /// Decide whether `role` may perform `action` on `resource`.
    ///
    /// First matching rule in file order wins; no match denies.
    pub fn enforce(&self, role: &str, resource: &str, action: &str) -> Decision {
        let rules = self.rules.read().clone();

        for (index, rule) in rules.rules.iter().enumerate() {
            if rule.matches(role, resource, action) {
                debug!(role, resource, action, rule = index, "policy allow");
                return Decision::Allow;
            }
        }

        debug!(role, resource, action, "policy deny: no matching rule");
        Decision::Deny
    }

    /// Replace the active rule set from the policy file.
    ///
    /// Parsing happens before the swap, so a malformed file leaves the
    /// previous rules in force.
    pub fn reload_from(&self, path: &Path) -> Result<(), PolicyError> {
        let fresh = RuleSet::load(path)?;
        info!(path = %path.display(), rules = fresh.len(), "reloaded policy rules");
        *self.rules.write() = Arc::new(fresh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine(source: &str) -> PolicyEngine {
        PolicyEngine::new(RuleSet::parse(source).unwrap())
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let rules = RuleSet::parse(
            "# campus policy\n\
             \n\
             p, teacher, /api/courses/*, GET\n\
             p, admin, /api/users, *\n",
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = RuleSet::parse("p, teacher, /api/courses\n").unwrap_err();
        assert!(matches!(err, PolicyError::Malformed { line: 1, .. }));

        let err = RuleSet::parse("g, teacher, /api/courses, GET\n").unwrap_err();
        assert!(matches!(err, PolicyError::Malformed { .. }));

        let err = RuleSet::parse("p, , /api/courses, GET\n").unwrap_err();
        assert!(matches!(err, PolicyError::Malformed { .. }));
    }

    #[test]
    fn test_exact_match_allows() {
        let engine = engine("p, teacher, /api/courses, GET\n");

        assert_eq!(engine.enforce("teacher", "/api/courses", "GET"), Decision::Allow);
        assert_eq!(engine.enforce("teacher", "/api/courses", "POST"), Decision::Deny);
        assert_eq!(engine.enforce("student", "/api/courses", "GET"), Decision::Deny);
    }

    #[test]
    fn test_placeholder_matches_single_segment() {
        let engine = engine("p, teacher, /api/courses/*, GET\n");

        assert_eq!(engine.enforce("teacher", "/api/courses/123", "GET"), Decision::Allow);
        assert_eq!(engine.enforce("teacher", "/api/courses", "GET"), Decision::Deny);
        assert_eq!(engine.enforce("teacher", "/api/courses/123/students", "GET"), Decision::Deny);
    }

    #[test]
    fn test_named_placeholder_matches_single_segment() {
        let engine = engine("p, student, /api/assignments/:id, GET\n");

        assert_eq!(engine.enforce("student", "/api/assignments/42", "GET"), Decision::Allow);
        assert_eq!(engine.enforce("student", "/api/assignments", "GET"), Decision::Deny);
    }

    #[test]
    fn test_wildcard_role_and_action() {
        let engine = engine("p, *, /api/health, GET\np, admin, /api/users/*, *\n");

        assert_eq!(engine.enforce("anyone", "/api/health", "GET"), Decision::Allow);
        assert_eq!(engine.enforce("admin", "/api/users/7", "DELETE"), Decision::Allow);
        assert_eq!(engine.enforce("teacher", "/api/users/7", "DELETE"), Decision::Deny);
    }

    #[test]
    fn test_first_match_wins_in_file_order() {
        // Both rules match the same request; the scan must stop at the first.
        let engine = engine("p, teacher, /api/courses/*, GET\np, teacher, /api/courses/123, GET\n");

        assert_eq!(engine.enforce("teacher", "/api/courses/123", "GET"), Decision::Allow);
    }

    #[test]
    fn test_enforce_is_deterministic() {
        let engine = engine("p, teacher, /api/courses/*, GET\n");

        for _ in 0..10 {
            assert_eq!(engine.enforce("teacher", "/api/courses/9", "GET"), Decision::Allow);
            assert_eq!(engine.enforce("student", "/api/courses/9", "GET"), Decision::Deny);
        }
    }

    #[test]
    fn test_reload_swaps_rule_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.csv");

        std::fs::write(&path, "p, teacher, /api/courses, GET\n").unwrap();
        let engine = PolicyEngine::from_file(&path).unwrap();
        assert_eq!(engine.enforce("teacher", "/api/courses", "GET"), Decision::Allow);
        assert_eq!(engine.enforce("student", "/api/courses", "GET"), Decision::Deny);

        std::fs::write(&path, "p, student, /api/courses, GET\n").unwrap();
        engine.reload_from(&path).unwrap();
        assert_eq!(engine.enforce("teacher", "/api/courses", "GET"), Decision::Deny);
        assert_eq!(engine.enforce("student", "/api/courses", "GET"), Decision::Allow);
    }

    #[test]
    fn test_reload_failure_keeps_previous_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.csv");

        std::fs::write(&path, "p, teacher, /api/courses, GET\n").unwrap();
        let engine = PolicyEngine::from_file(&path).unwrap();

        std::fs::write(&path, "not a rule\n").unwrap();
        assert!(engine.reload_from(&path).is_err());

        assert_eq!(engine.enforce("teacher", "/api/courses", "GET"), Decision::Allow);
    }

    proptest! {
        /// With no rules loaded, every request is denied.
        #[test]
        fn prop_empty_rule_set_denies_everything(
            role in "[a-zA-Z0-9_]{0,12}",
            resource in "(/[a-zA-Z0-9_]{1,8}){0,4}",
            action in "(GET|POST|PUT|DELETE|PATCH)",
        ) {
            let engine = PolicyEngine::new(RuleSet::default());
            prop_assert_eq!(engine.enforce(&role, &resource, &action), Decision::Deny);
        }

        /// A rule never grants a request for a different action.
        #[test]
        fn prop_action_mismatch_denies(action in "(POST|PUT|DELETE|PATCH)") {
            let engine = PolicyEngine::new(RuleSet::parse("p, teacher, /api/courses, GET\n").unwrap());
            prop_assert_eq!(engine.enforce("teacher", "/api/courses", &action), Decision::Deny);
        }
    }
}
