//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::ast::JoinKind;
use crate::Result;

/// Depths and defaults used when a relation resolves joins and selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Depth of a user-invoked `select`. Includes are joined only by the
    /// call made at exactly this depth.
    pub select_depth: u32,
    /// Depth of a user-invoked `join`.
    pub join_depth: u32,
    /// Join type used when the caller does not name one.
    pub default_join_kind: JoinKind,
    /// Mark the query DISTINCT the first time a join is added.
    pub distinct_on_join: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            select_depth: 3,
            join_depth: 1,
            default_join_kind: JoinKind::Outer,
            distinct_on_join: true,
        }
    }
}

impl ResolverConfig {
    /// Parse a config from YAML; missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a config from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn select_depth(mut self, depth: u32) -> Self {
        self.select_depth = depth;
        self
    }

    pub fn join_depth(mut self, depth: u32) -> Self {
        self.join_depth = depth;
        self
    }

    pub fn default_join_kind(mut self, kind: JoinKind) -> Self {
        self.default_join_kind = kind;
        self
    }

    pub fn distinct_on_join(mut self, enabled: bool) -> Self {
        self.distinct_on_join = enabled;
        self
    }
}
