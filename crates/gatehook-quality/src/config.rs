//! Configuration for the formatter/linter pipeline.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::ToolDescriptor;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QualityConfig {
    #[serde(default = "default_true")]
    pub formatter_enabled: bool,

    #[serde(default = "default_true")]
    pub linter_enabled: bool,

    /// Used when a tool declares no timeout of its own
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// How long a file hash stays cached
    #[serde(default = "default_hash_ttl")]
    pub hash_ttl_secs: u64,

    /// Cap on parsed lint issues per run
    #[serde(default = "default_max_issues")]
    pub max_issues: usize,

    /// Issues listed in the advisory summary
    #[serde(default = "default_summary_issues")]
    pub summary_issues: usize,

    #[serde(default)]
    pub extra_skip_extensions: Vec<String>,

    #[serde(default)]
    pub extra_skip_dirs: Vec<String>,

    /// Budget for the SessionStart tool inventory
    #[serde(default = "default_inventory_timeout")]
    pub inventory_timeout_ms: u64,

    /// Extra tools keyed by language name, merged into the builtin table
    #[serde(default)]
    pub tools: BTreeMap<String, Vec<ToolDescriptor>>,
}

fn default_true() -> bool {
    true
}

fn default_tool_timeout() -> u64 {
    30
}

fn default_hash_ttl() -> u64 {
    300
}

fn default_max_issues() -> usize {
    20
}

fn default_summary_issues() -> usize {
    5
}

fn default_inventory_timeout() -> u64 {
    2000
}

impl QualityConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn hash_ttl(&self) -> Duration {
        Duration::from_secs(self.hash_ttl_secs)
    }

    pub fn inventory_timeout(&self) -> Duration {
        Duration::from_millis(self.inventory_timeout_ms)
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            formatter_enabled: default_true(),
            linter_enabled: default_true(),
            tool_timeout_secs: default_tool_timeout(),
            hash_ttl_secs: default_hash_ttl(),
            max_issues: default_max_issues(),
            summary_issues: default_summary_issues(),
            extra_skip_extensions: vec![],
            extra_skip_dirs: vec![],
            inventory_timeout_ms: default_inventory_timeout(),
            tools: BTreeMap::new(),
        }
    }
}
