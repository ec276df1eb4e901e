use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Diagnostic counts for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTotals {
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub warnings: u64,
    #[serde(default)]
    pub information: u64,
    #[serde(default)]
    pub hints: u64,
}

impl SeverityTotals {
    fn add(mut self, other: &SeverityTotals) -> Self {
        self.errors = self.errors.saturating_add(other.errors);
        self.warnings = self.warnings.saturating_add(other.warnings);
        self.information = self.information.saturating_add(other.information);
        self.hints = self.hints.saturating_add(other.hints);
        self
    }
}

/// Persisted snapshot of diagnostics, keyed by project-relative file path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsBaseline {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub files: BTreeMap<String, SeverityTotals>,
}

impl DiagnosticsBaseline {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read baseline {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse baseline {:?}", path))
    }

    /// Sum of every file's severities
    pub fn totals(&self) -> SeverityTotals {
        self.files
            .values()
            .fold(SeverityTotals::default(), |acc, t| acc.add(t))
    }
}

/// Error ceiling a teammate must satisfy before going idle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGate {
    #[serde(default = "default_true")]
    pub enforce: bool,
    #[serde(default)]
    pub max_errors: u64,
    #[serde(default)]
    pub max_warnings: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct QualityGateFile {
    quality_gate: QualityGate,
}

fn default_true() -> bool {
    true
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            enforce: true,
            max_errors: 0,
            max_warnings: None,
        }
    }
}

impl QualityGate {
    /// Load the `[quality_gate]` table from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read quality gate {:?}", path))?;
        let file: QualityGateFile =
            toml::from_str(&content).context("Failed to parse quality gate TOML")?;
        Ok(file.quality_gate)
    }

    /// Reason for rejecting, or `None` when totals are within the ceiling
    pub fn violation(&self, totals: &SeverityTotals) -> Option<String> {
        if !self.enforce {
            return None;
        }
        if totals.errors > self.max_errors {
            return Some(format!(
                "{} diagnostic error(s) exceed the quality gate ceiling of {}; fix them before going idle",
                totals.errors, self.max_errors
            ));
        }
        match self.max_warnings {
            Some(max) if totals.warnings > max => Some(format!(
                "{} diagnostic warning(s) exceed the quality gate ceiling of {}; fix them before going idle",
                totals.warnings, max
            )),
            _ => None,
        }
    }
}
