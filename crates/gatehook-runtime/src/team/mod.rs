//! Team-mode gates for TaskCompleted and TeammateIdle.
//!
//! Both gates fail open: anything they cannot read or resolve means accept.

pub mod baseline;
pub mod task_completed;
pub mod teammate_idle;

use std::path::{Path, PathBuf};

pub use baseline::{DiagnosticsBaseline, QualityGate, SeverityTotals};
pub use task_completed::TaskCompletedGate;
pub use teammate_idle::TeammateIdleGate;

/// Project-relative directory holding gatehook state
pub const STATE_DIR: &str = ".gatehook";

/// `<project>/.gatehook/specs/<SPEC-ID>/spec.md`
pub fn spec_document_path(project: &Path, spec_id: &str) -> PathBuf {
    project
        .join(STATE_DIR)
        .join("specs")
        .join(spec_id)
        .join("spec.md")
}

/// `<project>/.gatehook/state/diagnostics-baseline.json`
pub fn baseline_path(project: &Path) -> PathBuf {
    project
        .join(STATE_DIR)
        .join("state")
        .join("diagnostics-baseline.json")
}

/// `<project>/.gatehook/quality.toml`
pub fn quality_gate_path(project: &Path) -> PathBuf {
    project.join(STATE_DIR).join("quality.toml")
}
