use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use super::spec_document_path;
use crate::hooks::{DispatchContext, EventType, Handler, HookInput, HookOutput};

/// Spec identifiers look like `SPEC-AUTH-001`
pub const SPEC_ID_PATTERN: &str = r"SPEC-[A-Z][A-Z0-9]*-\d{3}";

/// Rejects completion of a task whose subject names a spec with no document on disk
pub struct TaskCompletedGate {
    spec_id: Regex,
}

impl TaskCompletedGate {
    pub fn new() -> Result<Self> {
        Self::with_pattern(SPEC_ID_PATTERN)
    }

    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let spec_id = Regex::new(pattern).context("Invalid spec id pattern")?;
        Ok(Self { spec_id })
    }

    /// First spec identifier in a task subject
    pub fn extract_spec_id<'a>(&self, subject: &'a str) -> Option<&'a str> {
        self.spec_id.find(subject).map(|m| m.as_str())
    }
}

#[async_trait]
impl Handler for TaskCompletedGate {
    fn name(&self) -> &str {
        "task_completed_gate"
    }

    fn event(&self) -> EventType {
        EventType::TaskCompleted
    }

    async fn handle(&self, _ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput> {
        let accept = HookOutput::allow(EventType::TaskCompleted);
        if !input.is_team_mode() {
            return Ok(accept);
        }

        let Some(project) = input.resolve_project_dir() else {
            debug!("No project directory, skipping spec check");
            return Ok(accept);
        };
        let Some(spec_id) = input
            .task_subject
            .as_deref()
            .and_then(|s| self.extract_spec_id(s))
        else {
            return Ok(accept);
        };

        let doc = spec_document_path(&project, spec_id);
        match tokio::fs::try_exists(&doc).await {
            Ok(true) => {
                info!(spec = spec_id, task = ?input.task_id, "Task completion accepted");
                Ok(accept)
            }
            Ok(false) => Ok(HookOutput::deny(
                EventType::TaskCompleted,
                format!(
                    "Task references {} but no spec document exists at {}",
                    spec_id,
                    doc.display()
                ),
            )),
            Err(e) => {
                warn!(path = %doc.display(), error = %e, "Cannot check spec document, accepting");
                Ok(accept)
            }
        }
    }
}
