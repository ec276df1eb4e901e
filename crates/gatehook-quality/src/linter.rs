use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use gatehook_runtime::{DispatchContext, EventType, Handler, HookInput, HookOutput};
use tracing::info;

use crate::catalog::ToolType;
use crate::formatter::{display_name, truncate, writes_file, QualityPipeline};
use crate::issues::{parse_issues, summarize};

const MAX_ERROR_CHARS: usize = 600;

/// PostToolUse: lint the file the agent just wrote and feed issues back as context
pub struct LinterHandler {
    pipeline: Arc<QualityPipeline>,
    max_issues: usize,
    summary_issues: usize,
}

impl LinterHandler {
    pub fn new(pipeline: Arc<QualityPipeline>, max_issues: usize, summary_issues: usize) -> Self {
        Self {
            pipeline,
            max_issues,
            summary_issues,
        }
    }
}

#[async_trait]
impl Handler for LinterHandler {
    fn name(&self) -> &str {
        "linter"
    }

    fn event(&self) -> EventType {
        EventType::PostToolUse
    }

    async fn handle(&self, ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput> {
        if !writes_file(input) {
            return Ok(HookOutput::allow(EventType::PostToolUse));
        }
        let Some(target) = self.pipeline.select(input, ToolType::Linter).await else {
            return Ok(HookOutput::suppressed(EventType::PostToolUse));
        };

        let result = self.pipeline.run(ctx, &target).await;
        let file = display_name(&target.path);
        let issues = parse_issues(&result.combined_output(), self.max_issues);

        let mut notes = Vec::new();
        if result.file_modified {
            info!(file = %target.path.display(), tool = %result.tool, fixed = result.issues_fixed, "Lint fixes applied");
            notes.push(match result.issues_fixed {
                0 => format!("Auto-fixed lint issues in {} with {}", file, result.tool),
                n => format!("Auto-fixed {} lint issue(s) in {} with {}", n, file, result.tool),
            });
        }

        if result.issues_found > 0 {
            notes.push(summarize(
                &result.tool,
                &file,
                &issues,
                result.issues_found,
                self.summary_issues,
            ));
        } else if !result.success {
            let error = result.error.as_deref().unwrap_or("unknown error");
            notes.push(format!(
                "Warning: linter {} failed on {}: {}",
                result.tool,
                file,
                truncate(error, MAX_ERROR_CHARS)
            ));
        }

        if notes.is_empty() {
            return Ok(HookOutput::suppressed(EventType::PostToolUse));
        }
        Ok(HookOutput::allow(EventType::PostToolUse).with_context(notes.join("\n")))
    }
}
