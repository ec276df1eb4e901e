use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use gatehook_runtime::policy::WRITE_TOOLS;
use gatehook_runtime::{DispatchContext, EventType, Handler, HookInput, HookOutput};
use tracing::{debug, info};

use crate::catalog::{ToolCatalog, ToolDescriptor, ToolType};
use crate::eligibility::{Eligibility, FilePolicy};
use crate::runner::{ToolRunResult, ToolRunner};

/// Longest tool error echoed back to the agent
const MAX_ERROR_CHARS: usize = 600;

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// What formatter and linter share: file selection, tool selection, execution
pub struct QualityPipeline {
    pub catalog: Arc<ToolCatalog>,
    pub runner: Arc<ToolRunner>,
    pub policy: FilePolicy,
}

/// A file that passed eligibility and has an installed tool
pub(crate) struct Target {
    pub path: PathBuf,
    pub cwd: PathBuf,
    pub tool: ToolDescriptor,
}

impl QualityPipeline {
    /// Resolve the written file and pick a tool, or `None` to stay silent
    pub(crate) async fn select(&self, input: &HookInput, tool_type: ToolType) -> Option<Target> {
        let raw = input.file_path()?;
        let path = resolve_path(raw, &input.cwd);

        let root = input.resolve_project_dir();
        if let Eligibility::Skip(reason) = self.policy.check(&path, root.as_deref()).await {
            debug!(path = %path.display(), %reason, "Skipping file");
            return None;
        }

        let Some(tool) = self.catalog.first_available(&path, tool_type) else {
            debug!(path = %path.display(), %tool_type, "No installed tool");
            return None;
        };

        let cwd = if input.cwd.is_empty() {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            PathBuf::from(&input.cwd)
        };
        Some(Target { path, cwd, tool })
    }

    pub(crate) async fn run(&self, ctx: &DispatchContext, target: &Target) -> ToolRunResult {
        self.runner
            .run_tool(ctx, &target.tool, &target.path, &target.cwd)
            .await
    }
}

fn resolve_path(raw: &str, cwd: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_relative() && !cwd.is_empty() {
        Path::new(cwd).join(path)
    } else {
        path
    }
}

/// Only Write/Edit style tools produce files worth checking
pub(crate) fn writes_file(input: &HookInput) -> bool {
    WRITE_TOOLS.contains(&input.tool_name.as_str())
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// PostToolUse: format the file the agent just wrote
pub struct FormatterHandler {
    pipeline: Arc<QualityPipeline>,
}

impl FormatterHandler {
    pub fn new(pipeline: Arc<QualityPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Handler for FormatterHandler {
    fn name(&self) -> &str {
        "formatter"
    }

    fn event(&self) -> EventType {
        EventType::PostToolUse
    }

    async fn handle(&self, ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput> {
        if !writes_file(input) {
            return Ok(HookOutput::allow(EventType::PostToolUse));
        }
        let Some(target) = self.pipeline.select(input, ToolType::Formatter).await else {
            return Ok(HookOutput::suppressed(EventType::PostToolUse));
        };

        let result = self.pipeline.run(ctx, &target).await;
        let file = display_name(&target.path);

        let out = if !result.success {
            let error = result.error.as_deref().unwrap_or("unknown error");
            HookOutput::allow(EventType::PostToolUse).with_context(format!(
                "Warning: formatter {} failed on {}: {}",
                result.tool,
                file,
                truncate(error, MAX_ERROR_CHARS)
            ))
        } else if result.file_modified {
            info!(file = %target.path.display(), tool = %result.tool, "File auto-formatted");
            HookOutput::allow(EventType::PostToolUse)
                .with_context(format!("Auto-formatted {} with {}", file, result.tool))
        } else {
            HookOutput::suppressed(EventType::PostToolUse)
        };
        Ok(out)
    }
}
