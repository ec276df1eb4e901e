pub mod catalog;
pub mod change;
pub mod config;
pub mod eligibility;
pub mod formatter;
pub mod inventory;
pub mod issues;
pub mod linter;
pub mod runner;

pub use catalog::{FileArgMode, Language, PathLocator, ToolCatalog, ToolDescriptor, ToolLocator, ToolType};
pub use change::ChangeDetector;
pub use config::QualityConfig;
pub use eligibility::{Eligibility, FilePolicy};
pub use formatter::{FormatterHandler, QualityPipeline};
pub use inventory::ToolInventoryHandler;
pub use issues::{LintIssue, Severity};
pub use linter::LinterHandler;
pub use runner::{ToolRunResult, ToolRunner};

use anyhow::Result;
use gatehook_runtime::HandlerRegistry;
use std::sync::Arc;

/// Builtin tool table merged with configured extras, looked up on `PATH`.
pub fn build_catalog(config: &QualityConfig) -> Result<Arc<ToolCatalog>> {
    Ok(Arc::new(ToolCatalog::with_extra(config.tools.clone())?))
}

/// Shared file policy, hash cache and runner for the PostToolUse handlers.
pub fn build_pipeline(config: &QualityConfig, catalog: Arc<ToolCatalog>) -> Arc<QualityPipeline> {
    let detector = Arc::new(ChangeDetector::new(config.hash_ttl()));
    Arc::new(QualityPipeline {
        catalog,
        runner: Arc::new(ToolRunner::new(detector, config.tool_timeout())),
        policy: FilePolicy::new(&config.extra_skip_extensions, &config.extra_skip_dirs),
    })
}

/// Register formatter, linter (in that order) and the session tool inventory.
pub fn register_quality_handlers(
    registry: &HandlerRegistry,
    config: &QualityConfig,
    catalog: Arc<ToolCatalog>,
) {
    let pipeline = build_pipeline(config, catalog.clone());
    if config.formatter_enabled {
        registry.register(Arc::new(FormatterHandler::new(pipeline.clone())));
    }
    if config.linter_enabled {
        registry.register(Arc::new(LinterHandler::new(
            pipeline,
            config.max_issues,
            config.summary_issues,
        )));
    }
    registry.register(Arc::new(ToolInventoryHandler::new(
        catalog,
        config.inventory_timeout(),
    )));
}
