//! SessionStart report of which quality tools the project can use.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use gatehook_runtime::{DispatchContext, EventType, Handler, HookInput, HookOutput};
use tracing::{debug, warn};

use crate::catalog::{Language, ToolCatalog, ToolType};

/// Marker file -> languages it implies
const PROJECT_MARKERS: &[(&str, &[Language])] = &[
    ("Cargo.toml", &[Language::Rust]),
    ("go.mod", &[Language::Go]),
    ("pyproject.toml", &[Language::Python]),
    ("requirements.txt", &[Language::Python]),
    ("setup.py", &[Language::Python]),
    ("package.json", &[Language::JavaScript]),
    ("tsconfig.json", &[Language::TypeScript]),
    ("pom.xml", &[Language::Java]),
    ("build.gradle", &[Language::Java]),
    ("build.gradle.kts", &[Language::Kotlin]),
    ("Package.swift", &[Language::Swift]),
    ("CMakeLists.txt", &[Language::Cpp]),
    ("Gemfile", &[Language::Ruby]),
    ("composer.json", &[Language::Php]),
    ("mix.exs", &[Language::Elixir]),
    ("build.sbt", &[Language::Scala]),
    ("DESCRIPTION", &[Language::R]),
    ("pubspec.yaml", &[Language::Dart]),
    (".stylua.toml", &[Language::Lua]),
];

/// Languages whose marker files exist directly under `project`
pub fn detect_languages(project: &Path) -> Vec<Language> {
    let mut langs: Vec<Language> = PROJECT_MARKERS
        .iter()
        .filter(|(marker, _)| project.join(marker).is_file())
        .flat_map(|(_, langs)| langs.iter().copied())
        .collect();
    langs.sort();
    langs.dedup();
    langs
}

/// One line per language: installed formatter and linter, or what is missing
pub fn describe_tools(catalog: &ToolCatalog, languages: &[Language]) -> Vec<String> {
    languages
        .iter()
        .map(|&lang| {
            let parts: Vec<String> = [ToolType::Formatter, ToolType::Linter]
                .into_iter()
                .map(|tool_type| {
                    let found = catalog
                        .get_tools_for_language(lang, tool_type)
                        .into_iter()
                        .find(|t| catalog.is_available(t));
                    match found {
                        Some(tool) => format!("{} {}", tool_type, tool.name),
                        None => format!("no {}", tool_type),
                    }
                })
                .collect();
            format!("{}: {}", lang, parts.join(", "))
        })
        .collect()
}

/// Probes tool availability at session start under its own deadline,
/// so a slow `PATH` never holds up the session.
pub struct ToolInventoryHandler {
    catalog: Arc<ToolCatalog>,
    timeout: Duration,
}

impl ToolInventoryHandler {
    pub fn new(catalog: Arc<ToolCatalog>, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }
}

#[async_trait]
impl Handler for ToolInventoryHandler {
    fn name(&self) -> &str {
        "tool_inventory"
    }

    fn event(&self) -> EventType {
        EventType::SessionStart
    }

    async fn handle(&self, _ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput> {
        let default = HookOutput::default_for(EventType::SessionStart);
        let Some(project) = input.resolve_project_dir() else {
            return Ok(default);
        };

        let probe_ctx = DispatchContext::detached(self.timeout);
        let catalog = self.catalog.clone();
        let probe = tokio::task::spawn_blocking(move || {
            let languages = detect_languages(&project);
            describe_tools(&catalog, &languages)
        });

        let lines = tokio::select! {
            joined = probe => match joined {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(error = %e, "Tool inventory task failed");
                    return Ok(default);
                }
            },
            _ = probe_ctx.cancelled() => {
                debug!(timeout_ms = self.timeout.as_millis() as u64, "Tool inventory timed out");
                return Ok(default);
            }
        };

        if lines.is_empty() {
            return Ok(default);
        }
        Ok(default.with_context(format!("Quality tools for this project:\n{}", lines.join("\n"))))
    }
}
