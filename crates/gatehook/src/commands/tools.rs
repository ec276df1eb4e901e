use crate::config::Config;
use anyhow::Result;
use gatehook_quality::{build_catalog, Eligibility, FilePolicy, ToolCatalog, ToolType};
use std::fmt::Write as _;
use std::path::Path;

/// Human-readable tool report for one file
pub fn describe(
    catalog: &ToolCatalog,
    policy: &FilePolicy,
    file: &Path,
    root: Option<&Path>,
) -> String {
    let mut out = String::new();
    let Some(lang) = catalog.language_for_file(file) else {
        let _ = writeln!(out, "{}: no language detected", file.display());
        return out;
    };
    let _ = writeln!(out, "{}: {}", file.display(), lang);
    if let Eligibility::Skip(reason) = policy.check_path(file, root) {
        let _ = writeln!(out, "  skipped: {}", reason);
    }

    for tool_type in ToolType::ALL {
        let tools = catalog.get_tools_for_file(file, tool_type);
        if tools.is_empty() {
            let _ = writeln!(out, "  {}: none", tool_type);
            continue;
        }
        let listed: Vec<String> = tools
            .iter()
            .map(|t| {
                let state = if catalog.is_available(t) { "installed" } else { "missing" };
                format!("{} ({})", t.name, state)
            })
            .collect();
        let _ = writeln!(out, "  {}: {}", tool_type, listed.join(", "));
    }
    out
}

pub fn execute(file: &Path, config: &Config) -> Result<()> {
    let catalog = build_catalog(&config.quality)?;
    let policy = FilePolicy::new(
        &config.quality.extra_skip_extensions,
        &config.quality.extra_skip_dirs,
    );
    let root = crate::config::project_dir();
    print!("{}", describe(&catalog, &policy, file, root.as_deref()));
    Ok(())
}
