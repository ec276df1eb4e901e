use anyhow::Result;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# gatehook configuration

[dispatch]
timeout_secs = 30

[security]
enabled = true
blocked_tools = []
# dangerous_patterns, ask_patterns and protected_paths default to the builtin lists

[quality]
formatter_enabled = true
linter_enabled = true
tool_timeout_secs = 30
hash_ttl_secs = 300
max_issues = 20
summary_issues = 5
extra_skip_dirs = []
extra_skip_extensions = []
inventory_timeout_ms = 2000

# Extra tools per language, tried after builtins of equal priority
# [[quality.tools.python]]
# name = "yapf"
# command = "yapf"
# args = ["-i"]
# tool_type = "formatter"
# priority = 4

[team]
enabled = true
"#;

/// Initialize a new config file
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gatehook/config.toml");
        run_init(&path).unwrap();

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.dispatch.timeout_secs, 30);
        assert!(config.security.enabled);
        assert!(config.quality.tools.is_empty());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        assert!(run_init(&path).is_err());
    }
}
