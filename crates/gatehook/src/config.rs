use anyhow::{Context, Result};
use gatehook_quality::QualityConfig;
use gatehook_runtime::team::STATE_DIR;
use gatehook_runtime::SecurityPolicyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub security: SecurityPolicyConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub team: TeamConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Budget for the whole handler chain of one event
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TeamConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<project>/.gatehook/config.toml`
pub fn project_config_path(project: &Path) -> PathBuf {
    project.join(STATE_DIR).join("config.toml")
}

/// Project root for config lookup: `CLAUDE_PROJECT_DIR`, else the working directory
pub fn project_dir() -> Option<PathBuf> {
    match std::env::var("CLAUDE_PROJECT_DIR") {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => std::env::current_dir().ok(),
    }
}

/// Load config from `--config`, else the project config file, else defaults
pub fn load_config(path: Option<&Path>, project: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
        return read_config(Path::new(&expanded));
    }
    if let Some(project) = project {
        let candidate = project_config_path(project);
        if candidate.is_file() {
            return read_config(&candidate);
        }
    }
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;
    let config: Config = toml::from_str(&content).context("Failed to parse TOML config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_any_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(None, Some(dir.path())).unwrap();
        assert_eq!(config.dispatch.timeout_secs, 30);
        assert!(config.security.enabled);
        assert!(config.team.enabled);
        assert_eq!(config.quality.hash_ttl_secs, 300);
    }

    #[test]
    fn test_project_config_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_config_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "[dispatch]\ntimeout_secs = 5\n\n[quality]\nlinter_enabled = false\n",
        )
        .unwrap();

        let config = load_config(None, Some(dir.path())).unwrap();
        assert_eq!(config.dispatch.timeout(), Duration::from_secs(5));
        assert!(!config.quality.linter_enabled);
        assert!(config.quality.formatter_enabled);
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("custom.toml");
        fs::write(&explicit, "[security]\nblocked_tools = [\"WebFetch\"]\n").unwrap();

        let config = load_config(Some(&explicit), Some(dir.path())).unwrap();
        assert_eq!(config.security.blocked_tools, vec!["WebFetch"]);
        assert!(!config.security.dangerous_patterns.is_empty());
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml")), None).is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[dispatch\ntimeout_secs = ").unwrap();
        assert!(load_config(Some(&path), None).is_err());
    }
}
