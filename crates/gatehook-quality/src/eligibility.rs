//! Which files the formatter and linter are allowed to touch.

use std::collections::HashSet;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::catalog::Language;

/// Bytes sampled for the binary probe
const PROBE_LEN: usize = 8192;

const SKIP_EXTENSIONS: &[&str] = &[
    // lockfiles
    "lock", "sum",
    // binaries and objects
    "exe", "dll", "so", "dylib", "bin", "o", "a", "obj", "class", "jar", "pyc", "pyo", "wasm",
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "svg",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // archives and media
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "pdf", "mp3", "mp4", "mov",
];

const SKIP_FILE_NAMES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "Cargo.lock",
    "poetry.lock",
    "Gemfile.lock",
    "composer.lock",
    "go.sum",
];

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "vendor",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".ruff_cache",
    ".pytest_cache",
    ".next",
    ".gradle",
    ".dart_tool",
];

const MINIFIED_MARKERS: &[&str] = &[".min.", "-min."];

/// Verdict for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible(Language),
    Skip(String),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible(_))
    }
}

/// Denylists shared by the formatter and linter
#[derive(Debug, Clone)]
pub struct FilePolicy {
    skip_extensions: HashSet<String>,
    skip_dirs: HashSet<String>,
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl FilePolicy {
    /// Builtin denylists extended with user entries
    pub fn new(extra_extensions: &[String], extra_dirs: &[String]) -> Self {
        let skip_extensions = SKIP_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .chain(
                extra_extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_lowercase()),
            )
            .collect();
        let skip_dirs = SKIP_DIRS
            .iter()
            .map(|d| d.to_string())
            .chain(extra_dirs.iter().cloned())
            .collect();
        Self {
            skip_extensions,
            skip_dirs,
        }
    }

    /// Path-only checks: extension, lockfile name, minified marker, directory.
    ///
    /// Only directories below `root` are matched against the denylist, so a
    /// project checked out under e.g. `~/build/` is still eligible.
    pub fn check_path(&self, path: &Path, root: Option<&Path>) -> Eligibility {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if self.skip_extensions.contains(&ext.to_lowercase()) {
                return Eligibility::Skip(format!("extension .{ext} is excluded"));
            }
        }
        if SKIP_FILE_NAMES.contains(&file_name) {
            return Eligibility::Skip(format!("{file_name} is a lockfile"));
        }
        if MINIFIED_MARKERS.iter().any(|m| file_name.contains(m)) {
            return Eligibility::Skip(format!("{file_name} is minified"));
        }
        let relative = root
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        let excluded_dir = relative.components().find_map(|c| match c {
            Component::Normal(part) => part
                .to_str()
                .filter(|p| self.skip_dirs.contains(*p)),
            _ => None,
        });
        if let Some(dir) = excluded_dir {
            return Eligibility::Skip(format!("inside excluded directory {dir}"));
        }
        match Language::from_path(path) {
            Some(lang) => Eligibility::Eligible(lang),
            None => Eligibility::Skip(format!("no language detected for {file_name}")),
        }
    }

    /// Full check, including existence and the binary probe
    pub async fn check(&self, path: &Path, root: Option<&Path>) -> Eligibility {
        let verdict = self.check_path(path, root);
        if !verdict.is_eligible() {
            return verdict;
        }
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Eligibility::Skip("not a regular file".into()),
            Err(_) => return Eligibility::Skip("file does not exist".into()),
        }
        match is_text_file(path).await {
            Ok(true) => verdict,
            Ok(false) => Eligibility::Skip("binary content".into()),
            Err(e) => Eligibility::Skip(format!("unreadable: {e}")),
        }
    }
}

/// No null bytes in the first 8KB
pub async fn is_text_file(path: &Path) -> Result<bool> {
    let mut file = tokio::fs::File::open(path)
        .await
        .context("Failed to open file for binary check")?;
    let mut buf = vec![0u8; PROBE_LEN];
    let n = file
        .read(&mut buf)
        .await
        .context("Failed to read file for binary check")?;
    Ok(!buf[..n].contains(&0))
}
