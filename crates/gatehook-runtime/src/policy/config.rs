//! Configuration for the PreToolUse security policy.

use serde::{Deserialize, Serialize};

/// Patterns rejected in shell commands unless overridden in config
pub const BUILTIN_DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf /",
    "rm -rf /*",
    "rm -rf ~",
    "rm -fr /",
    ":(){ :|:& };:",
    "mkfs",
    "> /dev/sd",
    "> /dev/nvme",
    "dd if=/dev/zero of=/dev/",
    "dd if=/dev/random of=/dev/",
    "chmod -R 777 /",
    "> /dev/mem",
];

/// Shell patterns that need user confirmation rather than a hard deny
pub const BUILTIN_ASK_PATTERNS: &[&str] = &[
    "git push --force",
    "git push -f",
    "git reset --hard",
    "git clean -fd",
];

/// File names or suffixes writing tools may not touch
pub const BUILTIN_PROTECTED_PATHS: &[&str] = &[
    ".env",
    ".env.local",
    ".env.production",
    "id_rsa",
    "id_ed25519",
    ".pem",
    ".key",
    ".git/config",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityPolicyConfig {
    /// Master switch: if false, no policy is installed and everything is allowed
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tool names rejected outright (case-insensitive)
    #[serde(default)]
    pub blocked_tools: Vec<String>,

    /// Substrings rejected in shell commands (case-insensitive)
    #[serde(default = "default_dangerous_patterns")]
    pub dangerous_patterns: Vec<String>,

    /// Substrings that turn a shell command into an `ask`
    #[serde(default = "default_ask_patterns")]
    pub ask_patterns: Vec<String>,

    /// Path suffixes that Write/Edit may not target
    #[serde(default = "default_protected_paths")]
    pub protected_paths: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_dangerous_patterns() -> Vec<String> {
    to_strings(BUILTIN_DANGEROUS_PATTERNS)
}

fn default_ask_patterns() -> Vec<String> {
    to_strings(BUILTIN_ASK_PATTERNS)
}

fn default_protected_paths() -> Vec<String> {
    to_strings(BUILTIN_PROTECTED_PATHS)
}

impl Default for SecurityPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            blocked_tools: vec![],
            dangerous_patterns: default_dangerous_patterns(),
            ask_patterns: default_ask_patterns(),
            protected_paths: default_protected_paths(),
        }
    }
}
