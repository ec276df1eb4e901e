//! Policy layers used by the security handler.

use std::path::Path;

use super::{PolicyContext, PolicyDecision, PolicyLayer};

// ============================================================================
// Blocked tools
// ============================================================================

/// Rejects tools by name, case-insensitively.
pub struct BlockedToolLayer {
    blocked: Vec<String>,
}

impl BlockedToolLayer {
    pub fn new(blocked: Vec<String>) -> Self {
        Self {
            blocked: blocked.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

impl PolicyLayer for BlockedToolLayer {
    fn name(&self) -> &str {
        "blocked_tool"
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision {
        let tool = ctx.tool_name.to_lowercase();
        if self.blocked.contains(&tool) {
            PolicyDecision::Deny(format!("tool '{}' is blocked by policy", ctx.tool_name))
        } else {
            PolicyDecision::Allow
        }
    }
}

// ============================================================================
// Dangerous shell commands
// ============================================================================

/// Rejects shell commands containing a dangerous substring.
pub struct DangerousCommandLayer {
    patterns: Vec<String>,
}

impl DangerousCommandLayer {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }
}

impl PolicyLayer for DangerousCommandLayer {
    fn name(&self) -> &str {
        "dangerous_command"
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision {
        let Some(command) = ctx.shell_command() else {
            return PolicyDecision::Allow;
        };
        let command = command.to_lowercase();
        match self.patterns.iter().find(|p| command.contains(p.as_str())) {
            Some(pattern) => PolicyDecision::Deny(format!(
                "command blocked: matches dangerous command pattern '{}'",
                pattern
            )),
            None => PolicyDecision::Allow,
        }
    }
}

// ============================================================================
// Protected paths
// ============================================================================

/// Rejects Write/Edit against secrets and VCS internals.
///
/// A pattern matches the file name exactly, a `.suffix` pattern matches any
/// file ending with it, and a pattern with `/` matches the path tail.
pub struct ProtectedPathLayer {
    patterns: Vec<String>,
}

impl ProtectedPathLayer {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    fn matches(&self, path: &str) -> Option<&str> {
        let normalized = path.replace('\\', "/");
        let file_name = Path::new(&normalized)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        self.patterns
            .iter()
            .find(|pattern| {
                if pattern.contains('/') {
                    normalized.ends_with(pattern.as_str())
                } else if pattern.starts_with('.') {
                    file_name == pattern.as_str() || file_name.ends_with(pattern.as_str())
                } else {
                    file_name == pattern.as_str()
                }
            })
            .map(|p| p.as_str())
    }
}

impl PolicyLayer for ProtectedPathLayer {
    fn name(&self) -> &str {
        "protected_path"
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision {
        let Some(target) = ctx.write_target() else {
            return PolicyDecision::Allow;
        };
        match self.matches(target) {
            Some(pattern) => PolicyDecision::Deny(format!(
                "writing to '{}' is blocked: protected file pattern '{}'",
                target, pattern
            )),
            None => PolicyDecision::Allow,
        }
    }
}

// ============================================================================
// Confirmation patterns
// ============================================================================

/// Turns destructive-but-legitimate shell commands into an `ask`.
pub struct AskPatternLayer {
    patterns: Vec<String>,
}

impl AskPatternLayer {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }
}

impl PolicyLayer for AskPatternLayer {
    fn name(&self) -> &str {
        "ask_pattern"
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision {
        let Some(command) = ctx.shell_command() else {
            return PolicyDecision::Allow;
        };
        let command = command.to_lowercase();
        match self.patterns.iter().find(|p| command.contains(p.as_str())) {
            Some(pattern) => {
                PolicyDecision::Ask(format!("command matches '{}', confirm before running", pattern))
            }
            None => PolicyDecision::Allow,
        }
    }
}
