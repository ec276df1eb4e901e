use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle events the host agent reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    SessionStart,
    PreToolUse,
    PostToolUse,
    SessionEnd,
    Stop,
    PreCompact,
    TaskCompleted,
    TeammateIdle,
}

/// How the host expects the response for an event to be shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `hookSpecificOutput` with a permission decision
    Permission,
    /// `continue` + `systemMessage`
    Session,
    /// `{}` on stdout, decision carried by the exit code
    ExitCode,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::SessionStart,
        EventType::PreToolUse,
        EventType::PostToolUse,
        EventType::SessionEnd,
        EventType::Stop,
        EventType::PreCompact,
        EventType::TaskCompleted,
        EventType::TeammateIdle,
    ];

    /// Wire name, as sent in `hook_event_name`
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionStart => "SessionStart",
            EventType::PreToolUse => "PreToolUse",
            EventType::PostToolUse => "PostToolUse",
            EventType::SessionEnd => "SessionEnd",
            EventType::Stop => "Stop",
            EventType::PreCompact => "PreCompact",
            EventType::TaskCompleted => "TaskCompleted",
            EventType::TeammateIdle => "TeammateIdle",
        }
    }

    /// CLI subcommand name (kebab-case)
    pub fn subcommand(&self) -> &'static str {
        match self {
            EventType::SessionStart => "session-start",
            EventType::PreToolUse => "pre-tool-use",
            EventType::PostToolUse => "post-tool-use",
            EventType::SessionEnd => "session-end",
            EventType::Stop => "stop",
            EventType::PreCompact => "pre-compact",
            EventType::TaskCompleted => "task-completed",
            EventType::TeammateIdle => "teammate-idle",
        }
    }

    pub fn shape(&self) -> ResponseShape {
        match self {
            EventType::PreToolUse | EventType::PostToolUse => ResponseShape::Permission,
            EventType::SessionStart | EventType::SessionEnd | EventType::PreCompact => {
                ResponseShape::Session
            }
            EventType::Stop | EventType::TaskCompleted | EventType::TeammateIdle => {
                ResponseShape::ExitCode
            }
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = anyhow::Error;

    /// Accepts both the wire name and the subcommand name
    fn from_str(s: &str) -> Result<Self> {
        EventType::ALL
            .into_iter()
            .find(|e| e.as_str() == s || e.subcommand() == s)
            .ok_or_else(|| anyhow!("unknown hook event '{}'", s))
    }
}

/// One hook invocation's input, as read from stdin.
///
/// Payload blobs stay as raw JSON; handlers pick out the fields they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub hook_event_name: String,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<Value>,
    #[serde(default)]
    pub project_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub stop_hook_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<String>,

    // Team mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teammate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_subject: Option<String>,
}

impl HookInput {
    /// String field from `tool_input`, if the payload is an object carrying it
    pub fn tool_input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.as_ref()?.get(key)?.as_str()
    }

    /// Target file of a Write/Edit style tool call
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input_str("file_path")
            .or_else(|| self.tool_input_str("path"))
            .filter(|p| !p.is_empty())
    }

    /// True when the host runs this session as part of a team
    pub fn is_team_mode(&self) -> bool {
        self.team_name.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Project root: explicit field, then `CLAUDE_PROJECT_DIR`, then cwd
    pub fn resolve_project_dir(&self) -> Option<PathBuf> {
        if !self.project_dir.is_empty() {
            return Some(PathBuf::from(&self.project_dir));
        }
        if let Ok(dir) = std::env::var("CLAUDE_PROJECT_DIR") {
            if !dir.is_empty() {
                return Some(PathBuf::from(dir));
            }
        }
        if !self.cwd.is_empty() {
            return Some(PathBuf::from(&self.cwd));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_parse_wire_and_subcommand_names() {
        for event in EventType::ALL {
            assert_eq!(event.as_str().parse::<EventType>().unwrap(), event);
            assert_eq!(event.subcommand().parse::<EventType>().unwrap(), event);
        }
        assert!("UserPromptSubmit".parse::<EventType>().is_err());
    }

    #[test]
    fn test_input_tolerates_missing_fields() {
        let input: HookInput = serde_json::from_value(json!({"session_id": "s1"})).unwrap();
        assert_eq!(input.session_id, "s1");
        assert!(input.tool_input.is_none());
        assert!(!input.is_team_mode());
    }

    #[test]
    fn test_file_path_lookup() {
        let input = HookInput {
            tool_input: Some(json!({"file_path": "/tmp/a.py", "content": "x"})),
            ..Default::default()
        };
        assert_eq!(input.file_path(), Some("/tmp/a.py"));

        let input = HookInput {
            tool_input: Some(json!("not an object")),
            ..Default::default()
        };
        assert_eq!(input.file_path(), None);
    }

    #[test]
    fn test_blank_team_name_is_not_team_mode() {
        let input = HookInput {
            team_name: Some("  ".into()),
            ..Default::default()
        };
        assert!(!input.is_team_mode());
    }

    #[test]
    fn test_project_dir_prefers_explicit_field() {
        let input = HookInput {
            project_dir: "/work/proj".into(),
            cwd: "/elsewhere".into(),
            ..Default::default()
        };
        assert_eq!(input.resolve_project_dir(), Some(PathBuf::from("/work/proj")));
    }
}
