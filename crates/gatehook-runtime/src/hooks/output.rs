use serde::ser::{Serialize, Serializer};
use serde::Serialize as DeriveSerialize;

use super::events::{EventType, ResponseShape};

/// Outcome of a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Decision {
    Allow,
    Ask,
    Deny,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Ask => "ask",
            Decision::Deny => "deny",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    /// Serialises to `{}`
    Empty,
    Permission {
        decision: Decision,
        reason: Option<String>,
        context: Option<String>,
        suppress: bool,
    },
    Session {
        proceed: bool,
        message: Option<String>,
    },
    /// Stop-family verdict: `{}` on stdout, exit code 2 on reject
    Verdict { accept: bool, reason: Option<String> },
}

/// Response for one dispatch.
///
/// The body is always built from the event's [`ResponseShape`], so a handler
/// cannot produce a PreToolUse payload for a Stop event or vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct HookOutput {
    event: EventType,
    body: Body,
}

impl HookOutput {
    /// What the host expects when nothing had anything to say
    pub fn default_for(event: EventType) -> Self {
        let body = match event {
            EventType::PreToolUse | EventType::PostToolUse => Body::Permission {
                decision: Decision::Allow,
                reason: None,
                context: None,
                suppress: false,
            },
            EventType::SessionStart => Body::Session {
                proceed: true,
                message: None,
            },
            _ => Body::Empty,
        };
        Self { event, body }
    }

    pub fn allow(event: EventType) -> Self {
        Self::default_for(event)
    }

    /// Blocking decision with a required reason
    pub fn deny(event: EventType, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let body = match event.shape() {
            ResponseShape::Permission => Body::Permission {
                decision: Decision::Deny,
                reason: Some(reason),
                context: None,
                suppress: false,
            },
            ResponseShape::Session => Body::Session {
                proceed: false,
                message: Some(reason),
            },
            ResponseShape::ExitCode => Body::Verdict {
                accept: false,
                reason: Some(reason),
            },
        };
        Self { event, body }
    }

    /// Ask the user to confirm. Only tool events can ask; other events allow.
    pub fn ask(event: EventType, reason: impl Into<String>) -> Self {
        match event.shape() {
            ResponseShape::Permission => Self {
                event,
                body: Body::Permission {
                    decision: Decision::Ask,
                    reason: Some(reason.into()),
                    context: None,
                    suppress: false,
                },
            },
            _ => Self::default_for(event),
        }
    }

    /// Allow, and ask the host to hide this hook's output from the transcript
    pub fn suppressed(event: EventType) -> Self {
        let mut out = Self::default_for(event);
        if let Body::Permission { suppress, .. } = &mut out.body {
            *suppress = true;
        }
        out
    }

    /// Attach advisory text: `additionalContext` for tool events,
    /// `systemMessage` for session events, ignored for exit-code events.
    pub fn with_context(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if self.body == Body::Empty && self.event.shape() == ResponseShape::Session {
            self.body = Body::Session {
                proceed: true,
                message: None,
            };
        }
        match &mut self.body {
            Body::Permission {
                context, suppress, ..
            } => {
                *context = Some(text);
                *suppress = false;
            }
            Body::Session { message, .. } => *message = Some(text),
            Body::Empty | Body::Verdict { .. } => {}
        }
        self
    }

    pub fn event(&self) -> EventType {
        self.event
    }

    pub fn decision(&self) -> Decision {
        match &self.body {
            Body::Empty => Decision::Allow,
            Body::Permission { decision, .. } => *decision,
            Body::Session { proceed, .. } | Body::Verdict { accept: proceed, .. } => {
                if *proceed {
                    Decision::Allow
                } else {
                    Decision::Deny
                }
            }
        }
    }

    /// Stops the chain and, at the process boundary, exits with code 2
    pub fn is_blocking(&self) -> bool {
        self.decision() == Decision::Deny
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.body {
            Body::Permission { reason, .. } | Body::Verdict { reason, .. } => reason.as_deref(),
            Body::Session { proceed: false, message } => message.as_deref(),
            _ => None,
        }
    }

    /// `additionalContext` or `systemMessage`, whichever the shape carries
    pub fn context(&self) -> Option<&str> {
        match &self.body {
            Body::Permission { context, .. } => context.as_deref(),
            Body::Session { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self.body, Body::Permission { suppress: true, .. })
    }

    /// Process exit code: 2 exactly when the decision rejects
    pub fn exit_code(&self) -> i32 {
        if self.is_blocking() {
            2
        } else {
            0
        }
    }

    /// Fold a later non-blocking output into this one.
    /// Contexts concatenate in order, `ask` outranks `allow`, output stays
    /// suppressed only if both sides were.
    pub fn merge(self, other: HookOutput) -> HookOutput {
        let event = self.event;
        let body = match (self.body, other.body) {
            (Body::Empty, b) | (b, Body::Empty) => b,
            (
                Body::Permission {
                    decision: d1,
                    reason: r1,
                    context: c1,
                    suppress: s1,
                },
                Body::Permission {
                    decision: d2,
                    reason: r2,
                    context: c2,
                    suppress: s2,
                },
            ) => {
                let (decision, reason) = if d2 > d1 { (d2, r2) } else { (d1, r1.or(r2)) };
                Body::Permission {
                    decision,
                    reason,
                    context: join_text(c1, c2),
                    suppress: s1 && s2,
                }
            }
            (
                Body::Session {
                    proceed: p1,
                    message: m1,
                },
                Body::Session {
                    proceed: p2,
                    message: m2,
                },
            ) => Body::Session {
                proceed: p1 && p2,
                message: join_text(m1, m2),
            },
            (a, _) => a,
        };
        HookOutput { event, body }
    }
}

fn join_text(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(format!("{a}\n\n{b}")),
        (a, b) => a.or(b),
    }
}

#[derive(DeriveSerialize)]
struct WireOutput<'a> {
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    proceed: Option<bool>,
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    system_message: Option<&'a str>,
    #[serde(rename = "suppressOutput", skip_serializing_if = "Option::is_none")]
    suppress_output: Option<bool>,
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    hook_specific_output: Option<WireSpecific<'a>>,
}

#[derive(DeriveSerialize)]
struct WireSpecific<'a> {
    #[serde(rename = "hookEventName")]
    hook_event_name: &'a str,
    #[serde(rename = "permissionDecision")]
    permission_decision: &'a str,
    #[serde(rename = "permissionDecisionReason", skip_serializing_if = "Option::is_none")]
    permission_decision_reason: Option<&'a str>,
    #[serde(rename = "additionalContext", skip_serializing_if = "Option::is_none")]
    additional_context: Option<&'a str>,
}

impl Serialize for HookOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut wire = WireOutput {
            proceed: None,
            system_message: None,
            suppress_output: None,
            hook_specific_output: None,
        };
        match &self.body {
            Body::Empty | Body::Verdict { .. } => {}
            Body::Permission {
                decision,
                reason,
                context,
                suppress,
            } => {
                wire.suppress_output = suppress.then_some(true);
                wire.hook_specific_output = Some(WireSpecific {
                    hook_event_name: self.event.as_str(),
                    permission_decision: decision.as_str(),
                    permission_decision_reason: reason.as_deref(),
                    additional_context: context.as_deref(),
                });
            }
            Body::Session { proceed, message } => {
                wire.proceed = Some(*proceed);
                wire.system_message = message.as_deref();
            }
        }
        wire.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_shapes_per_event() {
        let pre = serde_json::to_value(HookOutput::default_for(EventType::PreToolUse)).unwrap();
        assert_eq!(
            pre,
            json!({"hookSpecificOutput": {"hookEventName": "PreToolUse", "permissionDecision": "allow"}})
        );

        let start = serde_json::to_value(HookOutput::default_for(EventType::SessionStart)).unwrap();
        assert_eq!(start, json!({"continue": true}));

        for event in [
            EventType::Stop,
            EventType::SessionEnd,
            EventType::TaskCompleted,
            EventType::TeammateIdle,
        ] {
            let v = serde_json::to_value(HookOutput::default_for(event)).unwrap();
            assert_eq!(v, json!({}), "{event} default must be empty");
        }
    }

    #[test]
    fn test_deny_on_exit_code_event_serialises_empty() {
        let out = HookOutput::deny(EventType::TaskCompleted, "spec missing");
        assert_eq!(serde_json::to_value(&out).unwrap(), json!({}));
        assert!(out.is_blocking());
        assert_eq!(out.exit_code(), 2);
        assert_eq!(out.reason(), Some("spec missing"));
    }

    #[test]
    fn test_deny_tool_use_carries_reason() {
        let out = HookOutput::deny(EventType::PreToolUse, "nope");
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["hookSpecificOutput"]["permissionDecision"], "deny");
        assert_eq!(v["hookSpecificOutput"]["permissionDecisionReason"], "nope");
        assert_eq!(out.exit_code(), 2);
    }

    #[test]
    fn test_ask_is_not_blocking() {
        let out = HookOutput::ask(EventType::PreToolUse, "confirm force push");
        assert_eq!(out.decision(), Decision::Ask);
        assert!(!out.is_blocking());
        assert_eq!(out.exit_code(), 0);

        // Non-tool events cannot ask
        assert_eq!(
            HookOutput::ask(EventType::Stop, "x").decision(),
            Decision::Allow
        );
    }

    #[test]
    fn test_suppressed_post_tool_use() {
        let v = serde_json::to_value(HookOutput::suppressed(EventType::PostToolUse)).unwrap();
        assert_eq!(v["suppressOutput"], true);
        assert_eq!(v["hookSpecificOutput"]["permissionDecision"], "allow");
    }

    #[test]
    fn test_context_on_session_end_switches_to_session_shape() {
        let out = HookOutput::default_for(EventType::SessionEnd).with_context("bye");
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"continue": true, "systemMessage": "bye"})
        );
    }

    #[test]
    fn test_merge_concatenates_context_and_keeps_ask() {
        let a = HookOutput::allow(EventType::PostToolUse).with_context("formatted");
        let b = HookOutput::suppressed(EventType::PostToolUse);
        let c = HookOutput::ask(EventType::PostToolUse, "check it");
        let merged = a.merge(b).merge(c);
        assert_eq!(merged.decision(), Decision::Ask);
        assert_eq!(merged.reason(), Some("check it"));
        assert_eq!(merged.context(), Some("formatted"));
        assert!(!merged.is_suppressed());

        let merged = HookOutput::allow(EventType::PostToolUse)
            .with_context("one")
            .merge(HookOutput::allow(EventType::PostToolUse).with_context("two"));
        assert_eq!(merged.context(), Some("one\n\ntwo"));
    }

    #[test]
    fn test_merge_suppressed_only_when_all_suppressed() {
        let merged = HookOutput::suppressed(EventType::PostToolUse)
            .merge(HookOutput::suppressed(EventType::PostToolUse));
        assert!(merged.is_suppressed());
    }
}
