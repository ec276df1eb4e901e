use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use gatehook_runtime::{
    run_hook, AuditHandler, DispatchContext, DispatchError, EventType, Handler, HandlerRegistry,
    HookInput, HookOutput, SecurityHandler, TaskCompletedGate,
};
use serde_json::{json, Value};

struct Fixed {
    name: &'static str,
    event: EventType,
    block: Option<&'static str>,
    called: AtomicBool,
}

impl Fixed {
    fn allow(name: &'static str, event: EventType) -> Arc<Self> {
        Arc::new(Self {
            name,
            event,
            block: None,
            called: AtomicBool::new(false),
        })
    }

    fn block(name: &'static str, event: EventType, reason: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            event,
            block: Some(reason),
            called: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Handler for Fixed {
    fn name(&self) -> &str {
        self.name
    }

    fn event(&self) -> EventType {
        self.event
    }

    async fn handle(&self, _ctx: &DispatchContext, _input: &HookInput) -> Result<HookOutput> {
        self.called.store(true, Ordering::SeqCst);
        Ok(match self.block {
            Some(reason) => HookOutput::deny(self.event, reason),
            None => HookOutput::allow(self.event),
        })
    }
}

struct Sleeper(Duration);

#[async_trait]
impl Handler for Sleeper {
    fn name(&self) -> &str {
        "sleeper"
    }

    fn event(&self) -> EventType {
        EventType::Stop
    }

    async fn handle(&self, _ctx: &DispatchContext, _input: &HookInput) -> Result<HookOutput> {
        tokio::time::sleep(self.0).await;
        Ok(HookOutput::allow(EventType::Stop))
    }
}

async fn run(registry: &HandlerRegistry, event: EventType, input: Value) -> (i32, Value) {
    let bytes = serde_json::to_vec(&input).unwrap();
    let mut reader: &[u8] = &bytes;
    let mut out = Vec::new();
    let code = run_hook(registry, event, &mut reader, &mut out).await.unwrap();
    (code, serde_json::from_slice(&out).unwrap())
}

#[tokio::test]
async fn test_dangerous_bash_command_denied_end_to_end() {
    let registry = HandlerRegistry::new();
    registry.register(Arc::new(AuditHandler::new(EventType::PreToolUse)));
    registry.register(Arc::new(SecurityHandler::with_defaults()));

    let (code, out) = run(
        &registry,
        EventType::PreToolUse,
        json!({
            "session_id": "s1",
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "rm -rf /"}
        }),
    )
    .await;

    assert_eq!(code, 2);
    let specific = &out["hookSpecificOutput"];
    assert_eq!(specific["hookEventName"], "PreToolUse");
    assert_eq!(specific["permissionDecision"], "deny");
    assert!(specific["permissionDecisionReason"]
        .as_str()
        .unwrap()
        .contains("dangerous command pattern"));
}

#[tokio::test]
async fn test_safe_bash_command_allowed() {
    let registry = HandlerRegistry::new();
    registry.register(Arc::new(SecurityHandler::with_defaults()));

    let (code, out) = run(
        &registry,
        EventType::PreToolUse,
        json!({"tool_name": "Bash", "tool_input": {"command": "cargo fmt --check"}}),
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(out["hookSpecificOutput"]["permissionDecision"], "allow");
}

#[tokio::test]
async fn test_blocking_handler_short_circuits_chain() {
    let registry = HandlerRegistry::new();
    let first = Fixed::allow("first", EventType::PreToolUse);
    let blocker = Fixed::block("blocker", EventType::PreToolUse, "x");
    let third = Fixed::allow("third", EventType::PreToolUse);
    registry.register(first.clone());
    registry.register(blocker.clone());
    registry.register(third.clone());

    let out = registry
        .dispatch(
            &DispatchContext::background(),
            EventType::PreToolUse,
            &HookInput::default(),
        )
        .await
        .unwrap();

    assert!(out.is_blocking());
    assert_eq!(out.reason(), Some("x"));
    assert!(first.called.load(Ordering::SeqCst));
    assert!(blocker.called.load(Ordering::SeqCst));
    assert!(!third.called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_unregistered_events_use_protocol_defaults() {
    let registry = HandlerRegistry::new();

    let (code, stop) = run(&registry, EventType::Stop, json!({})).await;
    assert_eq!(code, 0);
    assert_eq!(stop, json!({}));

    let (code, pre) = run(&registry, EventType::PreToolUse, json!({})).await;
    assert_eq!(code, 0);
    assert_eq!(pre["hookSpecificOutput"]["hookEventName"], "PreToolUse");
    assert_eq!(pre["hookSpecificOutput"]["permissionDecision"], "allow");
}

#[tokio::test]
async fn test_slow_handler_times_out() {
    let registry = HandlerRegistry::with_timeout(Duration::from_millis(50));
    registry.register(Arc::new(Sleeper(Duration::from_secs(5))));

    let err = registry
        .dispatch(
            &DispatchContext::background(),
            EventType::Stop,
            &HookInput::default(),
        )
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(err, DispatchError::Timeout { handler_index: 0, .. }));
}

#[tokio::test]
async fn test_task_completed_without_spec_document_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let registry = HandlerRegistry::new();
    registry.register(Arc::new(TaskCompletedGate::new().unwrap()));

    let (code, out) = run(
        &registry,
        EventType::TaskCompleted,
        json!({
            "hook_event_name": "TaskCompleted",
            "project_dir": dir.path().display().to_string(),
            "team_name": "core",
            "task_id": "7",
            "task_subject": "Implement SPEC-AUTH-001 login flow"
        }),
    )
    .await;

    assert_eq!(code, 2);
    assert_eq!(out, json!({}));

    let spec = dir.path().join(".gatehook/specs/SPEC-AUTH-001/spec.md");
    std::fs::create_dir_all(spec.parent().unwrap()).unwrap();
    std::fs::write(&spec, "# Auth").unwrap();

    let (code, _) = run(
        &registry,
        EventType::TaskCompleted,
        json!({
            "project_dir": dir.path().display().to_string(),
            "team_name": "core",
            "task_subject": "Implement SPEC-AUTH-001 login flow"
        }),
    )
    .await;
    assert_eq!(code, 0);
}
