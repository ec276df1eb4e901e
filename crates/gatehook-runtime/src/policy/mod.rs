//! Security policy for PreToolUse: layered checks over the tool name and input.

pub mod config;
pub mod layers;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::hooks::{DispatchContext, EventType, Handler, HookInput, HookOutput};

pub use config::SecurityPolicyConfig;
pub use layers::{AskPatternLayer, BlockedToolLayer, DangerousCommandLayer, ProtectedPathLayer};

/// Tool that executes shell commands
pub const SHELL_TOOL: &str = "Bash";

/// Tools that write a file named by `file_path`
pub const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Result of a single policy layer evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    /// Let the user confirm
    Ask(String),
    Deny(String),
}

/// What a layer sees of the tool call
pub struct PolicyContext<'a> {
    pub tool_name: &'a str,
    pub tool_input: Option<&'a Value>,
}

impl<'a> PolicyContext<'a> {
    pub fn from_input(input: &'a HookInput) -> Self {
        Self {
            tool_name: &input.tool_name,
            tool_input: input.tool_input.as_ref(),
        }
    }

    /// Shell command string, only for the shell tool with a well-formed input
    pub fn shell_command(&self) -> Option<&'a str> {
        if self.tool_name != SHELL_TOOL {
            return None;
        }
        self.tool_input?.get("command")?.as_str()
    }

    /// Target path of a file-writing tool
    pub fn write_target(&self) -> Option<&'a str> {
        if !WRITE_TOOLS.contains(&self.tool_name) {
            return None;
        }
        let input = self.tool_input?;
        input
            .get("file_path")
            .or_else(|| input.get("path"))?
            .as_str()
    }
}

/// Individual policy layer.
/// Layers never fail: unparseable input means there is nothing to check.
pub trait PolicyLayer: Send + Sync {
    /// Layer name for logging
    fn name(&self) -> &str;

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision;
}

/// Layers evaluated in order; the first non-allow result wins
#[derive(Default)]
pub struct SecurityPolicy {
    layers: Vec<Box<dyn PolicyLayer>>,
}

impl SecurityPolicy {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn add_layer(mut self, layer: Box<dyn PolicyLayer>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Build the standard layer stack from config
    pub fn from_config(config: &SecurityPolicyConfig) -> Self {
        Self::new()
            .add_layer(Box::new(BlockedToolLayer::new(config.blocked_tools.clone())))
            .add_layer(Box::new(DangerousCommandLayer::new(
                config.dangerous_patterns.clone(),
            )))
            .add_layer(Box::new(ProtectedPathLayer::new(
                config.protected_paths.clone(),
            )))
            .add_layer(Box::new(AskPatternLayer::new(config.ask_patterns.clone())))
    }

    pub fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision {
        for layer in &self.layers {
            match layer.evaluate(ctx) {
                PolicyDecision::Allow => continue,
                decision => {
                    warn!(
                        layer = layer.name(),
                        tool = ctx.tool_name,
                        decision = ?decision,
                        "Tool call flagged by security policy"
                    );
                    return decision;
                }
            }
        }
        PolicyDecision::Allow
    }
}

/// PreToolUse handler enforcing a [`SecurityPolicy`].
/// Without a policy every call is allowed.
pub struct SecurityHandler {
    policy: Option<Arc<SecurityPolicy>>,
}

impl SecurityHandler {
    pub fn new(policy: Option<Arc<SecurityPolicy>>) -> Self {
        Self { policy }
    }

    /// Handler with the builtin defaults
    pub fn with_defaults() -> Self {
        Self::new(Some(Arc::new(SecurityPolicy::from_config(
            &SecurityPolicyConfig::default(),
        ))))
    }
}

#[async_trait]
impl Handler for SecurityHandler {
    fn name(&self) -> &str {
        "security"
    }

    fn event(&self) -> EventType {
        EventType::PreToolUse
    }

    async fn handle(&self, _ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput> {
        let Some(policy) = &self.policy else {
            return Ok(HookOutput::allow(EventType::PreToolUse));
        };

        let out = match policy.evaluate(&PolicyContext::from_input(input)) {
            PolicyDecision::Allow => HookOutput::allow(EventType::PreToolUse),
            PolicyDecision::Ask(reason) => HookOutput::ask(EventType::PreToolUse, reason),
            PolicyDecision::Deny(reason) => HookOutput::deny(EventType::PreToolUse, reason),
        };
        Ok(out)
    }
}
