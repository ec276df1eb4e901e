use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::hooks::{DispatchContext, EventType, Handler, HookInput, HookOutput};

/// Logs every hook invocation. Always returns the event default (side-effect only).
pub struct AuditHandler {
    event: EventType,
}

impl AuditHandler {
    pub fn new(event: EventType) -> Self {
        Self { event }
    }
}

#[async_trait]
impl Handler for AuditHandler {
    fn name(&self) -> &str {
        "audit"
    }

    fn event(&self) -> EventType {
        self.event
    }

    async fn handle(&self, _ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput> {
        info!(
            event = %self.event,
            session_id = %input.session_id,
            tool = %input.tool_name,
            cwd = %input.cwd,
            team = ?input.team_name,
            "Hook audit"
        );
        Ok(HookOutput::default_for(self.event))
    }
}
