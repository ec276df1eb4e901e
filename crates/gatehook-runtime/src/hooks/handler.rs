use anyhow::Result;
use async_trait::async_trait;

use super::context::DispatchContext;
use super::events::{EventType, HookInput};
use super::output::HookOutput;

/// A unit of behaviour bound to exactly one event type
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handler name for logging
    fn name(&self) -> &str;

    /// The event this handler runs for
    fn event(&self) -> EventType;

    /// Inspect the input and decide. Returning `Err` aborts the whole chain,
    /// so recoverable problems should degrade to the event default instead.
    async fn handle(&self, ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput>;
}
