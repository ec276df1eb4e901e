use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::context::DispatchContext;
use super::events::{EventType, HookInput};
use super::handler::Handler;
use super::output::HookOutput;
use crate::error::DispatchError;

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Handlers organised by event type. Registration order is dispatch order.
pub struct HandlerRegistry {
    handlers: DashMap<EventType, Vec<Arc<dyn Handler>>>,
    timeout: Duration,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_DISPATCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            handlers: DashMap::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Append a handler to its event's chain
    pub fn register(&self, handler: Arc<dyn Handler>) {
        debug!(event = %handler.event(), handler = handler.name(), "Registering handler");
        self.handlers
            .entry(handler.event())
            .or_default()
            .push(handler);
    }

    pub fn has_handlers(&self, event: EventType) -> bool {
        self.handlers
            .get(&event)
            .map(|h| !h.is_empty())
            .unwrap_or(false)
    }

    /// Handler names for an event, in dispatch order
    pub fn handler_names(&self, event: EventType) -> Vec<String> {
        self.handlers
            .get(&event)
            .map(|h| h.iter().map(|h| h.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Run every handler registered for `event`, in order.
    ///
    /// Stops at the first blocking decision, the first handler error, or the
    /// deadline. A handler that returns after the deadline has passed still
    /// counts as a timeout. Non-blocking outputs are merged into the result.
    pub async fn dispatch(
        &self,
        ctx: &DispatchContext,
        event: EventType,
        input: &HookInput,
    ) -> Result<HookOutput, DispatchError> {
        // Snapshot so no map guard is held across awaits
        let handlers = self
            .handlers
            .get(&event)
            .map(|h| h.clone())
            .unwrap_or_default();

        if handlers.is_empty() {
            return Ok(HookOutput::default_for(event));
        }

        let ctx = ctx.with_timeout(self.timeout);
        let mut merged: Option<HookOutput> = None;

        for (index, handler) in handlers.iter().enumerate() {
            let result = match ctx.deadline() {
                Some(deadline) => {
                    tokio::time::timeout_at(deadline, handler.handle(&ctx, input))
                        .await
                        .ok()
                }
                None => Some(handler.handle(&ctx, input).await),
            };

            let result = match result {
                Some(result) if !ctx.is_expired() => result,
                _ => {
                    warn!(
                        event = %event,
                        handler = handler.name(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Handler exceeded dispatch deadline"
                    );
                    ctx.cancel();
                    return Err(DispatchError::Timeout {
                        event,
                        handler_index: index,
                        handler: handler.name().to_string(),
                    });
                }
            };

            let output = result.map_err(|source| {
                warn!(event = %event, handler = handler.name(), error = %source, "Handler failed");
                DispatchError::Handler {
                    event,
                    handler_index: index,
                    handler: handler.name().to_string(),
                    source,
                }
            })?;

            if output.is_blocking() {
                debug!(
                    event = %event,
                    handler = handler.name(),
                    reason = output.reason().unwrap_or_default(),
                    "Handler blocked, short-circuiting"
                );
                return Ok(output);
            }

            merged = Some(match merged {
                Some(acc) => acc.merge(output),
                None => output,
            });
        }

        Ok(merged.unwrap_or_else(|| HookOutput::default_for(event)))
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
