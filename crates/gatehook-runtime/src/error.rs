use thiserror::Error;

use crate::hooks::EventType;

/// Protocol-fatal failures. Blocking decisions are not errors; they travel as
/// [`HookOutput`](crate::hooks::HookOutput).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatch deadline passed while handler `handler_index` was running,
    /// even if that handler eventually returned
    #[error("{event} dispatch timed out in handler #{handler_index} ('{handler}')")]
    Timeout {
        event: EventType,
        handler_index: usize,
        handler: String,
    },

    #[error("{event} handler #{handler_index} ('{handler}') failed: {source}")]
    Handler {
        event: EventType,
        handler_index: usize,
        handler: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed hook input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    #[error("failed to read hook input: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout { .. })
    }
}
