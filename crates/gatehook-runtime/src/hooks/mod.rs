pub mod context;
pub mod events;
pub mod handler;
pub mod output;
pub mod registry;

pub use context::DispatchContext;
pub use events::{EventType, HookInput, ResponseShape};
pub use handler::Handler;
pub use output::{Decision, HookOutput};
pub use registry::HandlerRegistry;
