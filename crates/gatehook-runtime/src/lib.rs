pub mod audit;
pub mod error;
pub mod hooks;
pub mod policy;
pub mod protocol;
pub mod team;

pub use audit::AuditHandler;
pub use error::DispatchError;
pub use hooks::{
    Decision, DispatchContext, EventType, Handler, HandlerRegistry, HookInput, HookOutput,
    ResponseShape,
};
pub use policy::{SecurityHandler, SecurityPolicy, SecurityPolicyConfig};
pub use protocol::{read_input, run_hook, write_output};
pub use team::{TaskCompletedGate, TeammateIdleGate};

/// Initialize structured JSON logging on stderr (stdout carries the protocol).
/// Filter comes from `GATEHOOK_LOG`, defaulting to `warn`.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("GATEHOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
