use crate::config::Config;
use anyhow::Result;
use gatehook_quality::{build_catalog, register_quality_handlers};
use gatehook_runtime::{
    run_hook, AuditHandler, EventType, HandlerRegistry, SecurityHandler, SecurityPolicy,
    TaskCompletedGate, TeammateIdleGate,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Composition root: every handler, in dispatch order
pub fn build_registry(config: &Config) -> Result<HandlerRegistry> {
    let registry = HandlerRegistry::with_timeout(config.dispatch.timeout());

    for event in EventType::ALL {
        registry.register(Arc::new(AuditHandler::new(event)));
    }

    let policy = config
        .security
        .enabled
        .then(|| Arc::new(SecurityPolicy::from_config(&config.security)));
    if policy.is_none() {
        info!("Security policy disabled, PreToolUse allows everything");
    }
    registry.register(Arc::new(SecurityHandler::new(policy)));

    let catalog = build_catalog(&config.quality)?;
    register_quality_handlers(&registry, &config.quality, catalog);

    if config.team.enabled {
        registry.register(Arc::new(TaskCompletedGate::new()?));
        registry.register(Arc::new(TeammateIdleGate::new()));
    }

    Ok(registry)
}

/// Handle one event on stdin/stdout; returns the process exit code
pub async fn execute(event: EventType, config: &Config) -> Result<i32> {
    let registry = build_registry(config)?;
    debug!(event = %event, handlers = ?registry.handler_names(event), "Dispatching");

    let mut stdin = tokio::io::stdin();
    let mut stdout = std::io::stdout();
    run_hook(&registry, event, &mut stdin, &mut stdout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order() {
        let registry = build_registry(&Config::default()).unwrap();
        assert_eq!(
            registry.handler_names(EventType::PreToolUse),
            vec!["audit", "security"]
        );
        assert_eq!(
            registry.handler_names(EventType::PostToolUse),
            vec!["audit", "formatter", "linter"]
        );
        assert_eq!(
            registry.handler_names(EventType::SessionStart),
            vec!["audit", "tool_inventory"]
        );
        assert_eq!(
            registry.handler_names(EventType::TeammateIdle),
            vec!["audit", "teammate_idle_gate"]
        );
    }

    #[test]
    fn test_team_gates_can_be_disabled() {
        let mut config = Config::default();
        config.team.enabled = false;
        config.quality.linter_enabled = false;
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.handler_names(EventType::TaskCompleted), vec!["audit"]);
        assert_eq!(
            registry.handler_names(EventType::PostToolUse),
            vec!["audit", "formatter"]
        );
    }

    #[test]
    fn test_dispatch_timeout_from_config() {
        let mut config = Config::default();
        config.dispatch.timeout_secs = 7;
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.timeout(), std::time::Duration::from_secs(7));
    }
}
