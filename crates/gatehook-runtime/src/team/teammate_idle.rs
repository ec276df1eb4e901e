use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::{baseline_path, quality_gate_path, DiagnosticsBaseline, QualityGate};
use crate::hooks::{DispatchContext, EventType, Handler, HookInput, HookOutput};

/// Keeps a teammate working while the diagnostics baseline exceeds the quality gate
#[derive(Default)]
pub struct TeammateIdleGate;

impl TeammateIdleGate {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for TeammateIdleGate {
    fn name(&self) -> &str {
        "teammate_idle_gate"
    }

    fn event(&self) -> EventType {
        EventType::TeammateIdle
    }

    async fn handle(&self, _ctx: &DispatchContext, input: &HookInput) -> Result<HookOutput> {
        let accept = HookOutput::allow(EventType::TeammateIdle);
        if !input.is_team_mode() {
            return Ok(accept);
        }
        let Some(project) = input.resolve_project_dir() else {
            return Ok(accept);
        };

        let gate = match QualityGate::load(&quality_gate_path(&project)).await {
            Ok(gate) => gate,
            Err(e) => {
                debug!(error = %e, "No quality gate configured, accepting idle");
                return Ok(accept);
            }
        };
        let baseline = match DiagnosticsBaseline::load(&baseline_path(&project)).await {
            Ok(baseline) => baseline,
            Err(e) => {
                debug!(error = %e, "No diagnostics baseline, accepting idle");
                return Ok(accept);
            }
        };

        let totals = baseline.totals();
        let age_secs = baseline
            .created_at
            .map(|t| (Utc::now() - t).num_seconds());
        info!(
            teammate = ?input.teammate_name,
            errors = totals.errors,
            warnings = totals.warnings,
            max_errors = gate.max_errors,
            baseline_age_secs = ?age_secs,
            "Evaluating quality gate"
        );

        Ok(match gate.violation(&totals) {
            Some(reason) => HookOutput::deny(EventType::TeammateIdle, reason),
            None => accept,
        })
    }
}
