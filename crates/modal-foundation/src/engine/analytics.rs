//! Engine-wide analytics snapshot.

use std::collections::BTreeMap;

use modal_kernel::{ModalEventKind, PerformanceMetrics, ResourceUsage};
use serde::{Deserialize, Serialize};

use super::state::EngineState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalAnalytics {
    pub registered_modals: usize,
    pub enabled_modals: usize,
    pub active_modals: Vec<String>,
    pub total_activations: u64,
    pub total_executions: u64,
    /// Summed last-known usage of the active set.
    pub resource_usage: ResourceUsage,
    pub resource_ceiling: ResourceUsage,
    /// Highest fill ratio across the three dimensions, 0.0–1.0+.
    pub resource_utilization: f64,
    pub event_counts: BTreeMap<ModalEventKind, u64>,
    /// Counted over the retained conflict history.
    pub conflicts_detected: usize,
    pub conflicts_unresolved: usize,
    pub messages_sent: u64,
    pub modal_metrics: BTreeMap<String, PerformanceMetrics>,
}

impl ModalAnalytics {
    pub(crate) fn snapshot(state: &EngineState) -> Self {
        let modal_metrics: BTreeMap<String, PerformanceMetrics> = state
            .registry
            .iter()
            .map(|(id, entry)| (id.clone(), entry.metrics.clone()))
            .collect();

        let resource_usage = state.active_usage();
        let resource_ceiling = state.config.resource_ceiling();

        Self {
            registered_modals: state.registry.len(),
            enabled_modals: state
                .registry
                .values()
                .filter(|e| e.descriptor.enabled)
                .count(),
            active_modals: state.active.iter().map(|a| a.modal_id.clone()).collect(),
            total_activations: modal_metrics.values().map(|m| m.activation_count).sum(),
            total_executions: modal_metrics.values().map(|m| m.execution_count).sum(),
            resource_utilization: utilization(&resource_usage, &resource_ceiling),
            resource_usage,
            resource_ceiling,
            event_counts: state.events.counts().clone(),
            conflicts_detected: state.conflicts.len(),
            conflicts_unresolved: state.conflicts.iter().filter(|c| !c.resolved).count(),
            messages_sent: state.messages.total(),
            modal_metrics,
        }
    }

    pub fn event_count(&self, kind: ModalEventKind) -> u64 {
        self.event_counts.get(&kind).copied().unwrap_or(0)
    }
}

fn utilization(usage: &ResourceUsage, ceiling: &ResourceUsage) -> f64 {
    let ratio = |used: f64, cap: f64| if cap > 0.0 { used / cap } else { 0.0 };
    ratio(usage.memory, ceiling.memory)
        .max(ratio(usage.cpu, ceiling.cpu))
        .max(ratio(usage.network, ceiling.network))
}
