//! Mutable engine state. Everything here sits behind the engine's single lock.

use std::collections::HashMap;

use modal_kernel::{
    EventSeverity, LifecycleEvent, LifecyclePhase, ModalConflict, ModalDescriptor, ModalEvent,
    ModalEventKind, ModalOrchestrationConfig, PerformanceMetrics, ResourceUsage, TriggerMatcher,
};

use crate::events::EventHub;
use crate::history::BoundedLog;
use crate::messaging::CommunicationLog;

/// One registry slot.
#[derive(Debug)]
pub(crate) struct RegistryEntry {
    pub descriptor: ModalDescriptor,
    pub triggers: TriggerMatcher,
    pub metrics: PerformanceMetrics,
    /// Registration order, used as the tie-breaker when sorting by priority.
    pub seq: u64,
}

/// One member of the active set.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveModal {
    pub modal_id: String,
    /// Last-known usage: the requested amount until telemetry replaces it.
    pub usage: ResourceUsage,
    pub activated_at_ms: u64,
}

#[derive(Debug)]
pub(crate) struct EngineState {
    pub config: ModalOrchestrationConfig,
    pub registry: HashMap<String, RegistryEntry>,
    pub next_seq: u64,
    /// Activation order.
    pub active: Vec<ActiveModal>,
    pub events: EventHub,
    pub lifecycle: BoundedLog<LifecycleEvent>,
    pub conflicts: BoundedLog<ModalConflict>,
    pub messages: CommunicationLog,
}

impl EngineState {
    pub fn new(config: ModalOrchestrationConfig) -> Self {
        let limit = config.history_limit;
        Self {
            config,
            registry: HashMap::new(),
            next_seq: 0,
            active: Vec::new(),
            events: EventHub::new(limit),
            lifecycle: BoundedLog::new(limit),
            conflicts: BoundedLog::new(limit),
            messages: CommunicationLog::new(limit),
        }
    }

    pub fn is_active(&self, modal_id: &str) -> bool {
        self.active.iter().any(|a| a.modal_id == modal_id)
    }

    pub fn active_entry_mut(&mut self, modal_id: &str) -> Option<&mut ActiveModal> {
        self.active.iter_mut().find(|a| a.modal_id == modal_id)
    }

    pub fn active_usage(&self) -> ResourceUsage {
        self.active.iter().map(|a| a.usage).sum()
    }

    /// Descriptors of the active set, in activation order.
    pub fn active_descriptors(&self) -> Vec<&ModalDescriptor> {
        self.active
            .iter()
            .filter_map(|a| self.registry.get(&a.modal_id))
            .map(|e| &e.descriptor)
            .collect()
    }

    pub fn emit(
        &mut self,
        kind: ModalEventKind,
        severity: EventSeverity,
        modal_id: Option<&str>,
        message: impl Into<String>,
        data: serde_json::Value,
        now_ms: u64,
    ) {
        let mut event = ModalEvent::new(kind, severity, message)
            .with_data(data)
            .at(now_ms);
        if let Some(id) = modal_id {
            event = event.for_modal(id);
        }
        self.events.publish(event);
    }

    pub fn record_lifecycle(&mut self, modal_id: &str, phase: LifecyclePhase, now_ms: u64) {
        self.lifecycle.push(LifecycleEvent {
            modal_id: modal_id.to_string(),
            phase,
            timestamp_ms: now_ms,
        });
    }

    /// Remove `modal_id` from the active set. Returns `false` if it was not active.
    pub fn deactivate(&mut self, modal_id: &str, reason: &str, now_ms: u64) -> bool {
        let Some(pos) = self.active.iter().position(|a| a.modal_id == modal_id) else {
            return false;
        };
        let removed = self.active.remove(pos);

        self.emit(
            ModalEventKind::ModalDeactivated,
            EventSeverity::Info,
            Some(modal_id),
            format!("Modal {modal_id} deactivated: {reason}"),
            serde_json::json!({
                "reason": reason,
                "active_for_ms": now_ms.saturating_sub(removed.activated_at_ms),
            }),
            now_ms,
        );
        self.record_lifecycle(modal_id, LifecyclePhase::Deactivated, now_ms);
        true
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.events.set_history_limit(limit);
        self.lifecycle.set_capacity(limit);
        self.conflicts.set_capacity(limit);
        self.messages.set_history_limit(limit);
    }
}
