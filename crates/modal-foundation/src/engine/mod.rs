//! Modal orchestration engine
//!
//! Owns the registry, the active set, per-modal metrics and every engine log.
//! All operations are synchronous; state sits behind one
//! [`parking_lot::RwLock`], so a shared `Arc<ModalOrchestrationEngine>` can be
//! used from any task. Queries return owned snapshots.
//!
//! # Example
//!
//! ```rust,ignore
//! use modal_foundation::ModalOrchestrationEngine;
//! use modal_kernel::*;
//!
//! let engine = ModalOrchestrationEngine::new(ModalOrchestrationConfig::default());
//! let training = ModalDescriptor::new("training", "Training", "workout").with_trigger("workout");
//! engine.register_modal(training);
//!
//! let ctx = ModalContext::new("user-1", Platform::Mobile).with_topic("today's workout");
//! for id in engine.get_compatible_modals(&ctx) {
//!     let usage = ResourceUsage::new(10.0, 5.0, 1.0);
//!     let request = ModalActivationRequest::new(&id, ctx.clone(), usage);
//!     let response = engine.activate_modal(request);
//! }
//! ```

mod analytics;
mod state;

pub use analytics::ModalAnalytics;

use std::sync::Arc;
use std::time::Instant;

use modal_kernel::adaptation::AdaptedModal;
use modal_kernel::{
    Clock, CrossModalMessage, EventSeverity, LifecycleEvent, LifecyclePhase,
    ModalActivationRequest, ModalActivationResponse, ModalAdaptationContext, ModalConfigUpdate,
    ModalConflict, ModalContext, ModalDescriptor, ModalError, ModalEvent, ModalEventKind,
    ModalOrchestrationConfig, ModalResult, PerformanceMetrics, ResourceUsage, SystemClock,
    TriggerMatcher,
};
use parking_lot::RwLock;
use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::admission::AdmissionController;
use crate::conflict::ConflictResolver;
use state::{ActiveModal, EngineState, RegistryEntry};

pub struct ModalOrchestrationEngine {
    state: RwLock<EngineState>,
    clock: Arc<dyn Clock>,
}

impl Default for ModalOrchestrationEngine {
    fn default() -> Self {
        Self::new(ModalOrchestrationConfig::default())
    }
}

impl std::fmt::Debug for ModalOrchestrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ModalOrchestrationEngine")
            .field("registered", &state.registry.len())
            .field("active", &state.active.len())
            .finish()
    }
}

impl ModalOrchestrationEngine {
    pub fn new(config: ModalOrchestrationConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ModalOrchestrationConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(EngineState::new(config)),
            clock,
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_millis()
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Check whether `descriptor` could be registered right now, without
    /// registering it.
    pub fn validate_registration(&self, descriptor: &ModalDescriptor) -> ModalResult<()> {
        let state = self.state.read();
        Self::check_registration(&state, descriptor)
    }

    fn check_registration(state: &EngineState, descriptor: &ModalDescriptor) -> ModalResult<()> {
        descriptor.validate()?;

        if state.registry.contains_key(&descriptor.id) {
            return Err(ModalError::AlreadyRegistered(descriptor.id.clone()));
        }

        if let Some(missing) = descriptor
            .dependencies
            .iter()
            .find(|dep| !state.registry.contains_key(dep.as_str()))
        {
            return Err(ModalError::MissingDependency {
                modal_id: descriptor.id.clone(),
                dependency: missing.clone(),
            });
        }

        Ok(())
    }

    /// Add a descriptor to the registry.
    ///
    /// Returns `false` (and logs a `modal_error` event) when a required field
    /// is empty, the priority is outside 1–10, the id is taken, or a
    /// dependency is not registered yet.
    pub fn register_modal(&self, descriptor: ModalDescriptor) -> bool {
        let now = self.now_ms();
        let mut state = self.state.write();

        if let Err(err) = Self::check_registration(&state, &descriptor) {
            let modal_id = (!descriptor.id.is_empty()).then_some(descriptor.id.as_str());
            state.emit(
                ModalEventKind::ModalError,
                EventSeverity::Error,
                modal_id,
                format!("Failed to register modal: {err}"),
                json!({ "operation": "register", "error": err.to_string() }),
                now,
            );
            return false;
        }

        let modal_id = descriptor.id.clone();
        let seq = state.next_seq;
        state.next_seq += 1;

        let data = json!({
            "name": descriptor.name,
            "version": descriptor.version,
            "category": descriptor.category,
            "priority": descriptor.priority,
        });
        state.registry.insert(
            modal_id.clone(),
            RegistryEntry {
                triggers: TriggerMatcher::compile(&descriptor.activation_triggers),
                descriptor,
                metrics: PerformanceMetrics::new(now),
                seq,
            },
        );

        state.emit(
            ModalEventKind::ModalRegistered,
            EventSeverity::Info,
            Some(&modal_id),
            format!("Modal {modal_id} registered"),
            data,
            now,
        );
        state.record_lifecycle(&modal_id, LifecyclePhase::Initialized, now);
        true
    }

    /// Remove a descriptor, deactivating it first if needed. Metrics go with it.
    pub fn unregister_modal(&self, modal_id: &str) -> bool {
        let now = self.now_ms();
        let mut state = self.state.write();

        if !state.registry.contains_key(modal_id) {
            return false;
        }

        state.deactivate(modal_id, "unregistered", now);
        state.registry.remove(modal_id);

        state.emit(
            ModalEventKind::ModalUnregistered,
            EventSeverity::Info,
            Some(modal_id),
            format!("Modal {modal_id} unregistered"),
            Value::Null,
            now,
        );
        state.record_lifecycle(modal_id, LifecyclePhase::Destroyed, now);
        true
    }

    /// Snapshot of every registered descriptor, in registration order.
    pub fn get_registry(&self) -> Vec<ModalDescriptor> {
        let state = self.state.read();
        let mut entries: Vec<&RegistryEntry> = state.registry.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.descriptor.clone()).collect()
    }

    pub fn get_modal(&self, modal_id: &str) -> Option<ModalDescriptor> {
        self.state
            .read()
            .registry
            .get(modal_id)
            .map(|e| e.descriptor.clone())
    }

    pub fn is_registered(&self, modal_id: &str) -> bool {
        self.state.read().registry.contains_key(modal_id)
    }

    pub fn registered_count(&self) -> usize {
        self.state.read().registry.len()
    }

    // ========================================================================
    // Compatibility
    // ========================================================================

    /// Enabled modals with at least one trigger matching the context's topic,
    /// intent or data points. Highest priority first; equal priorities keep
    /// registration order.
    pub fn get_compatible_modals(&self, context: &ModalContext) -> Vec<String> {
        let candidates = context.match_candidates();
        let state = self.state.read();

        let mut matches: Vec<&RegistryEntry> = state
            .registry
            .values()
            .filter(|e| e.descriptor.enabled)
            .filter(|e| e.triggers.matches_any(candidates.iter().copied()))
            .collect();

        matches.sort_by(|a, b| {
            b.descriptor
                .priority
                .cmp(&a.descriptor.priority)
                .then(a.seq.cmp(&b.seq))
        });

        matches.into_iter().map(|e| e.descriptor.id.clone()).collect()
    }

    // ========================================================================
    // Activation state machine
    // ========================================================================

    /// Admit a modal into the active set.
    ///
    /// Checks run in order: existence, enabled flag, already-active (returns
    /// success with no side effects), resource admission, then conflicts.
    pub fn activate_modal(&self, request: ModalActivationRequest) -> ModalActivationResponse {
        let started = Instant::now();
        let now = self.now_ms();
        let elapsed_ms = || started.elapsed().as_secs_f64() * 1000.0;
        let modal_id = request.modal_id.as_str();

        let mut state = self.state.write();

        let candidate = match state.registry.get(modal_id).map(|e| e.descriptor.clone()) {
            Some(descriptor) if descriptor.enabled => descriptor,
            Some(_) => {
                let err = ModalError::Disabled(modal_id.to_string());
                return Self::reject(&mut state, modal_id, err, now, elapsed_ms());
            }
            None => {
                let err = ModalError::NotFound(modal_id.to_string());
                return Self::reject(&mut state, modal_id, err, now, elapsed_ms());
            }
        };

        if let Some(active) = state.active.iter().find(|a| a.modal_id == modal_id) {
            tracing::debug!(modal_id = %modal_id, "modal already active");
            return ModalActivationResponse::activated(active.usage, elapsed_ms());
        }

        if !request.required_resources.is_valid() {
            let err = ModalError::InvalidResources {
                modal_id: modal_id.to_string(),
                usage: format!("{:?}", request.required_resources),
            };
            return Self::reject(&mut state, modal_id, err, now, elapsed_ms());
        }

        let decision = AdmissionController::from_config(&state.config)
            .evaluate(state.active.iter().map(|a| &a.usage), request.required_resources);
        if decision.is_rejected() {
            let data = serde_json::to_value(&decision).unwrap_or(Value::Null);
            state.emit(
                ModalEventKind::ResourceLimitExceeded,
                EventSeverity::Warning,
                Some(modal_id),
                format!("Cannot activate {modal_id}: {}", decision.reason),
                data,
                now,
            );
            return ModalActivationResponse::failed(
                ModalError::InsufficientResources.to_string(),
                elapsed_ms(),
            );
        }

        let resolver = ConflictResolver::new(
            state.config.conflict_resolution_strategy,
            state.config.conflict_resolution_mode,
        );
        let assessment = resolver.assess(&candidate, state.active_descriptors(), now);

        for conflict in &assessment.conflicts {
            state.conflicts.push(conflict.clone());
            let data = serde_json::to_value(conflict).unwrap_or(Value::Null);
            state.emit(
                ModalEventKind::ConflictDetected,
                EventSeverity::Warning,
                Some(modal_id),
                format!("Conflict detected between {}", conflict.modal_ids.join(" and ")),
                data,
                now,
            );
        }

        if !assessment.all_resolved() {
            return ModalActivationResponse::failed(
                ModalError::UnresolvedConflicts.to_string(),
                elapsed_ms(),
            );
        }

        for evicted in &assessment.evictions {
            state.deactivate(evicted, &format!("evicted by {modal_id}"), now);
        }

        let usage = request.required_resources;
        state.active.push(ActiveModal {
            modal_id: modal_id.to_string(),
            usage,
            activated_at_ms: now,
        });

        let elapsed = elapsed_ms();
        if let Some(entry) = state.registry.get_mut(modal_id) {
            entry.metrics.record_activation(usage, elapsed, now);
        }

        state.emit(
            ModalEventKind::ModalActivated,
            EventSeverity::Info,
            Some(modal_id),
            format!("Modal {modal_id} activated"),
            json!({
                "priority": request.priority,
                "reason": request.reason,
                "resources": usage,
                "user_id": request.context.user_id,
            }),
            now,
        );
        state.record_lifecycle(modal_id, LifecyclePhase::Activated, now);

        ModalActivationResponse::activated(usage, elapsed)
    }

    fn reject(
        state: &mut EngineState,
        modal_id: &str,
        err: ModalError,
        now: u64,
        elapsed_ms: f64,
    ) -> ModalActivationResponse {
        state.emit(
            ModalEventKind::ModalError,
            EventSeverity::Error,
            Some(modal_id),
            format!("Failed to activate modal: {err}"),
            json!({ "operation": "activate", "error": err.to_string() }),
            now,
        );
        ModalActivationResponse::failed(err.to_string(), elapsed_ms)
    }

    /// Remove a modal from the active set. `false` if it was not active.
    pub fn deactivate_modal(&self, modal_id: &str) -> bool {
        let now = self.now_ms();
        self.state.write().deactivate(modal_id, "requested", now)
    }

    pub fn is_active(&self, modal_id: &str) -> bool {
        self.state.read().is_active(modal_id)
    }

    /// Active modal ids in activation order.
    pub fn active_modals(&self) -> Vec<String> {
        self.state
            .read()
            .active
            .iter()
            .map(|a| a.modal_id.clone())
            .collect()
    }

    /// Summed last-known usage of the active set.
    pub fn active_resource_usage(&self) -> ResourceUsage {
        self.state.read().active_usage()
    }

    // ========================================================================
    // Telemetry and metrics
    // ========================================================================

    /// Replace the tracked usage of an active modal with a measured sample.
    /// Negative or non-finite samples are dropped.
    pub fn record_resource_usage(&self, modal_id: &str, usage: ResourceUsage) -> bool {
        if !usage.is_valid() {
            tracing::warn!(modal_id = %modal_id, ?usage, "invalid resource sample dropped");
            return false;
        }
        let mut state = self.state.write();
        match state.active_entry_mut(modal_id) {
            Some(active) => {
                active.usage = usage;
                tracing::trace!(modal_id = %modal_id, ?usage, "resource sample recorded");
                true
            }
            None => false,
        }
    }

    /// Fold one executor run into the modal's metrics.
    pub fn record_execution(&self, modal_id: &str, elapsed_ms: f64, success: bool) -> bool {
        let now = self.now_ms();
        let mut state = self.state.write();
        match state.registry.get_mut(modal_id) {
            Some(entry) => {
                entry.metrics.record_execution(elapsed_ms, success, now);
                true
            }
            None => false,
        }
    }

    /// Store a host-reported satisfaction score (0–5, clamped).
    pub fn record_user_satisfaction(&self, modal_id: &str, score: f64) -> bool {
        let now = self.now_ms();
        let mut state = self.state.write();
        match state.registry.get_mut(modal_id) {
            Some(entry) => {
                entry.metrics.record_satisfaction(score, now);
                true
            }
            None => false,
        }
    }

    pub fn get_metrics(&self, modal_id: &str) -> Option<PerformanceMetrics> {
        self.state
            .read()
            .registry
            .get(modal_id)
            .map(|e| e.metrics.clone())
    }

    pub fn get_analytics(&self) -> ModalAnalytics {
        ModalAnalytics::snapshot(&self.state.read())
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Log a message between two registered modals. Nothing is delivered.
    pub fn send_cross_modal_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        message: &str,
        data: Value,
        requires_response: bool,
    ) -> bool {
        let now = self.now_ms();
        let mut state = self.state.write();

        for id in [sender_id, receiver_id] {
            if !state.registry.contains_key(id) {
                tracing::warn!(
                    sender = %sender_id,
                    receiver = %receiver_id,
                    unknown = %id,
                    "cross-modal message dropped"
                );
                return false;
            }
        }

        state.messages.record(CrossModalMessage {
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            message: message.to_string(),
            data,
            requires_response,
            timestamp_ms: now,
        });
        true
    }

    pub fn communication_log(&self) -> Vec<CrossModalMessage> {
        self.state.read().messages.messages()
    }

    /// Retained messages addressed to `receiver_id`.
    pub fn messages_for(&self, receiver_id: &str) -> Vec<CrossModalMessage> {
        self.state.read().messages.inbox(receiver_id)
    }

    // ========================================================================
    // Logs and events
    // ========================================================================

    pub fn events(&self) -> Vec<ModalEvent> {
        self.state.read().events.events()
    }

    pub fn recent_events(&self, n: usize) -> Vec<ModalEvent> {
        self.state.read().events.recent(n)
    }

    pub fn events_for(&self, modal_id: &str) -> Vec<ModalEvent> {
        self.state.read().events.events_for(modal_id)
    }

    pub fn events_of_kind(&self, kind: ModalEventKind) -> Vec<ModalEvent> {
        self.state.read().events.events_of_kind(kind)
    }

    pub fn lifecycle_history(&self) -> Vec<LifecycleEvent> {
        self.state.read().lifecycle.to_vec()
    }

    pub fn lifecycle_of(&self, modal_id: &str) -> Vec<LifecycleEvent> {
        self.state
            .read()
            .lifecycle
            .iter()
            .filter(|e| e.modal_id == modal_id)
            .cloned()
            .collect()
    }

    pub fn conflict_history(&self) -> Vec<ModalConflict> {
        self.state.read().conflicts.to_vec()
    }

    /// Live feed of every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ModalEvent> {
        self.state.read().events.subscribe()
    }

    /// Log that an adapted copy of a modal was produced.
    pub fn notify_adaptation(&self, adapted: &AdaptedModal, context: &ModalAdaptationContext) {
        let now = self.now_ms();
        let mut state = self.state.write();
        let data = json!({
            "original_modal_id": adapted.original_modal_id,
            "adapted_modal_id": adapted.adapted_modal_id,
            "adaptations": adapted.adaptations_applied.len(),
            "explanation": adapted.explanation,
            "user_id": context.modal_context.user_id,
            "energy_level": context.energy_level,
        });
        state.emit(
            ModalEventKind::ModalAdapted,
            EventSeverity::Info,
            Some(&adapted.original_modal_id),
            format!(
                "Modal {} adapted as {}",
                adapted.original_modal_id, adapted.adapted_modal_id
            ),
            data,
            now,
        );
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn config(&self) -> ModalOrchestrationConfig {
        self.state.read().config.clone()
    }

    /// Apply a partial configuration update. The new limits apply to the
    /// next admission check; already active modals stay active.
    pub fn update_config(&self, update: ModalConfigUpdate) {
        let now = self.now_ms();
        let mut state = self.state.write();

        let data = serde_json::to_value(&update).unwrap_or(Value::Null);
        state.config.apply(update);
        let limit = state.config.history_limit;
        state.set_history_limit(limit);

        state.emit(
            ModalEventKind::ConfigUpdated,
            EventSeverity::Info,
            None,
            "Orchestration configuration updated",
            data,
            now,
        );
    }
}
