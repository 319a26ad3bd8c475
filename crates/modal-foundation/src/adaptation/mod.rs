//! Rule-based modal adaptation
//!
//! Produces adapted copies of registered modals from the user's live state
//! (energy, recovery, training history). Enabled rules run in priority order
//! and compose on one clone per modal; the registry is never touched.

mod applier;
mod evaluator;
mod rules;

pub use applier::{
    DEFAULT_DURATION_MINUTES, DEFAULT_INTENSITY, DEFAULT_SERIES, DefaultActionApplier,
    MIN_DURATION_MINUTES, MIN_SERIES,
};
pub use evaluator::{
    DefaultConditionEvaluator, PLATEAU_VARIANCE_THRESHOLD, PLATEAU_WINDOW, is_plateau,
    training_delay_days,
};
pub use rules::*;

use std::sync::Arc;

use modal_kernel::adaptation::{
    ActionApplier, Adaptation, AdaptationRule, AdaptedModal, ConditionEvaluator, RuleUpdate,
};
use modal_kernel::{ModalAdaptationContext, ModalDescriptor};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::engine::ModalOrchestrationEngine;
use crate::history::BoundedLog;

/// Rule management errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AdaptationError {
    #[error("Adaptation rule already exists: {0}")]
    DuplicateRule(String),

    #[error("Adaptation rule not found: {0}")]
    RuleNotFound(String),

    #[error("Invalid adaptation rule {rule_id}: {reason}")]
    InvalidRule { rule_id: String, reason: String },
}

pub type AdaptationResult<T> = Result<T, AdaptationError>;

struct AdaptationState {
    /// Insertion order; sorted by priority on use.
    rules: Vec<AdaptationRule>,
    history: BoundedLog<AdaptedModal>,
}

pub struct AdaptationEngine {
    orchestration: Arc<ModalOrchestrationEngine>,
    evaluator: Arc<dyn ConditionEvaluator>,
    applier: Arc<dyn ActionApplier>,
    state: RwLock<AdaptationState>,
}

impl AdaptationEngine {
    /// Engine with no rules and the default interpreters.
    pub fn new(orchestration: Arc<ModalOrchestrationEngine>) -> Self {
        Self::with_interpreters(
            orchestration,
            Arc::new(DefaultConditionEvaluator),
            Arc::new(DefaultActionApplier),
        )
    }

    /// Engine preloaded with [`default_rules`].
    pub fn with_default_rules(orchestration: Arc<ModalOrchestrationEngine>) -> Self {
        let engine = Self::new(orchestration);
        engine.state.write().rules = default_rules();
        engine
    }

    pub fn with_interpreters(
        orchestration: Arc<ModalOrchestrationEngine>,
        evaluator: Arc<dyn ConditionEvaluator>,
        applier: Arc<dyn ActionApplier>,
    ) -> Self {
        let history_limit = orchestration.config().history_limit;
        Self {
            orchestration,
            evaluator,
            applier,
            state: RwLock::new(AdaptationState {
                rules: Vec::new(),
                history: BoundedLog::new(history_limit),
            }),
        }
    }

    // ========================================================================
    // Rule management
    // ========================================================================

    pub fn add_rule(&self, rule: AdaptationRule) -> AdaptationResult<()> {
        validate_rule(&rule)?;
        let mut state = self.state.write();
        if state.rules.iter().any(|r| r.id == rule.id) {
            return Err(AdaptationError::DuplicateRule(rule.id));
        }
        tracing::debug!(rule_id = %rule.id, priority = rule.priority, "adaptation rule added");
        state.rules.push(rule);
        Ok(())
    }

    pub fn update_rule(&self, rule_id: &str, update: RuleUpdate) -> AdaptationResult<()> {
        let mut state = self.state.write();
        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| AdaptationError::RuleNotFound(rule_id.to_string()))?;

        let mut updated = rule.clone();
        update.apply_to(&mut updated);
        validate_rule(&updated)?;
        *rule = updated;
        Ok(())
    }

    pub fn remove_rule(&self, rule_id: &str) -> AdaptationResult<AdaptationRule> {
        let mut state = self.state.write();
        let pos = state
            .rules
            .iter()
            .position(|r| r.id == rule_id)
            .ok_or_else(|| AdaptationError::RuleNotFound(rule_id.to_string()))?;
        Ok(state.rules.remove(pos))
    }

    pub fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> AdaptationResult<()> {
        self.update_rule(
            rule_id,
            RuleUpdate {
                enabled: Some(enabled),
                ..Default::default()
            },
        )
    }

    /// Rules in evaluation order: priority descending, ties by insertion.
    pub fn rules(&self) -> Vec<AdaptationRule> {
        let mut rules = self.state.read().rules.clone();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        rules
    }

    pub fn rule(&self, rule_id: &str) -> Option<AdaptationRule> {
        self.state.read().rules.iter().find(|r| r.id == rule_id).cloned()
    }

    // ========================================================================
    // Adaptation
    // ========================================================================

    /// Adapt one registered modal. `None` when the id is unknown or no rule
    /// fired.
    pub fn adapt_modal(
        &self,
        modal_id: &str,
        context: &ModalAdaptationContext,
    ) -> Option<AdaptedModal> {
        let original = self.orchestration.get_modal(modal_id)?;
        let clock = self.orchestration.clock();
        let now = clock.now_utc();
        let now_ms = clock.now_millis();

        let rules: Vec<AdaptationRule> = self.rules().into_iter().filter(|r| r.enabled).collect();

        let mut adapted: Option<ModalDescriptor> = None;
        let mut applied = Vec::new();
        let mut explanations = Vec::new();

        for rule in &rules {
            let fires = rule
                .conditions
                .iter()
                .all(|c| self.evaluator.evaluate(c, context, now));
            if !fires {
                continue;
            }
            tracing::debug!(modal_id = %modal_id, rule_id = %rule.id, "adaptation rule fired");

            for rule_action in &rule.actions {
                let copy = adapted.get_or_insert_with(|| original.clone());
                let change = self.applier.apply(&rule_action.action, copy, now);

                explanations.push(match &rule_action.explanation {
                    Some(template) => {
                        render(template, &original.name, &change.old_value, &change.new_value)
                    }
                    None => change.default_explanation.clone(),
                });
                applied.push(Adaptation {
                    rule_id: rule.id.clone(),
                    action: rule_action.action.clone(),
                    old_value: change.old_value,
                    new_value: change.new_value,
                    confidence: rule_action.confidence,
                });
            }
        }

        let mut modal = adapted?;
        let adapted_id = self.derive_id(modal_id);
        modal.id = adapted_id.clone();
        modal.metadata.updated_at = Some(now);

        let result = AdaptedModal {
            original_modal_id: modal_id.to_string(),
            adapted_modal_id: adapted_id,
            modal,
            adaptations_applied: applied,
            explanation: explanations.join(" "),
            timestamp_ms: now_ms,
        };

        tracing::info!(
            modal_id = %modal_id,
            adapted_id = %result.adapted_modal_id,
            adaptations = result.adaptations_applied.len(),
            "modal adapted"
        );
        self.state.write().history.push(result.clone());
        self.orchestration.notify_adaptation(&result, context);

        Some(result)
    }

    /// Adapt every modal compatible with the embedded modal context, in
    /// priority order. Modals no rule touched are left out.
    pub fn adapt_compatible_modals(&self, context: &ModalAdaptationContext) -> Vec<AdaptedModal> {
        self.orchestration
            .get_compatible_modals(&context.modal_context)
            .iter()
            .filter_map(|id| self.adapt_modal(id, context))
            .collect()
    }

    pub fn history(&self) -> Vec<AdaptedModal> {
        self.state.read().history.to_vec()
    }

    pub fn history_for(&self, original_modal_id: &str) -> Vec<AdaptedModal> {
        self.state
            .read()
            .history
            .iter()
            .filter(|a| a.original_modal_id == original_modal_id)
            .cloned()
            .collect()
    }

    /// `{id}_adapted_{suffix}`, re-rolled until it collides with no
    /// registered id.
    fn derive_id(&self, modal_id: &str) -> String {
        loop {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            let candidate = format!("{modal_id}_adapted_{}", &suffix[..12]);
            if !self.orchestration.is_registered(&candidate) {
                return candidate;
            }
        }
    }
}

fn validate_rule(rule: &AdaptationRule) -> AdaptationResult<()> {
    let invalid = |reason: &str| AdaptationError::InvalidRule {
        rule_id: rule.id.clone(),
        reason: reason.to_string(),
    };
    if rule.id.trim().is_empty() {
        return Err(invalid("empty id"));
    }
    if rule.actions.is_empty() {
        return Err(invalid("no actions"));
    }
    Ok(())
}

fn render(template: &str, modal_name: &str, old: &Value, new: &Value) -> String {
    template
        .replace("{modal}", modal_name)
        .replace("{old}", &plain(old))
        .replace("{new}", &plain(new))
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
