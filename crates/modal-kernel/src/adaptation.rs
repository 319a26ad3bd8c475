//! Adaptation rule types and the interpreter contracts.
//!
//! Rules are `conditions → actions` pairs. Conditions and actions are closed
//! enums so every evaluator and applier is an exhaustive `match`; the
//! [`ConditionEvaluator`] and [`ActionApplier`] traits let a host swap in its
//! own interpretation without touching the engine that drives them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ModalAdaptationContext;
use crate::descriptor::ModalDescriptor;

// ============================================================================
// Conditions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationStrategy {
    EnergyBased,
    PerformanceBased,
    ScheduleBased,
    ContextAware,
}

/// What a condition reads from the adaptation context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionSubject {
    /// Self-reported energy level (1–10).
    EnergyLevel,
    /// Recovery score (0–100).
    RecoveryScore,
    /// Whole days since the most recent workout, rounded up.
    TrainingDelay,
    /// `true` when recent session durations have stopped changing.
    PerformancePlateau,
    /// Dot-separated path into the serialized context, e.g. `user_data.goal`.
    Field { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
}

impl ComparisonOperator {
    /// Compare `actual` against `expected`.
    ///
    /// Numbers compare numerically. Ordering operators on anything else are
    /// false; `eq`/`neq` fall back to JSON equality.
    pub fn compare(self, actual: &Value, expected: &Value) -> bool {
        if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
            return match self {
                Self::Lt => a < b,
                Self::Lte => a <= b,
                Self::Gt => a > b,
                Self::Gte => a >= b,
                Self::Eq => (a - b).abs() < f64::EPSILON,
                Self::Neq => (a - b).abs() >= f64::EPSILON,
            };
        }
        match self {
            Self::Eq => actual == expected,
            Self::Neq => actual != expected,
            Self::Lt | Self::Lte | Self::Gt | Self::Gte => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub subject: ConditionSubject,
    pub operator: ComparisonOperator,
    pub value: Value,
}

impl Condition {
    pub fn new(
        subject: ConditionSubject,
        operator: ComparisonOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            subject,
            operator,
            value: value.into(),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

pub const DEFAULT_RESCHEDULE_HOURS: i64 = 24;

fn default_reschedule_hours() -> i64 {
    DEFAULT_RESCHEDULE_HOURS
}

/// One mutation applied to a cloned modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdaptationAction {
    /// Move `round(percentage / 20)` steps on the intensity scale.
    AdjustIntensity { percentage: f64 },
    /// `max(1, round(series × (1 + percentage / 100)))`.
    ModifySeries { percentage: f64 },
    /// `max(5, duration + minutes)`.
    ChangeDuration { minutes: i64 },
    /// Push the scheduled session forward.
    RescheduleSession {
        #[serde(default = "default_reschedule_hours")]
        hours: i64,
    },
    /// Relabel the modal to an alternative variant.
    SuggestAlternative { alternative: String },
}

impl AdaptationAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdjustIntensity { .. } => "adjust_intensity",
            Self::ModifySeries { .. } => "modify_series",
            Self::ChangeDuration { .. } => "change_duration",
            Self::RescheduleSession { .. } => "reschedule_session",
            Self::SuggestAlternative { .. } => "suggest_alternative",
        }
    }
}

fn default_confidence() -> f64 {
    0.8
}

/// An action together with how it is explained to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub action: AdaptationAction,
    /// Explanation text; `{modal}`, `{old}` and `{new}` are substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl RuleAction {
    pub fn new(action: AdaptationAction) -> Self {
        Self {
            action,
            explanation: None,
            confidence: default_confidence(),
        }
    }

    pub fn with_explanation(mut self, template: &str) -> Self {
        self.explanation = Some(template.to_string());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

fn default_true() -> bool {
    true
}

/// A prioritised `conditions → actions` rule. Conditions are AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationRule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub strategy: AdaptationStrategy,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub actions: Vec<RuleAction>,
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl AdaptationRule {
    pub fn new(id: &str, strategy: AdaptationStrategy) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            strategy,
            conditions: Vec::new(),
            actions: Vec::new(),
            priority: 0,
            enabled: true,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn then(mut self, action: RuleAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Partial update for an existing rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<RuleAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl RuleUpdate {
    pub fn apply_to(self, rule: &mut AdaptationRule) {
        if let Some(name) = self.name {
            rule.name = name;
        }
        if let Some(conditions) = self.conditions {
            rule.conditions = conditions;
        }
        if let Some(actions) = self.actions {
            rule.actions = actions;
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adaptation {
    pub rule_id: String,
    pub action: AdaptationAction,
    pub old_value: Value,
    pub new_value: Value,
    pub confidence: f64,
}

/// A copy-on-write derivative of a registered modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptedModal {
    pub original_modal_id: String,
    pub adapted_modal_id: String,
    /// The adapted copy; `modal.id == adapted_modal_id`.
    pub modal: ModalDescriptor,
    pub adaptations_applied: Vec<Adaptation>,
    pub explanation: String,
    pub timestamp_ms: u64,
}

/// What an [`ActionApplier`] changed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange {
    pub old_value: Value,
    pub new_value: Value,
    /// Phrase used when the rule action carries no explanation template.
    pub default_explanation: String,
}

// ============================================================================
// Interpreter contracts
// ============================================================================

/// Decides whether a single condition holds.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        condition: &Condition,
        context: &ModalAdaptationContext,
        now: DateTime<Utc>,
    ) -> bool;
}

/// Applies a single action to a cloned modal.
pub trait ActionApplier: Send + Sync {
    fn apply(
        &self,
        action: &AdaptationAction,
        modal: &mut ModalDescriptor,
        now: DateTime<Utc>,
    ) -> AppliedChange;
}
