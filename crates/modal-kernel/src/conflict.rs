//! Conflict records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Resource,
    Data,
    Recommendation,
    Activation,
}

/// How a detected conflict is to be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Decided by descriptor priority.
    #[default]
    Priority,
    /// Needs agreement between the modals; cannot be decided by the engine.
    Consensus,
    /// Needs the user to pick.
    UserChoice,
    /// Postponed.
    Defer,
}

/// A simultaneous-activation conflict between two or more modals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalConflict {
    /// Candidate first, then the active modal(s) it collides with.
    pub modal_ids: Vec<String>,
    pub conflict_type: ConflictType,
    pub resolution_strategy: ResolutionStrategy,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    pub timestamp_ms: u64,
}

impl ModalConflict {
    pub fn involves(&self, modal_id: &str) -> bool {
        self.modal_ids.iter().any(|id| id == modal_id)
    }
}
