//! Resource admission control for modal activation.
//!
//! The aggregate ceiling in every dimension is
//! `per_modal_limit × max_concurrent_modals`; a request is admitted only when
//! the summed usage of the active set plus the request fits in all three
//! dimensions at once.

use modal_kernel::{ModalOrchestrationConfig, ResourceUsage};
use serde::{Deserialize, Serialize};

/// The outcome of an admission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmissionOutcome {
    /// Request fits under the ceiling.
    Accept,
    /// Request would push at least one dimension over the ceiling.
    Reject,
}

impl std::fmt::Display for AdmissionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "Accept"),
            Self::Reject => write!(f, "Reject"),
        }
    }
}

/// Full admission decision with diagnostic metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionDecision {
    pub outcome: AdmissionOutcome,
    /// Human-readable reason for the decision.
    pub reason: String,
    /// Summed usage of the active set at decision time.
    pub current_usage: ResourceUsage,
    pub requested: ResourceUsage,
    pub ceiling: ResourceUsage,
    /// Dimensions that would overflow (`memory`, `cpu`, `network`).
    pub exceeded: Vec<&'static str>,
}

impl AdmissionDecision {
    pub fn is_accepted(&self) -> bool {
        self.outcome == AdmissionOutcome::Accept
    }

    pub fn is_rejected(&self) -> bool {
        self.outcome == AdmissionOutcome::Reject
    }
}

/// Stateless admission check over a configuration snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionController {
    ceiling: ResourceUsage,
}

impl AdmissionController {
    pub fn new(ceiling: ResourceUsage) -> Self {
        Self { ceiling }
    }

    pub fn from_config(config: &ModalOrchestrationConfig) -> Self {
        Self::new(config.resource_ceiling())
    }

    pub fn ceiling(&self) -> ResourceUsage {
        self.ceiling
    }

    /// Evaluate `requested` on top of the usage samples of every active modal.
    pub fn evaluate<'a, I>(&self, active_usage: I, requested: ResourceUsage) -> AdmissionDecision
    where
        I: IntoIterator<Item = &'a ResourceUsage>,
    {
        let current_usage: ResourceUsage = active_usage.into_iter().copied().sum();
        let projected = current_usage + requested;

        let mut exceeded = Vec::new();
        if projected.memory > self.ceiling.memory {
            exceeded.push("memory");
        }
        if projected.cpu > self.ceiling.cpu {
            exceeded.push("cpu");
        }
        if projected.network > self.ceiling.network {
            exceeded.push("network");
        }

        let (outcome, reason) = if exceeded.is_empty() {
            (
                AdmissionOutcome::Accept,
                "Resources available".to_string(),
            )
        } else {
            (
                AdmissionOutcome::Reject,
                format!("Resource ceiling exceeded for {}", exceeded.join(", ")),
            )
        };

        AdmissionDecision {
            outcome,
            reason,
            current_usage,
            requested,
            ceiling: self.ceiling,
            exceeded,
        }
    }
}
