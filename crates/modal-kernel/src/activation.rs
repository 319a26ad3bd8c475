//! Activation requests and responses.

use serde::{Deserialize, Serialize};

use crate::context::ModalContext;

/// Urgency attached to an activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A three-dimensional resource vector (memory in MB, cpu in percent of a
/// core, network in KB/s). Used both for requests and for tracked usage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub memory: f64,
    pub cpu: f64,
    pub network: f64,
}

impl ResourceUsage {
    pub const ZERO: ResourceUsage = ResourceUsage {
        memory: 0.0,
        cpu: 0.0,
        network: 0.0,
    };

    pub fn new(memory: f64, cpu: f64, network: f64) -> Self {
        Self {
            memory,
            cpu,
            network,
        }
    }

    /// Component-wise multiplication by a scalar.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.memory * factor, self.cpu * factor, self.network * factor)
    }

    /// Every component is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.memory, self.cpu, self.network]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// `true` when every component is ≤ the matching component of `ceiling`.
    pub fn fits_within(&self, ceiling: &ResourceUsage) -> bool {
        self.memory <= ceiling.memory && self.cpu <= ceiling.cpu && self.network <= ceiling.network
    }
}

impl std::ops::Add for ResourceUsage {
    type Output = ResourceUsage;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.memory + rhs.memory,
            self.cpu + rhs.cpu,
            self.network + rhs.network,
        )
    }
}

impl std::iter::Sum for ResourceUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, u| acc + u)
    }
}

/// Request to admit a modal into the active set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalActivationRequest {
    pub modal_id: String,
    pub context: ModalContext,
    #[serde(default)]
    pub priority: ActivationPriority,
    #[serde(default)]
    pub reason: String,
    pub required_resources: ResourceUsage,
}

impl ModalActivationRequest {
    pub fn new(modal_id: &str, context: ModalContext, required_resources: ResourceUsage) -> Self {
        Self {
            modal_id: modal_id.to_string(),
            context,
            priority: ActivationPriority::Medium,
            reason: String::new(),
            required_resources,
        }
    }

    pub fn with_priority(mut self, priority: ActivationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }
}

/// Outcome of an activation attempt. Never retained by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalActivationResponse {
    pub success: bool,
    pub activated: bool,
    pub resource_usage: ResourceUsage,
    pub execution_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ModalActivationResponse {
    pub fn activated(resource_usage: ResourceUsage, execution_time_ms: f64) -> Self {
        Self {
            success: true,
            activated: true,
            resource_usage,
            execution_time_ms,
            error_message: None,
        }
    }

    pub fn failed(error: impl Into<String>, execution_time_ms: f64) -> Self {
        Self {
            success: false,
            activated: false,
            resource_usage: ResourceUsage::ZERO,
            execution_time_ms,
            error_message: Some(error.into()),
        }
    }
}
