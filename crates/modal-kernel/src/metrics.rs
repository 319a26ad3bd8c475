//! Per-modal performance metrics.

use serde::{Deserialize, Serialize};

use crate::activation::ResourceUsage;

/// Running statistics for one registered modal. Created zeroed at
/// registration and dropped at unregistration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub activation_count: u64,
    /// Number of executor invocations.
    pub execution_count: u64,
    /// Running mean over activations and executions, in milliseconds.
    pub average_execution_time_ms: f64,
    /// Failed executions / executions, 0.0–1.0
    pub error_rate: f64,
    /// Running mean of the resources requested at activation.
    pub average_resource_usage: ResourceUsage,
    /// Host-reported satisfaction, 0.0–5.0
    pub user_satisfaction: f64,
    pub last_updated_ms: u64,
    #[serde(default)]
    failed_executions: u64,
    #[serde(default)]
    timed_samples: u64,
}

impl PerformanceMetrics {
    /// Empty metrics stamped at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            last_updated_ms: now_ms,
            ..Default::default()
        }
    }

    /// Fold one successful activation into the running averages.
    pub fn record_activation(&mut self, requested: ResourceUsage, elapsed_ms: f64, now_ms: u64) {
        self.activation_count += 1;
        let n = self.activation_count as f64;
        self.average_resource_usage = self
            .average_resource_usage
            .scaled((n - 1.0) / n)
            + requested.scaled(1.0 / n);
        self.record_timing(elapsed_ms);
        self.last_updated_ms = now_ms;
    }

    /// Fold one executor run into the error rate and timing average.
    pub fn record_execution(&mut self, elapsed_ms: f64, success: bool, now_ms: u64) {
        self.execution_count += 1;
        if !success {
            self.failed_executions += 1;
        }
        self.error_rate = self.failed_executions as f64 / self.execution_count as f64;
        self.record_timing(elapsed_ms);
        self.last_updated_ms = now_ms;
    }

    pub fn record_satisfaction(&mut self, score: f64, now_ms: u64) {
        self.user_satisfaction = score.clamp(0.0, 5.0);
        self.last_updated_ms = now_ms;
    }

    fn record_timing(&mut self, elapsed_ms: f64) {
        self.timed_samples += 1;
        let n = self.timed_samples as f64;
        self.average_execution_time_ms += (elapsed_ms - self.average_execution_time_ms) / n;
    }
}
