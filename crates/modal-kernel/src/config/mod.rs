//! Orchestration configuration
//!
//! [`ModalOrchestrationConfig`] is supplied when an engine is built and can be
//! patched at runtime through [`ModalConfigUpdate`]. With the `config` feature
//! enabled, [`loader`] reads it (or any other serde type) from YAML, TOML,
//! JSON, INI, RON or JSON5 files with `${VAR}` environment substitution.

use serde::{Deserialize, Serialize};

use crate::activation::ResourceUsage;
use crate::conflict::ResolutionStrategy;

#[cfg(feature = "config")]
pub mod loader;
#[cfg(feature = "config")]
pub use loader::*;

/// How per-modal resource budgets are handed out. Informational for the
/// admission controller, which always enforces the aggregate ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAllocationStrategy {
    #[default]
    Dynamic,
    Static,
    Priority,
}

/// What a `priority` conflict decision does to the losing side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolutionMode {
    /// Mark resolved and keep both modals active.
    #[default]
    AdmitAll,
    /// Deny the candidate unless it outranks every conflicting active modal.
    DenyLowerPriority,
    /// Admit a higher-priority candidate and deactivate the outranked modals;
    /// deny otherwise.
    EvictLowerPriority,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalOrchestrationConfig {
    pub max_concurrent_modals: u32,
    pub resource_allocation_strategy: ResourceAllocationStrategy,
    /// MB
    pub memory_limit_per_modal: f64,
    /// percent of one core
    pub cpu_limit_per_modal: f64,
    /// KB/s
    pub network_limit_per_modal: f64,
    pub enable_modal_caching: bool,
    pub cache_ttl_secs: u64,
    pub lazy_loading_enabled: bool,
    /// Modal ids installed by `preload`.
    pub preload_strategies: Vec<String>,
    /// Retention of every engine log.
    pub history_limit: usize,
    pub conflict_resolution_strategy: ResolutionStrategy,
    pub conflict_resolution_mode: ConflictResolutionMode,
    /// Nominal request used when the service activates a modal on demand.
    pub default_resource_request: ResourceUsage,
}

impl Default for ModalOrchestrationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_modals: 5,
            resource_allocation_strategy: ResourceAllocationStrategy::Dynamic,
            memory_limit_per_modal: 100.0,
            cpu_limit_per_modal: 20.0,
            network_limit_per_modal: 10.0,
            enable_modal_caching: true,
            cache_ttl_secs: 300,
            lazy_loading_enabled: true,
            preload_strategies: Vec::new(),
            history_limit: 1000,
            conflict_resolution_strategy: ResolutionStrategy::Priority,
            conflict_resolution_mode: ConflictResolutionMode::AdmitAll,
            default_resource_request: ResourceUsage::new(10.0, 5.0, 1.0),
        }
    }
}

impl ModalOrchestrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent_modals(mut self, max: u32) -> Self {
        self.max_concurrent_modals = max;
        self
    }

    pub fn with_limits(mut self, memory: f64, cpu: f64, network: f64) -> Self {
        self.memory_limit_per_modal = memory;
        self.cpu_limit_per_modal = cpu;
        self.network_limit_per_modal = network;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_conflict_mode(mut self, mode: ConflictResolutionMode) -> Self {
        self.conflict_resolution_mode = mode;
        self
    }

    pub fn with_conflict_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.conflict_resolution_strategy = strategy;
        self
    }

    /// `per_modal_limit × max_concurrent_modals` in every dimension.
    pub fn resource_ceiling(&self) -> ResourceUsage {
        ResourceUsage::new(
            self.memory_limit_per_modal,
            self.cpu_limit_per_modal,
            self.network_limit_per_modal,
        )
        .scaled(self.max_concurrent_modals as f64)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: ModalConfigUpdate) {
        let ModalConfigUpdate {
            max_concurrent_modals,
            resource_allocation_strategy,
            memory_limit_per_modal,
            cpu_limit_per_modal,
            network_limit_per_modal,
            enable_modal_caching,
            cache_ttl_secs,
            lazy_loading_enabled,
            preload_strategies,
            history_limit,
            conflict_resolution_strategy,
            conflict_resolution_mode,
            default_resource_request,
        } = update;

        if let Some(v) = max_concurrent_modals {
            self.max_concurrent_modals = v;
        }
        if let Some(v) = resource_allocation_strategy {
            self.resource_allocation_strategy = v;
        }
        if let Some(v) = memory_limit_per_modal {
            self.memory_limit_per_modal = v;
        }
        if let Some(v) = cpu_limit_per_modal {
            self.cpu_limit_per_modal = v;
        }
        if let Some(v) = network_limit_per_modal {
            self.network_limit_per_modal = v;
        }
        if let Some(v) = enable_modal_caching {
            self.enable_modal_caching = v;
        }
        if let Some(v) = cache_ttl_secs {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = lazy_loading_enabled {
            self.lazy_loading_enabled = v;
        }
        if let Some(v) = preload_strategies {
            self.preload_strategies = v;
        }
        if let Some(v) = history_limit {
            self.history_limit = v;
        }
        if let Some(v) = conflict_resolution_strategy {
            self.conflict_resolution_strategy = v;
        }
        if let Some(v) = conflict_resolution_mode {
            self.conflict_resolution_mode = v;
        }
        if let Some(v) = default_resource_request {
            self.default_resource_request = v;
        }
    }
}

/// Partial configuration update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfigUpdate {
    pub max_concurrent_modals: Option<u32>,
    pub resource_allocation_strategy: Option<ResourceAllocationStrategy>,
    pub memory_limit_per_modal: Option<f64>,
    pub cpu_limit_per_modal: Option<f64>,
    pub network_limit_per_modal: Option<f64>,
    pub enable_modal_caching: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
    pub lazy_loading_enabled: Option<bool>,
    pub preload_strategies: Option<Vec<String>>,
    pub history_limit: Option<usize>,
    pub conflict_resolution_strategy: Option<ResolutionStrategy>,
    pub conflict_resolution_mode: Option<ConflictResolutionMode>,
    pub default_resource_request: Option<ResourceUsage>,
}
