//! Orchestration service
//!
//! Wraps a [`ModalOrchestrationEngine`] with the asynchronous collaborators:
//! a [`ModalLoader`] that fetches descriptors and a [`ModalExecutor`] that
//! runs modals. Loader and executor calls are the only suspension points; the
//! engine lock is never held across them.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use error_stack::{Report, ResultExt};
use futures::future::{BoxFuture, FutureExt};
use modal_foundation::ModalOrchestrationEngine;
use modal_kernel::config::load_orchestration_config;
use modal_kernel::{
    ActivationPriority, ModalActivationRequest, ModalActivationResponse, ModalContext,
    ModalDescriptor, ModalExecutor, ModalLoader, Platform,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::DescriptorCache;
use crate::error::{ServiceError, ServiceResult};

/// User id attached to activations the service performs on its own behalf
/// (eager activation on install).
pub const SYSTEM_USER: &str = "system";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalInstallRequest {
    pub modal_id: String,
    /// Context used when the modal is activated right after installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ModalContext>,
    #[serde(default)]
    pub priority: ActivationPriority,
}

impl ModalInstallRequest {
    pub fn new(modal_id: &str) -> Self {
        Self {
            modal_id: modal_id.to_string(),
            context: None,
            priority: ActivationPriority::Medium,
        }
    }

    pub fn with_context(mut self, context: ModalContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_priority(mut self, priority: ActivationPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Result of [`ModalOrchestrationService::install_modal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallOutcome {
    pub modal_id: String,
    pub success: bool,
    /// The modal was registered before this call.
    pub already_installed: bool,
    /// Dependencies registered by this call, in installation order.
    pub installed_dependencies: Vec<String>,
    /// Activated immediately because lazy loading is off.
    pub activated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallOutcome {
    fn installed(modal_id: &str, installed_dependencies: Vec<String>) -> Self {
        Self {
            modal_id: modal_id.to_string(),
            success: true,
            already_installed: false,
            installed_dependencies,
            activated: false,
            error: None,
        }
    }

    fn already_installed(modal_id: &str) -> Self {
        Self {
            already_installed: true,
            ..Self::installed(modal_id, Vec::new())
        }
    }

    fn failed(modal_id: &str, error: String, installed_dependencies: Vec<String>) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::installed(modal_id, installed_dependencies)
        }
    }
}

/// Traversal state of one `install_modal` call.
#[derive(Default)]
struct InstallWalk {
    /// Modals currently being installed, outermost first.
    path: Vec<String>,
    in_progress: HashSet<String>,
    installed_dependencies: Vec<String>,
}

pub struct ModalOrchestrationService {
    engine: Arc<ModalOrchestrationEngine>,
    loader: Arc<dyn ModalLoader>,
    executor: Option<Arc<dyn ModalExecutor>>,
    cache: DescriptorCache,
}

impl ModalOrchestrationService {
    pub fn new(engine: Arc<ModalOrchestrationEngine>, loader: Arc<dyn ModalLoader>) -> Self {
        Self {
            engine,
            loader,
            executor: None,
            cache: DescriptorCache::new(),
        }
    }

    /// Build the engine from a configuration file (any supported format,
    /// `MODAL__*` environment overrides applied).
    pub fn from_config_file(path: &str, loader: Arc<dyn ModalLoader>) -> ServiceResult<Self> {
        let config = load_orchestration_config(path)
            .map_err(ServiceError::from)
            .map_err(Report::new)
            .attach(format!("loading orchestration config from {path}"))?;
        Ok(Self::new(
            Arc::new(ModalOrchestrationEngine::new(config)),
            loader,
        ))
    }

    pub fn with_executor(mut self, executor: Arc<dyn ModalExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn engine(&self) -> &Arc<ModalOrchestrationEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    // ========================================================================
    // Installation
    // ========================================================================

    /// Load and register a modal, installing missing dependencies first
    /// (depth-first).
    ///
    /// An unknown id, a dependency cycle or a rejected descriptor yields an
    /// unsuccessful [`InstallOutcome`] listing the dependencies that did get
    /// installed. Loader failures are returned as errors.
    pub async fn install_modal(
        &self,
        request: ModalInstallRequest,
    ) -> ServiceResult<InstallOutcome> {
        let modal_id = request.modal_id.as_str();

        if self.engine.is_registered(modal_id) {
            tracing::debug!(modal_id = %modal_id, "modal already installed");
            return Ok(InstallOutcome::already_installed(modal_id));
        }

        let mut walk = InstallWalk::default();
        if let Err(reason) = self.install_recursive(modal_id, &mut walk).await? {
            tracing::warn!(modal_id = %modal_id, reason = %reason, "modal installation failed");
            return Ok(InstallOutcome::failed(modal_id, reason, walk.installed_dependencies));
        }

        let mut outcome = InstallOutcome::installed(modal_id, walk.installed_dependencies);
        tracing::info!(
            modal_id = %modal_id,
            dependencies = outcome.installed_dependencies.len(),
            "modal installed"
        );

        if !self.engine.config().lazy_loading_enabled {
            let context = request
                .context
                .clone()
                .unwrap_or_else(|| ModalContext::new(SYSTEM_USER, Platform::Web));
            let response = self.activate(
                modal_id,
                context,
                request.priority,
                "eager activation on install",
            );
            outcome.activated = response.activated;
            if !response.success {
                tracing::warn!(
                    modal_id = %modal_id,
                    error = ?response.error_message,
                    "installed modal could not be activated"
                );
            }
        }

        Ok(outcome)
    }

    /// `Ok(Err(reason))` is a structured install failure; `Err` is a loader error.
    fn install_recursive<'a>(
        &'a self,
        modal_id: &'a str,
        walk: &'a mut InstallWalk,
    ) -> BoxFuture<'a, ServiceResult<Result<(), String>>> {
        async move {
            if self.engine.is_registered(modal_id) {
                return Ok(Ok(()));
            }
            if walk.in_progress.contains(modal_id) {
                let cycle = walk
                    .path
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(modal_id))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Ok(Err(format!("Dependency cycle detected: {cycle}")));
            }

            let Some(descriptor) = self.fetch_descriptor(modal_id).await? else {
                return Ok(Err(format!("Modal not found: {modal_id}")));
            };

            walk.path.push(modal_id.to_string());
            walk.in_progress.insert(modal_id.to_string());

            for dependency in &descriptor.dependencies {
                let result = self.install_recursive(dependency, walk).await;
                match result {
                    Ok(Ok(())) => {}
                    other => {
                        walk.path.pop();
                        walk.in_progress.remove(modal_id);
                        return other;
                    }
                }
            }

            walk.path.pop();
            walk.in_progress.remove(modal_id);

            if let Err(err) = self.engine.validate_registration(&descriptor) {
                return Ok(Err(err.to_string()));
            }
            if !self.engine.register_modal(descriptor) {
                return Ok(Err(format!("Registration of {modal_id} was rejected")));
            }

            if !walk.path.is_empty() {
                walk.installed_dependencies.push(modal_id.to_string());
            }
            Ok(Ok(()))
        }
        .boxed()
    }

    async fn fetch_descriptor(&self, modal_id: &str) -> ServiceResult<Option<ModalDescriptor>> {
        let config = self.engine.config();
        let now = self.engine.clock().now_millis();

        if config.enable_modal_caching {
            if let Some(descriptor) = self.cache.get(modal_id, config.cache_ttl_secs, now) {
                tracing::debug!(modal_id = %modal_id, "descriptor served from cache");
                return Ok(Some(descriptor));
            }
        }

        let loaded = self
            .loader
            .load(modal_id)
            .await
            .map_err(ServiceError::from)
            .map_err(Report::new)
            .attach(format!("loading modal {modal_id}"))?;

        if let (true, Some(descriptor)) = (config.enable_modal_caching, &loaded) {
            self.cache.insert(descriptor.clone(), now);
        }
        Ok(loaded)
    }

    /// Unregister a modal (deactivating it first) and forget its cached
    /// descriptor.
    pub fn uninstall_modal(&self, modal_id: &str) -> bool {
        self.cache.invalidate(modal_id);
        let removed = self.engine.unregister_modal(modal_id);
        if removed {
            tracing::info!(modal_id = %modal_id, "modal uninstalled");
        }
        removed
    }

    /// Install every id listed in `preload_strategies`.
    pub async fn preload(&self) -> ServiceResult<Vec<InstallOutcome>> {
        let ids = self.engine.config().preload_strategies;
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self
                .install_modal(ModalInstallRequest::new(&id))
                .await
                .attach(format!("preloading {id}"))?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run a modal through the executor, installing and activating it first
    /// when needed. Execution time and outcome are folded into the modal's
    /// metrics.
    pub async fn execute_modal(
        &self,
        modal_id: &str,
        context: ModalContext,
        input: Value,
    ) -> ServiceResult<Value> {
        let executor = self
            .executor
            .clone()
            .ok_or_else(|| Report::new(ServiceError::ExecutorMissing))?;

        if !self.engine.is_registered(modal_id) {
            let outcome = self
                .install_modal(ModalInstallRequest::new(modal_id).with_context(context.clone()))
                .await
                .attach(format!("installing {modal_id} before execution"))?;
            if !outcome.success {
                return Err(Report::new(ServiceError::InstallFailed {
                    modal_id: modal_id.to_string(),
                    reason: outcome.error.unwrap_or_default(),
                }));
            }
        }

        if !self.engine.is_active(modal_id) {
            let response =
                self.activate(modal_id, context.clone(), ActivationPriority::Medium, "execute");
            if !response.success {
                return Err(Report::new(ServiceError::ActivationFailed {
                    modal_id: modal_id.to_string(),
                    reason: response.error_message.unwrap_or_default(),
                }));
            }
        }

        let started = Instant::now();
        let result = executor.execute(modal_id, &context, input).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.engine.record_execution(modal_id, elapsed_ms, result.is_ok());

        match result {
            Ok(output) => {
                tracing::debug!(modal_id = %modal_id, elapsed_ms, "modal executed");
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(modal_id = %modal_id, error = %err, "modal execution failed");
                Err(Report::new(ServiceError::from(err))
                    .attach(format!("executing modal {modal_id}")))
            }
        }
    }

    // ========================================================================
    // Orchestration
    // ========================================================================

    /// Request activation of every compatible modal, highest priority first.
    /// Responses are in the same order as `get_compatible_modals`.
    pub fn orchestrate(&self, context: &ModalContext) -> Vec<ModalActivationResponse> {
        self.engine
            .get_compatible_modals(context)
            .iter()
            .map(|id| self.activate(id, context.clone(), ActivationPriority::Medium, "orchestrate"))
            .collect()
    }

    fn activate(
        &self,
        modal_id: &str,
        context: ModalContext,
        priority: ActivationPriority,
        reason: &str,
    ) -> ModalActivationResponse {
        let resources = self.engine.config().default_resource_request;
        self.engine.activate_modal(
            ModalActivationRequest::new(modal_id, context, resources)
                .with_priority(priority)
                .with_reason(reason),
        )
    }
}
