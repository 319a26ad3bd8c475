//! Catalog files: an optional engine configuration plus the modal descriptors.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use modal_kernel::{ModalDescriptor, ModalOrchestrationConfig, StaticModalLoader};
use modal_runtime::{InstallOutcome, ModalInstallRequest, ModalOrchestrationService};
use modal_foundation::ModalOrchestrationEngine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub config: ModalOrchestrationConfig,
    #[serde(default)]
    pub modals: Vec<ModalDescriptor>,
}

/// One problem found by [`Catalog::problems`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogProblem {
    pub modal_id: String,
    pub problem: String,
}

impl Catalog {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        modal_kernel::config::load_config(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))
    }

    /// Descriptor validation plus duplicate ids and dependencies the catalog
    /// cannot satisfy.
    pub fn problems(&self) -> Vec<CatalogProblem> {
        let ids: BTreeSet<&str> = self.modals.iter().map(|m| m.id.as_str()).collect();
        let mut seen = BTreeSet::new();
        let mut problems = Vec::new();

        for modal in &self.modals {
            let mut report = |problem: String| {
                problems.push(CatalogProblem {
                    modal_id: modal.id.clone(),
                    problem,
                })
            };
            if let Err(err) = modal.validate() {
                report(err.to_string());
            }
            if !seen.insert(modal.id.as_str()) {
                report("duplicate id".to_string());
            }
            for dependency in &modal.dependencies {
                if !ids.contains(dependency.as_str()) {
                    report(format!("unknown dependency: {dependency}"));
                }
            }
        }
        problems
    }

    /// Build a service over this catalog and install every modal through it,
    /// so dependencies are registered in order whatever the file order.
    pub async fn install(self) -> anyhow::Result<(ModalOrchestrationService, Vec<InstallOutcome>)> {
        let ids: Vec<String> = self.modals.iter().map(|m| m.id.clone()).collect();
        let engine = Arc::new(ModalOrchestrationEngine::new(self.config));
        let loader = Arc::new(StaticModalLoader::new(self.modals));
        let service = ModalOrchestrationService::new(engine, loader);

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = service
                .install_modal(ModalInstallRequest::new(&id))
                .await
                .map_err(|report| anyhow::anyhow!("{report:?}"))
                .with_context(|| format!("installing {id}"))?;
            if let Some(error) = &outcome.error {
                tracing::warn!(modal_id = %id, error = %error, "modal not installed");
            }
            outcomes.push(outcome);
        }
        Ok((service, outcomes))
    }
}
