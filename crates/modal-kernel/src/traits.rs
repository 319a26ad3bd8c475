//! Collaborator contracts injected by the host application.
//!
//! The kernel never says *how* descriptors are fetched or what a modal does
//! when it runs; it only fixes the shape of those calls.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::context::ModalContext;
use crate::descriptor::ModalDescriptor;

// ---------------------------------------------------------------------------
// Clock abstraction (injectable for testing)
// ---------------------------------------------------------------------------

/// Provides the current wall-clock time as Unix-epoch milliseconds.
///
/// Every timestamp the engines write goes through this trait so tests can
/// pin time.
pub trait Clock: Send + Sync {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;

    /// The current time as a `chrono` UTC timestamp.
    fn now_utc(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.now_millis() as i64).unwrap_or_default()
    }
}

/// The default [`Clock`] implementation backed by the system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Failure raised by a [`ModalLoader`] implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoaderError {
    /// The backing source could not be reached.
    #[error("Modal source unavailable: {0}")]
    Unavailable(String),

    /// The source returned something that is not a descriptor.
    #[error("Malformed modal descriptor for {modal_id}: {reason}")]
    Malformed { modal_id: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Fetches descriptors by id. `Ok(None)` means "no such modal".
#[async_trait]
pub trait ModalLoader: Send + Sync {
    async fn load(&self, modal_id: &str) -> Result<Option<ModalDescriptor>, LoaderError>;
}

/// In-memory loader over a fixed catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticModalLoader {
    catalog: HashMap<String, ModalDescriptor>,
}

impl StaticModalLoader {
    pub fn new(descriptors: impl IntoIterator<Item = ModalDescriptor>) -> Self {
        Self {
            catalog: descriptors
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.catalog.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl ModalLoader for StaticModalLoader {
    async fn load(&self, modal_id: &str) -> Result<Option<ModalDescriptor>, LoaderError> {
        Ok(self.catalog.get(modal_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Failure raised by a [`ModalExecutor`] implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutorError {
    #[error("Modal {modal_id} failed: {reason}")]
    Failed { modal_id: String, reason: String },

    #[error("Invalid input for modal {modal_id}: {reason}")]
    InvalidInput { modal_id: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Runs the actual feature behaviour of a modal.
#[async_trait]
pub trait ModalExecutor: Send + Sync {
    async fn execute(
        &self,
        modal_id: &str,
        context: &ModalContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ExecutorError>;
}
