//! Modal Testing Framework
//!
//! Test doubles for the loader and executor contracts, descriptor fixtures
//! and assertion macros for exercising the orchestration stack without a
//! real catalog or feature implementations.

pub mod fixtures;

use async_trait::async_trait;
use modal_kernel::{
    ExecutorError, LoaderError, ModalContext, ModalDescriptor, ModalExecutor, ModalLoader,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A mock loader over an in-memory catalog.
///
/// Every lookup is recorded so tests can assert on cache hits and install
/// order. The whole source can be switched offline to simulate outages.
#[derive(Clone, Default)]
pub struct MockLoader {
    catalog: Arc<RwLock<HashMap<String, ModalDescriptor>>>,
    offline: Arc<RwLock<Option<String>>>,
    /// Track every id that was requested
    pub call_history: Arc<RwLock<Vec<String>>>,
}

impl MockLoader {
    pub fn new(descriptors: impl IntoIterator<Item = ModalDescriptor>) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(
                descriptors.into_iter().map(|d| (d.id.clone(), d)).collect(),
            )),
            ..Default::default()
        }
    }

    pub async fn insert(&self, descriptor: ModalDescriptor) {
        self.catalog.write().await.insert(descriptor.id.clone(), descriptor);
    }

    /// Make every subsequent load fail with `LoaderError::Unavailable`.
    pub async fn go_offline(&self, reason: &str) {
        *self.offline.write().await = Some(reason.to_string());
    }

    pub async fn history(&self) -> Vec<String> {
        self.call_history.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.call_history.read().await.len()
    }

    pub fn name(&self) -> &str {
        "MockLoader"
    }
}

#[async_trait]
impl ModalLoader for MockLoader {
    async fn load(&self, modal_id: &str) -> Result<Option<ModalDescriptor>, LoaderError> {
        self.call_history.write().await.push(modal_id.to_string());
        if let Some(reason) = self.offline.read().await.clone() {
            return Err(LoaderError::Unavailable(reason));
        }
        Ok(self.catalog.read().await.get(modal_id).cloned())
    }
}

/// One recorded executor invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorCall {
    pub modal_id: String,
    pub user_id: String,
    pub input: Value,
}

/// A mock executor with stubbed per-modal outcomes.
///
/// Modals without a stub echo their input back.
#[derive(Clone, Default)]
pub struct MockExecutor {
    stubs: Arc<RwLock<HashMap<String, Result<Value, String>>>>,
    /// Track all invocations
    pub call_history: Arc<RwLock<Vec<ExecutorCall>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output `modal_id` produces.
    pub async fn set_result(&self, modal_id: &str, output: Value) {
        self.stubs.write().await.insert(modal_id.to_string(), Ok(output));
    }

    /// Makes `modal_id` fail with `ExecutorError::Failed`.
    pub async fn set_failure(&self, modal_id: &str, reason: &str) {
        self.stubs
            .write()
            .await
            .insert(modal_id.to_string(), Err(reason.to_string()));
    }

    pub async fn history(&self) -> Vec<ExecutorCall> {
        self.call_history.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.call_history.read().await.len()
    }

    pub async fn calls_for(&self, modal_id: &str) -> usize {
        self.call_history
            .read()
            .await
            .iter()
            .filter(|c| c.modal_id == modal_id)
            .count()
    }

    pub fn name(&self) -> &str {
        "MockExecutor"
    }
}

#[async_trait]
impl ModalExecutor for MockExecutor {
    async fn execute(
        &self,
        modal_id: &str,
        context: &ModalContext,
        input: Value,
    ) -> Result<Value, ExecutorError> {
        self.call_history.write().await.push(ExecutorCall {
            modal_id: modal_id.to_string(),
            user_id: context.user_id.clone(),
            input: input.clone(),
        });
        match self.stubs.read().await.get(modal_id) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(reason)) => Err(ExecutorError::Failed {
                modal_id: modal_id.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(input),
        }
    }
}

/// Assert how many times a mock loader or executor was called.
#[macro_export]
macro_rules! assert_called {
    ($mock:expr, $expected_count:expr) => {
        let count = $mock.call_count().await;
        assert_eq!(
            count, $expected_count,
            "Expected '{}' to be called {} times, but was called {} times",
            $mock.name(),
            $expected_count,
            count
        );
    };
}

/// Assert the engine's active set, in activation order.
#[macro_export]
macro_rules! assert_active {
    ($engine:expr, [$($id:expr),* $(,)?]) => {
        let expected: Vec<String> = vec![$($id.to_string()),*];
        assert_eq!(
            $engine.active_modals(),
            expected,
            "unexpected active modal set"
        );
    };
}

/// Assert that the engine logged at least one event of `kind` for `modal_id`.
#[macro_export]
macro_rules! assert_event {
    ($engine:expr, $kind:expr, $modal_id:expr) => {
        assert!(
            $engine
                .events_of_kind($kind)
                .iter()
                .any(|e| e.modal_id.as_deref() == Some($modal_id)),
            "Expected a {:?} event for '{}'",
            $kind,
            $modal_id
        );
    };
}
