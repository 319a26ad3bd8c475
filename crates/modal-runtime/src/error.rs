//! Error types for the orchestration service.

use error_stack::Report;
use modal_kernel::config::ConfigError;
use modal_kernel::{ExecutorError, LoaderError};
use thiserror::Error;

/// Failures the service surfaces to its caller. Validation problems during
/// installation are not errors; they come back as a structured
/// [`InstallOutcome`](crate::service::InstallOutcome).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// The descriptor source failed.
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    /// The modal ran and failed.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutorError),

    /// The engine refused to activate the modal.
    #[error("Activation of {modal_id} failed: {reason}")]
    ActivationFailed { modal_id: String, reason: String },

    /// On-demand installation before execution failed.
    #[error("Installation of {modal_id} failed: {reason}")]
    InstallFailed { modal_id: String, reason: String },

    /// `execute_modal` was called on a service built without an executor.
    #[error("No modal executor configured")]
    ExecutorMissing,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Error-stack–backed result alias for service operations.
pub type ServiceResult<T> = Result<T, Report<ServiceError>>;
