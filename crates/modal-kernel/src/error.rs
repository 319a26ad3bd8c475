//! Typed errors for the modal kernel.
//!
//! The engine recovers every [`ModalError`] locally: callers see a boolean or
//! a [`ModalActivationResponse`](crate::ModalActivationResponse) with an error
//! message, plus an event in the engine's log. The enum exists so that the
//! failure path is classified in one place instead of as loose strings.

use thiserror::Error;

/// Convenience result alias for kernel-level validation and state checks.
pub type ModalResult<T> = Result<T, ModalError>;

/// Errors raised while validating descriptors or driving the activation
/// state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ModalError {
    /// A required descriptor field is empty.
    #[error("Modal descriptor is missing required field: {0}")]
    MissingField(&'static str),

    /// Priority outside the 1–10 range.
    #[error("Modal {modal_id} has invalid priority {priority} (expected 1-10)")]
    InvalidPriority { modal_id: String, priority: u8 },

    /// A descriptor with this id is already registered.
    #[error("Modal already registered: {0}")]
    AlreadyRegistered(String),

    /// A declared dependency is not registered yet.
    #[error("Modal {modal_id} depends on unregistered modal {dependency}")]
    MissingDependency { modal_id: String, dependency: String },

    /// The referenced modal is not in the registry.
    #[error("Modal not found: {0}")]
    NotFound(String),

    /// The modal is registered but disabled.
    #[error("Modal is disabled: {0}")]
    Disabled(String),

    /// The modal is not currently active.
    #[error("Modal is not active: {0}")]
    NotActive(String),

    /// A resource figure is negative or not finite.
    #[error("Modal {modal_id} has invalid resource usage: {usage}")]
    InvalidResources { modal_id: String, usage: String },

    /// Admission control rejected the request.
    #[error("Insufficient resources")]
    InsufficientResources,

    /// At least one detected conflict could not be resolved.
    #[error("Unresolved conflicts")]
    UnresolvedConflicts,
}

impl ModalError {
    /// Whether this error comes from descriptor validation (as opposed to
    /// admission or conflict handling).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::InvalidPriority { .. }
                | Self::AlreadyRegistered(_)
                | Self::MissingDependency { .. }
                | Self::NotFound(_)
                | Self::Disabled(_)
                | Self::NotActive(_)
                | Self::InvalidResources { .. }
        )
    }
}
