//! Modal foundation
//!
//! Concrete implementations of the kernel contracts:
//! - [`ModalOrchestrationEngine`]: registry, activation state machine,
//!   admission control, conflict resolution, logs and analytics
//! - [`AdaptationEngine`]: rule-based derivation of adapted modal copies

pub mod admission;
pub mod conflict;
pub mod events;
pub mod history;
pub mod messaging;

pub mod engine;
pub use engine::{ModalAnalytics, ModalOrchestrationEngine};

pub mod adaptation;
pub use adaptation::{AdaptationEngine, AdaptationError, AdaptationResult};

pub use admission::{AdmissionController, AdmissionDecision, AdmissionOutcome};
pub use conflict::{ConflictAssessment, ConflictResolver};
pub use events::EventHub;
pub use history::BoundedLog;
pub use messaging::CommunicationLog;
