//! Modal runtime
//!
//! The asynchronous façade over the orchestration engine: installation with
//! dependency resolution, on-demand activation and execution, context-driven
//! orchestration, and the tracing setup used by the binaries.

pub mod cache;
pub mod error;
pub mod logging;
pub mod service;

pub use cache::DescriptorCache;
pub use error::{ServiceError, ServiceResult};
pub use logging::{LogFormat, init_tracing};
pub use service::{InstallOutcome, ModalInstallRequest, ModalOrchestrationService};

// Re-export the lower layers so hosts can depend on this crate alone.
pub use modal_foundation;
pub use modal_kernel;
