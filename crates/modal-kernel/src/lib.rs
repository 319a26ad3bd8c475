//! Modal kernel
//!
//! Pure data types and collaborator contracts for the modal orchestration
//! stack. Concrete engines live in `modal-foundation`; the installation and
//! execution façade lives in `modal-runtime`. The kernel never depends on
//! either of them.

// descriptor module
pub mod descriptor;
pub use descriptor::*;

// context module
pub mod context;
pub use context::*;

// activation request/response module
pub mod activation;
pub use activation::*;

// conflict module
pub mod conflict;
pub use conflict::*;

// event module
pub mod event;
pub use event::*;

// metrics module
pub mod metrics;
pub use metrics::*;

// adaptation rule types
pub mod adaptation;

// collaborator traits
pub mod traits;
pub use traits::*;

// configuration
pub mod config;
pub use config::{
    ConflictResolutionMode, ModalConfigUpdate, ModalOrchestrationConfig,
    ResourceAllocationStrategy,
};

// error module
pub mod error;
pub use error::{ModalError, ModalResult};
