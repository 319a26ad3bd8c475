//! CLI command implementations

pub mod adapt;
pub mod compatible;
pub mod list;
pub mod orchestrate;
pub mod validate;
