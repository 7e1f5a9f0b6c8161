//! # cordon-contracts
//!
//! Shared types, schemas, and contracts for the CORDON playbook engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, construction-time validation, template
//! scanning, and error types.

pub mod error;
pub mod execution;
pub mod playbook;
pub mod step;
pub mod template;
