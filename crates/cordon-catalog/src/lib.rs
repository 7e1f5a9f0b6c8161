//! # cordon-catalog
//!
//! TOML-driven playbook library for the CORDON playbook engine.
//!
//! Playbooks are authored as TOML files (see the `file` module for the
//! schema) and loaded into validated `PlaybookDefinition`s.  A catalog that
//! loads without error contains only executable playbooks — validation is
//! not deferred to run time.

pub mod catalog;
pub mod file;

pub use catalog::TomlCatalog;

// ── Tests ─────────────────────────────────────────────────────────────────────
