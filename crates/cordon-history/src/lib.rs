//! # cordon-history
//!
//! Immutable, append-only, SHA-256 hash-chained run history for the CORDON
//! playbook engine.
//!
//! ## Overview
//!
//! Every execution the runner finishes — completed, failed, or cancelled —
//! is wrapped in a `RunRecord` that links to the previous record via its
//! SHA-256 hash.  Tampering with any record — even a single byte — breaks
//! the chain and is detected by `verify_chain`.  A security-response tool's
//! own run history is evidence; it has to be as tamper-evident as the
//! incidents it documents.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cordon_history::InMemoryHistory;
//! use cordon_core::traits::RunRecorder;
//!
//! let history = InMemoryHistory::new();
//! let runner = Runner::new(dispatcher, notifier, Box::new(history.clone()));
//! // … run playbooks …
//! assert!(history.verify_integrity());
//! let ledger = history.export_ledger();
//! ```

pub mod chain;
pub mod memory;
pub mod record;

pub use chain::{hash_record, verify_chain};
pub use memory::InMemoryHistory;
pub use record::{RunLedger, RunRecord};

// ── Tests ─────────────────────────────────────────────────────────────────────
