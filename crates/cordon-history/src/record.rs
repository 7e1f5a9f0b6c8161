//! Run history record and ledger types.
//!
//! `RunRecord` is a single entry in the hash chain — it wraps a terminal
//! `Execution` with sequence numbering and the SHA-256 hashes that make
//! tampering detectable.  `RunLedger` is the sealed view produced when the
//! history is exported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cordon_contracts::execution::Execution;

/// A single entry in the SHA-256 hash chain of finished runs.
///
/// Each record commits to the previous record via `prev_hash`, forming an
/// append-only chain.  Modifying any field — including those of the embedded
/// `execution` — invalidates `this_hash` and every subsequent `prev_hash`,
/// which `verify_chain` detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Monotonically increasing position in the chain, starting at 0.
    pub sequence: u64,

    /// The terminal execution exactly as the runner handed it over.
    pub execution: Execution,

    /// SHA-256 hash (hex) of the previous record, or `GENESIS_HASH` for the
    /// first record.
    pub prev_hash: String,

    /// SHA-256 hash (hex) of this record's canonical content.
    ///
    /// Computed by `hash_record()` over (sequence, prev_hash, canonical JSON
    /// of execution).
    pub this_hash: String,
}

impl RunRecord {
    /// The sentinel `prev_hash` used for the first record in the chain.
    ///
    /// 64 hex zeros — a value that can never be the SHA-256 of real data,
    /// making genesis detection unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A sealed export of the run history.
///
/// Produced by `InMemoryHistory::export_ledger()`.  The `terminal_hash` is
/// the `this_hash` of the last record and can be used as a compact
/// commitment to the entire history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLedger {
    /// All records in chain order (sequence 0 first).
    pub records: Vec<RunRecord>,

    /// Wall-clock time (UTC) the ledger was exported.
    pub exported_at: DateTime<Utc>,

    /// The `this_hash` of the last record.  Empty string if the ledger is
    /// empty.
    pub terminal_hash: String,
}
