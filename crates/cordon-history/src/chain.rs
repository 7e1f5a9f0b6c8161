//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Every field that contributes to a record's hash is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the execution (serde_json, no pretty-printing)

use sha2::{Digest, Sha256};

use cordon_contracts::execution::Execution;

use crate::record::RunRecord;

/// Compute the SHA-256 hash for a single run record.
///
/// The hash commits to the record's position in the chain (`sequence`), its
/// link to the previous record (`prev_hash`), and the full execution —
/// status, steps, parameters, and log included.
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `execution` cannot be serialized to JSON — which cannot happen
/// for the well-formed `Execution` type.
pub fn hash_record(sequence: u64, execution: &Execution, prev_hash: &str) -> String {
    // serde_json::to_vec produces canonical, deterministic JSON without
    // trailing whitespace or key reordering across calls on the same value.
    let execution_json =
        serde_json::to_vec(execution).expect("Execution must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&execution_json);

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a run history chain.
///
/// Returns `true` when the chain is valid according to both rules:
///
/// 1. **Prev-hash linkage** — each record's `prev_hash` equals the
///    `this_hash` of the preceding record (or `GENESIS_HASH` for record 0).
/// 2. **Hash correctness** — each record's `this_hash` matches the value
///    recomputed from its own fields.
///
/// Returns `false` the moment any mismatch is detected.  An empty chain is
/// defined as valid.
pub fn verify_chain(records: &[RunRecord]) -> bool {
    let mut expected_prev = RunRecord::GENESIS_HASH.to_string();

    for record in records {
        if record.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_record(record.sequence, &record.execution, &record.prev_hash);
        if record.this_hash != recomputed {
            return false;
        }

        expected_prev = record.this_hash.clone();
    }

    true
}
