//! In-memory implementation of `RunRecorder`.
//!
//! `InMemoryHistory` is the reference implementation of the `RunRecorder`
//! trait.  It keeps all records in a `Vec` protected by a `Mutex`, making it
//! safe to share between the runner (which appends) and a presentation layer
//! (which lists and inspects).  The struct is `Clone` — clones share the
//! same underlying store, so one clone can be boxed into the runner while
//! another stays with the caller for queries.
//!
//! Use `export_ledger()` to obtain a sealed `RunLedger`, and
//! `verify_integrity()` at any time to confirm the chain has not been
//! tampered with in memory.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;

use cordon_contracts::{
    error::{CordonError, CordonResult},
    execution::{Execution, ExecutionId},
    playbook::PlaybookId,
};
use cordon_core::traits::RunRecorder;

use crate::{
    chain::{hash_record, verify_chain},
    record::{RunLedger, RunRecord},
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryHistory`.
pub(crate) struct HistoryState {
    /// All records written so far, in append order.
    pub(crate) records: Vec<RunRecord>,

    /// The next sequence number to assign (starts at 0).
    pub(crate) sequence: u64,

    /// The `this_hash` of the last written record, or `GENESIS_HASH` before
    /// any record has been written.
    pub(crate) last_hash: String,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// An in-memory, append-only run history backed by a SHA-256 hash chain.
///
/// # Thread safety
///
/// Every method acquires a `Mutex` internally.  Clones share the same
/// `Arc<Mutex<HistoryState>>` and may be used from multiple threads without
/// additional synchronization.
#[derive(Clone)]
pub struct InMemoryHistory {
    pub(crate) state: Arc<Mutex<HistoryState>>,
}

impl InMemoryHistory {
    /// Create an empty history store.
    ///
    /// The internal `last_hash` is initialized to `RunRecord::GENESIS_HASH`
    /// so the first record's `prev_hash` is automatically correct.
    pub fn new() -> Self {
        let state = HistoryState {
            records: Vec::new(),
            sequence: 0,
            last_hash: RunRecord::GENESIS_HASH.to_string(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Number of recorded runs.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .expect("history state lock poisoned")
            .records
            .len()
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every recorded execution, in append order.
    pub fn runs(&self) -> Vec<Execution> {
        let state = self.state.lock().expect("history state lock poisoned");
        state.records.iter().map(|r| r.execution.clone()).collect()
    }

    /// The recorded execution with the given id, if any.
    pub fn get(&self, execution_id: &ExecutionId) -> Option<Execution> {
        let state = self.state.lock().expect("history state lock poisoned");
        state
            .records
            .iter()
            .find(|r| &r.execution.id == execution_id)
            .map(|r| r.execution.clone())
    }

    /// All recorded runs of one playbook, in append order.
    ///
    /// This is the query behind a per-playbook run history view.
    pub fn for_playbook(&self, playbook_id: &PlaybookId) -> Vec<Execution> {
        let state = self.state.lock().expect("history state lock poisoned");
        state
            .records
            .iter()
            .filter(|r| &r.execution.playbook_id == playbook_id)
            .map(|r| r.execution.clone())
            .collect()
    }

    /// Export a sealed `RunLedger` containing all records written so far.
    ///
    /// The `terminal_hash` is the `this_hash` of the last record, or an
    /// empty string when no record has been written.
    pub fn export_ledger(&self) -> RunLedger {
        let state = self.state.lock().expect("history state lock poisoned");
        let terminal_hash = state
            .records
            .last()
            .map(|r| r.this_hash.clone())
            .unwrap_or_default();

        RunLedger {
            records: state.records.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Verify that the in-memory chain has not been tampered with.
    ///
    /// Delegates to `verify_chain`, which checks both prev-hash linkage and
    /// hash correctness for every record.
    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("history state lock poisoned");
        verify_chain(&state.records)
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

// ── RunRecorder impl ──────────────────────────────────────────────────────────

impl RunRecorder for InMemoryHistory {
    /// Append one terminal execution to the hash chain.
    ///
    /// Computes `this_hash` from (sequence, prev_hash, execution), wraps the
    /// execution in a `RunRecord`, appends it, then advances the sequence
    /// counter and `last_hash`.
    ///
    /// Returns `Err(HistoryWriteFailed)` only if the internal mutex is
    /// poisoned, which cannot happen under normal operation.
    fn record(&self, execution: &Execution) -> CordonResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| CordonError::HistoryWriteFailed {
                reason: format!("history state lock poisoned: {}", e),
            })?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;

        let this_hash = hash_record(sequence, execution, &prev_hash);

        let record = RunRecord {
            sequence,
            execution: execution.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        };

        state.records.push(record);
        state.sequence += 1;
        state.last_hash = this_hash;

        info!(
            execution_id = %execution.id.0,
            playbook_id = %execution.playbook_id.0,
            status = %execution.status,
            sequence,
            "run recorded to history"
        );

        Ok(())
    }
}
