//! Collaborator trait definitions for the CORDON runner.
//!
//! These three traits define the complete boundary between the engine and
//! the outside world:
//!
//! - `ActionDispatcher` — executes automated actions (firewall, EDR, …)
//! - `Notifier`         — delivers messages to channels (best-effort)
//! - `RunRecorder`      — long-term sink for terminal executions
//!
//! The runner wires them together. Approval signals are not a trait: they
//! arrive through `Runner::approve`, which owns the per-step approval state.

use std::collections::BTreeMap;

use cordon_contracts::{
    error::CordonResult,
    execution::{Execution, StepOutcome},
    step::ActionId,
};

/// Executes one automated action on behalf of an action step.
///
/// The runner calls this with fully resolved parameters — every
/// `${placeholder}` has already been substituted. Implementations own their
/// transport, retries, and timeouts; the runner treats a returned
/// `success: false` (or an `Err`) as a dispatch failure that fails the
/// whole execution.
pub trait ActionDispatcher: Send + Sync {
    /// Invoke `action` with the resolved parameter map and wait for the
    /// result.
    fn invoke(
        &self,
        action: &ActionId,
        parameters: &BTreeMap<String, String>,
    ) -> CordonResult<StepOutcome>;
}

/// Delivers a notification step's rendered message.
///
/// Notifications are not on the critical path of the operation they report:
/// the runner downgrades any failure here to a warning log entry and the
/// execution continues.
pub trait Notifier: Send + Sync {
    /// Send `message` to `channel` and wait for the result.
    fn send(&self, channel: &str, message: &str) -> CordonResult<StepOutcome>;
}

/// Long-term storage for finished runs.
///
/// The runner appends every execution that reaches a terminal state —
/// completed, failed, or cancelled — exactly once. Implementations must
/// treat this as an append-only operation; records handed over here are
/// never modified by the runner afterwards.
pub trait RunRecorder: Send + Sync {
    /// Append one terminal execution to the history store.
    fn record(&self, execution: &Execution) -> CordonResult<()>;
}
