//! Runtime error types for the CORDON playbook engine.
//!
//! All fallible operations in the CORDON crates return `CordonResult<T>`.
//! Error variants carry enough context to produce actionable log entries.

use thiserror::Error;

use crate::execution::ExecutionStatus;

/// The unified error type for the CORDON runtime.
#[derive(Debug, Error)]
pub enum CordonError {
    /// A template referenced a placeholder with no value in the parameter map.
    #[error("no value supplied for placeholder '${{{name}}}'")]
    MissingParameter { name: String },

    /// The parameter map supplied at start time does not cover the playbook's
    /// required parameter set. The execution fails before any step runs.
    #[error("missing required parameters: {}", .missing.join(", "))]
    ParameterValidation { missing: Vec<String> },

    /// An approval was submitted by an identity not in the step's approver set.
    /// The execution's state is unchanged.
    #[error("'{identity}' is not an approver for step '{step}'")]
    NotAnApprover { identity: String, step: String },

    /// An operation was requested against a terminal or mismatched state.
    /// The execution's state is unchanged.
    #[error("cannot {operation} an execution in state '{status}'")]
    InvalidStateTransition {
        operation: String,
        status: ExecutionStatus,
    },

    /// An action step's external dispatch failed or reported `success: false`.
    ///
    /// This fails the whole execution (fail-fast). It is recorded on the step
    /// result and the run log rather than returned from `Runner::start`.
    #[error("action '{action}' dispatch failed: {reason}")]
    DispatchFailed { action: String, reason: String },

    /// The execution id is not registered with this runner.
    #[error("unknown execution '{id}'")]
    UnknownExecution { id: String },

    /// A playbook definition was rejected at construction.
    #[error("invalid playbook definition: {reason}")]
    InvalidPlaybook { reason: String },

    /// A playbook catalog file could not be read or parsed.
    #[error("catalog error: {reason}")]
    Catalog { reason: String },

    /// The run history sink could not persist a terminal execution.
    #[error("history write failed: {reason}")]
    HistoryWriteFailed { reason: String },
}

/// Convenience alias used throughout the CORDON crates.
pub type CordonResult<T> = Result<T, CordonError>;
