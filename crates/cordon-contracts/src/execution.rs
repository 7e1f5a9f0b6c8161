//! Execution state types.
//!
//! An `Execution` is one run of a playbook against concrete parameters. It
//! snapshots the playbook's steps at start time — editing the definition
//! mid-run never changes an in-flight execution — and carries an append-only
//! log that is never truncated or reordered.
//!
//! Executions are mutated only by the runner and by approval/cancellation
//! calls routed through it. `Runner::status` hands out clones; callers must
//! treat them as read-only snapshots.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    playbook::{PlaybookDefinition, PlaybookId},
    step::{ApproverId, StepDefinition, StepId, StepKind},
};

/// Unique identifier for a single playbook execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub uuid::Uuid);

impl ExecutionId {
    /// Create a new, unique execution id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a whole execution.
///
/// ```text
/// Preparing → {AwaitingApproval | Running} → … → {Completed | Failed | Cancelled}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Initial state: the parameter map is being validated.
    Preparing,
    /// Suspended on an approval step; no further steps run until every
    /// listed approver has signed off.
    AwaitingApproval,
    /// A step is executing (or about to).
    Running,
    /// Every step completed.
    Completed,
    /// Parameter validation failed or an action step failed.
    Failed,
    /// Explicitly cancelled before reaching Completed/Failed.
    Cancelled,
}

impl ExecutionStatus {
    /// True for the three states no transition ever leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Preparing => "preparing",
            ExecutionStatus::AwaitingApproval => "awaiting_approval",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of one step within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The result payload attached to a finished step.
///
/// For action steps this is the dispatcher's verbatim response; for
/// notification steps the notifier's; for approval steps a synthesized
/// summary of who approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub success: bool,
    pub message: String,
    /// Free-form detail mapping (e.g. `firewall_rule_id` → `rule123`).
    /// Preserved per step so later-step result referencing can be layered
    /// on without a data-model change.
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl StepOutcome {
    /// A successful outcome with no details.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// A failed outcome with no details.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attach one detail entry, builder-style.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Severity of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// One entry in an execution's append-only run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// The live record of one step within an execution.
///
/// One `StepRun` exists per step definition, in the same order. The
/// definition fields needed for display (`name`, `kind`) are denormalized
/// here so a snapshot renders without a definition lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRun {
    pub step_id: StepId,
    pub name: String,
    pub kind: StepKind,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<StepOutcome>,
    /// Identities that have approved so far. Only populated for approval
    /// steps; empty for the other kinds.
    #[serde(default)]
    pub approved_by: Vec<ApproverId>,
}

impl StepRun {
    /// A pending run row for the given step definition.
    pub fn pending(step: &StepDefinition) -> Self {
        Self {
            step_id: step.id.clone(),
            name: step.name.clone(),
            kind: step.kind(),
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            result: None,
            approved_by: Vec::new(),
        }
    }
}

/// One run of a playbook against concrete parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    /// Weak reference to the owning playbook: a relation plus lookup key,
    /// never ownership. The step list below is the start-time snapshot.
    pub playbook_id: PlaybookId,
    pub status: ExecutionStatus,
    /// Input mapping supplied once at start, immutable thereafter.
    pub parameters: BTreeMap<String, String>,
    /// One row per step, in execution order.
    pub steps: Vec<StepRun>,
    /// Append-only; timestamps are monotonically non-decreasing.
    pub logs: Vec<LogEntry>,
    /// Identity that triggered the run.
    pub triggered_by: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Execution {
    /// Create a fresh execution in `Preparing` with every step pending.
    ///
    /// Snapshots the playbook's step list; the caller keeps the full
    /// definitions alongside to drive the run.
    pub fn new(
        playbook: &PlaybookDefinition,
        parameters: BTreeMap<String, String>,
        triggered_by: impl Into<String>,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            playbook_id: playbook.id().clone(),
            status: ExecutionStatus::Preparing,
            parameters,
            steps: playbook.steps().iter().map(StepRun::pending).collect(),
            logs: Vec::new(),
            triggered_by: triggered_by.into(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Append a log entry.
    ///
    /// The timestamp is clamped against the previous entry so the log stays
    /// monotonically non-decreasing even if the wall clock steps backwards.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let now = Utc::now();
        let timestamp = match self.logs.last() {
            Some(prev) if prev.timestamp > now => prev.timestamp,
            _ => now,
        };
        self.logs.push(LogEntry {
            timestamp,
            level,
            message: message.into(),
        });
    }

    /// Percentage of steps completed, 0–100.
    pub fn progress(&self) -> u8 {
        if self.steps.is_empty() {
            return 0;
        }
        let completed = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        (completed * 100 / self.steps.len()) as u8
    }

    /// The first step that has not completed — the one a progress view
    /// highlights. `None` once every step has completed.
    pub fn current_step(&self) -> Option<&StepRun> {
        self.steps.iter().find(|s| s.status != StepStatus::Completed)
    }
}
