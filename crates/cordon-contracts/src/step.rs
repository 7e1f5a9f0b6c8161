//! Step identity and definition types.
//!
//! A `StepDefinition` is one unit of work in a playbook. Its `config` is a
//! tagged union — an approval step structurally cannot carry an action id,
//! and a notification step cannot carry an approver list.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a step, unique within its playbook.
///
/// Step ids are authored with the playbook (e.g. `"step1"`, `"block-ip"`)
/// and stay stable across runs, so run history rows can be matched back to
/// the definition that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    /// Construct a step id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Identity allowed to approve an approval step (e.g. `"admin"`,
/// `"security-lead"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApproverId(pub String);

impl ApproverId {
    /// Construct an approver identity from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Namespaced action identifier resolved by the external dispatcher.
///
/// Example: ActionId("firewall.block_ip")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub String);

impl ActionId {
    /// Construct an action id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// The closed set of step kinds. Runner behavior is dispatched on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Suspends the execution until every listed approver has signed off.
    Approval,
    /// Invokes the external action dispatcher. Failure fails the execution.
    Action,
    /// Sends a message through the external notifier. Best-effort.
    Notification,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKind::Approval => "approval",
            StepKind::Action => "action",
            StepKind::Notification => "notification",
        };
        f.write_str(s)
    }
}

/// Kind-specific step payload.
///
/// Serialized with a `type` tag so the wire shape matches the step kind
/// exactly — there is no way to express an approval step with an `action`
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepConfig {
    /// Identities that must all approve before the run proceeds.
    Approval { approvers: Vec<ApproverId> },

    /// An action id plus parameter-name → template-string mapping.
    /// Template values may contain `${placeholder}` references resolved
    /// from the execution's parameter map when the step starts.
    Action {
        action: ActionId,
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },

    /// A channel identifier plus a message template with `${placeholder}`
    /// references.
    Notification { channel: String, message: String },
}

impl StepConfig {
    /// The kind tag this config belongs to.
    pub fn kind(&self) -> StepKind {
        match self {
            StepConfig::Approval { .. } => StepKind::Approval,
            StepConfig::Action { .. } => StepKind::Action,
            StepConfig::Notification { .. } => StepKind::Notification,
        }
    }
}

/// Immutable description of one unit of work within a playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique within the owning playbook, stable across runs.
    pub id: StepId,
    /// Human label shown in run views. Non-empty.
    pub name: String,
    /// Kind-specific payload; the kind is derived from the variant.
    #[serde(flatten)]
    pub config: StepConfig,
}

impl StepDefinition {
    /// The kind tag of this step.
    pub fn kind(&self) -> StepKind {
        self.config.kind()
    }

    /// Every template string this step renders at execution time.
    ///
    /// Approval steps render nothing. Action steps render each parameter
    /// value; notification steps render the message. The channel and action
    /// identifiers are literals, never templates.
    pub fn templates(&self) -> Vec<&str> {
        match &self.config {
            StepConfig::Approval { .. } => Vec::new(),
            StepConfig::Action { parameters, .. } => {
                parameters.values().map(String::as_str).collect()
            }
            StepConfig::Notification { message, .. } => vec![message.as_str()],
        }
    }
}
