//! Playbook identity and definition types.
//!
//! A `PlaybookDefinition` is a named, ordered list of step definitions.
//! Construction is the only way to obtain one, and construction validates —
//! code holding a `PlaybookDefinition` can rely on its invariants without
//! re-checking them.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CordonError, CordonResult},
    step::{StepConfig, StepDefinition},
    template,
};

/// Stable, human-readable identifier for a playbook.
///
/// Used across the catalog, run history, and execution records.
/// Example: PlaybookId("block-malicious-ip")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybookId(pub String);

impl PlaybookId {
    /// Construct a playbook id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// A validated, immutable playbook definition.
///
/// Sequence order is execution order; there is no other ordering concept.
/// Fields are private so the invariants checked in [`PlaybookDefinition::new`]
/// cannot be broken after construction — note the type deliberately does not
/// implement `Deserialize` (the catalog crate deserializes a raw file schema
/// and funnels it through `new`).
#[derive(Debug, Clone, Serialize)]
pub struct PlaybookDefinition {
    id: PlaybookId,
    name: String,
    description: String,
    steps: Vec<StepDefinition>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl PlaybookDefinition {
    /// Build a playbook definition, validating its invariants:
    ///
    /// - at least one step (an empty playbook is not executable)
    /// - step ids unique within the playbook
    /// - step names non-empty
    /// - approval steps list at least one approver
    ///
    /// Returns `CordonError::InvalidPlaybook` naming the first violation.
    pub fn new(
        id: PlaybookId,
        name: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
        steps: Vec<StepDefinition>,
    ) -> CordonResult<Self> {
        if steps.is_empty() {
            return Err(CordonError::InvalidPlaybook {
                reason: format!("playbook '{}' has no steps", id.0),
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.0.as_str()) {
                return Err(CordonError::InvalidPlaybook {
                    reason: format!("duplicate step id '{}'", step.id.0),
                });
            }
            if step.name.trim().is_empty() {
                return Err(CordonError::InvalidPlaybook {
                    reason: format!("step '{}' has an empty name", step.id.0),
                });
            }
            if let StepConfig::Approval { approvers } = &step.config {
                if approvers.is_empty() {
                    return Err(CordonError::InvalidPlaybook {
                        reason: format!("approval step '{}' lists no approvers", step.id.0),
                    });
                }
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            description: description.into(),
            steps,
            created_by: created_by.into(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &PlaybookId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The playbook's required parameter set: every distinct `${name}` token
    /// across all step templates.
    ///
    /// An execution request must supply a value for each of these before any
    /// step runs.
    pub fn required_parameters(&self) -> BTreeSet<String> {
        let mut required = BTreeSet::new();
        for step in &self.steps {
            for tpl in step.templates() {
                required.extend(template::extract_placeholders(tpl));
            }
        }
        required
    }
}
