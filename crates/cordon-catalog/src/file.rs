//! On-disk catalog schema.
//!
//! A catalog file holds an ordered list of playbooks:
//!
//! ```toml
//! [[playbooks]]
//! id = "block-malicious-ip"
//! name = "Block Malicious IP"
//! description = "Blocks an IP address across all firewalls"
//! created_by = "John Doe"
//!
//! [[playbooks.steps]]
//! id = "step1"
//! type = "approval"
//! name = "Get approval for IP block"
//! approvers = ["admin"]
//!
//! [[playbooks.steps]]
//! id = "step2"
//! type = "action"
//! name = "Block IP on Firewall"
//! action = "firewall.block_ip"
//! [playbooks.steps.parameters]
//! ip = "${ip_address}"
//! ```
//!
//! Steps reuse the contract types directly — the `type` tag selects the
//! config variant, so a step whose fields do not match its declared type is
//! a parse error, not a latent runtime surprise.  Playbook-level invariants
//! (non-empty, unique step ids, approvers present) are checked by funnelling
//! every entry through `PlaybookDefinition::new`.

use serde::Deserialize;

use cordon_contracts::{
    error::CordonResult,
    playbook::{PlaybookDefinition, PlaybookId},
    step::StepDefinition,
};

/// The top-level structure deserialized from a TOML catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    /// Playbooks in declaration order.
    #[serde(default)]
    pub playbooks: Vec<PlaybookEntry>,
}

/// One playbook as authored in the catalog file.
#[derive(Debug, Deserialize)]
pub struct PlaybookEntry {
    /// Stable identifier used for lookups and run history.
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub created_by: String,

    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl PlaybookEntry {
    /// Convert this entry into a validated `PlaybookDefinition`.
    ///
    /// Returns `CordonError::InvalidPlaybook` if the entry violates any
    /// definition invariant.
    pub fn into_definition(self) -> CordonResult<PlaybookDefinition> {
        PlaybookDefinition::new(
            PlaybookId::new(self.id),
            self.name,
            self.description,
            self.created_by,
            self.steps,
        )
    }
}
