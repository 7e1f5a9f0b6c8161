//! TOML-driven playbook catalog.
//!
//! `TomlCatalog` loads a set of playbook definitions from a TOML string or
//! file.  Every entry passes through `PlaybookDefinition::new`, so a catalog
//! that loads successfully contains only executable playbooks.

use std::path::Path;

use tracing::debug;

use cordon_contracts::{
    error::{CordonError, CordonResult},
    playbook::{PlaybookDefinition, PlaybookId},
};

use crate::file::CatalogFile;

/// A loaded, validated playbook library.
///
/// Construct via `from_toml_str` or `from_file`, then hand individual
/// definitions to the runner.
///
/// ```rust,ignore
/// use cordon_catalog::TomlCatalog;
///
/// let catalog = TomlCatalog::from_file(Path::new("catalogs/soc.toml"))?;
/// let playbook = catalog.get(&PlaybookId::new("block-malicious-ip"));
/// ```
#[derive(Debug)]
pub struct TomlCatalog {
    playbooks: Vec<PlaybookDefinition>,
}

impl TomlCatalog {
    /// Parse `s` as TOML and build a catalog.
    ///
    /// Returns `CordonError::Catalog` if the TOML is malformed or declares
    /// the same playbook id twice, and `CordonError::InvalidPlaybook` if any
    /// entry fails definition validation.
    pub fn from_toml_str(s: &str) -> CordonResult<Self> {
        let file: CatalogFile = toml::from_str(s).map_err(|e| CordonError::Catalog {
            reason: format!("failed to parse catalog TOML: {}", e),
        })?;

        let mut playbooks: Vec<PlaybookDefinition> = Vec::with_capacity(file.playbooks.len());
        for entry in file.playbooks {
            let definition = entry.into_definition()?;
            if playbooks.iter().any(|p| p.id() == definition.id()) {
                return Err(CordonError::Catalog {
                    reason: format!("duplicate playbook id '{}'", definition.id().0),
                });
            }

            debug!(
                playbook_id = %definition.id().0,
                steps = definition.steps().len(),
                "playbook loaded"
            );
            playbooks.push(definition);
        }

        Ok(Self { playbooks })
    }

    /// Read the file at `path` and parse it as a TOML catalog.
    ///
    /// Returns `CordonError::Catalog` if the file cannot be read or its
    /// contents do not form a valid catalog.
    pub fn from_file(path: &Path) -> CordonResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CordonError::Catalog {
            reason: format!("failed to read catalog file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Look up a playbook by id.
    pub fn get(&self, id: &PlaybookId) -> Option<&PlaybookDefinition> {
        self.playbooks.iter().find(|p| p.id() == id)
    }

    /// All playbooks, in declaration order.
    pub fn all(&self) -> &[PlaybookDefinition] {
        &self.playbooks
    }

    pub fn len(&self) -> usize {
        self.playbooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playbooks.is_empty()
    }
}
