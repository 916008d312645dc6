//! Allow-list of operations the bridge may invoke on a (subject, target) pair.
//!
//! Hosts describe their operations as a static slice of [`CapabilitySpec`]s
//! and build a [`CapabilityTable`] once at startup. An operation name that is
//! not in the table is never resolved any other way.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::gateway::WorldGateway;

/// Signature every capability implements.
pub type CapabilityHandler<W> = fn(
    &mut W,
    <W as WorldGateway>::EntityRef,
    <W as WorldGateway>::EntityRef,
) -> Result<String, CapabilityError>;

/// Describes a named operation exposed to controllers.
pub struct CapabilitySpec<W: WorldGateway + 'static> {
    /// Operation token used in `<subject> <operation> <target>` commands.
    pub id: &'static str,
    pub description: &'static str,
    /// Applies the operation and returns a short summary for the log.
    pub handler: CapabilityHandler<W>,
}

impl<W: WorldGateway + 'static> fmt::Debug for CapabilitySpec<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySpec")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("subject and target are the same state")]
    SameState,
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid capability table: {}", .errors.join("; "))]
pub struct CapabilityTableError {
    errors: Vec<String>,
}

impl CapabilityTableError {
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Immutable lookup from operation token to capability.
pub struct CapabilityTable<W: WorldGateway + 'static> {
    specs: HashMap<&'static str, &'static CapabilitySpec<W>>,
}

impl<W: WorldGateway + 'static> CapabilityTable<W> {
    pub fn new(specs: &'static [CapabilitySpec<W>]) -> Result<Self, CapabilityTableError> {
        let mut errors = Vec::new();
        let mut table = HashMap::with_capacity(specs.len());

        for spec in specs {
            if spec.id.trim().is_empty() || spec.id.contains(char::is_whitespace) {
                errors.push(format!("capability id '{}' must be a single token", spec.id));
                continue;
            }
            if table.insert(spec.id, spec).is_some() {
                errors.push(format!("duplicate capability '{}'", spec.id));
            }
        }

        if errors.is_empty() {
            Ok(Self { specs: table })
        } else {
            Err(CapabilityTableError { errors })
        }
    }

    /// A table that rejects every operation.
    pub fn empty() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&'static CapabilitySpec<W>> {
        self.specs.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.specs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered operation tokens in lexical order.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.specs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl<W: WorldGateway + 'static> fmt::Debug for CapabilityTable<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("ids", &self.ids())
            .finish()
    }
}
