//! Named registry of payload logic.

use tracing::debug;

use super::{Payload, PayloadLogic, builtin};
use crate::error::{CatalogError, PayloadError};
use crate::shell::Shell;

/// Payload logics by unique name, in registration order.
#[derive(Default)]
pub struct PayloadCatalog {
    entries: Vec<Box<dyn PayloadLogic>>,
}

impl PayloadCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalogue holding every built-in payload.
    pub fn with_builtins() -> Self {
        Self {
            entries: builtin::all(),
        }
    }

    pub fn register(&mut self, logic: Box<dyn PayloadLogic>) -> Result<(), CatalogError> {
        if self.get(logic.name()).is_some() {
            return Err(CatalogError::Duplicate(logic.name().to_string()));
        }
        debug!(payload = logic.name(), "registered payload");
        self.entries.push(logic);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn PayloadLogic> {
        self.entries
            .iter()
            .find(|l| l.name() == name)
            .map(|l| l.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|l| l.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn PayloadLogic + 'static)> {
        self.entries.iter().map(|l| l.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind the payload called `name` to `shell`.
    pub fn bind<'a>(
        &'a self,
        name: &str,
        shell: Option<&'a dyn Shell>,
    ) -> Result<Payload<'a>, PayloadError> {
        let logic = self
            .get(name)
            .ok_or_else(|| PayloadError::UnknownPayload(name.to_string()))?;
        Ok(Payload::bind(shell, logic))
    }

    /// Names of the payloads with no capability gap against `shell`.
    pub fn runnable(&self, shell: Option<&dyn Shell>) -> Vec<&str> {
        self.iter()
            .filter(|logic| Payload::bind(shell, *logic).can_run().is_empty())
            .map(|logic| logic.name())
            .collect()
    }
}
