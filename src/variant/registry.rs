//! Two-phase variant registration
//!
//! The host accepts new content only during a single startup window. The
//! registry moves through `Discovering -> Validated -> Registered -> Sealed`
//! and refuses anything out of order with a registration error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::descriptor::{factories, EntityFactory, ItemFactory, VariantDescriptor};
use super::discovery::Discovery;
use super::identifier::VariantId;
use crate::core::{Error, Result};

/// The host's content registry, as seen from here
pub trait HostRegistry {
    /// Bind one spawnable object type and one item type under `id`
    fn register_variant(&mut self, id: &VariantId, entity: EntityFactory, item: ItemFactory) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryState {
    /// Accepting discovery results
    Discovering,
    /// Candidates sorted and frozen, ready for the host
    Validated,
    /// Handed to the host at least once
    Registered,
    /// Host window closed; nothing more can be registered
    Sealed,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistryState::Discovering => "discovering",
            RegistryState::Validated => "validated",
            RegistryState::Registered => "registered",
            RegistryState::Sealed => "sealed",
        };
        f.write_str(name)
    }
}

/// Outcome of a registration pass
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub registered: Vec<VariantId>,
    pub failed: Vec<(VariantId, Error)>,
}

/// Owner of variant descriptors until the host takes them
pub struct VariantRegistry {
    state: RegistryState,
    pending: BTreeMap<VariantId, Arc<VariantDescriptor>>,
    registered: BTreeMap<VariantId, Arc<VariantDescriptor>>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self {
            state: RegistryState::Discovering,
            pending: BTreeMap::new(),
            registered: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    fn expect_state(&self, allowed: &[RegistryState], id: &str, action: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::registration(
                id,
                format!("cannot {} while registry is {}", action, self.state),
            ))
        }
    }

    /// Take the descriptors from a discovery pass
    ///
    /// Returns how many were accepted. Identifiers already pending are
    /// skipped with a warning.
    pub fn accept(&mut self, discovery: Discovery) -> Result<usize> {
        self.expect_state(&[RegistryState::Discovering], "*", "accept discoveries")?;

        let mut accepted = 0;
        for descriptor in discovery.descriptors {
            if self.pending.contains_key(&descriptor.id) {
                log::warn!(
                    "Variant '{}' from {} already discovered, skipping",
                    descriptor.id,
                    descriptor.texture.path().display()
                );
                continue;
            }
            self.pending.insert(descriptor.id.clone(), Arc::new(descriptor));
            accepted += 1;
        }
        Ok(accepted)
    }

    /// Freeze the candidate set
    pub fn validate(&mut self) -> Result<usize> {
        self.expect_state(&[RegistryState::Discovering], "*", "validate")?;
        self.state = RegistryState::Validated;
        Ok(self.pending.len())
    }

    /// Register every pending variant with the host, in identifier order
    ///
    /// A failure for one variant is logged and recorded; the rest proceed.
    pub fn register_all(&mut self, host: &mut dyn HostRegistry) -> Result<RegistrationReport> {
        self.expect_state(
            &[RegistryState::Validated, RegistryState::Registered],
            "*",
            "register",
        )?;

        let mut report = RegistrationReport::default();
        let pending: Vec<Arc<VariantDescriptor>> = self.pending.values().cloned().collect();
        for descriptor in pending {
            let id = descriptor.id.clone();
            match self.register_one(descriptor, host) {
                Ok(()) => report.registered.push(id),
                Err(e) => {
                    log::warn!("Skipping variant '{}': {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }

        self.state = RegistryState::Registered;
        log::info!(
            "Registered {} variants ({} failed)",
            report.registered.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Register one descriptor outside the batch
    ///
    /// Only allowed before sealing. An identifier that is already registered
    /// is rejected, never replaced.
    pub fn register(&mut self, descriptor: VariantDescriptor, host: &mut dyn HostRegistry) -> Result<()> {
        self.expect_state(
            &[RegistryState::Validated, RegistryState::Registered],
            descriptor.id.as_str(),
            "register",
        )?;
        let descriptor = Arc::new(descriptor);
        self.pending
            .entry(descriptor.id.clone())
            .or_insert_with(|| descriptor.clone());
        self.register_one(descriptor, host)?;
        self.state = RegistryState::Registered;
        Ok(())
    }

    fn register_one(&mut self, descriptor: Arc<VariantDescriptor>, host: &mut dyn HostRegistry) -> Result<()> {
        let id = descriptor.id.clone();
        if self.registered.contains_key(&id) {
            return Err(Error::registration(id.as_str(), "already registered"));
        }

        let (entity, item) = factories(descriptor.clone());
        host.register_variant(&id, entity, item)?;
        self.registered.insert(id, descriptor);
        Ok(())
    }

    /// Close the registration window for good
    pub fn seal(&mut self) {
        if self.state != RegistryState::Sealed {
            log::info!("Variant registry sealed with {} variants", self.registered.len());
        }
        self.state = RegistryState::Sealed;
    }

    /// Registered descriptor by identifier
    pub fn get(&self, id: &str) -> Option<Arc<VariantDescriptor>> {
        self.registered
            .iter()
            .find(|(key, _)| key.as_str() == id)
            .map(|(_, d)| d.clone())
    }

    /// Registered descriptors in identifier order
    pub fn registered(&self) -> impl Iterator<Item = &Arc<VariantDescriptor>> {
        self.registered.values()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
