//! In-process host registry used by the service binary and tests

use std::collections::HashMap;

use super::descriptor::{EntityFactory, ItemFactory, ItemStack};
use super::identifier::VariantId;
use super::registry::HostRegistry;
use crate::core::{Error, Result};
use crate::figurine::Figurine;

struct HostEntry {
    id: VariantId,
    entity: EntityFactory,
    item: ItemFactory,
}

/// Host registry that hands out sequential numeric ids in registration order
pub struct MemoryHost {
    entries: Vec<HostEntry>,
    by_id: HashMap<VariantId, u32>,
    frozen: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_id: HashMap::new(),
            frozen: false,
        }
    }

    /// Stop accepting registrations, as the host does once startup ends
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn numeric_id(&self, id: &str) -> Option<u32> {
        self.entries
            .iter()
            .position(|e| e.id.as_str() == id)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Spawn a figurine through the registered entity factory
    pub fn spawn(&self, id: &str) -> Option<Figurine> {
        self.entry(id).map(|e| (e.entity)())
    }

    /// Create an item stack through the registered item factory
    pub fn item_stack(&self, id: &str, count: u32) -> Option<ItemStack> {
        self.entry(id).map(|e| (e.item)(count))
    }

    /// Registered identifiers in numeric order
    pub fn ids(&self) -> impl Iterator<Item = &VariantId> {
        self.entries.iter().map(|e| &e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &str) -> Option<&HostEntry> {
        self.entries.iter().find(|e| e.id.as_str() == id)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRegistry for MemoryHost {
    fn register_variant(&mut self, id: &VariantId, entity: EntityFactory, item: ItemFactory) -> Result<()> {
        if self.frozen {
            return Err(Error::registration(id.as_str(), "host registry is frozen"));
        }
        if self.by_id.contains_key(id) {
            return Err(Error::registration(id.as_str(), "duplicate host registration"));
        }

        let numeric = u32::try_from(self.entries.len())
            .map_err(|_| Error::registration(id.as_str(), "host registry is full"))?;
        self.by_id.insert(id.clone(), numeric);
        self.entries.push(HostEntry {
            id: id.clone(),
            entity,
            item,
        });
        log::debug!("Host registered variant '{}' as #{}", id, numeric);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::descriptor::{factories, ArmModel, TextureRef, VariantDescriptor};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn register(host: &mut MemoryHost, id: &str) -> Result<()> {
        let descriptor = Arc::new(VariantDescriptor {
            id: VariantId::new(id).unwrap(),
            display_name: id.to_string(),
            texture: TextureRef::new(PathBuf::from("skin.png"), 64, 64),
            arms: ArmModel::Slim,
        });
        let (entity, item) = factories(descriptor.clone());
        host.register_variant(&descriptor.id, entity, item)
    }

    #[test]
    fn test_sequential_ids_and_factories() {
        let mut host = MemoryHost::new();
        register(&mut host, "first").unwrap();
        register(&mut host, "second").unwrap();

        assert_eq!(host.numeric_id("first"), Some(0));
        assert_eq!(host.numeric_id("second"), Some(1));
        assert_eq!(host.numeric_id("third"), None);

        let figurine = host.spawn("second").unwrap();
        assert_eq!(figurine.variant().as_str(), "second");
        assert_eq!(figurine.render_binding().arms, ArmModel::Slim);
        assert_eq!(host.item_stack("first", 4).unwrap().count, 4);
        assert!(host.spawn("missing").is_none());
    }

    #[test]
    fn test_duplicate_and_frozen_rejected() {
        let mut host = MemoryHost::new();
        register(&mut host, "one").unwrap();
        assert!(matches!(register(&mut host, "one"), Err(Error::Registration { .. })));

        host.freeze();
        assert!(host.is_frozen());
        assert!(matches!(register(&mut host, "two"), Err(Error::Registration { .. })));
        assert_eq!(host.len(), 1);
    }
}
