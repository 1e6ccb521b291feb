//! Variant descriptors and the capabilities every variant exposes

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::identifier::VariantId;
use crate::figurine::Figurine;

/// Arm model a skin is drawn on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmModel {
    /// Four-pixel arms
    #[default]
    Classic,
    /// Three-pixel arms (the alternate skeleton)
    Slim,
}

/// Opaque handle to a skin texture on disk
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureRef {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl TextureRef {
    pub fn new(path: PathBuf, width: u32, height: u32) -> Self {
        Self { path, width, height }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pre-1.8 skins are half as tall as they are wide
    pub fn is_legacy_layout(&self) -> bool {
        self.height * 2 == self.width
    }
}

/// Everything needed to register one spawnable variant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantDescriptor {
    pub id: VariantId,
    pub display_name: String,
    pub texture: TextureRef,
    pub arms: ArmModel,
}

impl VariantDescriptor {
    pub fn is_alternate_skeleton(&self) -> bool {
        self.arms == ArmModel::Slim
    }
}

/// What the renderer needs to draw a figurine of this variant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderBinding {
    pub texture: TextureRef,
    pub arms: ArmModel,
}

/// Inventory stack of figurine items
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub variant: VariantId,
    pub display_name: String,
    pub count: u32,
}

/// Spawn, render and inventory behavior shared by all variants
///
/// Variants differ only by their descriptor data, so one implementation
/// covers every skin.
pub trait VariantCapabilities {
    fn spawn(&self) -> Figurine;
    fn render_binding(&self) -> RenderBinding;
    fn item_stack(&self, count: u32) -> ItemStack;
}

impl VariantCapabilities for VariantDescriptor {
    fn spawn(&self) -> Figurine {
        Figurine::new(self.id.clone(), self.render_binding())
    }

    fn render_binding(&self) -> RenderBinding {
        RenderBinding {
            texture: self.texture.clone(),
            arms: self.arms,
        }
    }

    fn item_stack(&self, count: u32) -> ItemStack {
        ItemStack {
            variant: self.id.clone(),
            display_name: format!("{} Figurine", self.display_name),
            count,
        }
    }
}

/// Factory the host calls to spawn a figurine of one variant
pub type EntityFactory = Box<dyn Fn() -> Figurine + Send + Sync>;

/// Factory the host calls to create item stacks of one variant
pub type ItemFactory = Box<dyn Fn(u32) -> ItemStack + Send + Sync>;

/// Entity and item factories closed over a shared descriptor
pub fn factories(descriptor: Arc<VariantDescriptor>) -> (EntityFactory, ItemFactory) {
    let for_items = descriptor.clone();
    (
        Box::new(move || descriptor.spawn()),
        Box::new(move |count| for_items.item_stack(count)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(arms: ArmModel) -> VariantDescriptor {
        VariantDescriptor {
            id: VariantId::new("knight").unwrap(),
            display_name: "Knight".into(),
            texture: TextureRef::new(PathBuf::from("skins/knight.png"), 64, 64),
            arms,
        }
    }

    #[test]
    fn test_capabilities_carry_descriptor_data() {
        let d = descriptor(ArmModel::Slim);
        assert!(d.is_alternate_skeleton());

        let binding = d.render_binding();
        assert_eq!(binding.arms, ArmModel::Slim);
        assert_eq!(binding.texture.path(), Path::new("skins/knight.png"));

        let stack = d.item_stack(3);
        assert_eq!(stack.count, 3);
        assert_eq!(stack.display_name, "Knight Figurine");
    }

    #[test]
    fn test_factories_spawn_matching_variant() {
        let (spawn, item) = factories(Arc::new(descriptor(ArmModel::Classic)));
        let figurine = spawn();
        assert_eq!(figurine.variant().as_str(), "knight");
        assert_eq!(figurine.render_binding().arms, ArmModel::Classic);
        assert_eq!(item(1).variant.as_str(), "knight");
    }

    #[test]
    fn test_legacy_layout() {
        assert!(TextureRef::new(PathBuf::new(), 64, 32).is_legacy_layout());
        assert!(!TextureRef::new(PathBuf::new(), 64, 64).is_legacy_layout());
    }
}
