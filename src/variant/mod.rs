//! Dynamic figurine variants
//!
//! Skins are discovered from disk, turned into descriptors and handed to
//! the host registry once at startup.

mod descriptor;
mod discovery;
mod host;
mod identifier;
mod registry;

pub use descriptor::{
    factories, ArmModel, EntityFactory, ItemFactory, ItemStack, RenderBinding, TextureRef,
    VariantCapabilities, VariantDescriptor,
};
pub use discovery::{discover_skins, Discovery, DiscoveryOptions, SkippedSkin, SKIN_EXTENSION};
pub use host::MemoryHost;
pub use identifier::{display_name_from_stem, sanitize, VariantId};
pub use registry::{HostRegistry, RegistrationReport, RegistryState, VariantRegistry};
