//! Skin discovery: the read-only scan that turns a skins directory into
//! variant descriptors.
//!
//! Nothing here talks to the host, so discovery can run on a loading thread.
//! Every problem with a single file is recorded and the scan moves on.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::descriptor::{ArmModel, TextureRef, VariantDescriptor};
use super::identifier::{display_name_from_stem, VariantId};
use crate::core::{Error, MannequinConfig, Result};

/// File extension of skin textures
pub const SKIN_EXTENSION: &str = "png";

/// Narrowest accepted skin
const MIN_SKIN_WIDTH: u32 = 64;

/// Knobs for the scan
#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    /// Stem suffix marking a slim skin, compared case-insensitively
    pub slim_suffix: String,
    /// Extension of a sibling marker file marking a slim skin
    pub slim_marker_extension: String,
    /// Identifiers owned by the host
    pub reserved: BTreeSet<String>,
}

impl DiscoveryOptions {
    pub fn from_config(config: &MannequinConfig) -> Self {
        Self {
            slim_suffix: config.slim_suffix.to_lowercase(),
            slim_marker_extension: config.slim_marker_extension.clone(),
            reserved: config.reserved_ids.iter().cloned().collect(),
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from_config(&MannequinConfig::default())
    }
}

/// A skin file that did not become a variant
#[derive(Debug)]
pub struct SkippedSkin {
    pub path: PathBuf,
    pub error: Error,
}

/// Result of scanning a skins directory
#[derive(Debug, Default)]
pub struct Discovery {
    /// Surviving descriptors, sorted by identifier
    pub descriptors: Vec<VariantDescriptor>,
    pub skipped: Vec<SkippedSkin>,
}

impl Discovery {
    /// Number of skipped files caused by identifier collisions
    pub fn collision_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.error, Error::IdentifierCollision { .. }))
            .count()
    }
}

/// Scan `dir` for skins
///
/// Files are considered in path order, so when two files sanitize to the
/// same identifier the first one keeps it. Only a failure to list the
/// directory itself is an error; a missing directory yields nothing.
pub fn discover_skins(dir: &Path, options: &DiscoveryOptions) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    if !dir.exists() {
        log::warn!("Skins directory {} does not exist", dir.display());
        return Ok(discovery);
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if is_skin_file(&path) {
                    paths.push(path);
                }
            }
            Err(e) => log::warn!("Unreadable entry in {}: {}", dir.display(), e),
        }
    }
    paths.sort();

    // Image headers are probed in parallel; ordering is restored by collect
    let probed: Vec<(PathBuf, Result<VariantDescriptor>)> = paths
        .into_par_iter()
        .map(|path| {
            let result = probe_skin(&path, options);
            (path, result)
        })
        .collect();

    let mut claimed: HashMap<VariantId, PathBuf> = HashMap::new();
    for (path, result) in probed {
        let descriptor = match result {
            Ok(descriptor) => descriptor,
            Err(error) => {
                log::warn!("Skipping skin {}: {}", path.display(), error);
                discovery.skipped.push(SkippedSkin { path, error });
                continue;
            }
        };

        let existing = if options.reserved.contains(descriptor.id.as_str()) {
            Some("a reserved identifier".to_string())
        } else {
            claimed.get(&descriptor.id).map(|p| p.display().to_string())
        };

        if let Some(existing) = existing {
            let error = Error::IdentifierCollision {
                id: descriptor.id.to_string(),
                existing,
                rejected: path.display().to_string(),
            };
            log::warn!("Skipping skin: {}", error);
            discovery.skipped.push(SkippedSkin { path, error });
            continue;
        }

        claimed.insert(descriptor.id.clone(), path);
        discovery.descriptors.push(descriptor);
    }

    discovery.descriptors.sort_by(|a, b| a.id.cmp(&b.id));
    log::info!(
        "Discovered {} skin variants in {} ({} skipped)",
        discovery.descriptors.len(),
        dir.display(),
        discovery.skipped.len()
    );
    Ok(discovery)
}

fn is_skin_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SKIN_EXTENSION))
}

/// Build a descriptor for one skin file
fn probe_skin(path: &Path, options: &DiscoveryOptions) -> Result<VariantDescriptor> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::format("file name is not valid UTF-8"))?;
    let id = VariantId::from_stem(stem)?;

    let (width, height) = image::image_dimensions(path).map_err(|e| match e {
        image::ImageError::IoError(io) => Error::Io(io),
        other => Error::format(other.to_string()),
    })?;
    check_dimensions(width, height)?;
    let texture = TextureRef::new(path.to_path_buf(), width, height);

    let lower_stem = stem.to_lowercase();
    let suffixed = !options.slim_suffix.is_empty() && lower_stem.ends_with(&options.slim_suffix);
    let marked = !options.slim_marker_extension.is_empty()
        && path.with_extension(&options.slim_marker_extension).is_file();
    let arms = if suffixed || marked { ArmModel::Slim } else { ArmModel::Classic };

    if arms == ArmModel::Slim && texture.is_legacy_layout() {
        return Err(Error::format(format!(
            "slim arms need a square skin, got {}x{}",
            width, height
        )));
    }

    let display_stem = if suffixed {
        stem.len()
            .checked_sub(options.slim_suffix.len())
            .and_then(|end| stem.get(..end))
            .unwrap_or(stem)
    } else {
        stem
    };
    let display_name = match display_name_from_stem(display_stem) {
        name if name.is_empty() => id.to_string(),
        name => name,
    };

    Ok(VariantDescriptor {
        id,
        display_name,
        texture,
        arms,
    })
}

/// Skins are square or legacy 2:1, in multiples of 64 pixels wide
fn check_dimensions(width: u32, height: u32) -> Result<()> {
    let valid_width = width >= MIN_SKIN_WIDTH && width % MIN_SKIN_WIDTH == 0;
    let valid_height = height == width || height * 2 == width;
    if valid_width && valid_height {
        Ok(())
    } else {
        Err(Error::format(format!("unsupported skin size {}x{}", width, height)))
    }
}
