//! First-run installation of the bundled pose and action definitions

use std::path::{Path, PathBuf};

use crate::core::Result;

/// Bundled pose definitions as (file name, contents)
pub const DEFAULT_POSES: &[(&str, &str)] = &[
    ("standing.json", include_str!("../../assets/defaults/poses/standing.json")),
    ("sitting.json", include_str!("../../assets/defaults/poses/sitting.json")),
    ("waving.json", include_str!("../../assets/defaults/poses/waving.json")),
    ("stride_left.json", include_str!("../../assets/defaults/poses/stride_left.json")),
    ("stride_right.json", include_str!("../../assets/defaults/poses/stride_right.json")),
];

/// Bundled action definitions as (file name, contents)
pub const DEFAULT_ACTIONS: &[(&str, &str)] = &[
    ("wave.json", include_str!("../../assets/defaults/actions/wave.json")),
    ("walk.json", include_str!("../../assets/defaults/actions/walk.json")),
    ("sit_down.json", include_str!("../../assets/defaults/actions/sit_down.json")),
];

/// Copy the bundled defaults into any definition directory that is empty
///
/// Existing files are never overwritten. Returns the files written.
pub fn install_defaults(poses_dir: &Path, actions_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = install_into(poses_dir, DEFAULT_POSES)?;
    written.extend(install_into(actions_dir, DEFAULT_ACTIONS)?);

    if !written.is_empty() {
        log::info!("Installed {} bundled definitions", written.len());
    }
    Ok(written)
}

fn install_into(dir: &Path, defaults: &[(&str, &str)]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    if !super::definition_files(dir)?.is_empty() {
        return Ok(Vec::new());
    }

    let mut written = Vec::new();
    for (file_name, contents) in defaults {
        let path = dir.join(file_name);
        if path.exists() {
            continue;
        }
        std::fs::write(&path, contents)?;
        written.push(path);
    }
    Ok(written)
}
