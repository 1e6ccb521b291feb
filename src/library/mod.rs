//! Pose and action definition libraries.
//!
//! Definitions live as one JSON file per pose or action. Libraries load them
//! at startup, cache them by name, and reload single entries on request.

pub mod format;
pub mod poses;
pub mod actions;
pub mod bootstrap;

pub use actions::ActionLibrary;
pub use bootstrap::install_defaults;
pub use format::{parse_pose, ActionRecord, PoseRecord};
pub use poses::PoseLibrary;

use std::path::{Component, Path, PathBuf};

use crate::core::{Error, Result};

/// Outcome of loading a definition directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names loaded, in load order (duplicates included)
    pub loaded: Vec<String>,
    /// Files that failed validation, with the reason
    pub failed: Vec<(PathBuf, Error)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Definition files in `dir`, sorted by file name
///
/// A missing directory yields no files.
pub(crate) fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        log::warn!("Definition directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if format::is_definition_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `<dir>/<name>.<ext>` for a plain file name
pub(crate) fn definition_path(dir: &Path, name: &str, extension: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain {
        return Err(Error::format(format!("'{}' is not a valid definition name", name)));
    }
    Ok(dir.join(format!("{}.{}", name, extension)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_definition_files_sorted_and_filtered() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        for file in ["b.json", "a.json", "c.JSON", "readme.md"] {
            std::fs::write(temp_dir.path().join(file), "{}").unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("nested.json")).unwrap();

        let files = definition_files(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "c.JSON"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        assert!(definition_files(&temp_dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_definition_path_rejects_traversal() {
        let dir = Path::new("poses");
        assert_eq!(definition_path(dir, "sit", "json").unwrap(), PathBuf::from("poses/sit.json"));
        assert!(definition_path(dir, "../sit", "json").is_err());
        assert!(definition_path(dir, "a/b", "json").is_err());
        assert!(definition_path(dir, "", "json").is_err());
        assert!(definition_path(dir, "/etc/passwd", "json").is_err());
    }
}
