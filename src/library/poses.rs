//! Name-keyed pose cache backed by a directory of definition files

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::format::{self, PoseRecord, DEFINITION_EXTENSION};
use super::LoadReport;
use crate::animation::Pose;
use crate::core::{Error, Result};

struct PoseEntry {
    pose: Arc<Pose>,
    /// File the pose was read from, if any
    source: Option<PathBuf>,
}

/// Pose library manager
///
/// Poses are immutable and handed out as `Arc`s. A reload swaps the entry in
/// one write; readers see either the old or the new pose, never a mix.
pub struct PoseLibrary {
    /// Directory holding one JSON file per pose
    base_dir: PathBuf,
    entries: RwLock<HashMap<String, PoseEntry>>,
}

impl PoseLibrary {
    /// Create an empty library over `base_dir`
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a library and load every pose file in `base_dir`
    pub fn open(base_dir: PathBuf) -> Result<(Self, LoadReport)> {
        let library = Self::new(base_dir);
        let report = library.load_all()?;
        Ok((library, report))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Load every definition file, in file name order
    ///
    /// Bad files are reported and skipped. When two files define the same
    /// name the later one wins and a warning is logged.
    pub fn load_all(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for path in super::definition_files(&self.base_dir)? {
            match format::read_pose_file(&path) {
                Ok(pose) => {
                    report.loaded.push(pose.name().to_string());
                    self.insert_from(pose, Some(path));
                }
                Err(e) => {
                    log::warn!("Skipping pose file {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }

        log::info!(
            "Loaded {} poses from {} ({} failed)",
            report.loaded.len(),
            self.base_dir.display(),
            report.failed.len()
        );
        Ok(report)
    }

    fn insert_from(&self, pose: Pose, source: Option<PathBuf>) {
        let name = pose.name().to_string();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = entries.get(&name) {
            log::warn!(
                "Pose '{}' from {} overrides definition from {}",
                name,
                describe(source.as_deref()),
                describe(previous.source.as_deref())
            );
        }

        entries.insert(
            name,
            PoseEntry {
                pose: Arc::new(pose),
                source,
            },
        );
    }

    /// Add a pose built in code (e.g. a bundled default)
    pub fn insert(&self, pose: Pose) {
        self.insert_from(pose, None);
    }

    /// Cached pose by name, without touching the disk
    pub fn cached(&self, name: &str) -> Option<Arc<Pose>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| entry.pose.clone())
    }

    /// Pose by name, reading `<name>.json` on a cache miss
    pub fn get(&self, name: &str) -> Result<Arc<Pose>> {
        if let Some(pose) = self.cached(name) {
            return Ok(pose);
        }

        let path = self.default_path(name)?;
        let pose = read_named(&path, name)?;
        self.insert_from(pose, Some(path));
        self.cached(name)
            .ok_or_else(|| Error::format(format!("pose '{}' vanished during load", name)))
    }

    /// Re-read the file that defines `name`
    ///
    /// On any failure the cached pose is left untouched.
    pub fn reload(&self, name: &str) -> Result<Arc<Pose>> {
        let source = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|entry| entry.source.clone());
        let path = match source {
            Some(path) => path,
            None => self.default_path(name)?,
        };

        let pose = Arc::new(read_named(&path, name)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            name.to_string(),
            PoseEntry {
                pose: pose.clone(),
                source: Some(path),
            },
        );
        log::info!("Reloaded pose '{}'", name);
        Ok(pose)
    }

    /// Write `pose` to `<name>.json` and cache it
    pub fn save(&self, pose: Pose) -> Result<PathBuf> {
        let path = self.default_path(pose.name())?;
        let json = PoseRecord::from_pose(&pose).to_json_pretty()?;

        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::write(&path, json)?;

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            pose.name().to_string(),
            PoseEntry {
                pose: Arc::new(pose),
                source: Some(path.clone()),
            },
        );
        Ok(path)
    }

    /// Drop a pose from the cache; the file stays on disk
    pub fn invalidate(&self, name: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Sorted names of all cached poses
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `<base_dir>/<name>.json`, refusing names that would escape the directory
    fn default_path(&self, name: &str) -> Result<PathBuf> {
        super::definition_path(&self.base_dir, name, DEFINITION_EXTENSION)
    }
}

/// Read a pose file and check it defines the expected name
fn read_named(path: &Path, name: &str) -> Result<Pose> {
    let pose = format::read_pose_file(path)?;
    if pose.name() != name {
        return Err(Error::format(format!(
            "{} defines pose '{}', expected '{}'",
            path.display(),
            pose.name(),
            name
        )));
    }
    Ok(pose)
}

fn describe(source: Option<&Path>) -> String {
    source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<built-in>".to_string())
}
