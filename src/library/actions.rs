//! Name-keyed action cache
//!
//! Actions resolve their named poses through a [`PoseLibrary`] when they are
//! loaded, so a missing pose fails the load rather than playback.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::format::{self, DEFINITION_EXTENSION};
use super::poses::PoseLibrary;
use super::LoadReport;
use crate::animation::Action;
use crate::core::{Error, Result};

struct ActionEntry {
    action: Arc<Action>,
    source: Option<PathBuf>,
}

/// Action library manager
pub struct ActionLibrary {
    base_dir: PathBuf,
    entries: RwLock<HashMap<String, ActionEntry>>,
}

impl ActionLibrary {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a library and load every action file, resolving against `poses`
    pub fn open(base_dir: PathBuf, poses: &PoseLibrary) -> Result<(Self, LoadReport)> {
        let library = Self::new(base_dir);
        let report = library.load_all(poses)?;
        Ok((library, report))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Load every definition file in name order; bad files are skipped
    pub fn load_all(&self, poses: &PoseLibrary) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for path in super::definition_files(&self.base_dir)? {
            match load_file(&path, poses) {
                Ok(action) => {
                    report.loaded.push(action.name().to_string());
                    self.insert_from(action, Some(path));
                }
                Err(e) => {
                    log::warn!("Skipping action file {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }

        log::info!(
            "Loaded {} actions from {} ({} failed)",
            report.loaded.len(),
            self.base_dir.display(),
            report.failed.len()
        );
        Ok(report)
    }

    fn insert_from(&self, action: Action, source: Option<PathBuf>) {
        let name = action.name().to_string();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&name) {
            log::warn!("Action '{}' redefined, keeping the latest", name);
        }
        entries.insert(
            name,
            ActionEntry {
                action: Arc::new(action),
                source,
            },
        );
    }

    /// Add an action built in code
    pub fn insert(&self, action: Action) {
        self.insert_from(action, None);
    }

    pub fn cached(&self, name: &str) -> Option<Arc<Action>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| entry.action.clone())
    }

    /// Action by name, reading `<name>.json` on a cache miss
    pub fn get(&self, name: &str, poses: &PoseLibrary) -> Result<Arc<Action>> {
        if let Some(action) = self.cached(name) {
            return Ok(action);
        }

        let path = super::definition_path(&self.base_dir, name, DEFINITION_EXTENSION)?;
        let action = Arc::new(load_named(&path, name, poses)?);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.to_string(),
                ActionEntry {
                    action: action.clone(),
                    source: Some(path),
                },
            );
        Ok(action)
    }

    /// Re-read and re-resolve the action; on failure the old entry stays
    pub fn reload(&self, name: &str, poses: &PoseLibrary) -> Result<Arc<Action>> {
        let source = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|entry| entry.source.clone());
        let path = match source {
            Some(path) => path,
            None => super::definition_path(&self.base_dir, name, DEFINITION_EXTENSION)?,
        };

        let action = Arc::new(load_named(&path, name, poses)?);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.to_string(),
                ActionEntry {
                    action: action.clone(),
                    source: Some(path),
                },
            );
        log::info!("Reloaded action '{}'", name);
        Ok(action)
    }

    pub fn invalidate(&self, name: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Sorted names of all cached actions
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
}

fn load_file(path: &Path, poses: &PoseLibrary) -> Result<Action> {
    format::read_action_file(path)?.resolve(|name| poses.get(name).ok())
}

fn load_named(path: &Path, name: &str, poses: &PoseLibrary) -> Result<Action> {
    let action = load_file(path, poses)?;
    if action.name() != name {
        return Err(Error::format(format!(
            "{} defines action '{}', expected '{}'",
            path.display(),
            action.name(),
            name
        )));
    }
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{PartName, Pose};
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        poses: PoseLibrary,
        actions_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let poses_dir = temp_dir.path().join("poses");
        let actions_dir = temp_dir.path().join("actions");
        std::fs::create_dir_all(&poses_dir).unwrap();
        std::fs::create_dir_all(&actions_dir).unwrap();
        std::fs::write(
            poses_dir.join("up.json"),
            r#"{ "name": "up", "right_arm": { "rotation": [-3.0, 0, 0] } }"#,
        )
        .unwrap();

        let (poses, _) = PoseLibrary::open(poses_dir).expect("poses");
        poses.insert(Pose::standing());
        Fixture {
            _temp_dir: temp_dir,
            poses,
            actions_dir,
        }
    }

    const WAVE: &str = r#"{
        "name": "wave",
        "loop": true,
        "frames": [
            { "pose": "standing", "duration": 10 },
            { "pose": "up", "duration": 10 }
        ]
    }"#;

    #[test]
    fn test_load_and_sample() {
        let fx = fixture();
        std::fs::write(fx.actions_dir.join("wave.json"), WAVE).unwrap();

        let (actions, report) = ActionLibrary::open(fx.actions_dir.clone(), &fx.poses).expect("open");
        assert_eq!(report.loaded, vec!["wave".to_string()]);

        let wave = actions.get("wave", &fx.poses).unwrap();
        let arm = wave.get_pose_at(15).transform(PartName::RightArm).rotation;
        // Halfway from "up" back to "standing" on the looping return leg
        assert!((arm.x + 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_unresolved_pose_fails_load() {
        let fx = fixture();
        std::fs::write(
            fx.actions_dir.join("broken.json"),
            r#"{ "name": "broken", "frames": [ { "pose": "missing", "duration": 4 } ] }"#,
        )
        .unwrap();

        let (actions, report) = ActionLibrary::open(fx.actions_dir.clone(), &fx.poses).expect("open");
        assert!(actions.is_empty());
        assert!(matches!(report.failed[0].1, Error::Reference { .. }));
    }

    #[test]
    fn test_reference_loaded_on_demand() {
        let fx = fixture();
        std::fs::write(
            fx.poses.base_dir().join("late.json"),
            r#"{ "name": "late" }"#,
        )
        .unwrap();
        std::fs::write(
            fx.actions_dir.join("uses_late.json"),
            r#"{ "name": "uses_late", "frames": [ { "pose": "late", "duration": 4 } ] }"#,
        )
        .unwrap();

        let actions = ActionLibrary::new(fx.actions_dir.clone());
        assert!(actions.get("uses_late", &fx.poses).is_ok());
        assert!(fx.poses.cached("late").is_some());
    }

    #[test]
    fn test_failed_reload_keeps_old_entry() {
        let fx = fixture();
        let path = fx.actions_dir.join("wave.json");
        std::fs::write(&path, WAVE).unwrap();
        let (actions, _) = ActionLibrary::open(fx.actions_dir.clone(), &fx.poses).expect("open");

        std::fs::write(&path, r#"{ "name": "wave", "frames": [ { "pose": "up", "duration": 0 } ] }"#).unwrap();
        assert!(matches!(actions.reload("wave", &fx.poses), Err(Error::Format(_))));
        assert_eq!(actions.get("wave", &fx.poses).unwrap().total_ticks(), 20);

        std::fs::write(&path, r#"{ "name": "wave", "frames": [ { "pose": "up", "duration": 3 } ] }"#).unwrap();
        assert_eq!(actions.reload("wave", &fx.poses).unwrap().total_ticks(), 3);
        assert_eq!(actions.names(), vec!["wave".to_string()]);
    }
}
