//! Runtime configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILENAME: &str = "mannequin.json";

/// Preview tooling server settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugServerConfig {
    pub enabled: bool,
    /// Socket address to bind, e.g. "127.0.0.1:9742"
    pub address: String,
}

impl Default for DebugServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: format!("127.0.0.1:{}", mannequin_debug::DEFAULT_PORT),
        }
    }
}

/// Configuration for content directories and runtime behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MannequinConfig {
    /// Root that the relative content directories resolve against
    pub content_root: PathBuf,
    /// Pose definitions, one JSON file each
    pub poses_dir: PathBuf,
    /// Action definitions, one JSON file each
    pub actions_dir: PathBuf,
    /// Skin textures scanned for variants
    pub skins_dir: PathBuf,
    /// Filename stem suffix marking a thin-arm skin
    pub slim_suffix: String,
    /// Extension of a sibling marker file marking a thin-arm skin
    pub slim_marker_extension: String,
    /// Identifiers the host already owns
    pub reserved_ids: Vec<String>,
    /// Simulation ticks per second
    pub ticks_per_second: u32,
    pub debug_server: DebugServerConfig,
}

impl Default for MannequinConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("content"),
            poses_dir: PathBuf::from("poses"),
            actions_dir: PathBuf::from("actions"),
            skins_dir: PathBuf::from("skins"),
            slim_suffix: "_slim".to_string(),
            slim_marker_extension: "slim".to_string(),
            reserved_ids: vec!["figurine".to_string(), "default".to_string()],
            ticks_per_second: 20,
            debug_server: DebugServerConfig::default(),
        }
    }
}

impl MannequinConfig {
    /// Configuration rooted at `content_root` with every other field defaulted
    pub fn with_root(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            ..Default::default()
        }
    }

    /// Read config from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        if config.ticks_per_second == 0 {
            return Err(crate::core::Error::format("ticks_per_second must be positive"));
        }
        Ok(config)
    }

    pub fn poses_path(&self) -> PathBuf {
        self.content_root.join(&self.poses_dir)
    }

    pub fn actions_path(&self) -> PathBuf {
        self.content_root.join(&self.actions_dir)
    }

    pub fn skins_path(&self) -> PathBuf {
        self.content_root.join(&self.skins_dir)
    }

    /// Wall-clock length of one tick
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.ticks_per_second.max(1) as f64)
    }
}
