//! On-disk JSON records for poses and actions
//!
//! Records are parsed leniently by serde and then validated by hand so the
//! caller gets a precise error kind: unknown names are schema errors, bad
//! numbers and durations are format errors.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::animation::{Action, Frame, Interpolation, PartName, PartialTransform, Pose, Transform};
use crate::core::{Error, Result};

/// File extension for pose and action definitions
pub const DEFINITION_EXTENSION: &str = "json";

/// One part block: `{ rotation?, position?, scale? }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
}

impl PartRecord {
    fn from_transform(transform: &Transform) -> Self {
        let list = |v: glam::Vec3| Some(vec![v.x as f64, v.y as f64, v.z as f64]);
        Self {
            rotation: list(transform.rotation),
            position: list(transform.position),
            scale: list(transform.scale),
        }
    }

    fn to_partial(&self, part: PartName) -> Result<PartialTransform> {
        Ok(PartialTransform {
            rotation: vector(part, "rotation", self.rotation.as_deref())?,
            position: vector(part, "position", self.position.as_deref())?,
            scale: vector(part, "scale", self.scale.as_deref())?,
        })
    }
}

/// Validate an optional `[x, y, z]` list
fn vector(part: PartName, field: &str, values: Option<&[f64]>) -> Result<[Option<f32>; 3]> {
    let Some(values) = values else {
        return Ok([None; 3]);
    };

    if values.len() != 3 {
        return Err(Error::format(format!(
            "{}.{} expects 3 numbers, got {}",
            part,
            field,
            values.len()
        )));
    }

    let mut out = [None; 3];
    for (slot, &value) in out.iter_mut().zip(values) {
        let narrowed = value as f32;
        if !narrowed.is_finite() {
            return Err(Error::format(format!("{}.{} contains non-finite value {}", part, field, value)));
        }
        *slot = Some(narrowed);
    }
    Ok(out)
}

/// A pose definition: `{ name, display_name?, <part>? ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Part blocks keyed by part name; any other key is rejected on conversion
    #[serde(flatten)]
    pub parts: BTreeMap<String, Value>,
}

impl PoseRecord {
    /// Full record for a pose, every part and component written out
    pub fn from_pose(pose: &Pose) -> Self {
        let parts = pose
            .parts()
            .map(|(part, transform)| {
                let block = serde_json::to_value(PartRecord::from_transform(&transform))
                    .unwrap_or(Value::Null);
                (part.as_str().to_string(), block)
            })
            .collect();

        Self {
            name: pose.name().to_string(),
            display_name: Some(pose.display_name().to_string()),
            parts,
        }
    }

    /// Validate and build the pose
    pub fn into_pose(self) -> Result<Pose> {
        if self.name.trim().is_empty() {
            return Err(Error::format("pose name must not be empty"));
        }

        let mut parts = Vec::with_capacity(self.parts.len());
        for (key, block) in self.parts {
            let part: PartName = key
                .parse()
                .map_err(|_| Error::schema(format!("pose '{}' has unknown part '{}'", self.name, key)))?;
            let record: PartRecord = serde_json::from_value(block).map_err(|e| {
                Error::format(format!("pose '{}' part '{}': {}", self.name, key, e))
            })?;
            parts.push((part, record.to_partial(part)?));
        }

        Ok(Pose::new(self.name, self.display_name, parts))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse and validate a pose from any reader
pub fn parse_pose<R: Read>(reader: R) -> Result<Pose> {
    let record: PoseRecord = serde_json::from_reader(reader)?;
    record.into_pose()
}

/// Parse and validate a pose file
pub fn read_pose_file(path: &Path) -> Result<Pose> {
    let bytes = std::fs::read(path)?;
    parse_pose(bytes.as_slice())
        .map_err(|e| with_path(e, path))
}

/// A frame's pose: a name to resolve or an inline pose record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoseRef {
    Named(String),
    Inline(Value),
}

/// One frame: `{ pose, duration, interpolation? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameRecord {
    pub pose: PoseRef,
    /// Ticks; validated as a positive integer
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<String>,
}

/// An action definition: `{ name, loop?, frames }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionRecord {
    pub name: String,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    pub frames: Vec<FrameRecord>,
}

impl ActionRecord {
    /// Validate and build the action, resolving named poses through `lookup`
    ///
    /// Every referenced pose must resolve now; a miss is a reference error.
    pub fn resolve<F>(self, lookup: F) -> Result<Action>
    where
        F: Fn(&str) -> Option<Arc<Pose>>,
    {
        if self.name.trim().is_empty() {
            return Err(Error::format("action name must not be empty"));
        }

        let mut frames = Vec::with_capacity(self.frames.len());
        for (index, frame) in self.frames.into_iter().enumerate() {
            let duration = u32::try_from(frame.duration)
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| {
                    Error::format(format!(
                        "action '{}' frame {} has invalid duration {}",
                        self.name, index, frame.duration
                    ))
                })?;

            let interpolation = match frame.interpolation.as_deref() {
                Some(mode) => mode.parse::<Interpolation>()?,
                None => Interpolation::default(),
            };

            let pose = match frame.pose {
                PoseRef::Named(name) => lookup(&name).ok_or_else(|| Error::Reference {
                    action: self.name.clone(),
                    pose: name,
                })?,
                PoseRef::Inline(value) => Arc::new(inline_pose(&self.name, index, value)?),
            };

            frames.push(Frame::new(pose, duration, interpolation)?);
        }

        Action::new(self.name, frames, self.looping)
    }
}

/// Inline poses may omit their name; they are named after the action and frame
fn inline_pose(action: &str, index: usize, mut value: Value) -> Result<Pose> {
    let Value::Object(map) = &mut value else {
        return Err(Error::format(format!(
            "action '{}' frame {} pose must be a name or an object",
            action, index
        )));
    };
    map.entry("name")
        .or_insert_with(|| Value::String(format!("{}#{}", action, index)));

    let record: PoseRecord = serde_json::from_value(value)?;
    record.into_pose()
}

/// Parse an action record without resolving references
pub fn parse_action_record<R: Read>(reader: R) -> Result<ActionRecord> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read an action record from disk without resolving references
pub fn read_action_file(path: &Path) -> Result<ActionRecord> {
    let bytes = std::fs::read(path)?;
    parse_action_record(bytes.as_slice()).map_err(|e| with_path(e, path))
}

/// Prefix format and schema messages with the offending file
fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::Format(msg) => Error::Format(format!("{}: {}", path.display(), msg)),
        Error::Schema(msg) => Error::Schema(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}

/// True for files that look like definitions
pub fn is_definition_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(DEFINITION_EXTENSION))
}
