//! Actions: timed sequences of poses

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::pose::Pose;
use crate::core::{Error, Result};

/// How a frame blends toward the next one
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

impl Interpolation {
    pub fn as_str(self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::Step => "step",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Interpolation::Linear),
            "step" => Ok(Interpolation::Step),
            other => Err(Error::schema(format!("unknown interpolation '{}'", other))),
        }
    }
}

/// One timed pose in an action
#[derive(Clone, Debug)]
pub struct Frame {
    pub pose: Arc<Pose>,
    /// Length of this frame in ticks, always positive
    pub duration_ticks: u32,
    pub interpolation: Interpolation,
}

impl Frame {
    pub fn new(pose: Arc<Pose>, duration_ticks: u32, interpolation: Interpolation) -> Result<Self> {
        if duration_ticks == 0 {
            return Err(Error::format(format!(
                "frame with pose '{}' has zero duration",
                pose.name()
            )));
        }
        Ok(Self {
            pose,
            duration_ticks,
            interpolation,
        })
    }
}

/// A named, non-empty sequence of frames
#[derive(Clone, Debug)]
pub struct Action {
    name: String,
    frames: Vec<Frame>,
    looping: bool,
    total_ticks: u64,
}

impl Action {
    pub fn new(name: impl Into<String>, frames: Vec<Frame>, looping: bool) -> Result<Self> {
        let name = name.into();
        if frames.is_empty() {
            return Err(Error::format(format!("action '{}' has no frames", name)));
        }
        if let Some(frame) = frames.iter().find(|f| f.duration_ticks == 0) {
            return Err(Error::format(format!(
                "action '{}' has a zero-duration frame for pose '{}'",
                name,
                frame.pose.name()
            )));
        }

        let total_ticks = frames.iter().map(|f| f.duration_ticks as u64).sum();
        Ok(Self {
            name,
            frames,
            looping,
            total_ticks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Sum of all frame durations
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Locate the frame covering `elapsed_ticks` and how far into it we are
    ///
    /// Looping actions wrap; others hold the last frame once past the end.
    fn locate(&self, elapsed_ticks: u64) -> (usize, f32) {
        let last = self.frames.len() - 1;
        let time = if self.looping {
            elapsed_ticks % self.total_ticks
        } else if elapsed_ticks >= self.total_ticks {
            return (last, 1.0);
        } else {
            elapsed_ticks
        };

        let mut start = 0u64;
        for (index, frame) in self.frames.iter().enumerate() {
            let end = start + frame.duration_ticks as u64;
            if time < end {
                let fraction = (time - start) as f32 / frame.duration_ticks as f32;
                return (index, fraction);
            }
            start = end;
        }

        // Unreachable while time < total_ticks
        (last, 1.0)
    }

    /// Index of the frame that follows `index` during playback
    fn next_index(&self, index: usize) -> usize {
        if index + 1 < self.frames.len() {
            index + 1
        } else if self.looping {
            0
        } else {
            index
        }
    }

    /// Interpolated pose for `elapsed_ticks` since playback started
    ///
    /// The result carries the action's name.
    pub fn get_pose_at(&self, elapsed_ticks: u64) -> Pose {
        let (index, fraction) = self.locate(elapsed_ticks);
        let frame = &self.frames[index];

        let pose = match frame.interpolation {
            Interpolation::Step => (*frame.pose).clone(),
            Interpolation::Linear => {
                let next = &self.frames[self.next_index(index)];
                Pose::lerp(&frame.pose, &next.pose, fraction)
            }
        };

        pose.renamed(self.name.clone(), None)
    }
}

/// Free-function form of [`Action::get_pose_at`]
pub fn get_pose_at(action: &Action, elapsed_ticks: u64) -> Pose {
    action.get_pose_at(elapsed_ticks)
}
