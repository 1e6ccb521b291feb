//! Fixed figurine skeleton and per-part transforms

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::core::Error;

/// Number of parts in the figurine skeleton
pub const PART_COUNT: usize = 7;

/// One named part of the figurine skeleton
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartName {
    Head,
    Hat,
    Body,
    RightArm,
    LeftArm,
    RightLeg,
    LeftLeg,
}

impl PartName {
    /// All parts in schema order
    pub const ALL: [PartName; PART_COUNT] = [
        PartName::Head,
        PartName::Hat,
        PartName::Body,
        PartName::RightArm,
        PartName::LeftArm,
        PartName::RightLeg,
        PartName::LeftLeg,
    ];

    /// Position of this part in schema order
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in definition files
    pub fn as_str(self) -> &'static str {
        match self {
            PartName::Head => "head",
            PartName::Hat => "hat",
            PartName::Body => "body",
            PartName::RightArm => "right_arm",
            PartName::LeftArm => "left_arm",
            PartName::RightLeg => "right_leg",
            PartName::LeftLeg => "left_leg",
        }
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartName::ALL
            .into_iter()
            .find(|part| part.as_str() == s)
            .ok_or_else(|| Error::schema(format!("unknown part '{}'", s)))
    }
}

/// Rotation (radians), position offset and scale applied to one part
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub rotation: Vec3,
    pub position: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Vec3::ZERO,
        position: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(rotation: Vec3, position: Vec3, scale: Vec3) -> Self {
        Self {
            rotation,
            position,
            scale,
        }
    }

    /// Identity transform with the given rotation
    pub fn from_rotation(rotation: Vec3) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Interpolate component-wise; rotations take the shortest way around
    pub fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            rotation: a.rotation + wrap_angles(b.rotation - a.rotation) * t,
            position: a.position.lerp(b.position, t),
            scale: a.scale.lerp(b.scale, t),
        }
    }

    /// Component-wise comparison with a tolerance
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.rotation.abs_diff_eq(other.rotation, epsilon)
            && self.position.abs_diff_eq(other.position, epsilon)
            && self.scale.abs_diff_eq(other.scale, epsilon)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Wrap each angle into [-PI, PI)
fn wrap_angles(delta: Vec3) -> Vec3 {
    use std::f32::consts::{PI, TAU};
    let wrap = |a: f32| (a + PI).rem_euclid(TAU) - PI;
    Vec3::new(wrap(delta.x), wrap(delta.y), wrap(delta.z))
}

/// A transform with any of its nine components left unspecified
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PartialTransform {
    pub rotation: [Option<f32>; 3],
    pub position: [Option<f32>; 3],
    pub scale: [Option<f32>; 3],
}

impl PartialTransform {
    /// Fully specified partial, every component present
    pub fn from_transform(transform: &Transform) -> Self {
        let some = |v: Vec3| [Some(v.x), Some(v.y), Some(v.z)];
        Self {
            rotation: some(transform.rotation),
            position: some(transform.position),
            scale: some(transform.scale),
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = [Some(rotation.x), Some(rotation.y), Some(rotation.z)];
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = [Some(position.x), Some(position.y), Some(position.z)];
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = [Some(scale.x), Some(scale.y), Some(scale.z)];
        self
    }
}

/// Fill every missing component of `explicit` from `defaults`
pub fn merge(explicit: &PartialTransform, defaults: &Transform) -> Transform {
    let pick = |given: [Option<f32>; 3], fallback: Vec3| {
        Vec3::new(
            given[0].unwrap_or(fallback.x),
            given[1].unwrap_or(fallback.y),
            given[2].unwrap_or(fallback.z),
        )
    };

    Transform {
        rotation: pick(explicit.rotation, defaults.rotation),
        position: pick(explicit.position, defaults.position),
        scale: pick(explicit.scale, defaults.scale),
    }
}
