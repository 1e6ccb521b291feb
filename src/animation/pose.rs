//! Named, complete sets of part transforms

use glam::Vec3;

use super::skeleton::{merge, PartName, PartialTransform, Transform, PART_COUNT};

/// Arm splay of the standing pose, in radians (40 degrees)
pub const STANDING_ARM_SPLAY: f32 = 0.698_131_7;

/// Name of the built-in standing pose
pub const STANDING_POSE_NAME: &str = "standing";

/// A static posture: one transform for every skeleton part
///
/// Poses are immutable once built. Accessors hand out copies, so a pose can
/// be shared behind an `Arc` between the tick and render threads.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    name: String,
    display_name: String,
    transforms: [Transform; PART_COUNT],
}

impl Pose {
    /// Build a pose from explicit per-part data, defaulting missing parts to identity
    pub fn new(
        name: impl Into<String>,
        display_name: Option<String>,
        parts: impl IntoIterator<Item = (PartName, PartialTransform)>,
    ) -> Self {
        let mut transforms = [Transform::IDENTITY; PART_COUNT];
        for (part, partial) in parts {
            transforms[part.index()] = merge(&partial, &Transform::IDENTITY);
        }

        let name = name.into();
        Self {
            display_name: display_name.unwrap_or_else(|| name.clone()),
            name,
            transforms,
        }
    }

    /// Default appearance: identity everywhere, arms splayed outward
    pub fn standing() -> Self {
        Self::new(
            STANDING_POSE_NAME,
            Some("Standing".to_string()),
            [
                (
                    PartName::RightArm,
                    PartialTransform::default().with_rotation(Vec3::new(0.0, 0.0, STANDING_ARM_SPLAY)),
                ),
                (
                    PartName::LeftArm,
                    PartialTransform::default().with_rotation(Vec3::new(0.0, 0.0, -STANDING_ARM_SPLAY)),
                ),
            ],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Transform of a single part
    pub fn transform(&self, part: PartName) -> Transform {
        self.transforms[part.index()]
    }

    /// All transforms in schema order
    pub fn transforms(&self) -> [Transform; PART_COUNT] {
        self.transforms
    }

    /// Iterate parts with their transforms in schema order
    pub fn parts(&self) -> impl Iterator<Item = (PartName, Transform)> + '_ {
        PartName::ALL.into_iter().map(|part| (part, self.transforms[part.index()]))
    }

    /// Same transforms under a different name
    pub fn renamed(&self, name: impl Into<String>, display_name: Option<String>) -> Self {
        let name = name.into();
        Self {
            display_name: display_name.unwrap_or_else(|| name.clone()),
            name,
            transforms: self.transforms,
        }
    }

    /// Interpolate every part between two poses; the result keeps `a`'s name
    pub fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        let mut transforms = a.transforms;
        for (out, target) in transforms.iter_mut().zip(b.transforms.iter()) {
            *out = Transform::lerp(out, target, t);
        }

        Self {
            name: a.name.clone(),
            display_name: a.display_name.clone(),
            transforms,
        }
    }

    /// Compare transforms only, with a tolerance
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.transforms
            .iter()
            .zip(other.transforms.iter())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parts_are_identity() {
        let pose = Pose::new(
            "nod",
            None,
            [(PartName::Head, PartialTransform::default().with_rotation(Vec3::new(0.3, 0.0, 0.0)))],
        );

        assert_eq!(pose.display_name(), "nod");
        assert_eq!(pose.parts().count(), PART_COUNT);
        assert_eq!(pose.transform(PartName::Head).rotation, Vec3::new(0.3, 0.0, 0.0));
        for part in PartName::ALL.into_iter().filter(|p| *p != PartName::Head) {
            assert_eq!(pose.transform(part), Transform::IDENTITY);
        }
    }

    #[test]
    fn test_standing_arms_are_mirrored() {
        let pose = Pose::standing();
        let right = pose.transform(PartName::RightArm).rotation;
        let left = pose.transform(PartName::LeftArm).rotation;

        assert!((right.z - 0.698).abs() < 1e-3);
        assert_eq!(left.z, -right.z);
        assert_eq!(pose.transform(PartName::Body), Transform::IDENTITY);
    }

    #[test]
    fn test_accessor_returns_copy() {
        let pose = Pose::standing();
        let mut transforms = pose.transforms();
        transforms[0].rotation = Vec3::splat(9.0);
        assert_eq!(pose.transform(PartName::Head), Transform::IDENTITY);
    }

    #[test]
    fn test_pose_lerp_endpoints() {
        let a = Pose::new("a", None, []);
        let b = Pose::standing();
        assert!(Pose::lerp(&a, &b, 0.0).abs_diff_eq(&a, 1e-6));
        assert!(Pose::lerp(&a, &b, 1.0).abs_diff_eq(&b, 1e-6));
        assert_eq!(Pose::lerp(&a, &b, 0.5).name(), "a");
    }
}
