//! Pose and action model for the figurine skeleton

pub mod skeleton;
pub mod pose;
pub mod action;
pub mod animator;

pub use skeleton::{merge, PartName, PartialTransform, Transform, PART_COUNT};
pub use pose::{Pose, STANDING_ARM_SPLAY, STANDING_POSE_NAME};
pub use action::{get_pose_at, Action, Frame, Interpolation};
pub use animator::ActionPlayer;
