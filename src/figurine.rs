//! Runtime state of a spawned figurine

use std::sync::Arc;

use uuid::Uuid;

use crate::animation::{Action, ActionPlayer, Pose};
use crate::variant::{RenderBinding, VariantId};

/// What a figurine is currently showing
#[derive(Clone, Debug)]
pub enum Animation {
    /// A static pose
    Pose(Arc<Pose>),
    /// An action being played back
    Action(ActionPlayer),
}

impl Animation {
    /// Name of the pose or action
    pub fn name(&self) -> &str {
        match self {
            Animation::Pose(pose) => pose.name(),
            Animation::Action(player) => player.action().name(),
        }
    }
}

/// One spawned figurine: its variant and its current pose or action
///
/// Owned by the simulation tick; the renderer reads `current_pose()`.
#[derive(Clone, Debug)]
pub struct Figurine {
    id: Uuid,
    variant: VariantId,
    binding: RenderBinding,
    animation: Option<Animation>,
}

impl Figurine {
    pub fn new(variant: VariantId, binding: RenderBinding) -> Self {
        Self {
            id: Uuid::new_v4(),
            variant,
            binding,
            animation: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn variant(&self) -> &VariantId {
        &self.variant
    }

    pub fn render_binding(&self) -> &RenderBinding {
        &self.binding
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    /// Hold a static pose, dropping any running action
    pub fn set_pose(&mut self, pose: Arc<Pose>) {
        self.animation = Some(Animation::Pose(pose));
    }

    /// Start `action` from its first frame
    pub fn play_action(&mut self, action: Arc<Action>) {
        self.animation = Some(Animation::Action(ActionPlayer::playing(action)));
    }

    /// Back to the standing pose
    pub fn clear_animation(&mut self) {
        self.animation = None;
    }

    /// Mutable access to the running action, if any
    pub fn player_mut(&mut self) -> Option<&mut ActionPlayer> {
        match &mut self.animation {
            Some(Animation::Action(player)) => Some(player),
            _ => None,
        }
    }

    /// Advance playback by one simulation tick
    pub fn tick(&mut self) {
        if let Some(player) = self.player_mut() {
            player.advance(1);
        }
    }

    /// Snapshot for rendering
    pub fn current_pose(&self) -> Pose {
        match &self.animation {
            Some(Animation::Pose(pose)) => Pose::clone(pose),
            Some(Animation::Action(player)) => player.current_pose(),
            None => Pose::standing(),
        }
    }
}
