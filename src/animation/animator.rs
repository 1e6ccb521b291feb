//! Tick-driven action playback

use std::sync::Arc;

use super::{Action, Pose};

/// Playback state for one action, advanced by the simulation tick
#[derive(Clone, Debug)]
pub struct ActionPlayer {
    action: Arc<Action>,
    elapsed_ticks: u64,
    /// Ticks of action time per simulation tick
    speed: u32,
    playing: bool,
}

impl ActionPlayer {
    /// Create a stopped player at the start of `action`
    pub fn new(action: Arc<Action>) -> Self {
        Self {
            action,
            elapsed_ticks: 0,
            speed: 1,
            playing: false,
        }
    }

    /// Create a player that is already running
    pub fn playing(action: Arc<Action>) -> Self {
        let mut player = Self::new(action);
        player.play();
        player
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Pause, keeping the current time
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Stop and rewind to the first frame
    pub fn stop(&mut self) {
        self.playing = false;
        self.elapsed_ticks = 0;
    }

    pub fn set_speed(&mut self, speed: u32) {
        self.speed = speed;
    }

    /// Jump to `elapsed_ticks`; looping actions wrap into their cycle
    pub fn seek(&mut self, elapsed_ticks: u64) {
        self.elapsed_ticks = if self.action.is_looping() {
            elapsed_ticks % self.action.total_ticks()
        } else {
            elapsed_ticks
        };
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn action(&self) -> &Arc<Action> {
        &self.action
    }

    /// True once a non-looping action has run past its last frame
    pub fn is_finished(&self) -> bool {
        !self.action.is_looping() && self.elapsed_ticks >= self.action.total_ticks()
    }

    /// Advance by `ticks` simulation ticks
    pub fn advance(&mut self, ticks: u64) {
        if !self.playing {
            return;
        }

        let step = ticks.saturating_mul(self.speed as u64);
        if self.action.is_looping() {
            // Reduce both terms first so the sum cannot overflow
            let total = self.action.total_ticks();
            self.elapsed_ticks = (self.elapsed_ticks % total + step % total) % total;
        } else {
            self.elapsed_ticks = self.elapsed_ticks.saturating_add(step).min(self.action.total_ticks());
            if self.is_finished() {
                self.playing = false;
            }
        }
    }

    /// Pose for the current playback position
    pub fn current_pose(&self) -> Pose {
        self.action.get_pose_at(self.elapsed_ticks)
    }
}
