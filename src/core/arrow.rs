//! Directional warp indicator overlay
//!
//! Arrow warps (stairs, carpets) need explicit player confirmation, so the
//! game shows a bobbing arrow one tile ahead of the player while they face
//! the warp direction. This module only tracks the overlay state; drawing
//! is the renderer's job.

use std::f32::consts::TAU;

use super::constants::{ARROW_BOB_AMPLITUDE_PX, ARROW_BOB_CYCLE_MS, ARROW_FRAME_COUNT};
use super::types::{Direction, TilePoint};

#[derive(Debug, Default)]
pub struct ArrowOverlay {
    visible: bool,
    direction: Option<Direction>,
    tile: Option<TilePoint>,
    /// When the overlay last became visible or changed direction; the bob
    /// animation phase is measured from here
    started_at: u64,
}

impl ArrowOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-frame update.
    ///
    /// The overlay is visible only while no warp is in progress and the
    /// player faces the arrow's direction. `started_at` is reset only when
    /// the overlay becomes newly visible or the direction changes, so the
    /// bob phase stays stable across frames.
    pub fn update(
        &mut self,
        player_dir: Direction,
        arrow_dir: Option<Direction>,
        player_tile: TilePoint,
        now: u64,
        warp_in_progress: bool,
    ) {
        let arrow_dir = match arrow_dir {
            Some(dir) if !warp_in_progress && dir == player_dir => dir,
            _ => {
                self.hide();
                return;
            }
        };

        let newly_visible = !self.visible;
        let direction_changed = self.direction != Some(arrow_dir);
        if newly_visible || direction_changed {
            self.started_at = now;
        }

        self.visible = true;
        self.direction = Some(arrow_dir);
        self.tile = Some(player_tile.step(arrow_dir));
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.direction = None;
        self.tile = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Tile the arrow is drawn on (one step ahead of the player)
    pub fn tile(&self) -> Option<TilePoint> {
        self.tile
    }

    /// Phase within the bob cycle, in [0, 1)
    pub fn cycle_progress(&self, now: u64) -> f32 {
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed % ARROW_BOB_CYCLE_MS) as f32 / ARROW_BOB_CYCLE_MS as f32
    }

    /// Vertical bob offset in pixels
    pub fn bob_offset(&self, now: u64) -> f32 {
        if !self.visible {
            return 0.0;
        }
        (self.cycle_progress(now) * TAU).sin() * ARROW_BOB_AMPLITUDE_PX
    }

    /// Sprite frame for the current cycle phase
    pub fn frame_index(&self, now: u64) -> u32 {
        (self.cycle_progress(now) * ARROW_FRAME_COUNT as f32) as u32 % ARROW_FRAME_COUNT
    }
}
