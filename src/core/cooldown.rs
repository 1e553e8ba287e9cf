//! Warp cooldown and duplicate-trigger suppression
//!
//! Runtime state around warp detection: whether a warp is in flight, the
//! post-warp cooldown, and the last tile evaluated (so standing on a warp
//! tile does not re-fire it every frame). The detection itself lives in the
//! `detector` module; this tracker only answers "may a warp start now".

use serde::Serialize;
use tracing::debug;

use super::constants::{MIN_CHECK_COOLDOWN_MS, WARP_COOLDOWN_MS};
use super::types::{TileRef, WarpKind};

/// Snapshot of the tracker, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooldownState {
    pub in_progress: bool,
    pub cooldown_ms: u64,
    pub last_checked_tile: Option<TileRef>,
}

/// Tracks warp-in-progress, cooldown, and last-checked tile.
///
/// `cooldown_ms` is unsigned and decremented with saturation, so it can
/// never go negative.
#[derive(Debug, Default)]
pub struct WarpCooldown {
    in_progress: bool,
    cooldown_ms: u64,
    last_checked_tile: Option<TileRef>,
}

impl WarpCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick the cooldown down. Call once per frame.
    pub fn update(&mut self, delta_ms: u64) {
        self.cooldown_ms = self.cooldown_ms.saturating_sub(delta_ms);
    }

    /// Whether a warp of `kind` may start from the given tile.
    ///
    /// Refuses while a warp is in progress, while the cooldown runs, for
    /// arrow warps (those need explicit player confirmation), and for the
    /// tile that was already checked.
    pub fn can_trigger(&self, kind: WarpKind, tile_x: i32, tile_y: i32, map_id: &str) -> bool {
        if self.in_progress {
            return false;
        }
        if self.cooldown_ms > 0 {
            return false;
        }
        if kind == WarpKind::Arrow {
            return false;
        }
        if self.is_same_tile_as_last_checked(tile_x, tile_y, map_id) {
            return false;
        }
        true
    }

    /// Mark a warp as started from the given tile
    pub fn start_warp(&mut self, tile_x: i32, tile_y: i32, map_id: &str) {
        self.in_progress = true;
        self.last_checked_tile = Some(TileRef::new(map_id, tile_x, tile_y));
        debug!(map_id, tile_x, tile_y, "[warp] started");
    }

    /// Mark the warp as completed on the destination tile and start the
    /// post-warp cooldown
    pub fn complete_warp(&mut self, dest_map_id: &str, dest_x: i32, dest_y: i32) {
        self.in_progress = false;
        self.cooldown_ms = WARP_COOLDOWN_MS;
        self.last_checked_tile = Some(TileRef::new(dest_map_id, dest_x, dest_y));
        debug!(
            map_id = dest_map_id,
            dest_x,
            dest_y,
            cooldown_ms = WARP_COOLDOWN_MS,
            "[warp] completed"
        );
    }

    /// Record the tile the detector just evaluated.
    ///
    /// Also imposes the minimum check-cooldown so the tile is not
    /// re-evaluated again in the same burst of frames.
    pub fn update_last_checked_tile(&mut self, tile_x: i32, tile_y: i32, map_id: &str) {
        self.last_checked_tile = Some(TileRef::new(map_id, tile_x, tile_y));
        self.cooldown_ms = self.cooldown_ms.max(MIN_CHECK_COOLDOWN_MS);
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown_ms > 0
    }

    pub fn cooldown_remaining(&self) -> u64 {
        self.cooldown_ms
    }

    /// Force the in-progress flag. Door sequences manage their own warp
    /// timing and set this directly.
    pub fn set_in_progress(&mut self, in_progress: bool) {
        self.in_progress = in_progress;
    }

    pub fn set_cooldown(&mut self, cooldown_ms: u64) {
        self.cooldown_ms = cooldown_ms;
    }

    /// Forget the last checked tile, e.g. when the player steps away
    pub fn clear_last_checked_tile(&mut self) {
        self.last_checked_tile = None;
    }

    pub fn is_same_tile_as_last_checked(&self, tile_x: i32, tile_y: i32, map_id: &str) -> bool {
        match &self.last_checked_tile {
            Some(last) => last.map_id == map_id && last.x == tile_x && last.y == tile_y,
            None => false,
        }
    }

    pub fn state(&self) -> CooldownState {
        CooldownState {
            in_progress: self.in_progress,
            cooldown_ms: self.cooldown_ms,
            last_checked_tile: self.last_checked_tile.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
