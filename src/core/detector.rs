//! Warp classification and trigger detection
//!
//! # Detection Strategy
//!
//! Classification precedence is significant and deliberately preserved:
//! arrow first, then door-exit-requiring, then teleport pad, and finally a
//! default of Teleport whenever the tile carries a destination event that no
//! predicate matched. The precedence encodes game-data quirks (behavior
//! code 110 is in both the non-animated-door and teleport sets and must
//! classify as Door), so it is not re-derived from the predicate sets.
//!
//! Detection itself is pure: it reads tiles through [`TileSource`] and
//! returns a [`WarpTrigger`] or nothing. The `scan` wrapper adds the
//! per-frame bookkeeping (tile-changed check, cooldown guards) and reports
//! why no warp fired, which keeps the session loop and the tests honest.

use tracing::{debug, trace};

use super::behaviors::{
    arrow_direction_from_behavior, behavior_label, is_arrow_warp_behavior, is_teleport_warp_behavior,
    is_warp_behavior, requires_door_exit_sequence,
};
use super::cooldown::WarpCooldown;
use super::traits::TileSource;
use super::types::{Direction, TilePoint, WarpKind, WarpTrigger};

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Classify a behavior code into a warp kind.
///
/// Returns None for codes that are not warp-capable on their own; the
/// detector still defaults those to Teleport when a destination event is
/// present.
pub fn classify_warp_kind(behavior: u8) -> Option<WarpKind> {
    if is_arrow_warp_behavior(behavior) {
        return Some(WarpKind::Arrow);
    }
    if requires_door_exit_sequence(behavior) {
        return Some(WarpKind::Door);
    }
    if is_teleport_warp_behavior(behavior) {
        return Some(WarpKind::Teleport);
    }
    None
}

// =============================================================================
// DETECTOR
// =============================================================================

/// Detect a warp trigger at the given tile.
///
/// A destination event is required: a warp-capable behavior without one is
/// a world-data integrity problem, logged and treated as "no trigger".
pub fn detect_warp_trigger<T: TileSource + ?Sized>(
    world: &T,
    tile: TilePoint,
    facing: Direction,
) -> Option<WarpTrigger> {
    let resolved = world.resolve_tile(tile.x, tile.y)?;

    let warp_event = match resolved.warp_event {
        Some(event) => event,
        None => {
            if is_warp_behavior(resolved.behavior) {
                debug!(
                    map_id = %resolved.map_id,
                    x = tile.x,
                    y = tile.y,
                    behavior = %behavior_label(resolved.behavior),
                    "[warp] warp-capable tile has no destination event"
                );
            }
            return None;
        }
    };

    // Unmatched behaviors with a declared destination default to Teleport
    // so data-declared warps are never silently dropped
    let kind = classify_warp_kind(resolved.behavior).unwrap_or(WarpKind::Teleport);

    Some(WarpTrigger {
        kind,
        source_map: resolved.map_id,
        warp_event,
        behavior: resolved.behavior,
        facing,
    })
}

// =============================================================================
// SCAN
// =============================================================================

/// Why a scan produced no actionable warp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanBlock {
    /// Player is on a tile we already evaluated
    TileUnchanged,
    /// Tile is outside any loaded map
    NoTile,
    /// A warp is already running
    WarpInProgress,
    /// Post-warp or check cooldown still active
    OnCooldown,
    /// A door sequence is mid-flight
    DoorSequenceActive,
    /// Nothing warp-like here
    NoTrigger,
}

/// Actionable result of a per-frame warp scan
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    None(ScanBlock),
    /// Arrow tile: show the indicator, warp only on explicit confirmation
    Arrow {
        trigger: WarpTrigger,
        arrow_dir: Direction,
        metatile_id: u16,
    },
    /// Door-like tile: start the door entry sequence
    AutoDoor {
        trigger: WarpTrigger,
        metatile_id: u16,
    },
    /// Plain teleport: fade out, then warp
    WalkOver { trigger: WarpTrigger },
}

/// Scan result plus whether the evaluated tile differs from the last one
/// (the caller records it on the cooldown tracker when it does)
#[derive(Debug, Clone, PartialEq)]
pub struct WarpScan {
    pub outcome: ScanOutcome,
    pub tile_changed: bool,
    /// Map the player's tile belongs to, when resolvable
    pub current_map: Option<String>,
}

impl WarpScan {
    fn blocked(reason: ScanBlock, tile_changed: bool, current_map: Option<String>) -> Self {
        Self {
            outcome: ScanOutcome::None(reason),
            tile_changed,
            current_map,
        }
    }
}

/// Evaluate the player's tile for warp triggers.
///
/// Pure with respect to the cooldown tracker: the caller applies
/// `update_last_checked_tile` / `start_warp` based on the outcome.
pub fn scan_warp_trigger<T: TileSource + ?Sized>(
    world: &T,
    player_tile: TilePoint,
    facing: Direction,
    cooldown: &WarpCooldown,
    door_sequence_active: bool,
) -> WarpScan {
    let resolved = match world.resolve_tile(player_tile.x, player_tile.y) {
        Some(tile) => tile,
        None => return WarpScan::blocked(ScanBlock::NoTile, false, None),
    };
    let current_map = resolved.map_id.clone();
    let metatile_id = resolved.metatile_id;

    let tile_changed =
        !cooldown.is_same_tile_as_last_checked(player_tile.x, player_tile.y, &current_map);
    if !tile_changed {
        return WarpScan::blocked(ScanBlock::TileUnchanged, false, Some(current_map));
    }

    if door_sequence_active {
        return WarpScan::blocked(ScanBlock::DoorSequenceActive, tile_changed, Some(current_map));
    }

    let trigger = match detect_warp_trigger(world, player_tile, facing) {
        Some(trigger) => trigger,
        None => {
            trace!(
                map_id = %current_map,
                x = player_tile.x,
                y = player_tile.y,
                "[warp] no trigger at tile"
            );
            return WarpScan::blocked(ScanBlock::NoTrigger, tile_changed, Some(current_map));
        }
    };

    let outcome = match trigger.kind {
        WarpKind::Arrow => {
            // Arrow warps never auto-fire; surface them so the caller can
            // drive the indicator and wait for confirmation
            let arrow_dir = arrow_direction_from_behavior(trigger.behavior);
            match arrow_dir {
                Some(arrow_dir) => ScanOutcome::Arrow {
                    trigger,
                    arrow_dir,
                    metatile_id,
                },
                None => ScanOutcome::None(ScanBlock::NoTrigger),
            }
        }
        WarpKind::Door => {
            if cooldown.is_in_progress() {
                ScanOutcome::None(ScanBlock::WarpInProgress)
            } else if cooldown.is_on_cooldown() {
                ScanOutcome::None(ScanBlock::OnCooldown)
            } else {
                debug!(
                    map_id = %trigger.source_map,
                    behavior = %behavior_label(trigger.behavior),
                    dest_map = %trigger.warp_event.dest_map,
                    "[warp] door trigger"
                );
                ScanOutcome::AutoDoor { trigger, metatile_id }
            }
        }
        WarpKind::Teleport => {
            if cooldown.can_trigger(WarpKind::Teleport, player_tile.x, player_tile.y, &current_map)
            {
                debug!(
                    map_id = %trigger.source_map,
                    behavior = %behavior_label(trigger.behavior),
                    dest_map = %trigger.warp_event.dest_map,
                    "[warp] walk-over trigger"
                );
                ScanOutcome::WalkOver { trigger }
            } else if cooldown.is_in_progress() {
                ScanOutcome::None(ScanBlock::WarpInProgress)
            } else {
                ScanOutcome::None(ScanBlock::OnCooldown)
            }
        }
    };

    WarpScan {
        outcome,
        tile_changed,
        current_map: Some(current_map),
    }
}
