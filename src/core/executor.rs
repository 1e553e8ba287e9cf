//! Warp execution
//!
//! The renderer-agnostic part of actually performing a map transition:
//! calculate where the player lands, which way they face, whether the
//! arrival plays a door exit sequence, and the cooldown bookkeeping.
//! Callers reach this once a fade-out has completed with a pending trigger.

use tracing::{debug, info};

use super::behaviors::{
    is_deep_south_warp, is_door_behavior, is_east_arrow_warp, is_ladder_behavior,
    is_non_animated_door_behavior, is_north_arrow_warp, is_south_arrow_warp, is_west_arrow_warp,
    requires_door_exit_sequence,
};
use super::constants::{DOOR_FADE_DURATION_MS, FADE_DEFAULT_DURATION_MS};
use super::cooldown::WarpCooldown;
use super::door::{DoorExitAction, DoorExitConfig, DoorSequencer};
use super::errors::WarpError;
use super::fade::FadeController;
use super::traits::{DoorAnimKind, DoorAnimationHost, PlayerHandle, WorldService};
use super::types::{Direction, MapView, TilePoint, WarpKind, WarpTrigger};

// =============================================================================
// SPAWN POSITION
// =============================================================================

/// World coordinates the player lands on for a destination warp id.
///
/// Falls back to the map's first warp event, then to the map center, so a
/// bad warp id in world data never strands the player off-map.
pub fn calculate_spawn_position(view: &MapView, dest_warp_id: usize) -> TilePoint {
    if let Some(warp) = view.warp_events.get(dest_warp_id) {
        return TilePoint::new(view.origin_x + warp.x, view.origin_y + warp.y);
    }
    if let Some(warp) = view.warp_events.first() {
        return TilePoint::new(view.origin_x + warp.x, view.origin_y + warp.y);
    }
    TilePoint::new(
        view.origin_x + view.width / 2,
        view.origin_y + view.height / 2,
    )
}

// =============================================================================
// FACING
// =============================================================================

/// Which way the player faces after arriving on a tile.
///
/// Priority order, first match wins: deep-south warp faces up; any door
/// faces down; arrow warps face opposite the arrow; ladders preserve the
/// prior facing; everything else faces down.
pub fn determine_facing(dest_behavior: Option<u8>, prior_facing: Direction) -> Direction {
    let behavior = match dest_behavior {
        Some(behavior) => behavior,
        None => return Direction::Down,
    };

    if is_deep_south_warp(behavior) {
        return Direction::Up;
    }
    if is_door_behavior(behavior) || is_non_animated_door_behavior(behavior) {
        return Direction::Down;
    }
    if is_south_arrow_warp(behavior) {
        return Direction::Up;
    }
    if is_north_arrow_warp(behavior) {
        return Direction::Down;
    }
    if is_west_arrow_warp(behavior) {
        return Direction::Right;
    }
    if is_east_arrow_warp(behavior) {
        return Direction::Left;
    }
    if is_ladder_behavior(behavior) {
        return prior_facing;
    }
    Direction::Down
}

// =============================================================================
// DOOR EXIT START
// =============================================================================

/// Start the arrival door-exit sequence: hide the player, put the door in
/// its fully-open state (animation back-dated so it reads as already open),
/// and begin the exit machine.
pub(crate) fn start_door_exit(
    door: &mut DoorSequencer,
    player: &mut dyn PlayerHandle,
    animations: &mut dyn DoorAnimationHost,
    spawn: TilePoint,
    dest_behavior: u8,
    dest_metatile_id: u16,
    exit_direction: Direction,
    now: u64,
) {
    player.set_hidden(true);
    let start = door.start_exit(DoorExitConfig {
        door: spawn,
        metatile_id: dest_metatile_id,
        is_animated: is_door_behavior(dest_behavior),
        exit_direction,
        open_anim: None,
    });
    if start.action == Some(DoorExitAction::SpawnOpenAnimation) {
        let already_open_started_at = now.saturating_sub(DOOR_FADE_DURATION_MS);
        if let Some(handle) = animations.spawn(
            DoorAnimKind::Open,
            spawn.x,
            spawn.y,
            dest_metatile_id,
            already_open_started_at,
            true,
        ) {
            door.set_exit_open_anim(handle);
        }
    }
}

// =============================================================================
// EXECUTE
// =============================================================================

/// What `execute_warp` did on the arrival side
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOutcome {
    pub spawn: TilePoint,
    /// True when the destination started a door exit sequence; input stays
    /// locked until it finishes
    pub exit_sequence_started: bool,
}

/// Perform the map transition for a trigger whose fade-out has completed.
///
/// Fails with [`WarpError::DestinationUnavailable`] when the destination
/// map has no loaded view yet; the caller keeps the trigger pending and
/// requests the load.
#[allow(clippy::too_many_arguments)]
pub fn execute_warp(
    world: &dyn WorldService,
    player: &mut dyn PlayerHandle,
    door: &mut DoorSequencer,
    fade: &mut FadeController,
    cooldown: &mut WarpCooldown,
    animations: &mut dyn DoorAnimationHost,
    trigger: &WarpTrigger,
    from_door: bool,
    prior_facing: Direction,
    now: u64,
) -> Result<ExecuteOutcome, WarpError> {
    let dest_map = &trigger.warp_event.dest_map;
    let view = world
        .map_view(dest_map)
        .ok_or_else(|| WarpError::DestinationUnavailable {
            map_id: dest_map.clone(),
        })?;

    let spawn = calculate_spawn_position(&view, trigger.warp_event.dest_warp_id);
    let dest_tile = world.resolve_tile(spawn.x, spawn.y);
    let dest_behavior = dest_tile.as_ref().map(|t| t.behavior);
    let dest_metatile_id = dest_tile.as_ref().map(|t| t.metatile_id).unwrap_or(0);

    let facing = determine_facing(dest_behavior, prior_facing);
    player.set_position(spawn.x, spawn.y);
    player.set_facing(facing);

    // Source-map animations must not survive onto the arrival map; clear
    // before the exit sequence spawns its own
    animations.clear_all();

    let mut exit_sequence_started = false;
    if from_door {
        match dest_behavior {
            Some(behavior) if requires_door_exit_sequence(behavior) => {
                // Arrow-driven warps keep moving the way the arrow pointed;
                // door arrivals step out downward
                let exit_direction = if trigger.kind == WarpKind::Arrow {
                    trigger.facing
                } else {
                    Direction::Down
                };
                start_door_exit(
                    door,
                    player,
                    animations,
                    spawn,
                    behavior,
                    dest_metatile_id,
                    exit_direction,
                    now,
                );
                fade.start_fade_in(DOOR_FADE_DURATION_MS, now);
                exit_sequence_started = true;
            }
            _ => {
                player.set_hidden(false);
                fade.start_fade_in(DOOR_FADE_DURATION_MS, now);
                door.reset();
                player.unlock_input();
                cooldown.set_in_progress(false);
            }
        }
    } else {
        fade.start_fade_in(FADE_DEFAULT_DURATION_MS, now);
        door.reset_entry();
        player.set_hidden(false);
    }

    cooldown.complete_warp(dest_map, spawn.x, spawn.y);

    info!(
        dest_map = %dest_map,
        x = spawn.x,
        y = spawn.y,
        ?facing,
        exit_sequence_started,
        "[warp] executed"
    );
    debug!(from_door, behavior = ?dest_behavior, "[warp] arrival detail");

    Ok(ExecuteOutcome {
        spawn,
        exit_sequence_started,
    })
}
