//! Metatile behavior codes and warp classification predicates
//!
//! Behavior codes are the per-metatile gameplay semantics baked into map
//! data. Only the codes the warp system cares about are named here; the
//! predicates take raw `u8` codes because world data can carry codes this
//! crate has no name for.

use num_enum::TryFromPrimitive;

use super::types::Direction;

// =============================================================================
// BEHAVIOR CODES
// =============================================================================

pub const MB_BATTLE_PYRAMID_WARP: u8 = 13;
pub const MB_MOSSDEEP_GYM_WARP: u8 = 14;
pub const MB_MT_PYRE_HOLE: u8 = 15;
pub const MB_POND_WATER: u8 = 16;
pub const MB_INTERIOR_DEEP_WATER: u8 = 17;
pub const MB_DEEP_WATER: u8 = 18;
pub const MB_SOOTOPOLIS_DEEP_WATER: u8 = 20;
pub const MB_OCEAN_WATER: u8 = 21;
pub const MB_LAVARIDGE_GYM_B1F_WARP: u8 = 41;
pub const MB_NON_ANIMATED_DOOR: u8 = 96;
pub const MB_LADDER: u8 = 97;
pub const MB_EAST_ARROW_WARP: u8 = 98;
pub const MB_WEST_ARROW_WARP: u8 = 99;
pub const MB_NORTH_ARROW_WARP: u8 = 100;
pub const MB_SOUTH_ARROW_WARP: u8 = 101;
pub const MB_AQUA_HIDEOUT_WARP: u8 = 103;
pub const MB_LAVARIDGE_GYM_1F_WARP: u8 = 104;
pub const MB_ANIMATED_DOOR: u8 = 105;
pub const MB_WATER_DOOR: u8 = 108;
pub const MB_WATER_SOUTH_ARROW_WARP: u8 = 109;
pub const MB_DEEP_SOUTH_WARP: u8 = 110;

/// Named behavior codes, for log labels
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum MetatileBehavior {
    BattlePyramidWarp = MB_BATTLE_PYRAMID_WARP,
    MossdeepGymWarp = MB_MOSSDEEP_GYM_WARP,
    MtPyreHole = MB_MT_PYRE_HOLE,
    PondWater = MB_POND_WATER,
    InteriorDeepWater = MB_INTERIOR_DEEP_WATER,
    DeepWater = MB_DEEP_WATER,
    SootopolisDeepWater = MB_SOOTOPOLIS_DEEP_WATER,
    OceanWater = MB_OCEAN_WATER,
    LavaridgeGymB1fWarp = MB_LAVARIDGE_GYM_B1F_WARP,
    NonAnimatedDoor = MB_NON_ANIMATED_DOOR,
    Ladder = MB_LADDER,
    EastArrowWarp = MB_EAST_ARROW_WARP,
    WestArrowWarp = MB_WEST_ARROW_WARP,
    NorthArrowWarp = MB_NORTH_ARROW_WARP,
    SouthArrowWarp = MB_SOUTH_ARROW_WARP,
    AquaHideoutWarp = MB_AQUA_HIDEOUT_WARP,
    LavaridgeGym1fWarp = MB_LAVARIDGE_GYM_1F_WARP,
    AnimatedDoor = MB_ANIMATED_DOOR,
    WaterDoor = MB_WATER_DOOR,
    WaterSouthArrowWarp = MB_WATER_SOUTH_ARROW_WARP,
    DeepSouthWarp = MB_DEEP_SOUTH_WARP,
}

/// Human-readable label for a behavior code, for tracing
pub fn behavior_label(behavior: u8) -> String {
    match MetatileBehavior::try_from(behavior) {
        Ok(known) => format!("{:?}", known),
        Err(_) => format!("behavior({})", behavior),
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Doors with a visible open/close animation.
///
/// MB_NON_ANIMATED_DOOR is deliberately not included: stairs and similar
/// warps get exit movement but no door graphic.
pub fn is_door_behavior(behavior: u8) -> bool {
    matches!(behavior, MB_ANIMATED_DOOR | MB_WATER_DOOR)
}

/// Doors without animation (stairs, underwater entrances)
pub fn is_non_animated_door_behavior(behavior: u8) -> bool {
    matches!(behavior, MB_NON_ANIMATED_DOOR | MB_DEEP_SOUTH_WARP)
}

/// Whether arriving on this tile plays a door exit sequence,
/// animated or not
pub fn requires_door_exit_sequence(behavior: u8) -> bool {
    is_door_behavior(behavior) || is_non_animated_door_behavior(behavior)
}

/// Ladders get no exit sequence and preserve the player's facing
pub fn is_ladder_behavior(behavior: u8) -> bool {
    behavior == MB_LADDER
}

/// Instant warps: cave pads, holes, gym warp tiles
pub fn is_teleport_warp_behavior(behavior: u8) -> bool {
    matches!(
        behavior,
        MB_AQUA_HIDEOUT_WARP
            | MB_LAVARIDGE_GYM_1F_WARP
            | MB_LAVARIDGE_GYM_B1F_WARP
            | MB_BATTLE_PYRAMID_WARP
            | MB_MOSSDEEP_GYM_WARP
            | MB_DEEP_SOUTH_WARP
            | MB_MT_PYRE_HOLE
    )
}

/// Forced-movement arrow warps
pub fn is_arrow_warp_behavior(behavior: u8) -> bool {
    matches!(
        behavior,
        MB_EAST_ARROW_WARP
            | MB_WEST_ARROW_WARP
            | MB_NORTH_ARROW_WARP
            | MB_SOUTH_ARROW_WARP
            | MB_WATER_SOUTH_ARROW_WARP
    )
}

pub fn is_deep_south_warp(behavior: u8) -> bool {
    behavior == MB_DEEP_SOUTH_WARP
}

pub fn is_south_arrow_warp(behavior: u8) -> bool {
    matches!(behavior, MB_SOUTH_ARROW_WARP | MB_WATER_SOUTH_ARROW_WARP)
}

pub fn is_north_arrow_warp(behavior: u8) -> bool {
    behavior == MB_NORTH_ARROW_WARP
}

pub fn is_west_arrow_warp(behavior: u8) -> bool {
    behavior == MB_WEST_ARROW_WARP
}

pub fn is_east_arrow_warp(behavior: u8) -> bool {
    behavior == MB_EAST_ARROW_WARP
}

/// Water the player can surf on; a surf traversal override is only
/// restored after a warp when the landing tile passes this check
pub fn is_surfable_behavior(behavior: u8) -> bool {
    matches!(
        behavior,
        MB_POND_WATER
            | MB_INTERIOR_DEEP_WATER
            | MB_DEEP_WATER
            | MB_SOOTOPOLIS_DEEP_WATER
            | MB_OCEAN_WATER
    )
}

/// Movement direction an arrow warp forces
pub fn arrow_direction_from_behavior(behavior: u8) -> Option<Direction> {
    match behavior {
        MB_SOUTH_ARROW_WARP | MB_WATER_SOUTH_ARROW_WARP => Some(Direction::Down),
        MB_NORTH_ARROW_WARP => Some(Direction::Up),
        MB_WEST_ARROW_WARP => Some(Direction::Left),
        MB_EAST_ARROW_WARP => Some(Direction::Right),
        _ => None,
    }
}

pub fn is_warp_behavior(behavior: u8) -> bool {
    is_door_behavior(behavior) || is_teleport_warp_behavior(behavior) || is_arrow_warp_behavior(behavior)
}
