//! Core types - shared data structures for the warp system
//!
//! These types flow between the detector, the sequencers and the session.
//! Timestamps are caller-supplied milliseconds; nothing here reads a clock.

use serde::{Deserialize, Serialize};

// =============================================================================
// DIRECTIONS
// =============================================================================

/// Cardinal facing/movement direction on the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Tile-space delta for one step in this direction (y grows downward)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

// =============================================================================
// TILE COORDINATES
// =============================================================================

/// A tile position in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile one step away in `dir`
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A tile position qualified by the map it belongs to.
///
/// Used for duplicate-trigger suppression: the cooldown tracker remembers the
/// last tile it evaluated as a `TileRef`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRef {
    pub map_id: String,
    pub x: i32,
    pub y: i32,
}

impl TileRef {
    pub fn new(map_id: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            map_id: map_id.into(),
            x,
            y,
        }
    }
}

// =============================================================================
// WARP DATA
// =============================================================================

/// How a warp-capable tile transitions the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarpKind {
    /// Door with an entry/exit animation sequence
    Door,
    /// Instant transition (cave entrances, teleport pads)
    Teleport,
    /// Forced-movement arrow tile (stairs, carpets); needs explicit
    /// player confirmation rather than auto-triggering
    Arrow,
}

/// Destination record attached to a tile in map data.
///
/// Coordinates are local to the map that declares the event; map data ships
/// as camelCase JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpEvent {
    pub x: i32,
    pub y: i32,
    pub dest_map: String,
    pub dest_warp_id: usize,
}

/// A classified warp trigger, immutable once created by the detector.
///
/// Consumed exactly once: either by the walk-over warp path or by the door
/// sequencer (which carries it through the entry sequence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpTrigger {
    pub kind: WarpKind,
    /// Map the trigger tile belongs to
    pub source_map: String,
    pub warp_event: WarpEvent,
    /// Raw metatile behavior code of the trigger tile
    pub behavior: u8,
    /// Player facing at classification time
    pub facing: Direction,
}

// =============================================================================
// WORLD QUERIES
// =============================================================================

/// What the world service knows about one tile
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTile {
    /// Map the tile belongs to
    pub map_id: String,
    /// Metatile behavior code
    pub behavior: u8,
    /// Metatile id, used to look up door animation graphics
    pub metatile_id: u16,
    /// Warp event declared at this tile, if any
    pub warp_event: Option<WarpEvent>,
}

/// Loaded-map summary used to place the player after a warp
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub map_id: String,
    /// World coordinates of the map's top-left tile
    pub origin_x: i32,
    pub origin_y: i32,
    /// Map dimensions in tiles
    pub width: i32,
    pub height: i32,
    /// Warp events local to this map, indexed by warp id
    pub warp_events: Vec<WarpEvent>,
}

// =============================================================================
// TRAVERSAL
// =============================================================================

/// Player traversal mode carried across scripted warps (surf restore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraversalState {
    pub surfing: bool,
    pub underwater: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }

    #[test]
    fn test_tile_point_step() {
        let tile = TilePoint::new(10, 20);
        assert_eq!(tile.step(Direction::Up), TilePoint::new(10, 19));
        assert_eq!(tile.step(Direction::Right), TilePoint::new(11, 20));
    }

    #[test]
    fn test_warp_event_from_map_json() {
        // Map data uses camelCase field names
        let json = r#"{"x": 5, "y": 9, "destMap": "MAP_LITTLEROOT_TOWN", "destWarpId": 2}"#;
        let event: WarpEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.x, 5);
        assert_eq!(event.y, 9);
        assert_eq!(event.dest_map, "MAP_LITTLEROOT_TOWN");
        assert_eq!(event.dest_warp_id, 2);
    }
}
