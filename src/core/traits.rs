//! Capability traits - abstractions over the host engine
//!
//! The warp core never touches the renderer, world loader, player physics
//! or sprite subsystem directly; it consumes them through these traits. The
//! real implementations live in the host engine. Mock implementations for
//! testing are at the bottom of this file.

use super::types::{Direction, MapView, ResolvedTile, TilePoint, TraversalState};

// =============================================================================
// WORLD / TILES
// =============================================================================

/// Resolve tiles to behavior and warp data
pub trait TileSource {
    /// Look up the tile at world coordinates.
    ///
    /// Returns None outside any loaded map (border tiles).
    fn resolve_tile(&self, x: i32, y: i32) -> Option<ResolvedTile>;
}

/// World manager: loaded maps and the asynchronous destination load.
///
/// Loading runs outside the frame loop; the warp core only polls these
/// methods, it never blocks on a load.
pub trait WorldService: TileSource {
    /// Ask the world manager to load a map.
    ///
    /// `generation` is the session's warp generation counter; completions
    /// whose captured generation is stale must be discarded by the
    /// implementation.
    fn request_load(&mut self, map_id: &str, generation: u64);

    /// Whether a load is currently running
    fn is_loading(&self) -> bool;

    /// Map id of the active (playable) map covering the given tile
    fn active_map_at(&self, x: i32, y: i32) -> Option<String>;

    /// Loaded-map summary, or None if the map is not loaded
    fn map_view(&self, map_id: &str) -> Option<MapView>;
}

// =============================================================================
// PLAYER
// =============================================================================

/// The player avatar, as far as warps care
pub trait PlayerHandle {
    fn tile(&self) -> TilePoint;
    fn facing(&self) -> Direction;
    fn is_moving(&self) -> bool;

    fn set_position(&mut self, x: i32, y: i32);
    fn set_facing(&mut self, dir: Direction);

    /// Force one step of movement, ignoring input (door step-through)
    fn force_move(&mut self, dir: Direction);

    fn lock_input(&mut self);
    fn unlock_input(&mut self);

    /// Hide/show the sprite while inside a door
    fn set_hidden(&mut self, hidden: bool);

    fn traversal(&self) -> TraversalState;
    fn set_traversal(&mut self, traversal: TraversalState);
}

// =============================================================================
// DOOR ANIMATIONS
// =============================================================================

/// Open or close animation for a door metatile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorAnimKind {
    Open,
    Close,
}

/// Opaque id of a spawned door animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimHandle(pub u32);

/// Sprite subsystem hosting door animations.
///
/// `spawn` may fail (asset not loaded); callers must then treat the missing
/// handle as already done, otherwise the door sequencer waits forever. That
/// conversion happens in the session's oracle, not here.
pub trait DoorAnimationHost {
    fn spawn(
        &mut self,
        kind: DoorAnimKind,
        x: i32,
        y: i32,
        metatile_id: u16,
        started_at: u64,
        hold_on_complete: bool,
    ) -> Option<AnimHandle>;

    fn is_done(&self, handle: AnimHandle, now: u64) -> bool;

    fn remove(&mut self, handle: AnimHandle);

    /// Drop every animation, used when a warp lands on a new map
    fn clear_all(&mut self);
}

// =============================================================================
// FALL ARRIVAL
// =============================================================================

/// External sequencer for fall-style scripted warp arrivals (the player
/// drops in from above). Returns false if the hook cannot run, in which
/// case the orchestrator completes the warp normally.
pub trait FallArrivalHook {
    fn start(&mut self, x: i32, y: i32, now: u64) -> bool;
}

// =============================================================================
// TEST MOCKS
// =============================================================================

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};

    /// Mock world: fixed tiles, loaded maps, a scriptable active map
    #[derive(Default)]
    pub struct MockWorld {
        pub tiles: HashMap<(i32, i32), ResolvedTile>,
        pub maps: HashMap<String, MapView>,
        pub active_map: RefCell<Option<String>>,
        pub loading: Cell<bool>,
        pub load_requests: RefCell<Vec<(String, u64)>>,
    }

    impl MockWorld {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_tile(&mut self, x: i32, y: i32, tile: ResolvedTile) {
            self.tiles.insert((x, y), tile);
        }

        pub fn add_map(&mut self, view: MapView) {
            self.maps.insert(view.map_id.clone(), view);
        }

        pub fn set_active_map(&self, map_id: Option<&str>) {
            *self.active_map.borrow_mut() = map_id.map(String::from);
        }

        pub fn load_request_count(&self) -> usize {
            self.load_requests.borrow().len()
        }
    }

    impl TileSource for MockWorld {
        fn resolve_tile(&self, x: i32, y: i32) -> Option<ResolvedTile> {
            self.tiles.get(&(x, y)).cloned()
        }
    }

    impl WorldService for MockWorld {
        fn request_load(&mut self, map_id: &str, generation: u64) {
            self.load_requests
                .borrow_mut()
                .push((map_id.to_string(), generation));
        }

        fn is_loading(&self) -> bool {
            self.loading.get()
        }

        fn active_map_at(&self, _x: i32, _y: i32) -> Option<String> {
            self.active_map.borrow().clone()
        }

        fn map_view(&self, map_id: &str) -> Option<MapView> {
            self.maps.get(map_id).cloned()
        }
    }

    /// Mock player recording every command it receives
    pub struct MockPlayer {
        pub tile: Cell<TilePoint>,
        pub facing: Cell<Direction>,
        pub moving: Cell<bool>,
        pub hidden: Cell<bool>,
        pub input_locked: Cell<bool>,
        pub traversal: Cell<TraversalState>,
        pub forced_moves: RefCell<Vec<Direction>>,
    }

    impl MockPlayer {
        pub fn at(x: i32, y: i32, facing: Direction) -> Self {
            Self {
                tile: Cell::new(TilePoint::new(x, y)),
                facing: Cell::new(facing),
                moving: Cell::new(false),
                hidden: Cell::new(false),
                input_locked: Cell::new(false),
                traversal: Cell::new(TraversalState::default()),
                forced_moves: RefCell::new(Vec::new()),
            }
        }
    }

    impl PlayerHandle for MockPlayer {
        fn tile(&self) -> TilePoint {
            self.tile.get()
        }

        fn facing(&self) -> Direction {
            self.facing.get()
        }

        fn is_moving(&self) -> bool {
            self.moving.get()
        }

        fn set_position(&mut self, x: i32, y: i32) {
            self.tile.set(TilePoint::new(x, y));
        }

        fn set_facing(&mut self, dir: Direction) {
            self.facing.set(dir);
        }

        fn force_move(&mut self, dir: Direction) {
            self.forced_moves.borrow_mut().push(dir);
            self.moving.set(true);
        }

        fn lock_input(&mut self) {
            self.input_locked.set(true);
        }

        fn unlock_input(&mut self) {
            self.input_locked.set(false);
        }

        fn set_hidden(&mut self, hidden: bool) {
            self.hidden.set(hidden);
        }

        fn traversal(&self) -> TraversalState {
            self.traversal.get()
        }

        fn set_traversal(&mut self, traversal: TraversalState) {
            self.traversal.set(traversal);
        }
    }

    /// Mock animation host with scriptable completion and spawn failure
    #[derive(Default)]
    pub struct MockAnimations {
        pub next_id: Cell<u32>,
        pub spawned: RefCell<Vec<(DoorAnimKind, i32, i32, u16)>>,
        pub done: RefCell<HashSet<u32>>,
        pub removed: RefCell<Vec<u32>>,
        pub cleared: Cell<bool>,
        pub fail_spawn: Cell<bool>,
    }

    impl MockAnimations {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn finish(&self, handle: AnimHandle) {
            self.done.borrow_mut().insert(handle.0);
        }

        pub fn last_spawned(&self) -> Option<AnimHandle> {
            let id = self.next_id.get();
            if id == 0 {
                None
            } else {
                Some(AnimHandle(id - 1))
            }
        }
    }

    impl DoorAnimationHost for MockAnimations {
        fn spawn(
            &mut self,
            kind: DoorAnimKind,
            x: i32,
            y: i32,
            metatile_id: u16,
            _started_at: u64,
            _hold_on_complete: bool,
        ) -> Option<AnimHandle> {
            if self.fail_spawn.get() {
                return None;
            }
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            self.spawned.borrow_mut().push((kind, x, y, metatile_id));
            Some(AnimHandle(id))
        }

        fn is_done(&self, handle: AnimHandle, _now: u64) -> bool {
            self.done.borrow().contains(&handle.0)
        }

        fn remove(&mut self, handle: AnimHandle) {
            self.removed.borrow_mut().push(handle.0);
        }

        fn clear_all(&mut self) {
            self.cleared.set(true);
        }
    }

    /// Mock fall-arrival hook
    #[derive(Default)]
    pub struct MockFallArrival {
        pub starts: RefCell<Vec<(i32, i32, u64)>>,
        pub refuse: Cell<bool>,
    }

    impl FallArrivalHook for MockFallArrival {
        fn start(&mut self, x: i32, y: i32, now: u64) -> bool {
            if self.refuse.get() {
                return false;
            }
            self.starts.borrow_mut().push((x, y, now));
            true
        }
    }
}
