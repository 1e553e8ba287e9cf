//! Per-frame warp runtime
//!
//! `WarpSession` owns every warp state machine and enforces the frame
//! ordering: cooldown update, door entry advance, door exit advance,
//! scripted-warp update, pending warp execution, deferred input unlock,
//! arrow overlay refresh. The host calls `tick` once per frame, `scan`
//! after player movement settles, and `confirm_directional_warp` when the
//! player confirms a directional warp.
//!
//! The session dispatches the door machines' action descriptors to the
//! injected capabilities and converts missing animation handles to "done"
//! so a failed spawn can never stall a sequence.
//!
//! # Pending warps
//!
//! A trigger whose destination map has no loaded view yet is held as a
//! pending warp: the load is requested once (tagged with the session's warp
//! generation) and execution retries every frame until the view appears.
//! Walk-over triggers additionally wait for their fade-out to land before
//! the first attempt.

use tracing::{debug, info};

use super::arrow::ArrowOverlay;
use super::behaviors::is_door_behavior;
use super::constants::{DOOR_FADE_DURATION_MS, FADE_DEFAULT_DURATION_MS};
use super::cooldown::WarpCooldown;
use super::detector::{detect_warp_trigger, scan_warp_trigger, ScanOutcome};
use super::door::{DoorEntryAction, DoorEntryConfig, DoorExitAction, DoorSequencer};
use super::executor::execute_warp;
use super::fade::{FadeController, FadeDirection};
use super::scripted::{ScriptedWarpCtx, ScriptedWarpOrchestrator, ScriptedWarpRequest};
use super::traits::{
    AnimHandle, DoorAnimKind, DoorAnimationHost, FallArrivalHook, PlayerHandle, WorldService,
};
use super::types::{Direction, TilePoint, WarpKind, WarpTrigger};

// =============================================================================
// SESSION STATE
// =============================================================================

/// A warp waiting for its destination view (and, for walk-overs, its
/// fade-out) before execution
#[derive(Debug)]
struct PendingWarp {
    trigger: WarpTrigger,
    from_door: bool,
    load_requested: bool,
}

/// Arrow trigger under the player, kept while they stand on the tile
#[derive(Debug)]
struct ArrowCandidate {
    trigger: WarpTrigger,
    arrow_dir: Direction,
    metatile_id: u16,
}

/// External conditions that suppress trigger scanning for a frame
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanGuards {
    pub script_running: bool,
    pub dialog_open: bool,
}

#[derive(Default)]
pub struct WarpSession {
    cooldown: WarpCooldown,
    fade: FadeController,
    arrow: ArrowOverlay,
    door: DoorSequencer,
    scripted: ScriptedWarpOrchestrator,
    /// Incremented per warp; load completions carrying a stale generation
    /// are discarded by the world service
    generation: u64,
    warping: bool,
    pending: Option<PendingWarp>,
    current_arrow: Option<ArrowCandidate>,
    unlock_at: Option<u64>,
}

impl WarpSession {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Accessors ---

    pub fn is_warping(&self) -> bool {
        self.warping
    }

    pub fn cooldown(&self) -> &WarpCooldown {
        &self.cooldown
    }

    pub fn fade(&self) -> &FadeController {
        &self.fade
    }

    pub fn arrow(&self) -> &ArrowOverlay {
        &self.arrow
    }

    pub fn door(&self) -> &DoorSequencer {
        &self.door
    }

    pub fn scripted(&self) -> &ScriptedWarpOrchestrator {
        &self.scripted
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // FRAME UPDATE
    // =========================================================================

    /// Advance every machine one frame.
    ///
    /// The host references share one inner lifetime so short reborrows of
    /// them can sit alongside the session's own field borrows in the
    /// scripted-warp context.
    pub fn tick<'h>(
        &mut self,
        delta_ms: u64,
        now: u64,
        world: &mut (dyn WorldService + 'h),
        player: &mut (dyn PlayerHandle + 'h),
        animations: &mut (dyn DoorAnimationHost + 'h),
        fall_arrival: Option<&mut (dyn FallArrivalHook + 'h)>,
    ) {
        self.cooldown.update(delta_ms);

        self.drive_door_entry(now, player, animations);
        self.drive_door_exit(now, player, animations);

        self.scripted.update(ScriptedWarpCtx {
            now,
            generation: self.generation,
            warping: &mut self.warping,
            fade: &mut self.fade,
            cooldown: &mut self.cooldown,
            door: &mut self.door,
            world: &mut *world,
            player: &mut *player,
            animations: &mut *animations,
            fall_arrival,
        });

        self.drive_pending_warp(now, world, player, animations);

        if let Some(deadline) = self.unlock_at {
            if now >= deadline {
                self.unlock_at = None;
                if !self.warping {
                    player.unlock_input();
                }
            }
        }

        let arrow_dir = self.current_arrow.as_ref().map(|c| c.arrow_dir);
        self.arrow.update(
            player.facing(),
            arrow_dir,
            player.tile(),
            now,
            self.warping || self.cooldown.is_in_progress(),
        );
    }

    // =========================================================================
    // TRIGGER SCAN
    // =========================================================================

    /// Evaluate the player's tile for warp triggers; called by the host
    /// after movement settles.
    ///
    /// Walk-over teleports start immediately (fade-out, pending execution).
    /// Door-like tiles, on the player's tile or one step ahead in the
    /// facing direction, start the entry sequence. Arrow tiles only arm the
    /// directional indicator.
    pub fn scan(
        &mut self,
        now: u64,
        world: &mut dyn WorldService,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
        guards: ScanGuards,
    ) {
        if guards.script_running
            || guards.dialog_open
            || self.warping
            || self.pending.is_some()
            || self.scripted.is_active()
        {
            return;
        }

        let player_tile = player.tile();
        let facing = player.facing();
        let scan = scan_warp_trigger(
            world,
            player_tile,
            facing,
            &self.cooldown,
            self.door.is_active(),
        );
        let tile_changed = scan.tile_changed;
        let current_map = scan.current_map.clone();

        match scan.outcome {
            ScanOutcome::Arrow {
                trigger,
                arrow_dir,
                metatile_id,
            } => {
                self.current_arrow = Some(ArrowCandidate {
                    trigger,
                    arrow_dir,
                    metatile_id,
                });
            }
            ScanOutcome::AutoDoor {
                trigger,
                metatile_id,
            } => {
                // Standing on the door tile itself
                self.current_arrow = None;
                self.start_door_entry(
                    trigger,
                    player_tile,
                    metatile_id,
                    facing,
                    player,
                    animations,
                    now,
                );
            }
            ScanOutcome::WalkOver { trigger } => {
                self.current_arrow = None;
                self.start_walk_over(trigger, player_tile, player, now);
            }
            ScanOutcome::None(_) => {
                if tile_changed {
                    self.current_arrow = None;
                    self.probe_door_ahead(now, world, player, animations, player_tile, facing);
                }
            }
        }

        if tile_changed && !self.warping {
            if let Some(map) = &current_map {
                self.cooldown
                    .update_last_checked_tile(player_tile.x, player_tile.y, map);
            }
        }
    }

    /// Start the warp an armed directional indicator points at. Returns
    /// false when there is no candidate or the player is not facing it.
    pub fn confirm_directional_warp(
        &mut self,
        now: u64,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
    ) -> bool {
        if self.warping
            || self.door.is_active()
            || self.cooldown.is_in_progress()
            || self.cooldown.is_on_cooldown()
        {
            return false;
        }
        let (trigger, arrow_dir, metatile_id) = match &self.current_arrow {
            Some(candidate) if candidate.arrow_dir == player.facing() => (
                candidate.trigger.clone(),
                candidate.arrow_dir,
                candidate.metatile_id,
            ),
            _ => return false,
        };

        info!(
            dest_map = %trigger.warp_event.dest_map,
            ?arrow_dir,
            "[warp] directional warp confirmed"
        );
        self.current_arrow = None;
        self.arrow.hide();

        // Forced movement through the arrow tile reuses the non-animated
        // entry sequence: step, dwell, fade, warp
        let target = player.tile().step(arrow_dir);
        self.begin_entry(
            DoorEntryConfig {
                target,
                metatile_id,
                is_animated: false,
                entry_direction: arrow_dir,
                trigger,
                open_anim: None,
            },
            player,
            animations,
            now,
        );
        true
    }

    /// Queue a scripted warp from game logic
    pub fn request_scripted_warp(
        &mut self,
        request: ScriptedWarpRequest,
        player: &mut dyn PlayerHandle,
    ) {
        self.generation += 1;
        self.current_arrow = None;
        self.arrow.hide();
        self.scripted.begin(request, player, &mut self.warping);
    }

    /// Drop every in-flight transition and return to a neutral state
    pub fn reset(&mut self, player: &mut dyn PlayerHandle) {
        self.scripted.abort(&mut self.warping);
        self.door.reset();
        self.fade.clear();
        self.cooldown.reset();
        self.arrow.hide();
        self.pending = None;
        self.current_arrow = None;
        self.unlock_at = None;
        self.warping = false;
        player.set_hidden(false);
        player.unlock_input();
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn start_walk_over(
        &mut self,
        trigger: WarpTrigger,
        player_tile: TilePoint,
        player: &mut dyn PlayerHandle,
        now: u64,
    ) {
        self.generation += 1;
        self.warping = true;
        player.lock_input();
        self.cooldown
            .start_warp(player_tile.x, player_tile.y, &trigger.source_map);
        self.fade.start_fade_out(FADE_DEFAULT_DURATION_MS, now);
        self.pending = Some(PendingWarp {
            trigger,
            from_door: false,
            load_requested: false,
        });
    }

    /// Door warps also fire for a door-like tile one step ahead while the
    /// player faces it; the warp event lives on the door tile.
    fn probe_door_ahead(
        &mut self,
        now: u64,
        world: &dyn WorldService,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
        player_tile: TilePoint,
        facing: Direction,
    ) {
        if self.cooldown.is_in_progress() || self.cooldown.is_on_cooldown() {
            return;
        }
        let ahead = player_tile.step(facing);
        let trigger = match detect_warp_trigger(world, ahead, facing) {
            Some(trigger) if trigger.kind == WarpKind::Door => trigger,
            _ => return,
        };
        let metatile_id = world
            .resolve_tile(ahead.x, ahead.y)
            .map(|tile| tile.metatile_id)
            .unwrap_or(0);
        self.start_door_entry(trigger, ahead, metatile_id, facing, player, animations, now);
    }

    #[allow(clippy::too_many_arguments)]
    fn start_door_entry(
        &mut self,
        trigger: WarpTrigger,
        door_tile: TilePoint,
        metatile_id: u16,
        entry_direction: Direction,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
        now: u64,
    ) {
        let is_animated = is_door_behavior(trigger.behavior);
        self.begin_entry(
            DoorEntryConfig {
                target: door_tile,
                metatile_id,
                is_animated,
                entry_direction,
                trigger,
                open_anim: None,
            },
            player,
            animations,
            now,
        );
    }

    fn begin_entry(
        &mut self,
        config: DoorEntryConfig,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
        now: u64,
    ) {
        self.generation += 1;
        self.warping = true;
        player.lock_input();
        let player_tile = player.tile();
        self.cooldown
            .start_warp(player_tile.x, player_tile.y, &config.trigger.source_map);

        let target = config.target;
        let metatile_id = config.metatile_id;
        let start = self.door.start_entry(config, now);
        if start.action == Some(DoorEntryAction::SpawnOpenAnimation) {
            if let Some(handle) =
                animations.spawn(DoorAnimKind::Open, target.x, target.y, metatile_id, now, true)
            {
                self.door.set_entry_open_anim(handle);
            }
        }
    }

    fn drive_door_entry(
        &mut self,
        now: u64,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
    ) {
        if !self.door.is_entry_active() {
            return;
        }
        let fade_out_done =
            self.fade.direction() == Some(FadeDirection::Out) && self.fade.is_complete(now);
        let update = {
            let anims: &dyn DoorAnimationHost = animations;
            self.door.update_entry(
                now,
                player.is_moving(),
                |handle| Self::anim_done(anims, handle, now),
                fade_out_done,
            )
        };

        match update.action {
            Some(DoorEntryAction::StartPlayerStep(dir)) => player.force_move(dir),
            Some(DoorEntryAction::HidePlayer { spawn_close }) => {
                player.set_hidden(true);
                if spawn_close {
                    let entry = self.door.entry();
                    let door_tile = entry.target;
                    let metatile_id = entry.metatile_id;
                    let open_anim = entry.open_anim;
                    if let Some(handle) = animations.spawn(
                        DoorAnimKind::Close,
                        door_tile.x,
                        door_tile.y,
                        metatile_id,
                        now,
                        true,
                    ) {
                        self.door.set_entry_close_anim(handle);
                    }
                    if let Some(open) = open_anim {
                        animations.remove(open);
                    }
                }
            }
            Some(DoorEntryAction::RemoveCloseAnimation(handle)) => animations.remove(handle),
            Some(DoorEntryAction::StartFadeOut { duration_ms }) => {
                self.fade.start_fade_out(duration_ms, now)
            }
            Some(DoorEntryAction::ExecuteWarp(trigger)) => {
                // Executed via the pending path later this same frame
                self.pending = Some(PendingWarp {
                    trigger,
                    from_door: true,
                    load_requested: false,
                });
            }
            Some(DoorEntryAction::SpawnOpenAnimation) | None => {}
        }
    }

    fn drive_door_exit(
        &mut self,
        now: u64,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
    ) {
        if !self.door.is_exit_active() {
            return;
        }
        let update = {
            let anims: &dyn DoorAnimationHost = animations;
            self.door
                .update_exit(player.is_moving(), |handle| {
                    Self::anim_done(anims, handle, now)
                })
        };

        match update.action {
            Some(DoorExitAction::StartPlayerStep(dir)) => {
                // The player emerges from the door as the step starts
                player.set_hidden(false);
                player.force_move(dir);
            }
            Some(DoorExitAction::SpawnCloseAnimation { remove_open }) => {
                let exit = self.door.exit();
                let door_tile = exit.door;
                let metatile_id = exit.metatile_id;
                if let Some(handle) = animations.spawn(
                    DoorAnimKind::Close,
                    door_tile.x,
                    door_tile.y,
                    metatile_id,
                    now,
                    true,
                ) {
                    self.door.set_exit_close_anim(handle);
                }
                if let Some(open) = remove_open {
                    animations.remove(open);
                }
            }
            Some(DoorExitAction::RemoveCloseAnimation(handle)) => animations.remove(handle),
            Some(DoorExitAction::SpawnOpenAnimation) | None => {}
        }

        if update.done {
            debug!("[warp] door exit finished, play resumes");
            self.door.reset_exit();
            self.warping = false;
            player.set_hidden(false);
            player.unlock_input();
        }
    }

    fn drive_pending_warp(
        &mut self,
        now: u64,
        world: &mut dyn WorldService,
        player: &mut dyn PlayerHandle,
        animations: &mut dyn DoorAnimationHost,
    ) {
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return,
        };
        // Walk-over warps execute only once their fade-out has landed
        if !pending.from_door && !self.fade.is_complete(now) {
            self.pending = Some(pending);
            return;
        }

        let prior_facing = player.facing();
        match execute_warp(
            world,
            player,
            &mut self.door,
            &mut self.fade,
            &mut self.cooldown,
            animations,
            &pending.trigger,
            pending.from_door,
            prior_facing,
            now,
        ) {
            Ok(outcome) => {
                self.warping = outcome.exit_sequence_started;
                if !outcome.exit_sequence_started {
                    let fade_ms = if pending.from_door {
                        DOOR_FADE_DURATION_MS
                    } else {
                        FADE_DEFAULT_DURATION_MS
                    };
                    self.unlock_at = Some(now + fade_ms);
                }
            }
            Err(err) => {
                debug!(error = %err, "[warp] destination not ready, holding warp");
                let map_id = pending.trigger.warp_event.dest_map.clone();
                let mut pending = pending;
                if !pending.load_requested {
                    world.request_load(&map_id, self.generation);
                    pending.load_requested = true;
                }
                self.pending = Some(pending);
            }
        }
    }

    fn anim_done(animations: &dyn DoorAnimationHost, handle: Option<AnimHandle>, now: u64) -> bool {
        match handle {
            Some(handle) => animations.is_done(handle, now),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behaviors::{MB_ANIMATED_DOOR, MB_AQUA_HIDEOUT_WARP, MB_SOUTH_ARROW_WARP};
    use crate::core::constants::{DOOR_WAIT_BEFORE_FADE_MS, WARP_COOLDOWN_MS};
    use crate::core::door::DoorEntryStage;
    use crate::core::traits::mocks::{MockAnimations, MockPlayer, MockWorld};
    use crate::core::types::{MapView, ResolvedTile, WarpEvent};

    struct Rig {
        session: WarpSession,
        world: MockWorld,
        player: MockPlayer,
        animations: MockAnimations,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                session: WarpSession::new(),
                world: MockWorld::new(),
                player: MockPlayer::at(10, 10, Direction::Down),
                animations: MockAnimations::new(),
            }
        }

        fn tick(&mut self, delta_ms: u64, now: u64) {
            self.session.tick(
                delta_ms,
                now,
                &mut self.world,
                &mut self.player,
                &mut self.animations,
                None,
            );
        }

        fn scan(&mut self, now: u64) {
            self.session.scan(
                now,
                &mut self.world,
                &mut self.player,
                &mut self.animations,
                ScanGuards::default(),
            );
        }
    }

    fn warp_event(dest: &str) -> WarpEvent {
        WarpEvent {
            x: 2,
            y: 2,
            dest_map: dest.to_string(),
            dest_warp_id: 0,
        }
    }

    fn tile(map: &str, behavior: u8, metatile_id: u16, event: Option<WarpEvent>) -> ResolvedTile {
        ResolvedTile {
            map_id: map.to_string(),
            behavior,
            metatile_id,
            warp_event: event,
        }
    }

    fn dest_map(map_id: &str) -> MapView {
        MapView {
            map_id: map_id.to_string(),
            origin_x: 50,
            origin_y: 50,
            width: 10,
            height: 10,
            warp_events: vec![WarpEvent {
                x: 2,
                y: 2,
                dest_map: "MAP_BACK".to_string(),
                dest_warp_id: 0,
            }],
        }
    }

    #[test]
    fn test_walk_over_warp_end_to_end() {
        let mut rig = Rig::new();
        rig.world.set_tile(
            10,
            10,
            tile(
                "MAP_SOURCE",
                MB_AQUA_HIDEOUT_WARP,
                40,
                Some(warp_event("MAP_DEST")),
            ),
        );
        rig.world.add_map(dest_map("MAP_DEST"));

        rig.scan(0);
        assert!(rig.session.is_warping());
        assert!(rig.player.input_locked.get());
        assert_eq!(rig.session.fade().direction(), Some(FadeDirection::Out));
        assert!(rig.session.cooldown().is_in_progress());

        // Mid-fade nothing executes yet
        rig.tick(16, 250);
        assert_eq!(rig.player.tile.get(), TilePoint::new(10, 10));

        // Fade-out lands: the warp executes, player moves, fade-in starts
        rig.tick(250, 500);
        assert_eq!(rig.player.tile.get(), TilePoint::new(52, 52));
        assert_eq!(rig.session.fade().direction(), Some(FadeDirection::In));
        assert!(!rig.session.is_warping());
        assert!(!rig.session.cooldown().is_in_progress());
        assert_eq!(rig.session.cooldown().cooldown_remaining(), WARP_COOLDOWN_MS);

        // Input unlocks after the fade-in
        assert!(rig.player.input_locked.get());
        rig.tick(500, 500 + FADE_DEFAULT_DURATION_MS);
        assert!(!rig.player.input_locked.get());
    }

    #[test]
    fn test_walk_over_to_unloaded_map_requests_load_and_retries() {
        let mut rig = Rig::new();
        rig.world.set_tile(
            10,
            10,
            tile(
                "MAP_SOURCE",
                MB_AQUA_HIDEOUT_WARP,
                40,
                Some(warp_event("MAP_DEST")),
            ),
        );

        rig.scan(0);
        rig.tick(500, 500); // fade-out done, destination missing
        assert_eq!(rig.world.load_request_count(), 1);
        assert_eq!(rig.player.tile.get(), TilePoint::new(10, 10));
        assert!(rig.session.is_warping());

        // Still missing: no duplicate load request
        rig.tick(16, 516);
        assert_eq!(rig.world.load_request_count(), 1);

        // View appears, next frame executes
        rig.world.add_map(dest_map("MAP_DEST"));
        rig.tick(16, 532);
        assert_eq!(rig.player.tile.get(), TilePoint::new(52, 52));
        assert!(!rig.session.is_warping());
    }

    #[test]
    fn test_door_ahead_starts_entry_sequence() {
        let mut rig = Rig::new();
        rig.player.facing.set(Direction::Up);
        // Plain floor underfoot, animated door one tile up
        rig.world.set_tile(10, 10, tile("MAP_TOWN", 0, 1, None));
        rig.world.set_tile(
            10,
            9,
            tile(
                "MAP_TOWN",
                MB_ANIMATED_DOOR,
                612,
                Some(warp_event("MAP_HOUSE")),
            ),
        );
        rig.world.add_map(dest_map("MAP_HOUSE"));

        rig.scan(0);
        assert!(rig.session.door().is_entry_active());
        assert!(rig.session.is_warping());
        assert!(rig.player.input_locked.get());
        // Open animation spawned on the door tile
        assert_eq!(rig.animations.spawned.borrow().len(), 1);
        assert_eq!(
            rig.animations.spawned.borrow()[0],
            (DoorAnimKind::Open, 10, 9, 612)
        );
        let open = rig.animations.last_spawned().unwrap();

        // Door opens, then the player is stepped into it
        rig.tick(16, 100);
        assert!(rig.player.forced_moves.borrow().is_empty());
        rig.animations.finish(open);
        rig.tick(16, 270);
        assert_eq!(rig.player.forced_moves.borrow().as_slice(), &[Direction::Up]);

        // Step lands: player hidden, close animation replaces the open one
        rig.player.moving.set(false);
        rig.tick(16, 500);
        assert!(rig.player.hidden.get());
        assert_eq!(rig.animations.spawned.borrow().len(), 2);
        assert_eq!(rig.animations.spawned.borrow()[1].0, DoorAnimKind::Close);
        assert_eq!(rig.animations.removed.borrow().as_slice(), &[open.0]);

        // Close finishes, dwell, fade-out, then the warp executes
        let close = rig.animations.last_spawned().unwrap();
        rig.animations.finish(close);
        rig.tick(16, 600);
        rig.tick(DOOR_WAIT_BEFORE_FADE_MS, 600 + DOOR_WAIT_BEFORE_FADE_MS);
        assert_eq!(rig.session.fade().direction(), Some(FadeDirection::Out));

        let fade_done = 600 + DOOR_WAIT_BEFORE_FADE_MS + DOOR_FADE_DURATION_MS;
        rig.tick(DOOR_FADE_DURATION_MS, fade_done);
        assert_eq!(rig.player.tile.get(), TilePoint::new(52, 52));
        assert_eq!(rig.session.fade().direction(), Some(FadeDirection::In));
    }

    #[test]
    fn test_door_entry_survives_failed_animation_spawn() {
        // A host that cannot spawn door animations must still complete the
        // sequence; missing handles count as already-done
        let mut rig = Rig::new();
        rig.animations.fail_spawn.set(true);
        rig.player.facing.set(Direction::Up);
        rig.world.set_tile(10, 10, tile("MAP_TOWN", 0, 1, None));
        rig.world.set_tile(
            10,
            9,
            tile(
                "MAP_TOWN",
                MB_ANIMATED_DOOR,
                612,
                Some(warp_event("MAP_HOUSE")),
            ),
        );
        rig.world.add_map(dest_map("MAP_HOUSE"));

        rig.scan(0);
        assert!(rig.session.door().is_entry_active());
        assert!(rig.animations.spawned.borrow().is_empty());

        // No open animation to wait for: the step starts immediately
        rig.tick(16, 16);
        assert_eq!(rig.player.forced_moves.borrow().as_slice(), &[Direction::Up]);

        // Step lands; the close spawn fails too, nothing stalls
        rig.player.moving.set(false);
        rig.tick(16, 32);
        assert!(rig.player.hidden.get());
        rig.tick(16, 48);
        assert!(rig.animations.spawned.borrow().is_empty());

        // Dwell, fade-out, then the warp still executes
        rig.tick(200, 248);
        assert_eq!(rig.session.fade().direction(), Some(FadeDirection::Out));
        rig.tick(500, 748);
        assert_eq!(rig.player.tile.get(), TilePoint::new(52, 52));
        assert!(!rig.session.is_warping());
        assert!(!rig.player.hidden.get());
    }

    #[test]
    fn test_arrow_armed_and_confirmed() {
        let mut rig = Rig::new();
        rig.world.set_tile(
            10,
            10,
            tile(
                "MAP_ROUTE",
                MB_SOUTH_ARROW_WARP,
                44,
                Some(warp_event("MAP_CYCLING_ROAD")),
            ),
        );
        rig.world.add_map(dest_map("MAP_CYCLING_ROAD"));

        rig.scan(0);
        // Arrow never auto-fires
        assert!(!rig.session.is_warping());
        rig.tick(16, 16);
        assert!(rig.session.arrow().is_visible());
        assert_eq!(rig.session.arrow().tile(), Some(TilePoint::new(10, 11)));

        // Facing away hides the indicator but keeps the candidate
        rig.player.facing.set(Direction::Up);
        rig.tick(16, 32);
        assert!(!rig.session.arrow().is_visible());
        assert!(!rig
            .session
            .confirm_directional_warp(48, &mut rig.player, &mut rig.animations));

        rig.player.facing.set(Direction::Down);
        rig.tick(16, 48);
        assert!(rig.session.arrow().is_visible());
        assert!(rig
            .session
            .confirm_directional_warp(64, &mut rig.player, &mut rig.animations));
        assert!(rig.session.is_warping());
        assert_eq!(rig.session.door().entry_stage(), DoorEntryStage::Opening);
        assert!(!rig.session.arrow().is_visible());

        // Non-animated entry: forced step fires immediately
        rig.tick(16, 80);
        assert_eq!(
            rig.player.forced_moves.borrow().as_slice(),
            &[Direction::Down]
        );
    }

    #[test]
    fn test_scan_suppressed_by_guards() {
        let mut rig = Rig::new();
        rig.world.set_tile(
            10,
            10,
            tile(
                "MAP_SOURCE",
                MB_AQUA_HIDEOUT_WARP,
                40,
                Some(warp_event("MAP_DEST")),
            ),
        );

        rig.session.scan(
            0,
            &mut rig.world,
            &mut rig.player,
            &mut rig.animations,
            ScanGuards {
                dialog_open: true,
                ..Default::default()
            },
        );
        assert!(!rig.session.is_warping());

        rig.session.scan(
            0,
            &mut rig.world,
            &mut rig.player,
            &mut rig.animations,
            ScanGuards {
                script_running: true,
                ..Default::default()
            },
        );
        assert!(!rig.session.is_warping());

        // Unsuppressed scan fires
        rig.scan(0);
        assert!(rig.session.is_warping());
    }

    #[test]
    fn test_rescan_same_tile_is_noop() {
        let mut rig = Rig::new();
        rig.world.set_tile(10, 10, tile("MAP_SOURCE", 0, 1, None));
        rig.scan(0);
        assert!(rig
            .session
            .cooldown()
            .is_same_tile_as_last_checked(10, 10, "MAP_SOURCE"));

        // Same tile again: nothing new happens even if the tile gained a
        // warp (tile identity is the dedup key)
        rig.world.set_tile(
            10,
            10,
            tile(
                "MAP_SOURCE",
                MB_AQUA_HIDEOUT_WARP,
                40,
                Some(warp_event("MAP_DEST")),
            ),
        );
        rig.scan(16);
        assert!(!rig.session.is_warping());
    }

    #[test]
    fn test_door_arrival_plays_exit_and_unlocks() {
        let mut rig = Rig::new();
        rig.player.facing.set(Direction::Up);
        rig.world.set_tile(10, 10, tile("MAP_TOWN", 0, 1, None));
        rig.world.set_tile(
            10,
            9,
            tile(
                "MAP_TOWN",
                MB_ANIMATED_DOOR,
                612,
                Some(warp_event("MAP_HOUSE")),
            ),
        );
        rig.world.add_map(dest_map("MAP_HOUSE"));
        // Arrival tile is itself an animated door, so the exit plays
        rig.world
            .set_tile(52, 52, tile("MAP_HOUSE", MB_ANIMATED_DOOR, 700, None));

        rig.scan(0);
        // Fast-forward the whole entry
        let open = rig.animations.last_spawned().unwrap();
        rig.animations.finish(open);
        rig.tick(16, 100); // step starts
        rig.player.moving.set(false);
        rig.tick(16, 200); // hide + close spawn
        rig.animations.finish(rig.animations.last_spawned().unwrap());
        rig.tick(16, 300); // close removed, dwell starts
        rig.tick(DOOR_WAIT_BEFORE_FADE_MS, 300 + DOOR_WAIT_BEFORE_FADE_MS); // fade-out
        let arrive_at = 300 + DOOR_WAIT_BEFORE_FADE_MS + DOOR_FADE_DURATION_MS;
        rig.tick(DOOR_FADE_DURATION_MS, arrive_at);

        assert_eq!(rig.player.tile.get(), TilePoint::new(52, 52));
        assert!(rig.session.door().is_exit_active());
        assert!(rig.session.is_warping());
        assert!(rig.player.input_locked.get());

        // Exit: open (spawned held by the executor), step out, close, done
        rig.player.moving.set(false);
        let exit_open = rig.animations.last_spawned().unwrap();
        rig.animations.finish(exit_open);
        rig.tick(16, arrive_at + 16);
        assert!(!rig.player.hidden.get());

        rig.player.moving.set(false);
        rig.tick(16, arrive_at + 32); // close spawn
        rig.animations.finish(rig.animations.last_spawned().unwrap());
        rig.tick(16, arrive_at + 48); // done

        assert!(!rig.session.door().is_exit_active());
        assert!(!rig.session.is_warping());
        assert!(!rig.player.input_locked.get());
    }

    #[test]
    fn test_post_warp_cooldown_blocks_immediate_retrigger() {
        let mut rig = Rig::new();
        rig.world.set_tile(
            10,
            10,
            tile(
                "MAP_SOURCE",
                MB_AQUA_HIDEOUT_WARP,
                40,
                Some(warp_event("MAP_DEST")),
            ),
        );
        rig.world.add_map(dest_map("MAP_DEST"));
        // The arrival tile carries a warp straight back
        rig.world.set_tile(
            52,
            52,
            tile(
                "MAP_DEST",
                MB_AQUA_HIDEOUT_WARP,
                40,
                Some(warp_event("MAP_SOURCE")),
            ),
        );
        rig.world.add_map(dest_map("MAP_SOURCE"));

        rig.scan(0);
        rig.tick(500, 500); // executes, arrives on 52,52
        assert_eq!(rig.player.tile.get(), TilePoint::new(52, 52));

        // On cooldown and on the last-checked tile: no bounce-back
        rig.scan(600);
        rig.tick(100, 600);
        assert_eq!(rig.player.tile.get(), TilePoint::new(52, 52));
        assert!(!rig.session.is_warping());
    }

    #[test]
    fn test_scripted_warp_through_session() {
        let mut rig = Rig::new();
        rig.world.add_map(dest_map("MAP_EVENT"));
        rig.world.set_active_map(Some("MAP_EVENT"));

        let request = ScriptedWarpRequest {
            map_id: "MAP_EVENT".to_string(),
            x: 3,
            y: 3,
            direction: Some(Direction::Down),
            style: Default::default(),
            traversal_override: None,
            completion: None,
        };
        rig.session.request_scripted_warp(request, &mut rig.player);
        assert!(rig.session.is_warping());
        assert!(rig.player.input_locked.get());

        rig.tick(16, 0); // fade-out starts
        rig.tick(500, 500); // fade-out done, same-map reposition
        assert_eq!(rig.player.tile.get(), TilePoint::new(53, 53));
        assert!(!rig.session.is_warping());
        assert_eq!(rig.session.fade().direction(), Some(FadeDirection::In));
    }
}
