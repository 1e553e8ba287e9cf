//! Scripted-warp orchestration
//!
//! Scripted warps are requested by game logic (cutscenes, scripted events)
//! rather than by walking onto a tile. One attempt runs end-to-end through
//! `Pending -> Fading -> Loading -> Exiting | arrival`, wrapping the
//! asynchronous destination-map load with a polled [`LoadMonitor`]:
//! bounded retries, a one-time deferred marker while the loader works, and
//! rejection of the completion handle when the budget runs out. Every
//! terminal branch clears the warping flag or hands it to a successor
//! machine; nothing is left stuck.
//!
//! The orchestrator never blocks and never awaits: the load runs outside
//! the frame loop and is observed purely through [`WorldService`] queries
//! each tick.

use tracing::{debug, info, warn};

use super::behaviors::{is_surfable_behavior, requires_door_exit_sequence};
use super::completion::WarpCompletion;
use super::constants::{
    FADE_DEFAULT_DURATION_MS, SCRIPTED_WARP_LOAD_RETRY_INTERVAL_MS, SCRIPTED_WARP_MAX_LOAD_RETRIES,
};
use super::cooldown::WarpCooldown;
use super::door::DoorSequencer;
use super::errors::WarpError;
use super::executor::start_door_exit;
use super::fade::{FadeController, FadeDirection};
use super::traits::{DoorAnimationHost, FallArrivalHook, PlayerHandle, WorldService};
use super::types::{Direction, MapView, TilePoint, TraversalState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedWarpPhase {
    Pending,
    Fading,
    Loading,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptedWarpStyle {
    #[default]
    Default,
    /// Player drops in from above on arrival; handled by an external
    /// fall-arrival sequencer
    Fall,
}

/// A scripted warp request from game logic
#[derive(Debug)]
pub struct ScriptedWarpRequest {
    pub map_id: String,
    /// Destination tile, local to the destination map
    pub x: i32,
    pub y: i32,
    /// Facing on arrival; None keeps whatever the executor decides
    pub direction: Option<Direction>,
    pub style: ScriptedWarpStyle,
    /// Traversal to restore on arrival (surf carried across the warp);
    /// only honored when the landing tile is surfable
    pub traversal_override: Option<TraversalState>,
    pub completion: Option<WarpCompletion>,
}

/// Tracks a single in-flight destination load attempt
#[derive(Debug)]
pub struct LoadMonitor {
    pub map_id: String,
    pub started_at: u64,
    pub retries: u32,
    /// One-time marker so "still loading" is logged once, not every frame
    pub deferred_logged: bool,
}

#[derive(Debug)]
struct ActiveScriptedWarp {
    map_id: String,
    x: i32,
    y: i32,
    direction: Option<Direction>,
    phase: ScriptedWarpPhase,
    style: ScriptedWarpStyle,
    traversal_override: Option<TraversalState>,
    completion: Option<WarpCompletion>,
}

/// Everything a scripted-warp tick may touch, borrowed from the session.
///
/// The trait objects carry their own inner lifetime `'h` so the session can
/// reborrow long-lived host references for just the update call; tying them
/// to `'a` would pin the session's own field borrows for the hosts' whole
/// lifetime.
pub struct ScriptedWarpCtx<'a, 'h> {
    pub now: u64,
    /// Session warp generation, forwarded to load requests
    pub generation: u64,
    /// Session-wide "a warp owns the screen" flag
    pub warping: &'a mut bool,
    pub fade: &'a mut FadeController,
    pub cooldown: &'a mut WarpCooldown,
    pub door: &'a mut DoorSequencer,
    pub world: &'a mut (dyn WorldService + 'h),
    pub player: &'a mut (dyn PlayerHandle + 'h),
    pub animations: &'a mut (dyn DoorAnimationHost + 'h),
    pub fall_arrival: Option<&'a mut (dyn FallArrivalHook + 'h)>,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

#[derive(Debug, Default)]
pub struct ScriptedWarpOrchestrator {
    active: Option<ActiveScriptedWarp>,
    monitor: Option<LoadMonitor>,
    /// Completion resolved once this deadline passes (fade-in finishing)
    deferred_resolve: Option<(u64, WarpCompletion)>,
    /// Input unlocked once this deadline passes, unless a warp owns the
    /// screen again by then
    unlock_at: Option<u64>,
}

impl ScriptedWarpOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn phase(&self) -> Option<ScriptedWarpPhase> {
        self.active.as_ref().map(|warp| warp.phase)
    }

    pub fn pending_map_id(&self) -> Option<&str> {
        self.active.as_ref().map(|warp| warp.map_id.as_str())
    }

    pub fn monitor(&self) -> Option<&LoadMonitor> {
        self.monitor.as_ref()
    }

    /// Accept a scripted warp request. Locks input and raises the warping
    /// flag; the state machine advances on subsequent `update` calls.
    ///
    /// A request arriving while another attempt is in flight supersedes it:
    /// the prior attempt is rejected so its watcher is never left pending.
    pub fn begin(
        &mut self,
        request: ScriptedWarpRequest,
        player: &mut dyn PlayerHandle,
        warping: &mut bool,
    ) {
        if self.active.is_some() {
            warn!(
                superseded = self.pending_map_id().unwrap_or(""),
                "[warp] scripted warp superseded by a newer request"
            );
            self.abort(warping);
        }
        info!(
            map_id = %request.map_id,
            x = request.x,
            y = request.y,
            style = ?request.style,
            "[warp] scripted warp requested"
        );
        player.lock_input();
        *warping = true;
        self.active = Some(ActiveScriptedWarp {
            map_id: request.map_id,
            x: request.x,
            y: request.y,
            direction: request.direction,
            phase: ScriptedWarpPhase::Pending,
            style: request.style,
            traversal_override: request.traversal_override,
            completion: request.completion,
        });
        self.monitor = None;
    }

    /// Advance the machine one frame
    pub fn update(&mut self, mut ctx: ScriptedWarpCtx<'_, '_>) {
        self.poll_deadlines(&mut ctx);

        let phase = match self.active.as_ref() {
            Some(warp) => warp.phase,
            None => return,
        };

        match phase {
            ScriptedWarpPhase::Pending => {
                // Reuse a fade-out that is already running or finished
                if ctx.fade.direction() != Some(FadeDirection::Out) {
                    ctx.fade.start_fade_out(FADE_DEFAULT_DURATION_MS, ctx.now);
                }
                self.set_phase(ScriptedWarpPhase::Fading);
            }

            ScriptedWarpPhase::Fading => {
                if !ctx.fade.is_complete(ctx.now) {
                    return;
                }
                let map_id = match self.active.as_ref() {
                    Some(warp) => warp.map_id.clone(),
                    None => return,
                };

                // Same-map reposition skips the load entirely
                let same_map = self.destination_ready(&map_id, ctx.world);
                if let Some(view) = same_map {
                    debug!(map_id = %map_id, "[warp] destination already active, repositioning");
                    self.arrive(&view, &mut ctx);
                } else {
                    ctx.world.request_load(&map_id, ctx.generation);
                    self.monitor = Some(LoadMonitor {
                        map_id: map_id.clone(),
                        started_at: ctx.now,
                        retries: 0,
                        deferred_logged: false,
                    });
                    debug!(map_id = %map_id, "[warp] destination load requested");
                    self.set_phase(ScriptedWarpPhase::Loading);
                }
            }

            ScriptedWarpPhase::Loading => {
                let map_id = match self.active.as_ref() {
                    Some(warp) => warp.map_id.clone(),
                    None => return,
                };

                if let Some(view) = self.destination_ready(&map_id, ctx.world) {
                    self.monitor = None;
                    self.arrive(&view, &mut ctx);
                    return;
                }

                if ctx.world.is_loading() {
                    if let Some(monitor) = self.monitor.as_mut() {
                        if !monitor.deferred_logged {
                            monitor.deferred_logged = true;
                            debug!(map_id = %map_id, "[warp] load still running, deferring");
                        }
                    }
                    return;
                }

                // Not loading and not active: stalled. Re-issue or give up.
                let (elapsed, retries) = match self.monitor.as_ref() {
                    Some(monitor) => (ctx.now.saturating_sub(monitor.started_at), monitor.retries),
                    None => return,
                };
                if elapsed < SCRIPTED_WARP_LOAD_RETRY_INTERVAL_MS {
                    return;
                }
                if retries >= SCRIPTED_WARP_MAX_LOAD_RETRIES {
                    self.abort_load_timeout(&map_id, retries, &mut ctx);
                    return;
                }
                if let Some(monitor) = self.monitor.as_mut() {
                    monitor.retries += 1;
                    monitor.started_at = ctx.now;
                    monitor.deferred_logged = false;
                    warn!(
                        map_id = %map_id,
                        retry = monitor.retries,
                        "[warp] destination load stalled, retrying"
                    );
                }
                ctx.world.request_load(&map_id, ctx.generation);
            }

            ScriptedWarpPhase::Exiting => {
                if ctx.door.is_exit_active() {
                    return;
                }
                // Door exit finished; the exit dispatcher already unlocked
                // input and revealed the player
                let warp = match self.active.take() {
                    Some(warp) => warp,
                    None => return,
                };
                self.monitor = None;
                *ctx.warping = false;
                ctx.cooldown.set_in_progress(false);
                if let Some(completion) = warp.completion {
                    completion.resolve();
                }
                info!(map_id = %warp.map_id, "[warp] scripted warp finished after door exit");
            }
        }
    }

    /// Drop any in-flight attempt, rejecting its completion handle. Used
    /// on session reset and when a newer request supersedes the attempt.
    pub fn abort(&mut self, warping: &mut bool) {
        if let Some(warp) = self.active.take() {
            if let Some(completion) = warp.completion {
                completion.reject(WarpError::Aborted {
                    map_id: warp.map_id,
                });
            }
        }
        self.monitor = None;
        *warping = false;
    }

    // --- Internals ---

    fn set_phase(&mut self, phase: ScriptedWarpPhase) {
        if let Some(warp) = self.active.as_mut() {
            warp.phase = phase;
        }
    }

    /// The destination counts as ready when its view is loaded, the loader
    /// is idle, and the map is active at the arrival tile.
    fn destination_ready(&self, map_id: &str, world: &dyn WorldService) -> Option<MapView> {
        if world.is_loading() {
            return None;
        }
        let warp = self.active.as_ref()?;
        let view = world.map_view(map_id)?;
        let world_x = view.origin_x + warp.x;
        let world_y = view.origin_y + warp.y;
        match world.active_map_at(world_x, world_y) {
            Some(active) if active == map_id => Some(view),
            _ => None,
        }
    }

    fn arrive(&mut self, view: &MapView, ctx: &mut ScriptedWarpCtx<'_, '_>) {
        let warp = match self.active.take() {
            Some(warp) => warp,
            None => return,
        };
        let spawn = TilePoint::new(view.origin_x + warp.x, view.origin_y + warp.y);

        ctx.player.set_position(spawn.x, spawn.y);
        if let Some(direction) = warp.direction {
            ctx.player.set_facing(direction);
        }

        let landing = ctx.world.resolve_tile(spawn.x, spawn.y);
        if let Some(traversal) = warp.traversal_override {
            let surfable = landing
                .as_ref()
                .map(|tile| is_surfable_behavior(tile.behavior))
                .unwrap_or(false);
            ctx.player.set_traversal(TraversalState {
                surfing: traversal.surfing && surfable,
                underwater: traversal.underwater && surfable,
            });
        }

        ctx.cooldown
            .update_last_checked_tile(spawn.x, spawn.y, &warp.map_id);

        if ctx.fade.direction() != Some(FadeDirection::In) {
            ctx.fade.start_fade_in(FADE_DEFAULT_DURATION_MS, ctx.now);
        }

        // Fall arrivals hand the screen to the fall sequencer; the warping
        // flag stays raised until it lands the player
        if warp.style == ScriptedWarpStyle::Fall {
            if let Some(hook) = ctx.fall_arrival.as_deref_mut() {
                if hook.start(spawn.x, spawn.y, ctx.now) {
                    info!(map_id = %warp.map_id, "[warp] fall arrival handed off");
                    if let Some(completion) = warp.completion {
                        completion.resolve();
                    }
                    return;
                }
            }
        }

        // Door-like landings step the player out before play resumes
        let exit_behavior = landing
            .as_ref()
            .filter(|tile| requires_door_exit_sequence(tile.behavior));
        if let Some(tile) = exit_behavior {
            start_door_exit(
                ctx.door,
                ctx.player,
                ctx.animations,
                spawn,
                tile.behavior,
                tile.metatile_id,
                warp.direction.unwrap_or(Direction::Down),
                ctx.now,
            );
            debug!(map_id = %warp.map_id, "[warp] scripted arrival entering door exit");
            self.active = Some(ActiveScriptedWarp {
                phase: ScriptedWarpPhase::Exiting,
                ..warp
            });
            return;
        }

        // Plain arrival: play resumes once the fade-in lands
        *ctx.warping = false;
        ctx.cooldown.set_in_progress(false);
        if let Some(completion) = warp.completion {
            self.deferred_resolve = Some((ctx.now + FADE_DEFAULT_DURATION_MS, completion));
        }
        self.unlock_at = Some(ctx.now + FADE_DEFAULT_DURATION_MS);
        info!(map_id = %warp.map_id, x = spawn.x, y = spawn.y, "[warp] scripted arrival complete");
    }

    fn abort_load_timeout(&mut self, map_id: &str, retries: u32, ctx: &mut ScriptedWarpCtx<'_, '_>) {
        warn!(
            map_id,
            retries, "[warp] destination never loaded, aborting scripted warp"
        );
        let warp = self.active.take();
        self.monitor = None;
        *ctx.warping = false;
        ctx.cooldown.set_in_progress(false);

        if let Some(completion) = warp.and_then(|warp| warp.completion) {
            completion.reject(WarpError::LoadTimeout {
                map_id: map_id.to_string(),
                retries,
            });
        }

        if ctx.fade.direction() != Some(FadeDirection::In) {
            ctx.fade.start_fade_in(FADE_DEFAULT_DURATION_MS, ctx.now);
        }
        self.unlock_at = Some(ctx.now + FADE_DEFAULT_DURATION_MS);
    }

    fn poll_deadlines(&mut self, ctx: &mut ScriptedWarpCtx<'_, '_>) {
        let resolve_due = self
            .deferred_resolve
            .as_ref()
            .map_or(false, |(deadline, _)| ctx.now >= *deadline);
        if resolve_due {
            if let Some((_, completion)) = self.deferred_resolve.take() {
                completion.resolve();
            }
        }
        if let Some(deadline) = self.unlock_at {
            if ctx.now >= deadline {
                self.unlock_at = None;
                if !*ctx.warping {
                    ctx.player.unlock_input();
                }
            }
        }
    }
}
