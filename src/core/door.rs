//! Door entry/exit sequencing
//!
//! Two independent phase machines advanced once per frame. Neither machine
//! performs side effects itself: each update returns an action descriptor
//! the caller dispatches (force a step, hide the sprite, spawn an
//! animation, start the fade, execute the warp). Completion predicates are
//! supplied as oracles so the machines stay decoupled from the animation
//! and fade subsystems.
//!
//! Entry (walking into a door):
//! `Opening -> Stepping -> Closing -> WaitingBeforeFade -> FadingOut ->
//! Warping -> Idle`, with `Closing` skipped for non-animated doors
//! (stairs and similar).
//!
//! Exit (arriving on a door tile): `Opening -> Stepping -> Closing -> Done`.
//!
//! The machines have no timeouts. If an animation spawn failed upstream,
//! the oracle must answer "done" for the missing handle or the sequence
//! stalls; that conversion is the caller's contract.

use tracing::debug;

use super::constants::{DOOR_FADE_DURATION_MS, DOOR_WAIT_BEFORE_FADE_MS};
use super::traits::AnimHandle;
use super::types::{Direction, TilePoint, WarpTrigger};

// =============================================================================
// STAGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEntryStage {
    Idle,
    Opening,
    Stepping,
    Closing,
    WaitingBeforeFade,
    FadingOut,
    Warping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorExitStage {
    Idle,
    Opening,
    Stepping,
    Closing,
    Done,
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug)]
pub struct DoorEntryState {
    pub stage: DoorEntryStage,
    pub trigger: Option<WarpTrigger>,
    pub target: TilePoint,
    pub metatile_id: u16,
    pub is_animated: bool,
    pub entry_direction: Direction,
    pub open_anim: Option<AnimHandle>,
    pub close_anim: Option<AnimHandle>,
    pub player_hidden: bool,
    pub wait_started_at: u64,
}

impl DoorEntryState {
    fn idle() -> Self {
        Self {
            stage: DoorEntryStage::Idle,
            trigger: None,
            target: TilePoint::new(0, 0),
            metatile_id: 0,
            is_animated: true,
            entry_direction: Direction::Up,
            open_anim: None,
            close_anim: None,
            player_hidden: false,
            wait_started_at: 0,
        }
    }
}

#[derive(Debug)]
pub struct DoorExitState {
    pub stage: DoorExitStage,
    pub door: TilePoint,
    pub metatile_id: u16,
    pub is_animated: bool,
    pub exit_direction: Direction,
    pub open_anim: Option<AnimHandle>,
    pub close_anim: Option<AnimHandle>,
}

impl DoorExitState {
    fn idle() -> Self {
        Self {
            stage: DoorExitStage::Idle,
            door: TilePoint::new(0, 0),
            metatile_id: 0,
            is_animated: true,
            exit_direction: Direction::Down,
            open_anim: None,
            close_anim: None,
        }
    }
}

// =============================================================================
// CONFIGS AND ACTIONS
// =============================================================================

/// Parameters for starting a door entry sequence
#[derive(Debug, Clone)]
pub struct DoorEntryConfig {
    /// The door tile
    pub target: TilePoint,
    /// Metatile id for animation graphics lookup
    pub metatile_id: u16,
    /// False for stairs and other doors without a graphic
    pub is_animated: bool,
    /// Direction the player steps to pass through
    pub entry_direction: Direction,
    /// Warp executed once the fade-out completes
    pub trigger: WarpTrigger,
    /// Open animation, when the caller already spawned it
    pub open_anim: Option<AnimHandle>,
}

/// Parameters for starting a door exit sequence
#[derive(Debug, Clone)]
pub struct DoorExitConfig {
    pub door: TilePoint,
    pub metatile_id: u16,
    pub is_animated: bool,
    /// Direction the player steps off the door tile
    pub exit_direction: Direction,
    pub open_anim: Option<AnimHandle>,
}

/// What the caller must do after an entry update
#[derive(Debug, Clone, PartialEq)]
pub enum DoorEntryAction {
    /// Spawn the door open animation and report it back via
    /// [`DoorSequencer::set_entry_open_anim`]
    SpawnOpenAnimation,
    /// Force the player one step in the given direction
    StartPlayerStep(Direction),
    /// Hide the player sprite; for animated doors also spawn the close
    /// animation (reported back via `set_entry_close_anim`) and remove the
    /// open animation once the close one is showing
    HidePlayer { spawn_close: bool },
    /// Close animation finished; remove it to show the base tile
    RemoveCloseAnimation(AnimHandle),
    StartFadeOut { duration_ms: u64 },
    /// Fade-out complete; perform the map transition
    ExecuteWarp(WarpTrigger),
}

/// What the caller must do after an exit update
#[derive(Debug, Clone, PartialEq)]
pub enum DoorExitAction {
    /// Spawn the door in its fully-open state before the fade-in completes
    SpawnOpenAnimation,
    StartPlayerStep(Direction),
    /// Player stepped off; spawn the close animation, removing the open
    /// one once it is showing
    SpawnCloseAnimation { remove_open: Option<AnimHandle> },
    RemoveCloseAnimation(AnimHandle),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DoorEntryUpdate {
    pub done: bool,
    pub action: Option<DoorEntryAction>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DoorExitUpdate {
    pub done: bool,
    pub action: Option<DoorExitAction>,
}

// =============================================================================
// SEQUENCER
// =============================================================================

/// Owns both door phase machines. At most one of entry/exit runs at a time
/// in practice (the session enforces it), but the states are independent.
#[derive(Debug)]
pub struct DoorSequencer {
    entry: DoorEntryState,
    exit: DoorExitState,
}

impl Default for DoorSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl DoorSequencer {
    pub fn new() -> Self {
        Self {
            entry: DoorEntryState::idle(),
            exit: DoorExitState::idle(),
        }
    }

    /// Begin a door entry sequence.
    ///
    /// Returns `SpawnOpenAnimation` when an animated door still needs its
    /// open animation spawned.
    pub fn start_entry(&mut self, config: DoorEntryConfig, now: u64) -> DoorEntryUpdate {
        debug!(
            x = config.target.x,
            y = config.target.y,
            metatile_id = config.metatile_id,
            animated = config.is_animated,
            dest_map = %config.trigger.warp_event.dest_map,
            "[warp] door entry started"
        );
        let needs_open_anim = config.is_animated && config.open_anim.is_none();
        self.entry = DoorEntryState {
            stage: DoorEntryStage::Opening,
            trigger: Some(config.trigger),
            target: config.target,
            metatile_id: config.metatile_id,
            is_animated: config.is_animated,
            entry_direction: config.entry_direction,
            open_anim: config.open_anim,
            close_anim: None,
            player_hidden: false,
            wait_started_at: now,
        };

        DoorEntryUpdate {
            done: false,
            action: needs_open_anim.then_some(DoorEntryAction::SpawnOpenAnimation),
        }
    }

    /// Advance the entry machine one frame.
    ///
    /// `is_animation_done` is the caller's oracle over animation handles; a
    /// `None` handle must report done. `is_fade_done` gates the
    /// `FadingOut -> Warping` transition.
    pub fn update_entry<F>(
        &mut self,
        now: u64,
        player_is_moving: bool,
        is_animation_done: F,
        is_fade_done: bool,
    ) -> DoorEntryUpdate
    where
        F: Fn(Option<AnimHandle>) -> bool,
    {
        let state = &mut self.entry;
        match state.stage {
            DoorEntryStage::Idle => DoorEntryUpdate {
                done: true,
                action: None,
            },

            DoorEntryStage::Opening => {
                if !state.is_animated || is_animation_done(state.open_anim) {
                    state.stage = DoorEntryStage::Stepping;
                    DoorEntryUpdate {
                        done: false,
                        action: Some(DoorEntryAction::StartPlayerStep(state.entry_direction)),
                    }
                } else {
                    DoorEntryUpdate::default()
                }
            }

            DoorEntryStage::Stepping => {
                if player_is_moving {
                    return DoorEntryUpdate::default();
                }
                state.player_hidden = true;
                if state.is_animated {
                    state.stage = DoorEntryStage::Closing;
                    DoorEntryUpdate {
                        done: false,
                        action: Some(DoorEntryAction::HidePlayer { spawn_close: true }),
                    }
                } else {
                    // No close animation: dwell on the bare tile instead
                    state.stage = DoorEntryStage::WaitingBeforeFade;
                    state.wait_started_at = now;
                    DoorEntryUpdate {
                        done: false,
                        action: Some(DoorEntryAction::HidePlayer { spawn_close: false }),
                    }
                }
            }

            DoorEntryStage::Closing => {
                if !is_animation_done(state.close_anim) {
                    return DoorEntryUpdate::default();
                }
                state.stage = DoorEntryStage::WaitingBeforeFade;
                state.wait_started_at = now;
                DoorEntryUpdate {
                    done: false,
                    action: state.close_anim.map(DoorEntryAction::RemoveCloseAnimation),
                }
            }

            DoorEntryStage::WaitingBeforeFade => {
                if now.saturating_sub(state.wait_started_at) < DOOR_WAIT_BEFORE_FADE_MS {
                    return DoorEntryUpdate::default();
                }
                state.stage = DoorEntryStage::FadingOut;
                DoorEntryUpdate {
                    done: false,
                    action: Some(DoorEntryAction::StartFadeOut {
                        duration_ms: DOOR_FADE_DURATION_MS,
                    }),
                }
            }

            DoorEntryStage::FadingOut => {
                if !is_fade_done {
                    return DoorEntryUpdate::default();
                }
                state.stage = DoorEntryStage::Warping;
                match state.trigger.take() {
                    Some(trigger) => DoorEntryUpdate {
                        done: false,
                        action: Some(DoorEntryAction::ExecuteWarp(trigger)),
                    },
                    None => DoorEntryUpdate::default(),
                }
            }

            DoorEntryStage::Warping => {
                self.entry = DoorEntryState::idle();
                DoorEntryUpdate {
                    done: true,
                    action: None,
                }
            }
        }
    }

    /// Begin a door exit sequence on the arrival map
    pub fn start_exit(&mut self, config: DoorExitConfig) -> DoorExitUpdate {
        debug!(
            x = config.door.x,
            y = config.door.y,
            metatile_id = config.metatile_id,
            animated = config.is_animated,
            "[warp] door exit started"
        );
        let needs_open_anim = config.is_animated && config.open_anim.is_none();
        self.exit = DoorExitState {
            stage: DoorExitStage::Opening,
            door: config.door,
            metatile_id: config.metatile_id,
            is_animated: config.is_animated,
            exit_direction: config.exit_direction,
            open_anim: config.open_anim,
            close_anim: None,
        };

        DoorExitUpdate {
            done: false,
            action: needs_open_anim.then_some(DoorExitAction::SpawnOpenAnimation),
        }
    }

    /// Advance the exit machine one frame
    pub fn update_exit<F>(&mut self, player_is_moving: bool, is_animation_done: F) -> DoorExitUpdate
    where
        F: Fn(Option<AnimHandle>) -> bool,
    {
        let state = &mut self.exit;
        match state.stage {
            DoorExitStage::Idle | DoorExitStage::Done => DoorExitUpdate {
                done: true,
                action: None,
            },

            DoorExitStage::Opening => {
                if !state.is_animated || is_animation_done(state.open_anim) {
                    state.stage = DoorExitStage::Stepping;
                    DoorExitUpdate {
                        done: false,
                        action: Some(DoorExitAction::StartPlayerStep(state.exit_direction)),
                    }
                } else {
                    DoorExitUpdate::default()
                }
            }

            DoorExitStage::Stepping => {
                if player_is_moving {
                    return DoorExitUpdate::default();
                }
                if state.is_animated {
                    state.stage = DoorExitStage::Closing;
                    DoorExitUpdate {
                        done: false,
                        action: Some(DoorExitAction::SpawnCloseAnimation {
                            remove_open: state.open_anim,
                        }),
                    }
                } else {
                    state.stage = DoorExitStage::Done;
                    DoorExitUpdate {
                        done: true,
                        action: None,
                    }
                }
            }

            DoorExitStage::Closing => {
                if !is_animation_done(state.close_anim) {
                    return DoorExitUpdate::default();
                }
                state.stage = DoorExitStage::Done;
                DoorExitUpdate {
                    done: true,
                    action: state.close_anim.map(DoorExitAction::RemoveCloseAnimation),
                }
            }
        }
    }

    // --- Animation handle reporting ---

    pub fn set_entry_open_anim(&mut self, handle: AnimHandle) {
        self.entry.open_anim = Some(handle);
    }

    pub fn set_entry_close_anim(&mut self, handle: AnimHandle) {
        self.entry.close_anim = Some(handle);
    }

    pub fn set_exit_open_anim(&mut self, handle: AnimHandle) {
        self.exit.open_anim = Some(handle);
    }

    pub fn set_exit_close_anim(&mut self, handle: AnimHandle) {
        self.exit.close_anim = Some(handle);
    }

    // --- Accessors ---

    pub fn is_entry_active(&self) -> bool {
        self.entry.stage != DoorEntryStage::Idle
    }

    pub fn is_exit_active(&self) -> bool {
        self.exit.stage != DoorExitStage::Idle && self.exit.stage != DoorExitStage::Done
    }

    pub fn is_active(&self) -> bool {
        self.is_entry_active() || self.is_exit_active()
    }

    pub fn is_player_hidden(&self) -> bool {
        self.entry.player_hidden
    }

    pub fn entry_stage(&self) -> DoorEntryStage {
        self.entry.stage
    }

    pub fn exit_stage(&self) -> DoorExitStage {
        self.exit.stage
    }

    pub fn entry(&self) -> &DoorEntryState {
        &self.entry
    }

    pub fn exit(&self) -> &DoorExitState {
        &self.exit
    }

    pub fn entry_door_position(&self) -> Option<TilePoint> {
        (self.entry.stage != DoorEntryStage::Idle).then_some(self.entry.target)
    }

    pub fn exit_door_position(&self) -> Option<TilePoint> {
        self.is_exit_active().then_some(self.exit.door)
    }

    // --- Resets ---

    pub fn reset_entry(&mut self) {
        self.entry = DoorEntryState::idle();
    }

    pub fn reset_exit(&mut self) {
        self.exit = DoorExitState::idle();
    }

    pub fn reset(&mut self) {
        self.reset_entry();
        self.reset_exit();
    }
}
