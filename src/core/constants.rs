//! Timing constants for the warp system
//!
//! All durations are milliseconds against the caller-supplied frame
//! timestamp. Behavior codes live in the `behaviors` module.

// =============================================================================
// COOLDOWNS
// =============================================================================

/// Cooldown applied after a warp completes, so the arrival tile cannot
/// immediately re-trigger
pub const WARP_COOLDOWN_MS: u64 = 350;

/// Minimum cooldown imposed whenever the checked tile changes, so the same
/// tile is not re-evaluated mid-frame
pub const MIN_CHECK_COOLDOWN_MS: u64 = 50;

// =============================================================================
// FADES
// =============================================================================

/// Standard screen fade duration
pub const FADE_DEFAULT_DURATION_MS: u64 = 500;

/// Shorter fade used by quick transitions
pub const FADE_QUICK_DURATION_MS: u64 = 250;

// =============================================================================
// DOOR SEQUENCES
// =============================================================================

/// Duration of one door animation frame
pub const DOOR_ANIM_FRAME_DURATION_MS: u64 = 90;

/// Number of frames in a door open/close animation
pub const DOOR_ANIM_FRAME_COUNT: u32 = 3;

/// Dwell on the closed door before the fade-out starts
pub const DOOR_WAIT_BEFORE_FADE_MS: u64 = 200;

/// Fade duration used by door entry/exit sequences
pub const DOOR_FADE_DURATION_MS: u64 = 500;

// =============================================================================
// SCRIPTED WARPS
// =============================================================================

/// How long the load monitor waits before re-issuing a destination map load
pub const SCRIPTED_WARP_LOAD_RETRY_INTERVAL_MS: u64 = 1500;

/// Load re-issues allowed before the attempt is rejected
pub const SCRIPTED_WARP_MAX_LOAD_RETRIES: u32 = 3;

// =============================================================================
// DIRECTIONAL INDICATOR
// =============================================================================

/// Full bob cycle of the arrow overlay
pub const ARROW_BOB_CYCLE_MS: u64 = 600;

/// Vertical bob amplitude in pixels
pub const ARROW_BOB_AMPLITUDE_PX: f32 = 2.0;

/// Frames in the arrow sprite strip
pub const ARROW_FRAME_COUNT: u32 = 2;
