//! Core module - warp and transition state machines

pub mod arrow;
pub mod behaviors;
pub mod completion;
pub mod constants;
pub mod cooldown;
pub mod detector;
pub mod door;
pub mod errors;
pub mod executor;
pub mod fade;
pub mod scripted;
pub mod session;
pub mod traits;
pub mod types;

pub use arrow::ArrowOverlay;
pub use completion::{CompletionState, CompletionWatcher, WarpCompletion};
pub use cooldown::WarpCooldown;
pub use detector::{classify_warp_kind, detect_warp_trigger, scan_warp_trigger, ScanOutcome};
pub use door::DoorSequencer;
pub use errors::WarpError;
pub use fade::{FadeController, FadeDirection};
pub use scripted::{ScriptedWarpOrchestrator, ScriptedWarpRequest, ScriptedWarpStyle};
pub use session::{ScanGuards, WarpSession};
pub use traits::{DoorAnimationHost, FallArrivalHook, PlayerHandle, TileSource, WorldService};
pub use types::{Direction, TilePoint, WarpKind, WarpTrigger};
