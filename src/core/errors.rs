//! Warp system error types

use std::fmt;

/// Failures surfaced by the warp system.
///
/// Most problems are recovered locally (state reset, fade restored, input
/// unlocked); these variants cover the cases the caller has to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarpError {
    /// Destination map never became active within the retry budget
    LoadTimeout { map_id: String, retries: u32 },
    /// Destination map has no loaded view yet; the warp stays pending
    /// while the load is requested
    DestinationUnavailable { map_id: String },
    /// The attempt was dropped before completing, either superseded by a
    /// newer request or cleared by a session reset
    Aborted { map_id: String },
}

impl fmt::Display for WarpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarpError::LoadTimeout { map_id, retries } => {
                write!(
                    f,
                    "destination map {} did not load after {} retries",
                    map_id, retries
                )
            }
            WarpError::DestinationUnavailable { map_id } => {
                write!(f, "destination map {} is not loaded", map_id)
            }
            WarpError::Aborted { map_id } => {
                write!(f, "warp to {} was aborted before completing", map_id)
            }
        }
    }
}

impl std::error::Error for WarpError {}
