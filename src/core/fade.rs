//! Screen fade state
//!
//! Tracks a fade-to-black or fade-from-black as direction, start time and
//! duration. Alpha is a pure function of the caller's timestamp, so every
//! other state machine can use "is the fade complete" as a barrier without
//! the fade owning any per-frame bookkeeping.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    /// Fading to black
    Out,
    /// Fading from black
    In,
}

#[derive(Debug, Default)]
pub struct FadeController {
    mode: Option<FadeDirection>,
    started_at: u64,
    duration_ms: u64,
}

impl FadeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_fade_out(&mut self, duration_ms: u64, now: u64) {
        self.mode = Some(FadeDirection::Out);
        self.started_at = now;
        self.duration_ms = duration_ms;
    }

    pub fn start_fade_in(&mut self, duration_ms: u64, now: u64) {
        self.mode = Some(FadeDirection::In);
        self.started_at = now;
        self.duration_ms = duration_ms;
    }

    /// Fraction of the fade elapsed, clamped to [0, 1]
    pub fn progress(&self, now: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at) as f32;
        (elapsed / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    /// Black overlay opacity at `now`: rises for Out, falls for In,
    /// 0 when no fade is active
    pub fn alpha(&self, now: u64) -> f32 {
        match self.mode {
            Some(FadeDirection::Out) => self.progress(now),
            Some(FadeDirection::In) => 1.0 - self.progress(now),
            None => 0.0,
        }
    }

    /// True once the full duration has elapsed. An inactive fade counts as
    /// complete so callers can gate on this unconditionally.
    pub fn is_complete(&self, now: u64) -> bool {
        match self.mode {
            Some(_) => now.saturating_sub(self.started_at) >= self.duration_ms,
            None => true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    pub fn direction(&self) -> Option<FadeDirection> {
        self.mode
    }

    pub fn clear(&mut self) {
        self.mode = None;
        self.started_at = 0;
        self.duration_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_out_alpha_curve() {
        let mut fade = FadeController::new();
        fade.start_fade_out(500, 0);
        assert_eq!(fade.alpha(0), 0.0);
        assert_eq!(fade.alpha(250), 0.5);
        assert_eq!(fade.alpha(500), 1.0);
        assert!(fade.is_complete(500));
        assert!(!fade.is_complete(499));
        // Past the end the alpha stays clamped
        assert_eq!(fade.alpha(900), 1.0);
    }

    #[test]
    fn test_fade_in_alpha_curve() {
        let mut fade = FadeController::new();
        fade.start_fade_in(250, 1000);
        assert_eq!(fade.alpha(1000), 1.0);
        assert_eq!(fade.alpha(1125), 0.5);
        assert_eq!(fade.alpha(1250), 0.0);
        assert_eq!(fade.direction(), Some(FadeDirection::In));
    }

    #[test]
    fn test_inactive_fade() {
        let fade = FadeController::new();
        assert!(!fade.is_active());
        assert_eq!(fade.alpha(12345), 0.0);
        assert!(fade.is_complete(0));
    }

    #[test]
    fn test_clear() {
        let mut fade = FadeController::new();
        fade.start_fade_out(500, 0);
        fade.clear();
        assert!(!fade.is_active());
        assert_eq!(fade.alpha(100), 0.0);
    }

    #[test]
    fn test_zero_duration_is_instantly_complete() {
        let mut fade = FadeController::new();
        fade.start_fade_out(0, 100);
        assert!(fade.is_complete(100));
        assert_eq!(fade.alpha(100), 1.0);
    }
}
