//! Frame-budget back-pressure on LOD depth.
//!
//! Under sustained overrun the governor lowers a cap on max LOD one level at a
//! time; after a sustained run under budget it raises the cap again. The cap
//! only ever restricts the user's own max LOD setting.

use tracing::info;

/// Governor tunables.
#[derive(Clone, Debug, PartialEq)]
pub struct GovernorSettings {
    /// Whether the governor acts at all.
    pub enabled: bool,
    /// Target frame time in milliseconds.
    pub frame_budget_ms: f64,
    /// Consecutive over-budget frames before the cap drops a level.
    pub overrun_frames: u32,
    /// Consecutive under-budget frames before the cap rises a level.
    pub recovery_frames: u32,
    /// The cap never goes below this.
    pub min_max_lod: u8,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            frame_budget_ms: 16.7,
            overrun_frames: 30,
            recovery_frames: 120,
            min_max_lod: 3,
        }
    }
}

/// Tracks frame times and maintains an optional LOD cap.
#[derive(Clone, Debug)]
pub struct QualityGovernor {
    settings: GovernorSettings,
    cap: Option<u8>,
    over_streak: u32,
    under_streak: u32,
}

impl QualityGovernor {
    /// A governor with no cap in force.
    pub fn new(settings: GovernorSettings) -> Self {
        Self {
            settings,
            cap: None,
            over_streak: 0,
            under_streak: 0,
        }
    }

    /// Current tunables.
    pub fn settings(&self) -> &GovernorSettings {
        &self.settings
    }

    /// Cap currently in force, if any.
    pub fn cap(&self) -> Option<u8> {
        self.cap
    }

    /// Max LOD after applying the cap to the user's setting.
    pub fn effective_max_lod(&self, requested: u8) -> u8 {
        match self.cap {
            Some(cap) if self.settings.enabled => requested.min(cap),
            _ => requested,
        }
    }

    /// Feed the duration of the last frame.
    ///
    /// `requested` is the user's max LOD, the starting point when a cap is
    /// first introduced.
    pub fn record_frame(&mut self, frame_ms: f64, requested: u8) {
        if !self.settings.enabled {
            return;
        }

        if frame_ms > self.settings.frame_budget_ms {
            self.over_streak += 1;
            self.under_streak = 0;
            if self.over_streak >= self.settings.overrun_frames {
                self.over_streak = 0;
                let current = self.effective_max_lod(requested);
                let lowered = current.saturating_sub(1).max(self.settings.min_max_lod);
                if lowered < current {
                    self.cap = Some(lowered);
                    info!(frame_ms, cap = lowered, "Frame budget overrun, lowering max LOD");
                }
            }
        } else {
            self.under_streak += 1;
            self.over_streak = 0;
            if self.under_streak >= self.settings.recovery_frames {
                self.under_streak = 0;
                if let Some(cap) = self.cap {
                    let raised = cap + 1;
                    if raised >= requested {
                        self.cap = None;
                        info!("Frame budget recovered, max LOD cap lifted");
                    } else {
                        self.cap = Some(raised);
                        info!(cap = raised, "Frame budget recovered, raising max LOD");
                    }
                }
            }
        }
    }

    /// Lift any cap and reset the streaks.
    pub fn reset(&mut self) {
        self.cap = None;
        self.over_streak = 0;
        self.under_streak = 0;
    }
}

impl Default for QualityGovernor {
    fn default() -> Self {
        Self::new(GovernorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> QualityGovernor {
        QualityGovernor::new(GovernorSettings {
            enabled: true,
            frame_budget_ms: 10.0,
            overrun_frames: 3,
            recovery_frames: 5,
            min_max_lod: 3,
        })
    }

    #[test]
    fn test_disabled_governor_never_caps() {
        let mut governor = QualityGovernor::default();
        for _ in 0..1000 {
            governor.record_frame(100.0, 8);
        }
        assert_eq!(governor.cap(), None);
        assert_eq!(governor.effective_max_lod(8), 8);
    }

    #[test]
    fn test_sustained_overrun_lowers_cap() {
        let mut governor = enabled();
        for _ in 0..3 {
            governor.record_frame(20.0, 8);
        }
        assert_eq!(governor.effective_max_lod(8), 7);
        for _ in 0..3 {
            governor.record_frame(20.0, 8);
        }
        assert_eq!(governor.effective_max_lod(8), 6);
    }

    /// Isolated spikes do not accumulate.
    #[test]
    fn test_interrupted_overrun_does_not_cap() {
        let mut governor = enabled();
        for _ in 0..10 {
            governor.record_frame(20.0, 8);
            governor.record_frame(20.0, 8);
            governor.record_frame(5.0, 8);
        }
        assert_eq!(governor.cap(), None);
    }

    #[test]
    fn test_cap_respects_floor() {
        let mut governor = enabled();
        for _ in 0..100 {
            governor.record_frame(50.0, 8);
        }
        assert_eq!(governor.effective_max_lod(8), 3);
    }

    #[test]
    fn test_recovery_raises_then_lifts_cap() {
        let mut governor = enabled();
        for _ in 0..6 {
            governor.record_frame(20.0, 8);
        }
        assert_eq!(governor.cap(), Some(6));
        for _ in 0..5 {
            governor.record_frame(1.0, 8);
        }
        assert_eq!(governor.cap(), Some(7));
        for _ in 0..5 {
            governor.record_frame(1.0, 8);
        }
        assert_eq!(governor.cap(), None);
    }

    #[test]
    fn test_cap_never_raises_user_setting() {
        let mut governor = enabled();
        for _ in 0..3 {
            governor.record_frame(20.0, 8);
        }
        assert_eq!(governor.effective_max_lod(4), 4);
    }
}
