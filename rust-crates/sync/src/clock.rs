//! Epoch countdown and phase derivation.
//!
//! Progress is `(current_slot - epoch_start_slot) / slots_in_epoch`. Notices
//! fire exactly once per epoch via an explicit fired set: each update fires
//! at most the notice for the band the progress currently sits in, and any
//! band skipped over is retired along with it, so a late join never replays
//! stale milestones. Commits are throttled so consumers do not re-render on
//! every slot tick, while the displayed countdown never silently freezes.

use crate::ledger::EpochBounds;
use std::{
    collections::HashSet,
    time::{
        Duration,
        Instant,
    },
};

/// Fallback seconds per slot when no usable performance sample exists.
pub const DEFAULT_SLOT_TIME_SECS: f64 = 0.4;

pub const LAST_HOUR_SECS: f64 = 3600.0;
pub const LOCKED_PROGRESS: f64 = 0.92;

pub const MIN_COMMIT_INTERVAL: Duration = Duration::from_millis(250);
pub const MIN_PROGRESS_DELTA: f64 = 0.001;
pub const MIN_REMAINING_SECS_DELTA: f64 = 1.0;

/// Discrete phase of the current epoch, derived from progress and the
/// remaining-time estimate. `Locked` and `Resolving` take precedence over
/// the plain progress thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Early,
    Mid,
    Late,
    LastHour,
    Locked,
    Resolving,
}

pub fn derive_phase(progress: f64, remaining_slots: u64, remaining_secs: f64) -> Phase {
    if remaining_slots == 0 {
        Phase::Resolving
    } else if progress >= LOCKED_PROGRESS {
        Phase::Locked
    } else if remaining_secs <= LAST_HOUR_SECS {
        Phase::LastHour
    } else if progress < 0.33 {
        Phase::Early
    } else if progress < 0.66 {
        Phase::Mid
    } else {
        Phase::Late
    }
}

/// One-shot per-epoch milestones, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Notice {
    Quarter,
    Half,
    ThreeQuarters,
    Locked,
    Resolving,
}

impl Notice {
    fn for_progress(progress: f64) -> Option<Self> {
        if progress >= LOCKED_PROGRESS {
            Some(Self::Locked)
        } else if progress >= 0.75 {
            Some(Self::ThreeQuarters)
        } else if progress >= 0.50 {
            Some(Self::Half)
        } else if progress >= 0.25 {
            Some(Self::Quarter)
        } else {
            None
        }
    }
}

/// Derived countdown value committed to consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockReading {
    pub epoch: u64,
    pub progress: f64,
    pub phase: Phase,
    pub remaining_slots: u64,
    pub remaining_secs: f64,
}

/// Outcome of one clock update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClockUpdate {
    /// Value to publish, when not suppressed by throttling.
    pub commit: Option<ClockReading>,
    /// Milestones that fired on this update (at most one progress notice
    /// plus possibly `Resolving`).
    pub notices: Vec<Notice>,
    /// True exactly once per epoch, at the transition into `remaining == 0`.
    /// The finale watcher is started off this edge.
    pub open_finale: bool,
}

pub struct EpochClock {
    fired_epoch: Option<u64>,
    fired: HashSet<Notice>,
    last_commit_at: Option<Instant>,
    last_reading: Option<ClockReading>,
}

impl Default for EpochClock {
    fn default() -> Self {
        Self::new()
    }
}

impl EpochClock {
    pub fn new() -> Self {
        Self {
            fired_epoch: None,
            fired: HashSet::new(),
            last_commit_at: None,
            last_reading: None,
        }
    }

    pub fn update(
        &mut self,
        bounds: EpochBounds,
        current_slot: u64,
        secs_per_slot: f64,
        now: Instant,
    ) -> ClockUpdate {
        if self.fired_epoch != Some(bounds.epoch) {
            self.fired_epoch = Some(bounds.epoch);
            self.fired.clear();
        }

        let slots_in_epoch = bounds.slots_in_epoch.max(1);
        let elapsed = current_slot.saturating_sub(bounds.start_slot);
        let progress = (elapsed as f64 / slots_in_epoch as f64).clamp(0.0, 1.0);
        let remaining_slots = slots_in_epoch.saturating_sub(elapsed);
        let remaining_secs = remaining_slots as f64 * secs_per_slot;
        let phase = derive_phase(progress, remaining_slots, remaining_secs);

        let reading = ClockReading {
            epoch: bounds.epoch,
            progress,
            phase,
            remaining_slots,
            remaining_secs,
        };

        let mut notices = Vec::new();
        if let Some(notice) = Notice::for_progress(progress) {
            if !self.fired.contains(&notice) {
                notices.push(notice);
                // Bands skipped over are retired too: joining at 76% must
                // not replay the 25% and 50% milestones later.
                for earlier in [
                    Notice::Quarter,
                    Notice::Half,
                    Notice::ThreeQuarters,
                    Notice::Locked,
                ] {
                    if earlier <= notice {
                        self.fired.insert(earlier);
                    }
                }
            }
        }

        let mut open_finale = false;
        if remaining_slots == 0 && !self.fired.contains(&Notice::Resolving) {
            self.fired.insert(Notice::Resolving);
            notices.push(Notice::Resolving);
            open_finale = true;
        }

        let commit = if self.should_commit(&reading, now) {
            self.last_commit_at = Some(now);
            self.last_reading = Some(reading);
            Some(reading)
        } else {
            None
        };

        ClockUpdate {
            commit,
            notices,
            open_finale,
        }
    }

    fn should_commit(&self, reading: &ClockReading, now: Instant) -> bool {
        let Some(previous) = self.last_reading else {
            return true;
        };
        if let Some(at) = self.last_commit_at {
            if now.duration_since(at) < MIN_COMMIT_INTERVAL {
                return false;
            }
        }
        previous.epoch != reading.epoch
            || previous.phase != reading.phase
            || (reading.progress - previous.progress).abs() >= MIN_PROGRESS_DELTA
            || previous.remaining_slots != reading.remaining_slots
            || (reading.remaining_secs - previous.remaining_secs).abs()
                >= MIN_REMAINING_SECS_DELTA
    }
}

/// Seconds-per-slot estimate fed from recent performance samples. Bad
/// samples (errors, NaN, nonsense magnitudes) never corrupt the last good
/// value.
#[derive(Debug, Clone, Copy)]
pub struct SlotTimeEstimator {
    estimate: f64,
}

impl Default for SlotTimeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTimeEstimator {
    pub fn new() -> Self {
        Self {
            estimate: DEFAULT_SLOT_TIME_SECS,
        }
    }

    pub fn secs_per_slot(&self) -> f64 {
        self.estimate
    }

    pub fn ingest(&mut self, sample: Option<f64>) {
        let Some(sample) = sample else { return };
        if !sample.is_finite() || sample <= 0.0 || sample > 10.0 {
            return;
        }
        self.estimate = sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> EpochBounds {
        EpochBounds {
            epoch: 815,
            start_slot: 1_000_000,
            slots_in_epoch: 10_000,
        }
    }

    fn slot_at(progress: f64) -> u64 {
        bounds().start_slot + (progress * bounds().slots_in_epoch as f64) as u64
    }

    fn far_enough(n: u32) -> Instant {
        // Spaced beyond the commit throttle so suppression never masks the
        // notice assertions.
        Instant::now() + MIN_COMMIT_INTERVAL * (n + 1)
    }

    #[test]
    fn notice_sequence_fires_exactly_once_each() {
        let mut clock = EpochClock::new();
        let mut fired = Vec::new();
        for (i, progress) in [0.10, 0.26, 0.40, 0.76, 0.93].into_iter().enumerate() {
            let update = clock.update(bounds(), slot_at(progress), 0.4, far_enough(i as u32));
            fired.extend(update.notices);
        }
        assert_eq!(
            fired,
            vec![Notice::Quarter, Notice::ThreeQuarters, Notice::Locked]
        );

        // Repeating the final progress value fires nothing further.
        let update = clock.update(bounds(), slot_at(0.93), 0.4, far_enough(10));
        assert!(update.notices.is_empty());
    }

    #[test]
    fn resolving_fires_once_and_opens_finale_once() {
        let mut clock = EpochClock::new();
        let end = bounds().start_slot + bounds().slots_in_epoch;

        let first = clock.update(bounds(), end, 0.4, far_enough(0));
        assert!(first.open_finale);
        assert!(first.notices.contains(&Notice::Resolving));
        assert_eq!(first.commit.unwrap().phase, Phase::Resolving);

        let second = clock.update(bounds(), end + 5, 0.4, far_enough(1));
        assert!(!second.open_finale);
        assert!(second.notices.is_empty());
    }

    #[test]
    fn fired_set_resets_on_new_epoch() {
        let mut clock = EpochClock::new();
        clock.update(bounds(), slot_at(0.30), 0.4, far_enough(0));

        let next_epoch = EpochBounds {
            epoch: 816,
            start_slot: bounds().start_slot + bounds().slots_in_epoch,
            slots_in_epoch: 10_000,
        };
        let slot = next_epoch.start_slot + 3_000;
        let update = clock.update(next_epoch, slot, 0.4, far_enough(1));
        assert_eq!(update.notices, vec![Notice::Quarter]);
    }

    #[test]
    fn locked_and_resolving_take_precedence() {
        assert_eq!(derive_phase(0.95, 500, 200.0), Phase::Locked);
        assert_eq!(derive_phase(0.95, 0, 0.0), Phase::Resolving);
        assert_eq!(derive_phase(0.50, 100, 40.0), Phase::LastHour);
        assert_eq!(derive_phase(0.10, 9_000, 100_000.0), Phase::Early);
        assert_eq!(derive_phase(0.50, 5_000, 100_000.0), Phase::Mid);
        assert_eq!(derive_phase(0.70, 3_000, 100_000.0), Phase::Late);
    }

    #[test]
    fn commits_are_throttled_by_interval() {
        let mut clock = EpochClock::new();
        let t0 = Instant::now();
        let first = clock.update(bounds(), slot_at(0.10), 0.4, t0);
        assert!(first.commit.is_some());

        // A different slot inside the throttle window is suppressed.
        let quick = clock.update(
            bounds(),
            slot_at(0.10) + 1,
            0.4,
            t0 + Duration::from_millis(50),
        );
        assert!(quick.commit.is_none());

        // The same change clears once the interval passes.
        let later = clock.update(
            bounds(),
            slot_at(0.10) + 1,
            0.4,
            t0 + MIN_COMMIT_INTERVAL * 2,
        );
        assert!(later.commit.is_some());
    }

    #[test]
    fn unchanged_reading_is_suppressed_even_after_interval() {
        let mut clock = EpochClock::new();
        let t0 = Instant::now();
        clock.update(bounds(), slot_at(0.10), 0.4, t0);
        let repeat = clock.update(bounds(), slot_at(0.10), 0.4, t0 + Duration::from_secs(5));
        assert!(repeat.commit.is_none());
    }

    #[test]
    fn estimator_ignores_bad_samples() {
        let mut est = SlotTimeEstimator::new();
        assert_eq!(est.secs_per_slot(), DEFAULT_SLOT_TIME_SECS);

        est.ingest(Some(0.45));
        assert_eq!(est.secs_per_slot(), 0.45);

        est.ingest(None);
        est.ingest(Some(f64::NAN));
        est.ingest(Some(0.0));
        est.ingest(Some(-1.0));
        est.ingest(Some(1_000.0));
        assert_eq!(est.secs_per_slot(), 0.45);
    }
}
