//! Silence-based end-of-turn detection

use std::time::{Duration, Instant};

/// Observable timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Minimum recording window; silence cannot end the turn yet
    WaitingMinimum,
    /// Watching for the silence window to elapse since the last partial
    WatchingSilence,
    /// The turn-complete signal has been raised
    Expired,
}

/// Decides when a recording turn ends
///
/// A turn runs for at least `min_duration` regardless of silence, then ends
/// once `silence_timeout` has passed since the last partial transcript.
/// Partials reset the silence clock but never shorten the minimum window.
/// The timer fires exactly once; afterwards it is inert.
#[derive(Debug)]
pub struct TurnTimer {
    started_at: Instant,
    last_activity: Instant,
    min_duration: Duration,
    silence_timeout: Duration,
    fired: bool,
}

impl TurnTimer {
    /// Start a timer at `now`
    #[must_use]
    pub const fn new(min_duration: Duration, silence_timeout: Duration, now: Instant) -> Self {
        Self {
            started_at: now,
            last_activity: now,
            min_duration,
            silence_timeout,
            fired: false,
        }
    }

    /// Record a partial transcript arrival, resetting the silence clock
    pub const fn record_activity(&mut self, now: Instant) {
        if !self.fired {
            self.last_activity = now;
        }
    }

    /// Check for expiry; returns `true` exactly once when the turn completes
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.fired {
            return false;
        }
        if now.duration_since(self.started_at) < self.min_duration {
            return false;
        }
        if now.duration_since(self.last_activity) >= self.silence_timeout {
            self.fired = true;
            return true;
        }
        false
    }

    /// Raise the turn-complete signal from an external stop request;
    /// returns `true` if this call fired it
    pub const fn force(&mut self) -> bool {
        if self.fired {
            false
        } else {
            self.fired = true;
            true
        }
    }

    /// Current phase
    #[must_use]
    pub fn state(&self, now: Instant) -> TimerState {
        if self.fired {
            TimerState::Expired
        } else if now.duration_since(self.started_at) < self.min_duration {
            TimerState::WaitingMinimum
        } else {
            TimerState::WatchingSilence
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(8);
    const SILENCE: Duration = Duration::from_secs(3);

    #[test]
    fn never_fires_before_minimum() {
        let start = Instant::now();
        let mut timer = TurnTimer::new(MIN, SILENCE, start);

        // Continuous silence from turn start: still no fire inside the
        // minimum window
        for secs in 0..8 {
            assert!(!timer.poll(start + Duration::from_secs(secs)));
        }
        assert_eq!(timer.state(start + Duration::from_secs(7)), TimerState::WaitingMinimum);

        // At the minimum boundary the silence window (counted from start)
        // has long elapsed
        assert!(timer.poll(start + MIN));
        assert_eq!(timer.state(start + MIN), TimerState::Expired);
    }

    #[test]
    fn fires_within_silence_timeout_of_last_partial() {
        let start = Instant::now();
        let mut timer = TurnTimer::new(MIN, SILENCE, start);

        timer.record_activity(start + Duration::from_secs(9));
        assert!(!timer.poll(start + Duration::from_secs(10)));
        assert!(!timer.poll(start + Duration::from_secs(11)));
        assert!(timer.poll(start + Duration::from_secs(12)));
    }

    #[test]
    fn activity_never_shortens_minimum() {
        let start = Instant::now();
        let mut timer = TurnTimer::new(MIN, SILENCE, start);

        // A single early partial, then silence: expiry still waits for the
        // minimum window, then fires on the first poll past it
        timer.record_activity(start + Duration::from_secs(1));
        assert!(!timer.poll(start + Duration::from_secs(5)));
        assert_eq!(timer.state(start + Duration::from_secs(9)), TimerState::WatchingSilence);
        assert!(timer.poll(start + Duration::from_secs(9)));
    }

    #[test]
    fn fires_exactly_once() {
        let start = Instant::now();
        let mut timer = TurnTimer::new(MIN, SILENCE, start);

        assert!(timer.poll(start + Duration::from_secs(20)));
        assert!(!timer.poll(start + Duration::from_secs(30)));
        assert!(!timer.force());
    }

    #[test]
    fn external_stop_fires_once() {
        let start = Instant::now();
        let mut timer = TurnTimer::new(MIN, SILENCE, start);

        assert!(timer.force());
        assert!(!timer.force());
        assert!(!timer.poll(start + Duration::from_secs(20)));
        assert_eq!(timer.state(start), TimerState::Expired);
    }

    #[test]
    fn activity_after_fire_is_ignored() {
        let start = Instant::now();
        let mut timer = TurnTimer::new(MIN, SILENCE, start);

        assert!(timer.poll(start + Duration::from_secs(20)));
        timer.record_activity(start + Duration::from_secs(21));
        assert_eq!(timer.state(start + Duration::from_secs(21)), TimerState::Expired);
    }
}
