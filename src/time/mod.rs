//! Per-pass timing: the time snapshot handed to hooks, the clock that
//! produces it and the pacer that holds a pass to its cadence.

use std::thread;
use std::time::{Duration, Instant};

/// Timing snapshot for a single tick of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameTime {
    /// Time accumulated by this pass since it started
    pub total: Duration,
    /// Time since the previous tick of the same pass
    pub elapsed: Duration,
}

impl GameTime {
    pub fn total_seconds(&self) -> f64 {
        self.total.as_secs_f64()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Tracks time for one pass. Update and Draw each own one, since they tick
/// at unrelated rates.
#[derive(Debug)]
pub struct Clock {
    time: GameTime,
    last_instant: Option<Instant>,
    max_delta: Option<Duration>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Clock {
    pub fn new(max_delta: Option<Duration>) -> Self {
        Self {
            time: GameTime::default(),
            last_instant: None,
            max_delta,
        }
    }

    /// Advance the clock. Call once per tick, right before the hooks run.
    pub fn tick(&mut self) -> GameTime {
        self.tick_at(Instant::now())
    }

    /// Advance the clock to `now`. The first tick always has a zero delta,
    /// and an instant earlier than the previous one counts as no time passing.
    pub fn tick_at(&mut self, now: Instant) -> GameTime {
        let elapsed = match self.last_instant {
            None => Duration::ZERO,
            Some(last) => now.saturating_duration_since(last),
        };
        self.last_instant = Some(self.last_instant.map_or(now, |last| last.max(now)));

        let elapsed = match self.max_delta {
            Some(max) => elapsed.min(max),
            None => elapsed,
        };
        self.time = GameTime {
            total: self.time.total + elapsed,
            elapsed,
        };
        self.time
    }

    pub fn time(&self) -> GameTime {
        self.time
    }
}

/// Sleeps a pass until its next deadline.
///
/// A pass that falls behind by more than one period does not try to catch
/// up with a burst of ticks; the schedule restarts from the current instant.
#[derive(Debug)]
pub struct Pacer {
    period: Option<Duration>,
    next: Instant,
}

impl Pacer {
    pub fn new(hz: Option<u32>) -> Self {
        let period = hz
            .filter(|hz| *hz > 0)
            .map(|hz| Duration::from_secs_f64(1.0 / f64::from(hz)));
        Self {
            period,
            next: Instant::now(),
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn wait(&mut self) {
        let Some(period) = self.period else {
            return;
        };
        self.next += period;
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        } else if now - self.next > period {
            self.next = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_zero_delta() {
        let mut clock = Clock::default();
        let time = clock.tick();
        assert_eq!(time.elapsed, Duration::ZERO);
        assert_eq!(time.total, Duration::ZERO);
    }

    #[test]
    fn total_accumulates_deltas() {
        let start = Instant::now();
        let mut clock = Clock::default();
        clock.tick_at(start);
        clock.tick_at(start + Duration::from_millis(16));
        let time = clock.tick_at(start + Duration::from_millis(40));
        assert_eq!(time.elapsed, Duration::from_millis(24));
        assert_eq!(time.total, Duration::from_millis(40));
        assert_eq!(clock.time(), time);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let start = Instant::now();
        let mut clock = Clock::default();
        let offsets = [0u64, 10, 5, 30, 30, 2, 45];
        let mut previous_total = Duration::ZERO;
        for offset in offsets {
            let time = clock.tick_at(start + Duration::from_millis(offset));
            assert!(time.total >= previous_total);
            previous_total = time.total;
        }
        // 0 -> 10 -> (5 is in the past) -> 30 -> 30 -> (2) -> 45
        assert_eq!(previous_total, Duration::from_millis(45));
    }

    #[test]
    fn delta_is_clamped() {
        let start = Instant::now();
        let mut clock = Clock::new(Some(Duration::from_millis(250)));
        clock.tick_at(start);
        let time = clock.tick_at(start + Duration::from_secs(3));
        assert_eq!(time.elapsed, Duration::from_millis(250));
        assert_eq!(time.total, Duration::from_millis(250));
    }

    #[test]
    fn unpaced_pacer_returns_immediately() {
        let mut pacer = Pacer::new(None);
        assert_eq!(pacer.period(), None);
        let before = Instant::now();
        for _ in 0..1000 {
            pacer.wait();
        }
        assert!(before.elapsed() < Duration::from_millis(100));
        assert_eq!(Pacer::new(Some(0)).period(), None);
    }

    #[test]
    fn pacer_holds_cadence() {
        let mut pacer = Pacer::new(Some(200));
        let before = Instant::now();
        for _ in 0..4 {
            pacer.wait();
        }
        // Four periods of 5ms each
        assert!(before.elapsed() >= Duration::from_millis(19));
    }
}
