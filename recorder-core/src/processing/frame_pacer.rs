use std::time::{Duration, Instant};

use crate::traits::clock::Clock;

/// Fixed-interval deadline scheduler for the video loop.
///
/// Deadlines advance by exactly one interval per frame. When the loop falls
/// more than one interval behind, the frame is counted late and the schedule
/// is re-anchored instead of bursting to catch up. The slots missed during
/// the stall are never encoded, so after a stall the video is shorter than
/// the wall time it covers.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    next_deadline: Option<Instant>,
    late_frames: u64,
}

impl FramePacer {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / frame_rate),
            next_deadline: None,
            late_frames: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next frame is due.
    pub fn wait(&mut self, clock: &dyn Clock) {
        let now = clock.now();
        let deadline = *self.next_deadline.get_or_insert(now);

        if now < deadline {
            clock.sleep(deadline - now);
            self.next_deadline = Some(deadline + self.interval);
        } else if now > deadline + self.interval {
            self.late_frames += 1;
            self.next_deadline = Some(now + self.interval);
        } else {
            self.next_deadline = Some(deadline + self.interval);
        }
    }

    /// Forget the schedule, e.g. after a pause.
    pub fn reset(&mut self) {
        self.next_deadline = None;
    }

    pub fn late_frames(&self) -> u64 {
        self.late_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct ManualClock {
        now: Mutex<Instant>,
        slept: Mutex<Vec<Duration>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
                slept: Mutex::new(Vec::new()),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock()
        }

        fn sleep(&self, duration: Duration) {
            self.slept.lock().push(duration);
            self.advance(duration);
        }
    }

    #[test]
    fn first_frame_is_immediate() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(20.0);
        pacer.wait(&clock);
        assert!(clock.slept.lock().is_empty());
    }

    #[test]
    fn sleeps_until_next_deadline() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(20.0);
        pacer.wait(&clock);
        clock.advance(Duration::from_millis(10));
        pacer.wait(&clock);
        assert_eq!(clock.slept.lock().as_slice(), &[Duration::from_millis(40)]);
        assert_eq!(pacer.late_frames(), 0);
    }

    #[test]
    fn late_frame_reanchors_schedule() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(10.0);
        pacer.wait(&clock);
        clock.advance(Duration::from_millis(350));
        pacer.wait(&clock);
        assert_eq!(pacer.late_frames(), 1);

        // Next deadline is one interval after the late frame, not a burst.
        pacer.wait(&clock);
        assert_eq!(clock.slept.lock().as_slice(), &[Duration::from_millis(100)]);
    }

    #[test]
    fn stall_drops_missed_slots() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut pacer = FramePacer::new(10.0);
        pacer.wait(&clock);
        clock.advance(Duration::from_millis(350));
        pacer.wait(&clock);
        for _ in 0..6 {
            pacer.wait(&clock);
        }

        // 8 frames at 10 fps encode 0.8 s but took 0.95 s of wall time.
        assert_eq!(clock.now() - start, Duration::from_millis(950));
        assert_eq!(pacer.late_frames(), 1);
    }

    #[test]
    fn reset_starts_fresh() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(10.0);
        pacer.wait(&clock);
        clock.advance(Duration::from_secs(5));
        pacer.reset();
        pacer.wait(&clock);
        assert_eq!(pacer.late_frames(), 0);
        assert!(clock.slept.lock().is_empty());
    }
}
