use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Source of wall-clock time. The session derives elapsed time from
/// timestamps read through this seam instead of counting ticks, so timer
/// jitter never accumulates and tests can drive time by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Production clock backed by the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock for unit tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_demand() {
        let clock = ManualClock::default();
        let before = clock.now();

        clock.advance(Duration::from_secs(5));

        assert_eq!(
            clock.now().duration_since(before).unwrap(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn manual_clock_is_frozen_between_advances() {
        let clock = ManualClock::default();
        assert_eq!(clock.now(), clock.now());
    }
}
