use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix time in whole seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
            })
    }
}

/// Frozen clock, for deterministic expiry checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2023() {
        assert!(SystemClock.now_unix() > 1_672_531_200);
    }

    #[test]
    fn fixed_clock_does_not_move() {
        let clock = FixedClock(42);
        assert_eq!(clock.now_unix(), 42);
        assert_eq!(clock.now_unix(), 42);
    }
}
