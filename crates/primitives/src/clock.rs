use std::time::{SystemTime, UNIX_EPOCH};

use auto_impl::auto_impl;

/// Unix timestamp in milliseconds.
pub type Timestamp = u64;

/// Source of the current time.
///
/// Passed explicitly into the engine so queue ordering can be driven
/// deterministically in tests.
#[auto_impl(&, Box, Arc)]
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Timestamp)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(a > 0);
        assert!(b >= a);
    }
}
