//! Opaque registration handles.
//!
//! Handles are allocated from a monotonically increasing counter at
//! registration time and are never reused, so a stale handle can only
//! ever miss; it can never address a newer registration.

use std::fmt;

/// Handle to a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

/// Handle to a registered crontab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CrontabHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

impl fmt::Display for CrontabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crontab#{}", self.0)
    }
}

/// Monotonic id source shared by the handle types.
#[derive(Debug, Default)]
pub(crate) struct Sequence {
    next: u64,
}

impl Sequence {
    pub(crate) fn new() -> Self {
        Self { next: 0 }
    }

    fn advance(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    pub(crate) fn timer(&mut self) -> TimerHandle {
        TimerHandle(self.advance())
    }

    pub(crate) fn crontab(&mut self) -> CrontabHandle {
        CrontabHandle(self.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_monotonic_and_unique() {
        let mut seq = Sequence::new();
        let a = seq.timer();
        let b = seq.timer();
        let c = seq.crontab();

        assert!(a < b, "later handles must order after earlier ones");
        assert_ne!(a, b);
        assert_eq!(c.to_string(), "crontab#3");
    }
}
