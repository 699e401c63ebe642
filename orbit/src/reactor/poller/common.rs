use super::platform::RawFd;

use std::time::Duration;

/// Readiness a descriptor is watched for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Interest {
    pub(crate) read: bool,
    pub(crate) write: bool,
}

/// Readiness reported for one watched descriptor.
///
/// Error and hang-up conditions are reported as readiness in every
/// watched direction so the listener gets to observe them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Event {
    pub(crate) fd: RawFd,
    pub(crate) readable: bool,
    pub(crate) writable: bool,
}

/// Largest timeout, in milliseconds, accepted by the wait primitives.
pub(crate) const MAX_TIMEOUT_MS: i32 = i32::MAX;

/// Converts a wait bound to poll milliseconds.
///
/// `None` blocks indefinitely (`-1`). Sub-millisecond remainders round
/// up so the wait never ends before the deadline it was computed for;
/// values beyond [`MAX_TIMEOUT_MS`] saturate.
pub(crate) fn timeout_millis(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(t) => t.as_nanos().div_ceil(1_000_000).min(MAX_TIMEOUT_MS as u128) as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_millis_rounds_up_and_saturates() {
        assert_eq!(timeout_millis(None), -1);
        assert_eq!(timeout_millis(Some(Duration::ZERO)), 0);
        assert_eq!(timeout_millis(Some(Duration::from_micros(1))), 1);
        assert_eq!(timeout_millis(Some(Duration::from_millis(50))), 50);
        assert_eq!(timeout_millis(Some(Duration::from_micros(50_001))), 51);
        assert_eq!(timeout_millis(Some(Duration::MAX)), i32::MAX);
        assert_eq!(
            timeout_millis(Some(Duration::from_millis(i32::MAX as u64 + 1))),
            i32::MAX
        );
    }
}
