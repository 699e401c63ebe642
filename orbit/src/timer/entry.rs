use crate::handle::TimerHandle;

use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Smallest interval a timer may be registered with.
///
/// Shorter (including zero) intervals are raised to this value so a
/// periodic timer can never make the loop spin without advancing time.
pub const MIN_INTERVAL: Duration = Duration::from_micros(1);

/// Callback invoked when a timer fires.
pub type TimerListener<C> = Box<dyn FnMut(&mut C, TimerHandle)>;

/// A registered timer.
pub(crate) struct Timer<C> {
    /// Delay between registration (or the previous firing) and the deadline.
    pub(crate) interval: Duration,

    /// Whether the timer is rescheduled after firing.
    pub(crate) periodic: bool,

    /// The last computed `now + interval`.
    pub(crate) deadline: Instant,

    /// Taken out while the listener runs.
    pub(crate) listener: Option<TimerListener<C>>,
}

impl<C> Timer<C> {
    pub(crate) fn new(
        interval: Duration,
        periodic: bool,
        now: Instant,
        listener: TimerListener<C>,
    ) -> Self {
        let interval = interval.max(MIN_INTERVAL);

        Self {
            interval,
            periodic,
            deadline: deadline_after(now, interval),
            listener: Some(listener),
        }
    }
}

/// Upper bound for deadlines that would overflow [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// `now + interval`, saturated at [`FAR_FUTURE`] from `now`.
pub(crate) fn deadline_after(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// An entry of the ordered schedule.
///
/// The deadline is a copy taken when the schedule was built. If it no
/// longer matches the live timer the entry is stale and must be skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Scheduled {
    pub(crate) deadline: Instant,
    pub(crate) handle: TimerHandle,
}

impl Ord for Scheduled {
    /// Orders by deadline, then by registration order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.handle.cmp(&other.handle))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
