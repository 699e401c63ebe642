use super::entry::{Scheduled, Timer, TimerListener, deadline_after};
use crate::handle::{Sequence, TimerHandle};

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Deadline-ordered registry of interval timers.
///
/// The schedule is an ascending list of `(deadline, handle)` pairs that
/// is only re-sorted when it has been marked stale, so repeated calls to
/// [`earliest_remaining`](Self::earliest_remaining) between mutations do
/// not pay for sorting.
///
/// Listeners may add or delete timers (including their own) while
/// [`tick`](Self::tick) is iterating; every due entry is re-validated
/// against the live registry before it fires.
pub struct TimerScheduler<C> {
    /// Live timers by handle.
    timers: HashMap<TimerHandle, Timer<C>>,

    /// Ascending schedule, valid once `stale` is cleared.
    schedule: Vec<Scheduled>,

    /// Set whenever `schedule` may be out of order or out of date.
    stale: bool,

    /// Handle source.
    sequence: Sequence,
}

impl<C> TimerScheduler<C> {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
            schedule: Vec::new(),
            stale: false,
            sequence: Sequence::new(),
        }
    }

    /// Registers a timer due `interval` from now.
    ///
    /// The interval is raised to [`MIN_INTERVAL`](super::MIN_INTERVAL)
    /// if it is shorter.
    pub fn add<F>(&mut self, interval: Duration, periodic: bool, listener: F) -> TimerHandle
    where
        F: FnMut(&mut C, TimerHandle) + 'static,
    {
        let listener: TimerListener<C> = Box::new(listener);
        let handle = self.sequence.timer();
        let timer = Timer::new(interval, periodic, Instant::now(), listener);

        self.schedule.push(Scheduled {
            deadline: timer.deadline,
            handle,
        });
        self.timers.insert(handle, timer);
        self.stale = true;

        handle
    }

    /// Cancels a timer.
    ///
    /// Returns `false` if the handle is unknown (already fired or deleted).
    pub fn del(&mut self, handle: TimerHandle) -> bool {
        if self.timers.remove(&handle).is_none() {
            return false;
        }

        // Removing preserves order, so the stale flag is left as is.
        self.schedule.retain(|s| s.handle != handle);
        true
    }

    /// Cancels every timer. Handles are not reused afterwards.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.schedule.clear();
        self.stale = false;
    }

    /// Returns `true` if the timer is still registered.
    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// The effective interval of a registered timer.
    pub fn interval(&self, handle: TimerHandle) -> Option<Duration> {
        self.timers.get(&handle).map(|t| t.interval)
    }

    /// Whether a registered timer is periodic.
    pub fn is_periodic(&self, handle: TimerHandle) -> Option<bool> {
        self.timers.get(&handle).map(|t| t.periodic)
    }

    /// Returns `true` if no timer is registered.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of registered timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Time left until the earliest deadline, or `None` without timers.
    ///
    /// Overdue timers report [`Duration::ZERO`].
    pub fn earliest_remaining(&mut self) -> Option<Duration> {
        self.sort();

        self.schedule
            .first()
            .map(|s| s.deadline.saturating_duration_since(Instant::now()))
    }

    /// Fires every timer whose deadline has passed.
    ///
    /// Periodic timers that are still registered after their listener
    /// returns are rescheduled to `now + interval`, where `now` is the
    /// instant captured at the start of the tick. One-shot timers are
    /// removed. Returns the number of listeners invoked.
    pub fn tick(ctx: &mut C) -> usize
    where
        C: AsMut<TimerScheduler<C>>,
    {
        let scheduler = ctx.as_mut();
        scheduler.sort();

        let now = Instant::now();

        // The schedule is sorted, so the due entries form a prefix.
        let due: Vec<Scheduled> = scheduler
            .schedule
            .iter()
            .take_while(|s| s.deadline <= now)
            .copied()
            .collect();

        let mut fired = 0;

        for scheduled in due {
            let Some(mut listener) = ctx.as_mut().take_due(scheduled) else {
                continue;
            };

            listener(ctx, scheduled.handle);
            fired += 1;

            ctx.as_mut().settle(scheduled.handle, listener, now);
        }

        fired
    }

    /// Takes the listener out of a due entry that is still live.
    ///
    /// Entries deleted or rescheduled by an earlier listener in the same
    /// tick, and entries whose listener is already running, yield `None`.
    fn take_due(&mut self, scheduled: Scheduled) -> Option<TimerListener<C>> {
        let timer = self.timers.get_mut(&scheduled.handle)?;

        if timer.deadline != scheduled.deadline {
            return None;
        }

        timer.listener.take()
    }

    /// Puts a timer back after its listener ran.
    fn settle(&mut self, handle: TimerHandle, listener: TimerListener<C>, now: Instant) {
        let Some(timer) = self.timers.get_mut(&handle) else {
            // Deleted by its own listener.
            return;
        };

        if timer.periodic {
            timer.deadline = deadline_after(now, timer.interval);
            timer.listener = Some(listener);
        } else {
            self.timers.remove(&handle);
        }

        self.stale = true;
    }

    /// Rebuilds and sorts the schedule if it is stale.
    fn sort(&mut self) {
        if !self.stale {
            return;
        }

        self.stale = false;
        self.schedule = self
            .timers
            .iter()
            .map(|(&handle, timer)| Scheduled {
                deadline: timer.deadline,
                handle,
            })
            .collect();
        self.schedule.sort_unstable();
    }
}

impl<C> Default for TimerScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TimerScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerScheduler")
            .field("timers", &self.timers.len())
            .field("stale", &self.stale)
            .finish()
    }
}
