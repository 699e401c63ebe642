use super::builder::ReactorBuilder;
use super::poller::Poller;
use super::poller::common::{Event, Interest};
use super::poller::platform::RawFd;
use crate::crontab::{CrontabScheduler, Rule};
use crate::error::CrontabError;
use crate::handle::{CrontabHandle, TimerHandle};
use crate::signal::{SignalBridge, SignalHandler};
use crate::task::TaskQueue;
use crate::timer::TimerScheduler;
use crate::utils::Slots;

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::time::Duration;
use tracing::{debug, trace};

/// Callback invoked with a ready stream.
pub type StreamListener = Box<dyn FnMut(&mut Reactor, RawFd)>;

/// The reactor.
///
/// A `Reactor` owns every event source and runs them on the calling
/// thread. Each iteration of [`run`](Self::run):
/// 1. runs the deferred tasks queued before the iteration started,
/// 2. fires due timers, then due crontabs,
/// 3. blocks until a stream is ready, a signal arrives or the earliest
///    timer/crontab deadline passes,
/// 4. dispatches pending signals, then ready readers and writers.
///
/// Every callback receives `&mut Reactor` and may register or cancel
/// anything, including itself, or call [`stop`](Self::stop).
///
/// A panic in a callback unwinds out of `run`.
pub struct Reactor {
    /// Deferred tasks.
    tasks: TaskQueue<Reactor>,

    /// Interval timers.
    timers: TimerScheduler<Reactor>,

    /// Calendar rules.
    crontabs: CrontabScheduler<Reactor>,

    /// Signal listeners.
    signals: SignalHandler<Reactor>,

    /// OS signal delivery, absent when unsupported or disabled.
    bridge: Option<SignalBridge>,

    /// Read interest by stream.
    readers: Slots<RawFd, StreamListener>,

    /// Write interest by stream.
    writers: Slots<RawFd, StreamListener>,

    /// Platform readiness primitive.
    poller: Poller,

    /// Readiness collected by the last wait.
    events: Vec<Event>,

    /// Upper bound applied to every finite wait.
    max_wait: Duration,

    /// Cleared by [`stop`](Self::stop).
    running: bool,
}

impl Reactor {
    /// Creates a reactor with the default configuration.
    pub fn new() -> io::Result<Self> {
        ReactorBuilder::new().build()
    }

    /// Returns a builder for a configured reactor.
    pub fn builder() -> ReactorBuilder {
        ReactorBuilder::new()
    }

    pub(crate) fn with_config(
        signals: bool,
        event_capacity: usize,
        max_wait: Duration,
    ) -> io::Result<Self> {
        let bridge = if signals { SignalBridge::new()? } else { None };

        Ok(Self {
            tasks: TaskQueue::new(),
            timers: TimerScheduler::new(),
            crontabs: CrontabScheduler::new(),
            signals: SignalHandler::new(),
            bridge,
            readers: Slots::new(),
            writers: Slots::new(),
            poller: Poller::new(event_capacity)?,
            events: Vec::with_capacity(event_capacity),
            max_wait,
            running: false,
        })
    }

    /// Queues `task` to run at the start of the next iteration.
    ///
    /// Tasks queued by a running task wait for the following iteration.
    pub fn add_task<F>(&mut self, task: F)
    where
        F: FnOnce(&mut Reactor) + 'static,
    {
        self.tasks.add(task);
    }

    /// Watches `fd` for readability, replacing any previous read listener.
    pub fn set_read<F>(&mut self, fd: RawFd, listener: F) -> bool
    where
        F: FnMut(&mut Reactor, RawFd) + 'static,
    {
        debug!(?fd, "read interest set");
        self.readers.set(fd, Box::new(listener));
        true
    }

    /// Watches `fd` for writability, replacing any previous write listener.
    pub fn set_write<F>(&mut self, fd: RawFd, listener: F) -> bool
    where
        F: FnMut(&mut Reactor, RawFd) + 'static,
    {
        debug!(?fd, "write interest set");
        self.writers.set(fd, Box::new(listener));
        true
    }

    /// Stops watching `fd` for readability.
    pub fn del_read(&mut self, fd: RawFd) -> bool {
        if self.readers.remove(fd) {
            debug!(?fd, "read interest removed");
        }
        true
    }

    /// Stops watching `fd` for writability.
    pub fn del_write(&mut self, fd: RawFd) -> bool {
        if self.writers.remove(fd) {
            debug!(?fd, "write interest removed");
        }
        true
    }

    /// Returns `true` if signal listeners can be registered.
    pub fn signals_supported(&self) -> bool {
        self.bridge.is_some()
    }

    /// Sets the listener of `signal`, replacing any previous one.
    ///
    /// Returns `false` if signals are unsupported or disabled, or if the
    /// signal cannot be caught; nothing is registered in that case.
    pub fn set_signal<F>(&mut self, signal: i32, listener: F) -> bool
    where
        F: FnMut(&mut Reactor, i32) + 'static,
    {
        let Some(bridge) = self.bridge.as_mut() else {
            return false;
        };

        if !self.signals.has(signal) && !bridge.install(signal) {
            return false;
        }

        debug!(signal, "signal listener set");
        self.signals.set(signal, listener);
        true
    }

    /// Removes the listener of `signal` and restores its default
    /// disposition.
    ///
    /// Returns `false` if signals are unsupported or disabled.
    pub fn del_signal(&mut self, signal: i32) -> bool {
        let Some(bridge) = self.bridge.as_mut() else {
            return false;
        };

        if !self.signals.del(signal) {
            return true;
        }

        debug!(signal, "signal listener removed");
        bridge.restore(signal)
    }

    /// Registers a timer due after `interval`.
    ///
    /// A periodic timer fires every `interval` until deleted. Intervals
    /// below one microsecond are raised to one microsecond.
    pub fn add_timer<F>(&mut self, interval: Duration, listener: F, periodic: bool) -> TimerHandle
    where
        F: FnMut(&mut Reactor, TimerHandle) + 'static,
    {
        let handle = self.timers.add(interval, periodic, listener);
        debug!(%handle, ?interval, periodic, "timer added");
        handle
    }

    /// Cancels a timer. Returns `true` even if it had already finished.
    pub fn del_timer(&mut self, handle: TimerHandle) -> bool {
        if self.timers.del(handle) {
            debug!(%handle, "timer deleted");
        }
        true
    }

    /// Returns `true` if the timer is still registered.
    pub fn contains_timer(&self, handle: TimerHandle) -> bool {
        self.timers.contains(handle)
    }

    /// Registers a crontab from its five field rules.
    ///
    /// # Errors
    ///
    /// Returns [`CrontabError`] if any field is invalid; nothing is
    /// registered then.
    pub fn add_crontab<F>(
        &mut self,
        listener: F,
        minute: &str,
        hour: &str,
        day_of_month: &str,
        month: &str,
        day_of_week: &str,
    ) -> Result<CrontabHandle, CrontabError>
    where
        F: FnMut(&mut Reactor, CrontabHandle) + 'static,
    {
        let rule = Rule::parse(&[minute, hour, day_of_month, month, day_of_week])?;
        Ok(self.add_crontab_rule(rule, listener))
    }

    /// Registers a crontab from a whitespace-separated expression such
    /// as `"0 */2 * * 1-5"`. Missing trailing fields default to `*`.
    ///
    /// # Errors
    ///
    /// Returns [`CrontabError`] if the expression is invalid.
    pub fn add_crontab_expr<F>(&mut self, listener: F, expr: &str) -> Result<CrontabHandle, CrontabError>
    where
        F: FnMut(&mut Reactor, CrontabHandle) + 'static,
    {
        let rule: Rule = expr.parse()?;
        Ok(self.add_crontab_rule(rule, listener))
    }

    /// Registers an already parsed rule.
    pub fn add_crontab_rule<F>(&mut self, rule: Rule, listener: F) -> CrontabHandle
    where
        F: FnMut(&mut Reactor, CrontabHandle) + 'static,
    {
        let handle = self.crontabs.add(rule, listener);
        debug!(%handle, %rule, "crontab added");
        handle
    }

    /// Removes a crontab. Returns `true` even if it was unknown.
    pub fn del_crontab(&mut self, handle: CrontabHandle) -> bool {
        if self.crontabs.del(handle) {
            debug!(%handle, "crontab deleted");
        }
        true
    }

    /// Drops every task, timer, crontab and signal listener.
    ///
    /// Signal dispositions are restored to their defaults. Stream
    /// interest is kept. Safe to call from a callback; a registration
    /// whose listener is running is dropped once it returns.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.timers.clear();
        self.crontabs.clear();

        let signals = self.signals.signals();
        self.signals.clear();

        if let Some(bridge) = self.bridge.as_mut() {
            for signal in signals {
                bridge.restore(signal);
            }
        }

        debug!("reactor reset");
    }

    /// Returns `true` while [`run`](Self::run) is looping and no stop
    /// has been requested.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Requests the loop to stop.
    ///
    /// The current iteration finishes with a non-blocking wait so pending
    /// signals and ready streams are still dispatched, then
    /// [`run`](Self::run) returns. Calling it again has no further effect.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Runs the loop until [`stop`](Self::stop) is called or nothing is
    /// left to wait for.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait primitive fails for a reason other
    /// than signal interruption.
    pub fn run(&mut self) -> io::Result<()> {
        self.running = true;
        debug!("reactor loop started");

        while self.running {
            TaskQueue::tick(self);
            TimerScheduler::tick(self);
            CrontabScheduler::tick(self);

            let timeout = if !self.running {
                Some(Duration::ZERO)
            } else {
                match self.next_timeout() {
                    Some(timeout) => timeout,
                    None => {
                        debug!("nothing left to wait for");
                        break;
                    }
                }
            };

            self.wait(timeout)?;
        }

        self.running = false;
        debug!("reactor loop stopped");
        Ok(())
    }

    /// Computes the wait bound of this iteration.
    ///
    /// The outer `None` means there is nothing to wait for at all; an
    /// inner `None` blocks until a stream or signal wakes the loop.
    fn next_timeout(&mut self) -> Option<Option<Duration>> {
        if !self.tasks.is_empty() {
            return Some(Some(Duration::ZERO));
        }

        let timeout = match (self.timers.earliest_remaining(), self.crontabs.earliest_remaining()) {
            (Some(timer), Some(crontab)) => Some(timer.min(crontab)),
            (timer, crontab) => timer.or(crontab),
        };

        if timeout.is_none()
            && self.readers.is_empty()
            && self.writers.is_empty()
            && self.signals.is_empty()
        {
            return None;
        }

        Some(timeout.map(|t| t.min(self.max_wait)))
    }

    /// Blocks for readiness, then dispatches signals and streams.
    fn wait(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let interest = self.interest();
        let wake = self
            .bridge
            .as_ref()
            .filter(|_| !self.signals.is_empty())
            .map(SignalBridge::fd);

        trace!(?timeout, streams = interest.len(), "waiting");

        let mut events = std::mem::take(&mut self.events);
        let polled = self.poller.poll(&interest, wake, &mut events, timeout);

        // Signals are dispatched even if the wait failed.
        self.dispatch_signals();
        polled?;

        trace!(ready = events.len(), "wait returned");

        for event in events.iter().filter(|e| e.readable) {
            self.dispatch(Direction::Read, event.fd);
        }

        for event in events.iter().filter(|e| e.writable) {
            self.dispatch(Direction::Write, event.fd);
        }

        self.events = events;
        Ok(())
    }

    /// Snapshot of the current read and write interest.
    fn interest(&self) -> Vec<(RawFd, Interest)> {
        let mut interest: BTreeMap<RawFd, Interest> = BTreeMap::new();

        for fd in self.readers.keys() {
            interest.entry(fd).or_default().read = true;
        }

        for fd in self.writers.keys() {
            interest.entry(fd).or_default().write = true;
        }

        interest.into_iter().collect()
    }

    fn dispatch_signals(&mut self) {
        let pending = match &self.bridge {
            Some(bridge) => bridge.drain(),
            None => return,
        };

        for signal in pending {
            trace!(signal, "dispatching signal");
            SignalHandler::call(self, signal);
        }
    }

    /// Invokes the listener still registered for `fd`, if any.
    fn dispatch(&mut self, direction: Direction, fd: RawFd) {
        let Some(mut listener) = self.listeners(direction).take(fd) else {
            return;
        };

        listener(self, fd);
        self.listeners(direction).restore(fd, listener);
    }

    fn listeners(&mut self, direction: Direction) -> &mut Slots<RawFd, StreamListener> {
        match direction {
            Direction::Read => &mut self.readers,
            Direction::Write => &mut self.writers,
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Read,
    Write,
}

impl AsMut<TaskQueue<Reactor>> for Reactor {
    fn as_mut(&mut self) -> &mut TaskQueue<Reactor> {
        &mut self.tasks
    }
}

impl AsMut<TimerScheduler<Reactor>> for Reactor {
    fn as_mut(&mut self) -> &mut TimerScheduler<Reactor> {
        &mut self.timers
    }
}

impl AsMut<CrontabScheduler<Reactor>> for Reactor {
    fn as_mut(&mut self) -> &mut CrontabScheduler<Reactor> {
        &mut self.crontabs
    }
}

impl AsMut<SignalHandler<Reactor>> for Reactor {
    fn as_mut(&mut self) -> &mut SignalHandler<Reactor> {
        &mut self.signals
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("tasks", &self.tasks)
            .field("timers", &self.timers)
            .field("crontabs", &self.crontabs)
            .field("signals", &self.signals)
            .field("readers", &self.readers.len())
            .field("writers", &self.writers.len())
            .field("running", &self.running)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Instant;

    fn reactor() -> Reactor {
        Reactor::builder().signals(false).build().expect("reactor")
    }

    #[test]
    fn test_run_returns_when_idle() {
        let mut reactor = reactor();
        let start = Instant::now();

        reactor.run().expect("run");

        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(!reactor.is_running());
    }

    #[test]
    fn test_tasks_run_before_timers() {
        let mut reactor = reactor();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        let log = order.clone();
        reactor.add_timer(
            Duration::ZERO,
            move |_, _| log.borrow_mut().push("timer"),
            false,
        );

        let log = order.clone();
        reactor.add_task(move |_| log.borrow_mut().push("task"));

        // Let the timer become due before the first iteration.
        std::thread::sleep(Duration::from_millis(2));
        reactor.run().expect("run");

        assert_eq!(*order.borrow(), vec!["task", "timer"]);
    }

    #[test]
    fn test_task_queued_by_timer_runs_without_blocking() {
        let mut reactor = reactor();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        reactor.add_timer(
            Duration::from_millis(1),
            move |r, _| {
                let flag = flag.clone();
                r.add_task(move |_| flag.set(true));
            },
            false,
        );

        reactor.run().expect("run");
        assert!(ran.get(), "Pending task keeps the loop alive");
    }

    #[test]
    fn test_stop_is_idempotent_and_ends_loop() {
        let mut reactor = reactor();
        let ticks = Rc::new(Cell::new(0));

        let count = ticks.clone();
        reactor.add_timer(
            Duration::from_millis(1),
            move |r, _| {
                count.set(count.get() + 1);
                r.stop();
                r.stop();
            },
            true,
        );

        reactor.run().expect("run");

        assert_eq!(ticks.get(), 1);
        assert!(!reactor.is_running());
    }

    #[test]
    fn test_next_timeout_clamped_by_max_wait() {
        let mut reactor = Reactor::builder()
            .signals(false)
            .max_wait(Duration::from_millis(5))
            .build()
            .expect("reactor");

        reactor.add_timer(Duration::from_secs(3600), |_, _| {}, false);

        let timeout = reactor.next_timeout().expect("timer pending");
        assert_eq!(timeout, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_next_timeout_picks_earliest_source() {
        let mut reactor = reactor();
        assert_eq!(reactor.next_timeout(), None);

        reactor.add_timer(Duration::from_secs(3600), |_, _| {}, false);
        reactor.add_timer(Duration::from_secs(10), |_, _| {}, false);

        let timeout = reactor.next_timeout().expect("timers pending").expect("bounded");
        assert!(timeout <= Duration::from_secs(10));
        assert!(timeout > Duration::from_secs(9));

        reactor
            .add_crontab(|_, _| {}, "*", "*", "*", "*", "*")
            .expect("valid rule");
        let timeout = reactor.next_timeout().expect("pending").expect("bounded");
        assert_eq!(timeout, Duration::ZERO, "Unevaluated crontab minute is due now");
    }

    #[test]
    fn test_streams_alone_block_indefinitely() {
        let mut reactor = reactor();
        reactor.set_read(0 as RawFd, |_, _| {});

        assert_eq!(reactor.next_timeout(), Some(None));

        reactor.del_read(0 as RawFd);
        assert_eq!(reactor.next_timeout(), None);
    }

    #[test]
    fn test_signals_disabled_reports_unsupported() {
        let mut reactor = reactor();

        assert!(!reactor.signals_supported());
        assert!(!reactor.set_signal(10, |_, _| {}));
        assert!(!reactor.del_signal(10));
        assert!(reactor.signals.is_empty());
    }

    #[test]
    fn test_invalid_crontab_is_rejected_atomically() {
        let mut reactor = reactor();

        let err = reactor
            .add_crontab(|_, _| {}, "*/15", "99", "*", "*", "*")
            .unwrap_err();
        assert_eq!(err.as_label(), "crontab_range");

        assert!(reactor.add_crontab_expr(|_, _| {}, "a-b").is_err());
        assert!(reactor.crontabs.is_empty());
    }

    #[test]
    fn test_reset_drops_registrations_but_keeps_streams() {
        let mut reactor = reactor();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        reactor.add_task(move |_| flag.set(true));
        let timer = reactor.add_timer(Duration::from_millis(1), |_, _| {}, true);
        reactor
            .add_crontab_expr(|_, _| {}, "*/5")
            .expect("valid expression");
        reactor.set_read(0 as RawFd, |_, _| {});

        reactor.reset();

        assert!(reactor.tasks.is_empty());
        assert!(!reactor.contains_timer(timer));
        assert!(reactor.crontabs.is_empty());
        assert_eq!(reactor.next_timeout(), Some(None), "Read interest survives");

        reactor.del_read(0 as RawFd);
        reactor.run().expect("run");
        assert!(!ran.get(), "Dropped task never runs");
    }

    #[test]
    fn test_reset_from_timer_ends_loop() {
        let mut reactor = reactor();
        let ticks = Rc::new(Cell::new(0));

        let count = ticks.clone();
        reactor.add_timer(
            Duration::from_millis(1),
            move |r, _| {
                count.set(count.get() + 1);
                r.reset();
            },
            true,
        );
        reactor.add_timer(Duration::from_secs(3600), |_, _| {}, false);

        reactor.run().expect("run");

        assert_eq!(ticks.get(), 1);
    }
}
