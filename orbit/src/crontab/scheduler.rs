use super::entry::{Crontab, CrontabListener};
use super::rule::Rule;
use super::sample::TimeSample;
use crate::error::CrontabError;
use crate::handle::{CrontabHandle, Sequence};

use chrono::{Local, NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Registry of crontabs evaluated once per calendar minute.
///
/// Crontabs are kept in registration order. Rule matching is rate
/// limited: a tick inside a minute that has already been evaluated does
/// nothing, and [`earliest_remaining`](Self::earliest_remaining) reports
/// the time left until the next minute starts.
pub struct CrontabScheduler<C> {
    crontabs: BTreeMap<CrontabHandle, Crontab<C>>,

    /// Minutes since the epoch of the last evaluated sample.
    last_minute: Option<i64>,

    sequence: Sequence,
}

impl<C> CrontabScheduler<C> {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            crontabs: BTreeMap::new(),
            last_minute: None,
            sequence: Sequence::new(),
        }
    }

    /// Registers a parsed rule.
    pub fn add<F>(&mut self, rule: Rule, listener: F) -> CrontabHandle
    where
        F: FnMut(&mut C, CrontabHandle) + 'static,
    {
        let listener: CrontabListener<C> = Box::new(listener);
        let handle = self.sequence.crontab();

        self.crontabs.insert(handle, Crontab::new(rule, listener));
        handle
    }

    /// Parses the field rules and registers them.
    ///
    /// Nothing is registered when any field is invalid.
    pub fn add_rules<F>(&mut self, rules: &[&str], listener: F) -> Result<CrontabHandle, CrontabError>
    where
        F: FnMut(&mut C, CrontabHandle) + 'static,
    {
        let rule = Rule::parse(rules)?;
        Ok(self.add(rule, listener))
    }

    /// Removes a crontab. Returns `false` if the handle is unknown.
    pub fn del(&mut self, handle: CrontabHandle) -> bool {
        self.crontabs.remove(&handle).is_some()
    }

    /// Removes every crontab.
    pub fn clear(&mut self) {
        self.crontabs.clear();
        self.last_minute = None;
    }

    /// Returns `true` if the crontab is registered.
    pub fn contains(&self, handle: CrontabHandle) -> bool {
        self.crontabs.contains_key(&handle)
    }

    /// The rule of a registered crontab.
    pub fn rule(&self, handle: CrontabHandle) -> Option<Rule> {
        self.crontabs.get(&handle).map(|c| c.rule)
    }

    /// Returns `true` if no crontab is registered.
    pub fn is_empty(&self) -> bool {
        self.crontabs.is_empty()
    }

    /// Number of registered crontabs.
    pub fn len(&self) -> usize {
        self.crontabs.len()
    }

    /// Time left until the next evaluation is due, by the local clock.
    pub fn earliest_remaining(&self) -> Option<Duration> {
        self.earliest_remaining_at(Local::now().naive_local())
    }

    /// Time left until the next evaluation is due at `now`.
    ///
    /// Returns `None` without crontabs and zero if the minute containing
    /// `now` has not been evaluated yet.
    pub fn earliest_remaining_at(&self, now: NaiveDateTime) -> Option<Duration> {
        if self.crontabs.is_empty() {
            return None;
        }

        if self.last_minute != Some(minute_of(&now)) {
            return Some(Duration::ZERO);
        }

        // Leap seconds report nanoseconds past 1e9.
        let into_minute = Duration::new(
            u64::from(now.second()),
            now.nanosecond().min(999_999_999),
        );

        Some(Duration::from_secs(60).saturating_sub(into_minute))
    }

    /// Evaluates every crontab against the local clock.
    pub fn tick(ctx: &mut C) -> usize
    where
        C: AsMut<CrontabScheduler<C>>,
    {
        Self::tick_at(ctx, Local::now().naive_local())
    }

    /// Evaluates every crontab against `now`, at most once per minute.
    ///
    /// Returns the number of listeners invoked.
    pub fn tick_at(ctx: &mut C, now: NaiveDateTime) -> usize
    where
        C: AsMut<CrontabScheduler<C>>,
    {
        let minute = minute_of(&now);
        let scheduler = ctx.as_mut();

        if scheduler.last_minute == Some(minute) {
            return 0;
        }
        scheduler.last_minute = Some(minute);

        Self::tick_sample(ctx, TimeSample::from_datetime(&now))
    }

    /// Evaluates every crontab against `sample` without rate limiting.
    ///
    /// A crontab still never fires twice for the same sample.
    pub fn tick_sample(ctx: &mut C, sample: TimeSample) -> usize
    where
        C: AsMut<CrontabScheduler<C>>,
    {
        let handles: Vec<CrontabHandle> = ctx.as_mut().crontabs.keys().copied().collect();
        let mut fired = 0;

        for handle in handles {
            let Some(mut listener) = ctx.as_mut().begin(handle, &sample) else {
                continue;
            };

            listener(ctx, handle);
            fired += 1;

            if let Some(crontab) = ctx.as_mut().crontabs.get_mut(&handle) {
                crontab.firing = false;
                crontab.last_fired = Some(sample);
                crontab.listener = Some(listener);
            }
        }

        fired
    }

    /// Marks a due crontab as firing and takes its listener.
    fn begin(&mut self, handle: CrontabHandle, sample: &TimeSample) -> Option<CrontabListener<C>> {
        let crontab = self.crontabs.get_mut(&handle)?;

        if !crontab.is_due(sample) {
            return None;
        }

        let listener = crontab.listener.take()?;
        crontab.firing = true;
        Some(listener)
    }
}

/// Whole minutes since the epoch of a local naive time.
fn minute_of(now: &NaiveDateTime) -> i64 {
    now.and_utc().timestamp().div_euclid(60)
}

impl<C> Default for CrontabScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for CrontabScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrontabScheduler")
            .field("crontabs", &self.crontabs.len())
            .field("last_minute", &self.last_minute)
            .finish()
    }
}
