use super::rule::Rule;
use super::sample::TimeSample;
use crate::handle::CrontabHandle;

/// Callback invoked when a crontab rule matches.
pub type CrontabListener<C> = Box<dyn FnMut(&mut C, CrontabHandle)>;

/// A registered crontab.
pub(crate) struct Crontab<C> {
    pub(crate) rule: Rule,

    /// Taken out while the listener runs.
    pub(crate) listener: Option<CrontabListener<C>>,

    /// The sample of the last firing.
    pub(crate) last_fired: Option<TimeSample>,

    /// Set while the listener runs.
    pub(crate) firing: bool,
}

impl<C> Crontab<C> {
    pub(crate) fn new(rule: Rule, listener: CrontabListener<C>) -> Self {
        Self {
            rule,
            listener: Some(listener),
            last_fired: None,
            firing: false,
        }
    }

    /// Returns `true` if the crontab should fire for `sample`.
    ///
    /// A crontab never fires while its listener is running, nor twice for
    /// the same sample.
    pub(crate) fn is_due(&self, sample: &TimeSample) -> bool {
        !self.firing && self.last_fired.as_ref() != Some(sample) && self.rule.matches(sample)
    }
}
