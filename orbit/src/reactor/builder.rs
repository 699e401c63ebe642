use super::core::Reactor;

use std::io;
use std::time::Duration;

/// Default readiness buffer size.
const EVENT_CAPACITY: usize = 64;

/// Default upper bound of a single finite wait: the largest timeout the
/// wait primitives accept.
const MAX_WAIT: Duration = Duration::from_millis(i32::MAX as u64);

/// Builder for configuring and creating a reactor.
///
/// # Examples
///
/// ```rust
/// use orbit::Reactor;
/// use std::time::Duration;
///
/// let reactor = Reactor::builder()
///     .signals(false)
///     .max_wait(Duration::from_secs(1))
///     .build()
///     .unwrap();
///
/// assert!(!reactor.signals_supported());
/// ```
pub struct ReactorBuilder {
    /// Whether OS signal delivery is set up.
    signals: bool,

    /// Initial readiness buffer size.
    event_capacity: usize,

    /// Upper bound of a single finite wait.
    max_wait: Duration,
}

impl ReactorBuilder {
    /// Creates a builder with default configuration.
    ///
    /// Signals are enabled where the platform supports them.
    pub fn new() -> Self {
        Self {
            signals: true,
            event_capacity: EVENT_CAPACITY,
            max_wait: MAX_WAIT,
        }
    }

    /// Enables or disables OS signal delivery.
    ///
    /// With signals disabled, [`Reactor::set_signal`] always fails and no
    /// process-wide handler is ever installed.
    pub fn signals(mut self, enabled: bool) -> Self {
        self.signals = enabled;
        self
    }

    /// Sets the initial capacity of the readiness buffers.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn event_capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "event_capacity must be > 0");

        self.event_capacity = n;
        self
    }

    /// Caps every finite wait at `max_wait`.
    ///
    /// Waits with nothing but streams or signals to wait for stay
    /// unbounded.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Builds the reactor.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal pipe or the wait primitive cannot
    /// be created.
    pub fn build(self) -> io::Result<Reactor> {
        Reactor::with_config(self.signals, self.event_capacity, self.max_wait)
    }
}

impl Default for ReactorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
