use crate::utils::Slots;

use std::fmt;

/// Callback invoked with the delivered signal number.
pub type SignalListener<C> = Box<dyn FnMut(&mut C, i32)>;

/// Registry holding at most one listener per signal number.
pub struct SignalHandler<C> {
    listeners: Slots<i32, SignalListener<C>>,
}

impl<C> SignalHandler<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Slots::new(),
        }
    }

    /// Sets the listener for `signal`, replacing any existing one.
    pub fn set<F>(&mut self, signal: i32, listener: F)
    where
        F: FnMut(&mut C, i32) + 'static,
    {
        self.listeners.set(signal, Box::new(listener));
    }

    /// Removes the listener for `signal`. Returns `false` if there was none.
    pub fn del(&mut self, signal: i32) -> bool {
        self.listeners.remove(signal)
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Returns `true` if a listener is set for `signal`.
    pub fn has(&self, signal: i32) -> bool {
        self.listeners.contains(signal)
    }

    /// Returns `true` if no listener is set.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of signals with a listener.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Registered signal numbers, ascending.
    pub fn signals(&self) -> Vec<i32> {
        self.listeners.keys().collect()
    }

    /// Invokes the listener of `signal`.
    ///
    /// A signal without a listener is dropped. Returns `true` if a
    /// listener ran.
    pub fn call(ctx: &mut C, signal: i32) -> bool
    where
        C: AsMut<SignalHandler<C>>,
    {
        let Some(mut listener) = ctx.as_mut().listeners.take(signal) else {
            return false;
        };

        listener(ctx, signal);
        ctx.as_mut().listeners.restore(signal, listener);
        true
    }
}

impl<C> Default for SignalHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for SignalHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalHandler")
            .field("signals", &self.signals())
            .finish()
    }
}
