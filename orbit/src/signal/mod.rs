//! OS signal support.
//!
//! [`SignalHandler`] is the per-signal listener registry. The platform
//! bridge turns asynchronous signal delivery into a readable descriptor
//! and a set of pending flags, drained by the reactor right after every
//! blocking wait.
//!
//! On platforms without POSIX signals the bridge is absent and every
//! signal operation of the reactor reports `false`.

mod handler;

#[cfg(unix)]
mod unix;

#[cfg(not(unix))]
mod unsupported;

pub use handler::{SignalHandler, SignalListener};

#[cfg(unix)]
pub(crate) use unix::SignalBridge;

#[cfg(not(unix))]
pub(crate) use unsupported::SignalBridge;
