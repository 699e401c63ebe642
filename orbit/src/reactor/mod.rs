//! The event loop.
//!
//! [`Reactor`] ties the task queue, the timer and crontab schedulers, the
//! signal handler and stream readiness together and drives them from a
//! single thread.
//!
//! Readiness is collected by a level-triggered poller: `poll(2)` on Unix
//! and `WSAPoll` on Windows, where only sockets can be watched.

mod builder;
mod core;

pub(crate) mod poller;

pub use builder::ReactorBuilder;
pub use core::{Reactor, StreamListener};
pub use poller::platform::RawFd;
