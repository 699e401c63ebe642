//! Platform-specific readiness poller.
//!
//! This module provides a unified interface over the platform's
//! readiness primitive. The poller is used by the reactor to:
//! - wait for stream readiness,
//! - wake up when a signal is delivered,
//! - bound the wait by the next timer or crontab deadline.
//!
//! The concrete implementation is selected at compile time
//! depending on the target operating system.

pub(crate) mod common;

#[cfg(unix)]
mod poll;

#[cfg(windows)]
mod wsapoll;

#[cfg(unix)]
pub(crate) type Poller = poll::PollPoller;

#[cfg(windows)]
pub(crate) type Poller = wsapoll::WsaPoller;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(windows)]
pub(crate) use windows as platform;
