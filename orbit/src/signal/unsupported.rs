//! Signal bridge for platforms without POSIX signals.
//!
//! The bridge is never created, so the reactor reports signals as
//! unsupported.

use crate::reactor::RawFd;

use std::io;

pub(crate) enum SignalBridge {}

impl SignalBridge {
    pub(crate) fn new() -> io::Result<Option<Self>> {
        Ok(None)
    }

    pub(crate) fn fd(&self) -> RawFd {
        match *self {}
    }

    pub(crate) fn install(&mut self, _signal: i32) -> bool {
        match *self {}
    }

    pub(crate) fn restore(&mut self, _signal: i32) -> bool {
        match *self {}
    }

    pub(crate) fn drain(&self) -> Vec<i32> {
        match *self {}
    }
}
