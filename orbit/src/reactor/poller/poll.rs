//! `poll(2)`-based poller.
//!
//! The reactor hands over a fresh snapshot of its read and write
//! interest on every wait, which `poll(2)` consumes directly: there is no
//! kernel-side registration to keep in sync with listeners that come and
//! go between iterations.
//!
//! With an empty interest set `poll(2)` degrades to a bounded sleep that
//! signals can still interrupt.

use super::common::{Event, Interest, timeout_millis};
use super::platform::RawFd;

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, nfds_t, pollfd};
use std::io;
use std::time::Duration;

/// Unix poller.
pub(crate) struct PollPoller {
    /// Reusable `pollfd` buffer.
    fds: Vec<pollfd>,
}

impl PollPoller {
    /// Creates a poller with room for `capacity` descriptors.
    pub(crate) fn new(capacity: usize) -> io::Result<Self> {
        Ok(Self {
            fds: Vec::with_capacity(capacity),
        })
    }

    /// Waits for readiness of the given descriptors.
    ///
    /// Blocks until:
    /// - at least one descriptor becomes ready,
    /// - `wake` becomes readable,
    /// - a signal interrupts the wait,
    /// - or the optional timeout expires.
    ///
    /// `events` is cleared and filled with the ready descriptors. The
    /// `wake` descriptor is never reported; draining it is up to its owner.
    /// An interrupted wait is not an error and reports nothing.
    pub(crate) fn poll(
        &mut self,
        interest: &[(RawFd, Interest)],
        wake: Option<RawFd>,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        events.clear();
        self.fds.clear();

        for &(fd, interest) in interest {
            let mut flags = 0;

            if interest.read {
                flags |= POLLIN;
            }
            if interest.write {
                flags |= POLLOUT;
            }

            self.fds.push(pollfd {
                fd,
                events: flags,
                revents: 0,
            });
        }

        if let Some(fd) = wake {
            self.fds.push(pollfd {
                fd,
                events: POLLIN,
                revents: 0,
            });
        }

        let n = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as nfds_t,
                timeout_millis(timeout),
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        if n == 0 {
            return Ok(());
        }

        let failed = POLLERR | POLLHUP | POLLNVAL;

        // The wake descriptor, if any, is last and is skipped here.
        for (pfd, &(fd, interest)) in self.fds.iter().zip(interest) {
            let re = pfd.revents;
            if re == 0 {
                continue;
            }

            let readable = interest.read && re & (POLLIN | failed) != 0;
            let writable = interest.write && re & (POLLOUT | failed) != 0;

            if readable || writable {
                events.push(Event {
                    fd,
                    readable,
                    writable,
                });
            }
        }

        Ok(())
    }
}
