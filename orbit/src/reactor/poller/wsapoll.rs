//! Windows `WSAPoll`-based poller.
//!
//! This mirrors the Unix `poll(2)` backend over WinSock sockets. There is
//! no signal bridge on Windows, so no wake descriptor is ever passed in.
//! `WSAPoll` rejects an empty descriptor set, so a wait without sockets
//! sleeps for the timeout instead.

use super::common::{Event, Interest, timeout_millis};
use super::platform::RawFd;
use super::windows::ensure_winsock;

use std::io;
use std::thread;
use std::time::Duration;

use windows_sys::Win32::Networking::WinSock::{
    POLLERR, POLLHUP, POLLNVAL, POLLRDNORM, POLLWRNORM, SOCKET, SOCKET_ERROR, WSAPOLLFD, WSAPoll,
};

/// Windows poller based on `WSAPoll`.
pub(crate) struct WsaPoller {
    /// Reusable `WSAPOLLFD` buffer.
    fds: Vec<WSAPOLLFD>,
}

impl WsaPoller {
    /// Creates a poller with room for `capacity` sockets.
    pub(crate) fn new(capacity: usize) -> io::Result<Self> {
        ensure_winsock();

        Ok(Self {
            fds: Vec::with_capacity(capacity),
        })
    }

    /// Waits for readiness of the given sockets.
    ///
    /// `wake` is accepted for parity with the Unix backend and ignored.
    pub(crate) fn poll(
        &mut self,
        interest: &[(RawFd, Interest)],
        _wake: Option<RawFd>,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        events.clear();

        if interest.is_empty() {
            if let Some(timeout) = timeout {
                thread::sleep(timeout);
            }
            return Ok(());
        }

        self.fds.clear();

        for &(fd, interest) in interest {
            let mut ev = 0;
            if interest.read {
                ev |= POLLRDNORM;
            }
            if interest.write {
                ev |= POLLWRNORM;
            }

            self.fds.push(WSAPOLLFD {
                fd: fd as SOCKET,
                events: ev,
                revents: 0,
            });
        }

        let rc = unsafe { WSAPoll(self.fds.as_mut_ptr(), self.fds.len() as u32, timeout_millis(timeout)) };
        if rc == SOCKET_ERROR {
            return Err(io::Error::last_os_error());
        }

        let failed = (POLLERR | POLLHUP | POLLNVAL) as i32;

        for (pfd, &(fd, interest)) in self.fds.iter().zip(interest) {
            let re = pfd.revents as i32;
            if re == 0 {
                continue;
            }

            let readable = interest.read && (re & (POLLRDNORM as i32 | failed)) != 0;
            let writable = interest.write && (re & (POLLWRNORM as i32 | failed)) != 0;

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
