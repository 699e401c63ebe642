//! Self-pipe bridge between POSIX signal delivery and the reactor.
//!
//! The installed handler only performs async-signal-safe work: for every
//! live bridge it raises the pending bit of the delivered signal and
//! writes one byte to that bridge's non-blocking pipe. While a listener
//! is set, the read end of the pipe takes part in every blocking wait, so
//! delivery wakes the reactor, which then drains the pipe and dispatches
//! the pending signals synchronously.
//!
//! Signal dispositions are process-wide. Each bridge occupies one slot of
//! a fixed target table, and a disposition is reference counted across
//! bridges: the handler is installed by the first bridge that listens on
//! a signal and `SIG_DFL` is restored when the last one stops.

use crate::reactor::poller::platform::{RawFd, sys_close, sys_pipe, sys_read};

use libc::c_int;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::mem;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Signal numbers at or above this bound are rejected.
const MAX_SIGNAL: usize = 128;

/// Number of bridges that may be alive at once.
const MAX_BRIDGES: usize = 64;

/// Wake target of one bridge.
struct Target {
    /// Write end of the bridge's pipe, or `-1` for a free slot.
    fd: AtomicI32,

    /// Pending bit per signal number.
    pending: [AtomicU64; MAX_SIGNAL / 64],
}

impl Target {
    const fn new() -> Self {
        Self {
            fd: AtomicI32::new(-1),
            pending: [const { AtomicU64::new(0) }; MAX_SIGNAL / 64],
        }
    }

    fn mark(&self, signal: usize) {
        self.pending[signal / 64].fetch_or(1 << (signal % 64), Ordering::AcqRel);
    }

    fn unmark(&self, signal: usize) {
        self.pending[signal / 64].fetch_and(!(1 << (signal % 64)), Ordering::AcqRel);
    }

    /// Takes every pending bit.
    fn take(&self) -> [u64; MAX_SIGNAL / 64] {
        let mut taken = [0; MAX_SIGNAL / 64];
        for (word, bits) in taken.iter_mut().zip(&self.pending) {
            *word = bits.swap(0, Ordering::AcqRel);
        }
        taken
    }
}

static TARGETS: [Target; MAX_BRIDGES] = [const { Target::new() }; MAX_BRIDGES];

/// Number of bridges listening on each signal.
static INSTALLS: Mutex<BTreeMap<i32, usize>> = Mutex::new(BTreeMap::new());

/// The installed `sigaction` handler.
extern "C" fn on_signal(signal: c_int) {
    let saved = errno::get();

    if signal > 0 && (signal as usize) < MAX_SIGNAL {
        for target in &TARGETS {
            let fd = target.fd.load(Ordering::Acquire);
            if fd < 0 {
                continue;
            }

            target.mark(signal as usize);

            let byte = 1u8;
            // A full pipe already guarantees a wakeup.
            unsafe {
                libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
            }
        }
    }

    errno::set(saved);
}

/// Owns one notification pipe and the signals this bridge listens on.
pub(crate) struct SignalBridge {
    /// Index into the target table.
    slot: usize,

    /// Read end, polled by the reactor.
    read_fd: RawFd,

    /// Write end, used by the handler.
    write_fd: RawFd,

    /// Signals this bridge holds a disposition reference for.
    installed: BTreeSet<i32>,
}

impl SignalBridge {
    /// Creates the pipe and claims a wake target.
    ///
    /// Returns `None` when every target is taken; signals are then
    /// unsupported for the new reactor.
    pub(crate) fn new() -> io::Result<Option<Self>> {
        let (read_fd, write_fd) = sys_pipe()?;

        let claimed = TARGETS.iter().position(|target| {
            target
                .fd
                .compare_exchange(-1, write_fd, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        });

        let Some(slot) = claimed else {
            warn!(limit = MAX_BRIDGES, "no free signal target, signals disabled");
            sys_close(read_fd);
            sys_close(write_fd);
            return Ok(None);
        };

        // Bits left by a previous owner of the slot.
        TARGETS[slot].take();

        Ok(Some(Self {
            slot,
            read_fd,
            write_fd,
            installed: BTreeSet::new(),
        }))
    }

    /// Descriptor that becomes readable when a signal is delivered.
    pub(crate) fn fd(&self) -> RawFd {
        self.read_fd
    }

    /// Routes `signal` to the bridge.
    ///
    /// Returns `false` for out-of-range or uncatchable signals.
    pub(crate) fn install(&mut self, signal: i32) -> bool {
        if !is_catchable(signal) {
            warn!(signal, "signal cannot be caught");
            return false;
        }

        if self.installed.contains(&signal) {
            return true;
        }

        let mut installs = INSTALLS.lock().unwrap_or_else(PoisonError::into_inner);
        let count = installs.entry(signal).or_insert(0);

        if *count == 0 {
            let handler = on_signal as extern "C" fn(c_int) as libc::sighandler_t;
            if let Err(err) = set_disposition(signal, handler) {
                warn!(signal, error = %err, "failed to install signal handler");
                installs.remove(&signal);
                return false;
            }
            debug!(signal, "signal handler installed");
        }

        *count += 1;
        self.installed.insert(signal);
        true
    }

    /// Releases this bridge's reference on `signal`, restoring the
    /// default disposition once no bridge listens on it.
    pub(crate) fn restore(&mut self, signal: i32) -> bool {
        if !self.installed.remove(&signal) {
            return true;
        }

        TARGETS[self.slot].unmark(signal as usize);

        let mut installs = INSTALLS.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(count) = installs.get_mut(&signal) else {
            return true;
        };

        *count -= 1;
        if *count > 0 {
            return true;
        }
        installs.remove(&signal);

        match set_disposition(signal, libc::SIG_DFL) {
            Ok(()) => {
                debug!(signal, "signal handler restored");
                true
            }
            Err(err) => {
                warn!(signal, error = %err, "failed to restore signal disposition");
                false
            }
        }
    }

    /// Empties the pipe and returns the signals delivered since the last
    /// drain, ascending.
    pub(crate) fn drain(&self) -> Vec<i32> {
        let mut buffer = [0u8; 64];
        while sys_read(self.read_fd, &mut buffer) > 0 {}

        let pending = TARGETS[self.slot].take();

        self.installed
            .iter()
            .copied()
            .filter(|&signal| {
                let signal = signal as usize;
                pending[signal / 64] & (1 << (signal % 64)) != 0
            })
            .collect()
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        let installed: Vec<i32> = self.installed.iter().copied().collect();
        for signal in installed {
            self.restore(signal);
        }

        TARGETS[self.slot].fd.store(-1, Ordering::Release);

        sys_close(self.read_fd);
        sys_close(self.write_fd);
    }
}

fn is_catchable(signal: i32) -> bool {
    signal > 0
        && (signal as usize) < MAX_SIGNAL
        && signal != libc::SIGKILL
        && signal != libc::SIGSTOP
}

fn set_disposition(signal: i32, handler: libc::sighandler_t) -> io::Result<()> {
    let mut action: libc::sigaction = unsafe { mem::zeroed() };
    action.sa_sigaction = handler;
    action.sa_flags = 0;

    let rc = unsafe {
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signal, &action, std::ptr::null_mut())
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// `errno` preservation across the handler.
///
/// Targets without a known accessor skip the preservation, so a handler
/// running there may overwrite `errno` of the interrupted code.
mod errno {
    use libc::c_int;

    #[cfg(target_os = "linux")]
    fn location() -> *mut c_int {
        unsafe { libc::__errno_location() }
    }

    #[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
    fn location() -> *mut c_int {
        unsafe { libc::__errno() }
    }

    #[cfg(any(target_vendor = "apple", target_os = "freebsd"))]
    fn location() -> *mut c_int {
        unsafe { libc::__error() }
    }

    #[cfg(any(target_os = "solaris", target_os = "illumos"))]
    fn location() -> *mut c_int {
        unsafe { libc::___errno() }
    }

    #[cfg(target_os = "haiku")]
    fn location() -> *mut c_int {
        unsafe { libc::_errnop() }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "netbsd",
        target_os = "openbsd",
        target_vendor = "apple",
        target_os = "freebsd",
        target_os = "solaris",
        target_os = "illumos",
        target_os = "haiku"
    )))]
    fn location() -> *mut c_int {
        std::ptr::null_mut()
    }

    pub(super) fn get() -> c_int {
        let ptr = location();
        if ptr.is_null() { 0 } else { unsafe { *ptr } }
    }

    pub(super) fn set(value: c_int) {
        let ptr = location();
        if !ptr.is_null() {
            unsafe { *ptr = value };
        }
    }
}
