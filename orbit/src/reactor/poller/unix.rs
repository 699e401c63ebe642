//! Unix system call wrappers used by the poller and the signal bridge.

use libc::{F_GETFD, F_GETFL, F_SETFD, F_SETFL, FD_CLOEXEC, O_NONBLOCK, c_int, close, fcntl, read};
use std::io;

pub use std::os::fd::RawFd;

/// Reads from a file descriptor into the given buffer.
///
/// Returns the number of bytes read, or a negative value on error.
/// The file descriptor **must** be non-blocking.
pub(crate) fn sys_read(fd: RawFd, buffer: &mut [u8]) -> isize {
    unsafe { read(fd, buffer.as_mut_ptr() as *mut _, buffer.len()) }
}

/// Closes a file descriptor.
pub(crate) fn sys_close(fd: RawFd) {
    unsafe { close(fd) };
}

/// Sets a file descriptor to non-blocking mode.
pub(crate) fn sys_set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Marks a file descriptor close-on-exec.
pub(crate) fn sys_set_cloexec(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFD) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { fcntl(fd, F_SETFD, flags | FD_CLOEXEC) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Creates a non-blocking, close-on-exec pipe.
///
/// Returns `(read_end, write_end)`.
pub(crate) fn sys_pipe() -> io::Result<(RawFd, RawFd)> {
    let mut fds: [c_int; 2] = [-1, -1];

    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    for fd in fds {
        if let Err(e) = sys_set_nonblocking(fd).and_then(|_| sys_set_cloexec(fd)) {
            sys_close(fds[0]);
            sys_close(fds[1]);
            return Err(e);
        }
    }

    Ok((fds[0], fds[1]))
}
