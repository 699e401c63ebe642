//! Windows system call wrappers used by the poller.
//!
//! Streams are WinSock sockets. Winsock is initialized lazily, once per
//! process, before the first wait.

use std::mem;
use std::sync::Once;

use windows_sys::Win32::Networking::WinSock::{WSADATA, WSAStartup};

/// Raw stream handle on Windows: a WinSock `SOCKET`.
pub type RawFd = std::os::windows::io::RawSocket;

/// Creates a MAKEWORD value for Winsock version.
#[inline]
const fn makeword(low: u8, high: u8) -> u16 {
    ((high as u16) << 8) | (low as u16)
}

/// Winsock initialization guard.
static WINSOCK_INIT: Once = Once::new();

/// Initialize Winsock if not already initialized.
pub(crate) fn ensure_winsock() {
    WINSOCK_INIT.call_once(|| unsafe {
        let mut data: WSADATA = mem::zeroed();
        let rc = WSAStartup(makeword(2, 2), &mut data as *mut _);
        assert_eq!(rc, 0, "WSAStartup failed: {}", rc);
    });
}
