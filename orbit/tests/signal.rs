#![cfg(unix)]

//! Signal dispositions are process-wide, so every test here listens on a
//! signal no other test in this binary uses.

mod common;

use orbit::Reactor;
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::rc::Rc;
use std::time::{Duration, Instant};

fn signal_reactor() -> Reactor {
    common::init_tracing();
    Reactor::new().expect("Failed to build reactor")
}

fn disposition(signal: i32) -> libc::sighandler_t {
    let mut current: libc::sigaction = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::sigaction(signal, std::ptr::null(), &mut current) };
    assert_eq!(rc, 0, "Failed to query signal disposition");
    current.sa_sigaction
}

#[test]
fn test_signal_delivered_to_listener() {
    let mut reactor = signal_reactor();
    assert!(reactor.signals_supported());

    assert!(!reactor.set_signal(libc::SIGKILL, |_, _| {}));
    assert!(!reactor.set_signal(0, |_, _| {}));

    let received = Rc::new(RefCell::new(Vec::new()));

    let log = received.clone();
    assert!(reactor.set_signal(libc::SIGUSR1, move |r, signal| {
        log.borrow_mut().push(signal);
        assert!(r.del_signal(signal));
        r.stop();
    }));

    reactor.add_timer(
        Duration::from_millis(10),
        |_, _| unsafe {
            libc::raise(libc::SIGUSR1);
        },
        false,
    );

    // Guard against a lost signal.
    let guard = reactor.add_timer(Duration::from_secs(5), |r, _| r.stop(), false);

    reactor.run().expect("run");

    assert_eq!(*received.borrow(), vec![libc::SIGUSR1]);
    assert!(reactor.contains_timer(guard), "Signal should arrive before the guard");
    assert!(reactor.del_signal(libc::SIGUSR1), "Removing an unset signal succeeds");
}

#[test]
fn test_signal_wakes_reactor_after_other_reactors_dropped() {
    let mut reactor = signal_reactor();
    let delivered = Rc::new(Cell::new(None));
    let start = Instant::now();

    let at = delivered.clone();
    assert!(reactor.set_signal(libc::SIGALRM, move |r, _| {
        at.set(Some(start.elapsed()));
        r.stop();
    }));

    // A second listener on the same signal must not reset the disposition
    // when its reactor goes away.
    let mut other = signal_reactor();
    assert!(other.set_signal(libc::SIGALRM, |_, _| {}));
    drop(other);
    drop(signal_reactor());

    reactor.add_timer(
        Duration::from_millis(10),
        |_, _| unsafe {
            libc::raise(libc::SIGALRM);
        },
        false,
    );
    reactor.add_timer(Duration::from_secs(3), |r, _| r.stop(), false);

    reactor.run().expect("run");

    let elapsed = delivered.get().expect("Signal should be dispatched");
    assert!(
        elapsed < Duration::from_secs(1),
        "Signal should wake the wait, took {elapsed:?}"
    );

    assert!(reactor.del_signal(libc::SIGALRM));
    assert_eq!(disposition(libc::SIGALRM), libc::SIG_DFL);
}

#[test]
fn test_stop_still_dispatches_signals_before_streams() {
    let mut reactor = signal_reactor();
    let (stream, mut peer) = UnixStream::pair().expect("Failed to create socket pair");
    let order = Rc::new(RefCell::new(Vec::new()));

    peer.write_all(b"x").expect("Failed to write");

    let log = order.clone();
    assert!(reactor.set_signal(libc::SIGUSR2, move |_, _| {
        log.borrow_mut().push("signal");
    }));

    let log = order.clone();
    reactor.set_read(stream.as_raw_fd(), move |_, _| {
        log.borrow_mut().push("read");
    });

    reactor.add_task(|r| {
        unsafe { libc::raise(libc::SIGUSR2) };
        r.stop();
    });

    let start = Instant::now();
    reactor.run().expect("run");

    assert_eq!(*order.borrow(), vec!["signal", "read"]);
    assert!(
        start.elapsed() < Duration::from_millis(500),
        "Stopped iteration must not block"
    );

    reactor.del_read(stream.as_raw_fd());
    assert!(reactor.del_signal(libc::SIGUSR2));
}

#[test]
fn test_reset_restores_default_dispositions() {
    let mut reactor = signal_reactor();

    assert!(reactor.set_signal(libc::SIGWINCH, |_, _| {}));
    assert_ne!(disposition(libc::SIGWINCH), libc::SIG_DFL);

    reactor.add_timer(Duration::from_secs(60), |_, _| {}, true);
    reactor.reset();

    assert_eq!(disposition(libc::SIGWINCH), libc::SIG_DFL);
    assert!(reactor.signals_supported());

    // Nothing is left to wait for.
    let start = Instant::now();
    reactor.run().expect("run");
    assert!(start.elapsed() < Duration::from_millis(100));

    assert!(reactor.set_signal(libc::SIGWINCH, |_, _| {}));
    assert!(reactor.del_signal(libc::SIGWINCH));
}
