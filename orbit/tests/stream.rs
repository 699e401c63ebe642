#![cfg(unix)]

mod common;

use std::cell::RefCell;
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::rc::Rc;

fn pair() -> (UnixStream, UnixStream) {
    let (a, b) = UnixStream::pair().expect("Failed to create socket pair");
    a.set_nonblocking(true).expect("Failed to set non-blocking");
    b.set_nonblocking(true).expect("Failed to set non-blocking");
    (a, b)
}

#[test]
fn test_read_listener_receives_data_and_unregisters() {
    let mut reactor = common::reactor();
    let (mut reader, mut writer) = pair();
    let received = Rc::new(RefCell::new(Vec::new()));

    writer.write_all(b"ping").expect("Failed to write");

    let fd = reader.as_raw_fd();
    let sink = received.clone();
    assert!(reactor.set_read(fd, move |r, ready| {
        let mut buffer = [0u8; 16];
        let n = reader.read(&mut buffer).expect("Failed to read");
        sink.borrow_mut().extend_from_slice(&buffer[..n]);
        assert!(r.del_read(ready));
    }));

    reactor.run().expect("run");

    assert_eq!(&*received.borrow(), b"ping");
}

#[test]
fn test_write_listener_fires_when_writable() {
    let mut reactor = common::reactor();
    let (mut peer, mut writer) = pair();

    let fd = writer.as_raw_fd();
    reactor.set_write(fd, move |r, ready| {
        writer.write_all(b"pong").expect("Failed to write");
        r.del_write(ready);
    });

    reactor.run().expect("run");

    let mut buffer = [0u8; 4];
    peer.read_exact(&mut buffer).expect("Failed to read");
    assert_eq!(&buffer, b"pong");
}

#[test]
fn test_read_dispatched_before_write_on_same_stream() {
    let mut reactor = common::reactor();
    let (stream, mut peer) = pair();
    let order = Rc::new(RefCell::new(Vec::new()));

    peer.write_all(b"x").expect("Failed to write");

    let fd = stream.as_raw_fd();

    let log = order.clone();
    reactor.set_read(fd, move |r, ready| {
        log.borrow_mut().push("read");
        r.del_read(ready);
    });

    let log = order.clone();
    reactor.set_write(fd, move |r, ready| {
        log.borrow_mut().push("write");
        r.del_write(ready);
    });

    reactor.run().expect("run");

    assert_eq!(*order.borrow(), vec!["read", "write"]);
    drop(stream);
}

#[test]
fn test_listener_replaced_from_callback() {
    let mut reactor = common::reactor();
    let (reader, mut writer) = pair();
    let calls = Rc::new(RefCell::new(Vec::new()));

    writer.write_all(b"ab").expect("Failed to write");

    // Outlives the replaced listener.
    let reader = Rc::new(RefCell::new(reader));
    let fd = reader.borrow().as_raw_fd();

    let log = calls.clone();
    let stream = reader.clone();
    reactor.set_read(fd, move |r, ready| {
        log.borrow_mut().push("first");

        let mut byte = [0u8; 1];
        stream
            .borrow_mut()
            .read_exact(&mut byte)
            .expect("Failed to read");

        let log = log.clone();
        r.set_read(ready, move |r, ready| {
            log.borrow_mut().push("second");
            r.del_read(ready);
        });
    });

    reactor.run().expect("run");

    assert_eq!(*calls.borrow(), vec!["first", "second"]);
    drop(reader);
}

#[test]
fn test_unregistered_stream_is_not_dispatched() {
    let mut reactor = common::reactor();
    let (reader, mut writer) = pair();
    let calls = Rc::new(RefCell::new(0));

    writer.write_all(b"data").expect("Failed to write");

    let fd = reader.as_raw_fd();
    let count = calls.clone();
    reactor.set_read(fd, move |_, _| *count.borrow_mut() += 1);
    assert!(reactor.del_read(fd));
    assert!(reactor.del_read(fd), "Removing twice still succeeds");

    reactor.run().expect("run");

    assert_eq!(*calls.borrow(), 0);
    drop(reader);
}
