mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

#[test]
fn test_one_shot_timer_fires_once() {
    let mut reactor = common::reactor();
    let fired = Rc::new(Cell::new(0));
    let start = Instant::now();

    let count = fired.clone();
    let handle = reactor.add_timer(
        Duration::from_millis(50),
        move |_, _| count.set(count.get() + 1),
        false,
    );
    assert!(reactor.contains_timer(handle));

    reactor.run().expect("run");

    assert_eq!(fired.get(), 1, "One-shot timer should fire exactly once");
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(50),
        "Timer should not fire before its interval"
    );
    assert!(
        elapsed < Duration::from_millis(500),
        "Timer should fire shortly after its interval, took {elapsed:?}"
    );
    assert!(!reactor.contains_timer(handle));
}

#[test]
fn test_periodic_timer_cancelled_from_callback() {
    let mut reactor = common::reactor();
    let fired = Rc::new(Cell::new(0));
    let start = Instant::now();

    let count = fired.clone();
    reactor.add_timer(
        Duration::from_millis(10),
        move |r, handle| {
            count.set(count.get() + 1);
            if count.get() == 3 {
                assert!(r.del_timer(handle));
            }
        },
        true,
    );

    reactor.run().expect("run");

    assert_eq!(fired.get(), 3);
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_timer_deleted_before_due_never_fires() {
    let mut reactor = common::reactor();
    let fired = Rc::new(Cell::new(false));

    let flag = fired.clone();
    let victim = reactor.add_timer(Duration::from_millis(40), move |_, _| flag.set(true), false);

    reactor.add_timer(
        Duration::from_millis(5),
        move |r, _| {
            r.del_timer(victim);
        },
        false,
    );

    reactor.run().expect("run");

    assert!(!fired.get(), "Deleted timer should never fire");
    assert!(reactor.del_timer(victim), "Deleting twice still succeeds");
}

#[test]
fn test_timers_fire_in_deadline_order() {
    let mut reactor = common::reactor();
    let order = Rc::new(RefCell::new(Vec::new()));

    for (name, millis) in [("c", 30), ("a", 10), ("b", 20)] {
        let log = order.clone();
        reactor.add_timer(
            Duration::from_millis(millis),
            move |_, _| log.borrow_mut().push(name),
            false,
        );
    }

    reactor.run().expect("run");

    assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn test_zero_interval_timer_fires() {
    let mut reactor = common::reactor();
    let fired = Rc::new(Cell::new(false));

    let flag = fired.clone();
    reactor.add_timer(Duration::ZERO, move |_, _| flag.set(true), false);

    reactor.run().expect("run");
    assert!(fired.get());
}

#[test]
fn test_stop_ends_loop_with_live_timers() {
    let mut reactor = common::reactor();
    let ticks = Rc::new(Cell::new(0));

    let count = ticks.clone();
    let periodic = reactor.add_timer(
        Duration::from_millis(5),
        move |_, _| count.set(count.get() + 1),
        true,
    );

    reactor.add_timer(
        Duration::from_millis(30),
        |r, _| {
            assert!(r.is_running());
            r.stop();
            assert!(!r.is_running());
        },
        false,
    );

    reactor.run().expect("run");

    assert!(ticks.get() >= 1);
    assert!(
        reactor.contains_timer(periodic),
        "Stopping does not clear registrations"
    );
}
