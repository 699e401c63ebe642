//! # Orbit
//!
//! **Orbit** is a single-threaded, callback-driven event reactor.
//!
//! One [`Reactor`] multiplexes every event source of a program on the
//! calling thread:
//!
//! - **Deferred tasks** run at the start of the next iteration
//! - **Timers** fire once or periodically after a monotonic interval
//! - **Crontabs** fire when the local wall clock matches a five-field rule
//! - **Signals** are delivered to listeners synchronously, never from the
//!   interrupt context
//! - **Streams** report read and write readiness of raw descriptors
//!
//! Every callback receives `&mut Reactor` and may register or cancel
//! anything, including its own registration.
//!
//! ## Quick Start
//!
//! ```rust
//! use orbit::Reactor;
//! use std::time::Duration;
//!
//! let mut reactor = Reactor::new().unwrap();
//!
//! reactor.add_task(|_| println!("first iteration"));
//!
//! reactor.add_timer(
//!     Duration::from_millis(10),
//!     |reactor, handle| {
//!         println!("{handle} fired");
//!         reactor.del_timer(handle);
//!     },
//!     true,
//! );
//!
//! // Returns once nothing is left to wait for.
//! reactor.run().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`task`] — Deferred task queue
//! - [`timer`] — Interval timers
//! - [`crontab`] — Calendar rules
//! - [`signal`] — Signal listener registry
//!
//! The schedulers are generic over the context they pass to listeners and
//! can be driven without a reactor; [`Reactor`] is the context used by the
//! event loop itself.

mod error;
mod handle;
mod reactor;
mod utils;

pub mod crontab;
pub mod signal;
pub mod task;
pub mod timer;

pub use error::{CrontabError, FieldKind};
pub use handle::{CrontabHandle, TimerHandle};
pub use reactor::{RawFd, Reactor, ReactorBuilder, StreamListener};

pub use crontab::{CrontabScheduler, Field, Rule, TimeSample};
pub use signal::SignalHandler;
pub use task::TaskQueue;
pub use timer::{MIN_INTERVAL, TimerScheduler};
