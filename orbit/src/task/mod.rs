//! Deferred task queue.
//!
//! Tasks are zero-argument callbacks queued for the next loop iteration.
//! They run before timers, crontabs and I/O, in FIFO order.

mod queue;

pub use queue::{Task, TaskQueue};
