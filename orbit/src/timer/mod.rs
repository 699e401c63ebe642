//! Interval timers.
//!
//! This module provides one-shot and periodic timers ordered by
//! monotonic deadline. The scheduler reports how long the reactor may
//! block before the next timer is due and fires every due timer on
//! [`TimerScheduler::tick`].

mod entry;
mod scheduler;

pub use entry::{MIN_INTERVAL, TimerListener};
pub use scheduler::TimerScheduler;
