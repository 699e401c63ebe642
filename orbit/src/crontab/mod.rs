//! Calendar rules with minute granularity.
//!
//! A crontab is a five-field rule (minute, hour, day of month, month,
//! day of week) and a listener. Once per calendar minute the scheduler
//! samples the local clock into a [`TimeSample`] and fires every crontab
//! whose rule matches it.
//!
//! Each field is a comma-separated list of items:
//!
//! ```text
//! *               any value
//! */step          every step-th value of the field's range
//! n               a single value
//! start-end       inclusive range
//! start-end/step  inclusive range with a step
//! ```

mod entry;
mod rule;
mod sample;
mod scheduler;

pub use entry::CrontabListener;
pub use rule::{Field, Rule};
pub use sample::TimeSample;
pub use scheduler::CrontabScheduler;
