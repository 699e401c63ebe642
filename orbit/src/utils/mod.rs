//! Internal containers shared by the registries.
//!
//! [`Slots`] maps keys to listeners that can be taken out while they run,
//! so a listener may replace or remove its own registration.

mod slots;

pub(crate) use slots::Slots;
