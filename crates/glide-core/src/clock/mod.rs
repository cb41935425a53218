//! Frame clock driving all periodic work

mod source;
mod tick;

pub use source::{ClockEvent, ClockSource, ClockState};
pub use tick::Tick;
