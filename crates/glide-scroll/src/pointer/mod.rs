//! Pointer tracking for mouse and touch
//!
//! - `tracker` - single-session press/move/release state machine
//! - `drag` - drag specialization with travel accounting and click detection

mod drag;
mod tracker;

pub use drag::{DragEvent, DragTracker};
pub use tracker::{Coords, PointerEvent, PointerSession, PointerTracker};
