//! Virtual smooth scrolling

mod state;
mod virtual_scroll;

pub use state::{ScrollBehavior, ScrollBounds, ScrollPosition, ScrollSnapshot, ScrollToOptions};
pub use virtual_scroll::{ContainerRef, SurfaceEvent, SurfaceOptions, VirtualScrollSurface};
