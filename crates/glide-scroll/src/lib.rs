pub mod context;
pub mod dom;
pub mod input;
pub mod pointer;
pub mod scrollbar;
pub mod source;
pub mod surface;
pub mod window;

pub use context::Context;
pub use input::{normalize_wheel, NormalizedWheel, PointerInput, WheelInput};
pub use pointer::{DragEvent, DragTracker, PointerEvent, PointerTracker};
pub use scrollbar::{ScrollbarSync, ThumbState};
pub use source::{Axis, NativeScroll, ScrollMetrics, ScrollSource};
pub use surface::{
    ScrollBehavior, ScrollToOptions, SurfaceEvent, SurfaceOptions, VirtualScrollSurface,
};
pub use window::{Window, WindowEvent};
