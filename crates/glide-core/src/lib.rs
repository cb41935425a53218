pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod math;

pub use clock::{ClockEvent, ClockSource, ClockState, Tick};
pub use config::{
    AppConfig, ClockConfig, EaseMode, FpsTarget, PointerConfig, ScrollConfig, ScrollbarConfig,
};
pub use error::{Error, Result};
pub use events::{ListenerId, Listeners};
pub use host::{FrameHandle, FrameScheduler, Host, ManualHost, TimerHandle, TimerQueue};
