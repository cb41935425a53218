//! Adaptive frame clock
//!
//! A `ClockSource` is the only thing in the engine that asks the host for
//! animation frames. Every callback re-arms the next frame before doing any
//! work, throttles to the configured frame rate and periodically re-measures
//! the real frame rate so subscribers can normalize their easing.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::tick::Tick;
use crate::config::ClockConfig;
use crate::events::{ListenerId, Listeners};
use crate::host::{FrameHandle, FrameScheduler, Host};

/// Frames are only used for fps measurement once this many have elapsed
const FPS_WARMUP_FRAMES: u64 = 10;

/// Longer frames are stalls (background tab, debugger) rather than samples
const MAX_FPS_SAMPLE_MS: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    Paused,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockEvent {
    Play,
    Pause,
    /// Emitted after every play/pause transition
    Toggle { running: bool },
    Frame(Tick),
    Destroy,
}

#[derive(Debug)]
struct ClockInner {
    state: ClockState,
    config: ClockConfig,
    index: u64,
    fps: f64,
    last_timestamp: Option<f64>,
    handle: Option<FrameHandle>,
}

impl ClockInner {
    /// Account for a host callback at `now`, returning the frame to emit
    fn advance(&mut self, now: f64) -> Option<Tick> {
        let Some(last) = self.last_timestamp else {
            // First callback after play is the start of time, not a frame
            self.last_timestamp = Some(now);
            return None;
        };

        let duration = now - last;
        if duration < self.config.fps.min_frame_duration() {
            return None;
        }

        self.last_timestamp = Some(now);
        self.index += 1;
        self.measure_fps(duration);

        Some(Tick {
            index: self.index,
            timestamp: now,
            duration,
            fps: self.fps,
            fps_factor: 60.0 / self.fps,
        })
    }

    fn measure_fps(&mut self, duration: f64) {
        let every = self.config.fps_recalc_frames.max(1);
        if self.index < FPS_WARMUP_FRAMES || self.index % every != 0 {
            return;
        }
        if duration <= 0.0 || duration > MAX_FPS_SAMPLE_MS {
            return;
        }
        self.fps = (60.0 * (1000.0 / 60.0) / duration).round().max(1.0);
    }
}

struct Shared {
    frames: Rc<dyn FrameScheduler>,
    inner: RefCell<ClockInner>,
    events: Listeners<ClockEvent>,
}

/// Cloneable handle to one frame clock
#[derive(Clone)]
pub struct ClockSource {
    shared: Rc<Shared>,
}

impl fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockSource")
            .field("inner", &self.shared.inner.borrow())
            .field("listeners", &self.shared.events.len())
            .finish()
    }
}

impl ClockSource {
    pub fn new(host: &Host, config: ClockConfig) -> Self {
        let fps = config.fps.initial_fps();
        Self {
            shared: Rc::new(Shared {
                frames: Rc::clone(&host.frames),
                inner: RefCell::new(ClockInner {
                    state: ClockState::Idle,
                    config,
                    index: 0,
                    fps,
                    last_timestamp: None,
                    handle: None,
                }),
                events: Listeners::new(),
            }),
        }
    }

    pub fn state(&self) -> ClockState {
        self.shared.inner.borrow().state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state() == ClockState::Running
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == ClockState::Destroyed
    }

    /// Index of the last emitted frame
    pub fn index(&self) -> u64 {
        self.shared.inner.borrow().index
    }

    pub fn fps(&self) -> f64 {
        self.shared.inner.borrow().fps
    }

    pub fn fps_factor(&self) -> f64 {
        60.0 / self.fps()
    }

    pub fn config(&self) -> ClockConfig {
        self.shared.inner.borrow().config.clone()
    }

    /// Replace the configuration snapshot
    pub fn set_config(&self, config: ClockConfig) {
        let mut inner = self.shared.inner.borrow_mut();
        if inner.config.fps != config.fps {
            inner.fps = config.fps.initial_fps();
        }
        inner.config = config;
    }

    pub fn on(&self, callback: impl Fn(&ClockEvent) + 'static) -> ListenerId {
        self.shared.events.add(callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.shared.events.remove(id)
    }

    /// Start ticking; returns false when already running or destroyed
    pub fn play(&self) -> bool {
        {
            let mut inner = self.shared.inner.borrow_mut();
            match inner.state {
                ClockState::Running | ClockState::Destroyed => return false,
                ClockState::Idle | ClockState::Paused => {}
            }
            inner.state = ClockState::Running;
            inner.last_timestamp = None;
        }

        debug!("Clock playing");
        self.arm();
        self.shared.events.emit(&ClockEvent::Play);
        self.shared.events.emit(&ClockEvent::Toggle { running: true });
        true
    }

    /// Stop ticking; returns false when not running
    pub fn pause(&self) -> bool {
        let handle = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.state != ClockState::Running {
                return false;
            }
            inner.state = ClockState::Paused;
            inner.handle.take()
        };

        if let Some(handle) = handle {
            self.shared.frames.cancel(handle);
        }

        debug!("Clock paused");
        self.shared.events.emit(&ClockEvent::Pause);
        self.shared.events.emit(&ClockEvent::Toggle { running: false });
        true
    }

    /// Pause and tear down; the clock can never run again
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.pause();
        self.shared.inner.borrow_mut().state = ClockState::Destroyed;
        debug!("Clock destroyed");
        self.shared.events.emit(&ClockEvent::Destroy);
        self.shared.events.clear();
    }

    fn arm(&self) {
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        let handle = self.shared.frames.request(Box::new(move |now| {
            if let Some(shared) = weak.upgrade() {
                ClockSource { shared }.on_frame(now);
            }
        }));

        if handle.is_none() {
            debug!("Host has no animation frames, clock will not tick");
        }
        self.shared.inner.borrow_mut().handle = handle;
    }

    fn on_frame(&self, now: f64) {
        {
            let mut inner = self.shared.inner.borrow_mut();
            inner.handle = None;
            if inner.state != ClockState::Running {
                return;
            }
        }

        // Re-arm first, subscribers may pause or destroy
        self.arm();

        let tick = self.shared.inner.borrow_mut().advance(now);
        if let Some(tick) = tick {
            trace!(index = tick.index, duration = tick.duration, fps = tick.fps, "frame");
            self.shared.events.emit(&ClockEvent::Frame(tick));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FpsTarget;
    use crate::host::ManualHost;
    use std::cell::Cell;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn clock_with(config: ClockConfig) -> (Rc<ManualHost>, ClockSource, Rc<RefCell<Vec<ClockEvent>>>) {
        let host = ManualHost::new();
        let clock = ClockSource::new(&Host::manual(&host), config);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        clock.on(move |event| sink.borrow_mut().push(*event));
        (host, clock, events)
    }

    fn frames(events: &RefCell<Vec<ClockEvent>>) -> Vec<Tick> {
        events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ClockEvent::Frame(tick) => Some(*tick),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_play_pause_idempotent() {
        let (_host, clock, events) = clock_with(ClockConfig::default());
        assert_eq!(clock.state(), ClockState::Idle);

        assert!(clock.play());
        assert!(!clock.play());
        assert!(clock.pause());
        assert!(!clock.pause());

        assert_eq!(
            *events.borrow(),
            vec![
                ClockEvent::Play,
                ClockEvent::Toggle { running: true },
                ClockEvent::Pause,
                ClockEvent::Toggle { running: false },
            ]
        );
    }

    #[test]
    fn test_first_callback_is_baseline() {
        let (host, clock, events) = clock_with(ClockConfig::default());
        clock.play();

        host.advance(FRAME_MS);
        assert!(frames(&events).is_empty());

        host.advance(FRAME_MS);
        let ticks = frames(&events);
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].index, 1);
        assert!((ticks[0].duration - FRAME_MS).abs() < 1e-9);
        assert!((ticks[0].fps_factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_index_strictly_increasing() {
        let (host, clock, events) = clock_with(ClockConfig::default());
        clock.play();
        for _ in 0..30 {
            host.advance(FRAME_MS);
        }
        clock.pause();
        clock.play();
        for _ in 0..30 {
            host.advance(FRAME_MS);
        }

        let ticks = frames(&events);
        assert!(ticks.len() > 50);
        assert!(ticks.windows(2).all(|pair| pair[1].index == pair[0].index + 1));
    }

    #[test]
    fn test_pause_before_first_callback_emits_nothing() {
        let (host, clock, events) = clock_with(ClockConfig::default());
        clock.play();
        clock.pause();
        assert_eq!(host.pending_frames(), 0);

        for _ in 0..5 {
            host.advance(FRAME_MS);
        }
        assert!(frames(&events).is_empty());
    }

    #[test]
    fn test_paused_clock_holds_no_callback() {
        let (host, clock, _events) = clock_with(ClockConfig::default());
        clock.play();
        host.advance(FRAME_MS);
        assert_eq!(host.pending_frames(), 1);
        clock.pause();
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_throttles_to_target_fps() {
        let (host, clock, events) = clock_with(ClockConfig {
            fps: FpsTarget::Fixed(30),
            ..ClockConfig::default()
        });
        clock.play();
        host.advance(17.0);
        for _ in 0..60 {
            host.advance(17.0);
        }

        let ticks = frames(&events);
        assert_eq!(ticks.len(), 30);
        assert!(ticks.iter().all(|tick| tick.duration >= 1000.0 / 30.0 - 1e-9));
        // Throttled callbacks keep the loop armed
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn test_fps_measured_after_warmup() {
        let (host, clock, events) = clock_with(ClockConfig::default());
        clock.play();
        host.advance(0.0);
        for _ in 0..20 {
            host.advance(1000.0 / 30.0);
        }

        let ticks = frames(&events);
        assert!(ticks[..9].iter().all(|tick| tick.fps == 60.0));
        assert_eq!(ticks[9].index, 10);
        assert_eq!(ticks[9].fps, 30.0);
        assert!((clock.fps_factor() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fps_ignores_stalls() {
        let (host, clock, events) = clock_with(ClockConfig::default());
        clock.play();
        host.advance(0.0);
        for _ in 0..19 {
            host.advance(FRAME_MS);
        }
        // Frame 20 would trigger a recompute but lasts longer than 250ms
        host.advance(400.0);

        let ticks = frames(&events);
        let last = ticks.last().unwrap();
        assert_eq!(last.index, 20);
        assert_eq!(last.fps, 60.0);
    }

    #[test]
    fn test_no_frame_support_never_ticks() {
        let host = ManualHost::without_frames();
        let clock = ClockSource::new(&Host::manual(&host), ClockConfig::default());
        let ticked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ticked);
        clock.on(move |event| {
            if matches!(event, ClockEvent::Frame(_)) {
                flag.set(true);
            }
        });

        assert!(clock.play());
        for _ in 0..10 {
            host.advance(FRAME_MS);
        }
        assert!(!ticked.get());
        assert!(clock.is_playing());
    }

    #[test]
    fn test_destroy_is_terminal() {
        let (host, clock, events) = clock_with(ClockConfig::default());
        clock.play();
        host.advance(FRAME_MS);
        clock.destroy();

        assert_eq!(clock.state(), ClockState::Destroyed);
        assert!(!clock.play());
        assert_eq!(host.pending_frames(), 0);
        assert!(events.borrow().contains(&ClockEvent::Destroy));

        let before = events.borrow().len();
        host.advance(FRAME_MS);
        assert_eq!(events.borrow().len(), before);
    }

    #[test]
    fn test_pause_from_frame_listener_stops_loop() {
        let host = ManualHost::new();
        let clock = ClockSource::new(&Host::manual(&host), ClockConfig::default());
        let count = Rc::new(Cell::new(0));

        let handle = clock.clone();
        let counter = Rc::clone(&count);
        clock.on(move |event| {
            if let ClockEvent::Frame(tick) = event {
                counter.set(counter.get() + 1);
                if tick.index == 3 {
                    handle.pause();
                }
            }
        });

        clock.play();
        for _ in 0..10 {
            host.advance(FRAME_MS);
        }
        assert_eq!(count.get(), 3);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_dropped_clock_callback_is_noop() {
        let host = ManualHost::new();
        {
            let clock = ClockSource::new(&Host::manual(&host), ClockConfig::default());
            clock.play();
        }
        assert_eq!(host.pending_frames(), 1);
        host.advance(FRAME_MS);
        assert_eq!(host.pending_frames(), 0);
    }
}
