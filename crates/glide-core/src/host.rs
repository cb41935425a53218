//! Host capabilities consumed by the engine
//!
//! The engine never talks to a browser or a window system directly. It is
//! handed a [`Host`] at construction that provides animation frames and
//! timeouts. [`ManualHost`] implements both on a virtual clock that the caller
//! advances explicitly.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Callback run with the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Callback run when a timeout expires
pub type TimerCallback = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Animation frame capability (`requestAnimationFrame` in a browser)
pub trait FrameScheduler {
    /// Schedule `callback` for the next frame
    ///
    /// Returns `None` when the host has no animation frame support.
    fn request(&self, callback: FrameCallback) -> Option<FrameHandle>;

    fn cancel(&self, handle: FrameHandle);

    /// Current time in milliseconds
    fn now(&self) -> f64;
}

/// Timeout capability (`setTimeout` in a browser)
pub trait TimerQueue {
    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle;

    fn clear_timeout(&self, handle: TimerHandle);
}

/// Capabilities handed to every component at construction
#[derive(Clone)]
pub struct Host {
    pub frames: Rc<dyn FrameScheduler>,
    pub timers: Rc<dyn TimerQueue>,
}

impl Host {
    pub fn new(frames: Rc<dyn FrameScheduler>, timers: Rc<dyn TimerQueue>) -> Self {
        Self { frames, timers }
    }

    /// Host backed by a single [`ManualHost`]
    pub fn manual(manual: &Rc<ManualHost>) -> Self {
        Self {
            frames: Rc::clone(manual) as Rc<dyn FrameScheduler>,
            timers: Rc::clone(manual) as Rc<dyn TimerQueue>,
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

struct PendingTimer {
    handle: TimerHandle,
    deadline: f64,
    callback: TimerCallback,
}

/// Deterministic host driven by explicit calls to [`ManualHost::advance`]
pub struct ManualHost {
    now: Cell<f64>,
    next_id: Cell<u64>,
    frames_supported: bool,
    frames: RefCell<Vec<(FrameHandle, FrameCallback)>>,
    timers: RefCell<Vec<PendingTimer>>,
    frames_fired: Cell<u64>,
}

impl fmt::Debug for ManualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualHost")
            .field("now", &self.now.get())
            .field("pending_frames", &self.pending_frames())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

impl Default for ManualHost {
    fn default() -> Self {
        Self {
            now: Cell::new(0.0),
            next_id: Cell::new(1),
            frames_supported: true,
            frames: RefCell::new(Vec::new()),
            timers: RefCell::new(Vec::new()),
            frames_fired: Cell::new(0),
        }
    }
}

impl ManualHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Host without animation frame support
    pub fn without_frames() -> Rc<Self> {
        Rc::new(Self {
            frames_supported: false,
            ..Self::default()
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Number of frame callbacks run so far
    pub fn frames_fired(&self) -> u64 {
        self.frames_fired.get()
    }

    /// Move time forward, run due timers, then run one round of frames
    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms.max(0.0));
        self.run_timers();
        self.run_frame();
    }

    /// Move time forward and run due timers only
    pub fn advance_timers(&self, ms: f64) {
        self.now.set(self.now.get() + ms.max(0.0));
        self.run_timers();
    }

    /// Move time to an absolute timestamp (never backwards)
    pub fn advance_to(&self, timestamp: f64) {
        let delta = timestamp - self.now.get();
        self.advance(delta);
    }

    /// Run every timer whose deadline has passed, in deadline order
    pub fn run_timers(&self) {
        loop {
            let now = self.now.get();
            let due = {
                let mut timers = self.timers.borrow_mut();
                let position = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.deadline <= now)
                    .min_by(|(_, a), (_, b)| {
                        a.deadline
                            .total_cmp(&b.deadline)
                            .then(a.handle.0.cmp(&b.handle.0))
                    })
                    .map(|(index, _)| index);
                position.map(|index| timers.remove(index))
            };

            match due {
                Some(timer) => {
                    trace!(handle = timer.handle.0, "timer fired");
                    (timer.callback)();
                }
                None => break,
            }
        }
    }

    /// Run the frame callbacks that were pending before this call
    ///
    /// Callbacks requested while the round runs wait for the next round.
    pub fn run_frame(&self) {
        let round: Vec<(FrameHandle, FrameCallback)> = self.frames.borrow_mut().drain(..).collect();
        let now = self.now.get();
        for (_, callback) in round {
            self.frames_fired.set(self.frames_fired.get() + 1);
            callback(now);
        }
    }
}

impl FrameScheduler for ManualHost {
    fn request(&self, callback: FrameCallback) -> Option<FrameHandle> {
        if !self.frames_supported {
            return None;
        }
        let handle = FrameHandle(self.next_id());
        self.frames.borrow_mut().push((handle, callback));
        Some(handle)
    }

    fn cancel(&self, handle: FrameHandle) {
        self.frames.borrow_mut().retain(|(pending, _)| *pending != handle);
    }

    fn now(&self) -> f64 {
        self.now.get()
    }
}

impl TimerQueue for ManualHost {
    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        self.timers.borrow_mut().push(PendingTimer {
            handle,
            deadline: self.now.get() + delay_ms.max(0.0),
            callback,
        });
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.timers.borrow_mut().retain(|timer| timer.handle != handle);
    }
}
