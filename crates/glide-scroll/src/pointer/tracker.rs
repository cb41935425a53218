use std::cell::RefCell;
use std::fmt;
use std::ops::{Add, Sub};
use std::rc::Rc;

use glide_core::{ListenerId, Listeners, PointerConfig, TimerHandle, TimerQueue};
use serde::Serialize;
use tracing::{debug, trace};

use crate::context::Context;
use crate::dom::ElementRef;
use crate::input::{PointerInput, PointerKind, PointerPhase, PRIMARY_BUTTON};
use crate::window::{Window, WindowEvent};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

impl Coords {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }
}

impl Add for Coords {
    type Output = Coords;

    fn add(self, rhs: Coords) -> Coords {
        Coords::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coords {
    type Output = Coords;

    fn sub(self, rhs: Coords) -> Coords {
        Coords::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One press-to-release interaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerSession {
    pub pointer_id: i64,
    pub kind: PointerKind,
    pub start: Coords,
    /// Coordinates before the latest move
    pub prev: Coords,
    pub current: Coords,
}

impl PointerSession {
    fn begin(input: &PointerInput) -> Self {
        let at = Coords::new(input.x, input.y);
        Self {
            pointer_id: input.pointer_id,
            kind: input.kind,
            start: at,
            prev: at,
            current: at,
        }
    }

    /// Movement of the latest move
    pub fn step(&self) -> Coords {
        self.current - self.prev
    }

    /// Movement since the press
    pub fn diff(&self) -> Coords {
        self.current - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Start(PointerSession),
    Move(PointerSession),
    End(PointerSession),
    Cancel(PointerSession),
}

#[derive(Debug)]
struct TrackerState {
    config: PointerConfig,
    session: Option<PointerSession>,
    window_listener: Option<ListenerId>,
    pending_end: Option<TimerHandle>,
    destroyed: bool,
}

struct Shared {
    element: ElementRef,
    window: Rc<Window>,
    timers: Rc<dyn TimerQueue>,
    state: RefCell<TrackerState>,
    events: Listeners<PointerEvent>,
}

/// Tracks at most one pointer session on an element
///
/// Presses arrive through [`PointerTracker::handle_start`]. While a session is
/// live the tracker listens on the window for moves, releases, cancels and
/// blur; the window listener is removed as soon as the session is over.
#[derive(Clone)]
pub struct PointerTracker {
    shared: Rc<Shared>,
}

impl fmt::Debug for PointerTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerTracker")
            .field("state", &self.shared.state.borrow())
            .finish_non_exhaustive()
    }
}

impl PointerTracker {
    pub fn new(ctx: &Context, element: ElementRef, config: PointerConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                element,
                window: Rc::clone(&ctx.window),
                timers: Rc::clone(&ctx.host.timers),
                state: RefCell::new(TrackerState {
                    config,
                    session: None,
                    window_listener: None,
                    pending_end: None,
                    destroyed: false,
                }),
                events: Listeners::new(),
            }),
        }
    }

    pub fn element(&self) -> ElementRef {
        Rc::clone(&self.shared.element)
    }

    pub fn session(&self) -> Option<PointerSession> {
        self.shared.state.borrow().session
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.session().is_some()
    }

    pub fn config(&self) -> PointerConfig {
        self.shared.state.borrow().config.clone()
    }

    pub fn set_config(&self, config: PointerConfig) {
        self.shared.state.borrow_mut().config = config;
    }

    pub fn on(&self, callback: impl Fn(&PointerEvent) + 'static) -> ListenerId {
        self.shared.events.add(callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.shared.events.remove(id)
    }

    /// Press on the tracked element; returns whether a session started
    ///
    /// Rejected while another session is live and for anything other than
    /// the primary mouse button or a touch.
    pub fn handle_start(&self, input: &PointerInput) -> bool {
        let session = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed || state.session.is_some() || input.phase != PointerPhase::Start {
                return false;
            }
            let qualifies = match input.kind {
                PointerKind::Mouse => input.button == PRIMARY_BUTTON,
                PointerKind::Touch => true,
            };
            if !qualifies {
                return false;
            }
            let session = PointerSession::begin(input);
            state.session = Some(session);
            session
        };

        self.attach_window();
        debug!(pointer_id = session.pointer_id, kind = ?session.kind, "Pointer session started");
        self.shared.events.emit(&PointerEvent::Start(session));
        true
    }

    /// Window-level event routed to this tracker
    pub fn handle_window(&self, event: &WindowEvent) {
        match event {
            WindowEvent::Pointer(input) => match input.phase {
                PointerPhase::Move => self.handle_move(input),
                PointerPhase::End => self.handle_end(input),
                PointerPhase::Cancel => self.cancel(),
                PointerPhase::Start => {}
            },
            WindowEvent::Blur => self.cancel(),
            WindowEvent::Resize(_) => {}
        }
    }

    fn handle_move(&self, input: &PointerInput) {
        let session = {
            let mut state = self.shared.state.borrow_mut();
            let Some(session) = state.session.as_mut() else {
                return;
            };
            if session.pointer_id != input.pointer_id || session.kind != input.kind {
                return;
            }
            session.prev = session.current;
            session.current = Coords::new(input.x, input.y);
            *session
        };

        trace!(x = session.current.x, y = session.current.y, "Pointer moved");
        self.shared.events.emit(&PointerEvent::Move(session));
    }

    /// Releases are reconciled one timer turn later, so duplicate releases
    /// from overlapping mouse and touch handlers collapse into one end
    fn handle_end(&self, input: &PointerInput) {
        let delay = {
            let state = self.shared.state.borrow();
            let Some(session) = state.session else {
                return;
            };
            if session.pointer_id != input.pointer_id || session.kind != input.kind {
                trace!(pointer_id = input.pointer_id, "Ignoring release of another pointer");
                return;
            }
            if state.pending_end.is_some() {
                return;
            }
            state.config.end_delay_ms
        };

        let weak = Rc::downgrade(&self.shared);
        let pointer_id = input.pointer_id;
        let handle = self.shared.timers.set_timeout(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    PointerTracker { shared }.finish(pointer_id);
                }
            }),
        );
        self.shared.state.borrow_mut().pending_end = Some(handle);
    }

    fn finish(&self, pointer_id: i64) {
        let (session, listener) = {
            let mut state = self.shared.state.borrow_mut();
            state.pending_end = None;
            match state.session {
                Some(session) if session.pointer_id == pointer_id => {
                    state.session = None;
                    (session, state.window_listener.take())
                }
                _ => return,
            }
        };

        if let Some(id) = listener {
            self.shared.window.remove_listener(id);
        }
        debug!(pointer_id, "Pointer session ended");
        self.shared.events.emit(&PointerEvent::End(session));
    }

    /// Abort the live session, if any, and drop the window listener
    pub fn cancel(&self) {
        let (session, listener, pending) = {
            let mut state = self.shared.state.borrow_mut();
            (
                state.session.take(),
                state.window_listener.take(),
                state.pending_end.take(),
            )
        };

        if let Some(id) = listener {
            self.shared.window.remove_listener(id);
        }
        if let Some(handle) = pending {
            self.shared.timers.clear_timeout(handle);
        }
        if let Some(session) = session {
            debug!(pointer_id = session.pointer_id, "Pointer session cancelled");
            self.shared.events.emit(&PointerEvent::Cancel(session));
        }
    }

    pub fn destroy(&self) {
        self.cancel();
        self.shared.state.borrow_mut().destroyed = true;
        self.shared.events.clear();
    }

    fn attach_window(&self) {
        let weak = Rc::downgrade(&self.shared);
        let id = self.shared.window.add_listener(move |event| {
            if let Some(shared) = weak.upgrade() {
                PointerTracker { shared }.handle_window(event);
            }
        });
        self.shared.state.borrow_mut().window_listener = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, MemoryElement, Size};
    use glide_core::{Host, ManualHost};

    struct Fixture {
        host: Rc<ManualHost>,
        window: Rc<Window>,
        tracker: PointerTracker,
        events: Rc<RefCell<Vec<PointerEvent>>>,
    }

    fn fixture() -> Fixture {
        let host = ManualHost::new();
        let window = Window::new(Size::new(800.0, 600.0));
        let ctx = Context::new(Host::manual(&host), Rc::clone(&window), MemoryDocument::new());
        let tracker = PointerTracker::new(&ctx, MemoryElement::new("target"), PointerConfig::default());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        tracker.on(move |event| sink.borrow_mut().push(*event));
        Fixture {
            host,
            window,
            tracker,
            events,
        }
    }

    fn dispatch(window: &Window, input: PointerInput) {
        window.dispatch(&WindowEvent::Pointer(input));
    }

    #[test]
    fn test_start_only_for_primary_button_or_touch() {
        let f = fixture();
        assert!(!f.tracker.handle_start(&PointerInput::mouse_down(0.0, 0.0).with_button(2)));
        assert!(!f.tracker.handle_start(&PointerInput::mouse_move(0.0, 0.0)));
        assert!(f.tracker.handle_start(&PointerInput::touch_start(4, 0.0, 0.0)));
    }

    #[test]
    fn test_second_start_is_rejected() {
        let f = fixture();
        assert!(f.tracker.handle_start(&PointerInput::mouse_down(10.0, 10.0)));
        assert!(!f.tracker.handle_start(&PointerInput::touch_start(0, 50.0, 50.0)));
        assert_eq!(f.tracker.session().unwrap().kind, PointerKind::Mouse);
    }

    #[test]
    fn test_window_listener_lives_with_session() {
        let f = fixture();
        assert_eq!(f.window.listener_count(), 0);

        f.tracker.handle_start(&PointerInput::mouse_down(0.0, 0.0));
        assert_eq!(f.window.listener_count(), 1);

        dispatch(&f.window, PointerInput::mouse_up(0.0, 0.0));
        f.host.run_timers();
        assert_eq!(f.window.listener_count(), 0);
        assert!(!f.tracker.is_active());
    }

    #[test]
    fn test_step_and_diff() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::mouse_down(10.0, 20.0));
        dispatch(&f.window, PointerInput::mouse_move(15.0, 30.0));
        dispatch(&f.window, PointerInput::mouse_move(18.0, 26.0));

        let session = f.tracker.session().unwrap();
        assert_eq!(session.step(), Coords::new(3.0, -4.0));
        assert_eq!(session.diff(), Coords::new(8.0, 6.0));
    }

    #[test]
    fn test_moves_of_other_pointers_ignored() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::touch_start(1, 0.0, 0.0));
        dispatch(&f.window, PointerInput::touch_move(2, 100.0, 100.0));
        dispatch(&f.window, PointerInput::mouse_move(100.0, 100.0));
        assert_eq!(f.tracker.session().unwrap().current, Coords::new(0.0, 0.0));
    }

    #[test]
    fn test_foreign_end_keeps_session() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::touch_start(1, 0.0, 0.0));
        dispatch(&f.window, PointerInput::touch_end(7, 0.0, 0.0));
        f.host.run_timers();

        assert!(f.tracker.is_active());
        assert_eq!(f.window.listener_count(), 1);
    }

    #[test]
    fn test_end_is_deferred_and_deduplicated() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::touch_start(1, 0.0, 0.0));
        dispatch(&f.window, PointerInput::touch_end(1, 0.0, 0.0));
        dispatch(&f.window, PointerInput::touch_end(1, 0.0, 0.0));

        assert!(f.tracker.is_active());
        f.host.run_timers();
        assert!(!f.tracker.is_active());

        let ends = f
            .events
            .borrow()
            .iter()
            .filter(|event| matches!(event, PointerEvent::End(_)))
            .count();
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_blur_cancels() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::mouse_down(0.0, 0.0));
        f.window.dispatch(&WindowEvent::Blur);

        assert!(!f.tracker.is_active());
        assert_eq!(f.window.listener_count(), 0);
        assert!(matches!(f.events.borrow().last(), Some(PointerEvent::Cancel(_))));
    }

    #[test]
    fn test_touch_cancel_drops_pending_end() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::touch_start(1, 0.0, 0.0));
        dispatch(&f.window, PointerInput::touch_end(1, 0.0, 0.0));
        dispatch(&f.window, PointerInput::touch_cancel(1));

        assert_eq!(f.host.pending_timers(), 0);
        f.host.run_timers();
        assert!(!f
            .events
            .borrow()
            .iter()
            .any(|event| matches!(event, PointerEvent::End(_))));
    }

    #[test]
    fn test_new_session_after_end() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::mouse_down(0.0, 0.0));
        dispatch(&f.window, PointerInput::mouse_up(0.0, 0.0));
        f.host.run_timers();
        assert!(f.tracker.handle_start(&PointerInput::touch_start(3, 5.0, 5.0)));
    }

    #[test]
    fn test_destroy_mid_session() {
        let f = fixture();
        f.tracker.handle_start(&PointerInput::mouse_down(0.0, 0.0));
        dispatch(&f.window, PointerInput::mouse_up(0.0, 0.0));
        f.tracker.destroy();

        assert_eq!(f.host.pending_timers(), 0);
        assert_eq!(f.window.listener_count(), 0);
        assert!(!f.tracker.handle_start(&PointerInput::mouse_down(0.0, 0.0)));
    }
}
