use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glide_core::{ListenerId, Listeners, PointerConfig};
use tracing::trace;

use super::tracker::{Coords, PointerEvent, PointerSession, PointerTracker};
use crate::context::Context;
use crate::dom::ElementRef;
use crate::input::PointerInput;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    Start(PointerSession),
    Move {
        session: PointerSession,
        step: Coords,
        diff: Coords,
        /// Absolute distance covered per axis since the press
        travel: Coords,
    },
    End {
        session: PointerSession,
        travel: Coords,
        /// The pointer never left the drag threshold
        is_click: bool,
    },
    Cancel(PointerSession),
}

#[derive(Debug, Default)]
struct DragState {
    travel: Coords,
    pointer_events_disabled: bool,
}

struct Shared {
    tracker: PointerTracker,
    state: RefCell<DragState>,
    events: Listeners<DragEvent>,
}

/// Pointer tracker that tells drags from clicks
///
/// Once travel on either axis passes the configured threshold the element
/// stops receiving pointer events, so releasing over a link inside a dragged
/// surface does not click it. Pointer events come back when the drag ends.
#[derive(Clone)]
pub struct DragTracker {
    shared: Rc<Shared>,
}

impl fmt::Debug for DragTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragTracker")
            .field("tracker", &self.shared.tracker)
            .field("state", &self.shared.state.borrow())
            .finish()
    }
}

impl DragTracker {
    pub fn new(ctx: &Context, element: ElementRef, config: PointerConfig) -> Self {
        let shared = Rc::new(Shared {
            tracker: PointerTracker::new(ctx, element, config),
            state: RefCell::new(DragState::default()),
            events: Listeners::new(),
        });

        let weak = Rc::downgrade(&shared);
        shared.tracker.on(move |event| {
            if let Some(shared) = weak.upgrade() {
                DragTracker { shared }.handle_pointer(event);
            }
        });

        Self { shared }
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.shared.tracker
    }

    pub fn is_dragging(&self) -> bool {
        self.shared.tracker.is_active()
    }

    pub fn travel(&self) -> Coords {
        self.shared.state.borrow().travel
    }

    pub fn set_config(&self, config: PointerConfig) {
        self.shared.tracker.set_config(config);
    }

    pub fn on(&self, callback: impl Fn(&DragEvent) + 'static) -> ListenerId {
        self.shared.events.add(callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.shared.events.remove(id)
    }

    pub fn handle_start(&self, input: &PointerInput) -> bool {
        self.shared.tracker.handle_start(input)
    }

    pub fn cancel(&self) {
        self.shared.tracker.cancel();
    }

    pub fn destroy(&self) {
        self.shared.tracker.destroy();
        self.restore_pointer_events();
        self.shared.events.clear();
    }

    fn exceeds_threshold(&self, travel: Coords) -> bool {
        let threshold = self.shared.tracker.config().drag_threshold;
        travel.x > threshold || travel.y > threshold
    }

    fn handle_pointer(&self, event: &PointerEvent) {
        match event {
            PointerEvent::Start(session) => {
                self.shared.state.borrow_mut().travel = Coords::default();
                self.shared.events.emit(&DragEvent::Start(*session));
            }
            PointerEvent::Move(session) => {
                let step = session.step();
                let travel = {
                    let mut state = self.shared.state.borrow_mut();
                    state.travel = state.travel + step.abs();
                    state.travel
                };

                if self.exceeds_threshold(travel) {
                    self.disable_pointer_events();
                }

                self.shared.events.emit(&DragEvent::Move {
                    session: *session,
                    step,
                    diff: session.diff(),
                    travel,
                });
            }
            PointerEvent::End(session) => {
                self.restore_pointer_events();
                let travel = self.travel();
                let is_click = !self.exceeds_threshold(travel);
                self.shared.events.emit(&DragEvent::End {
                    session: *session,
                    travel,
                    is_click,
                });
            }
            PointerEvent::Cancel(session) => {
                self.restore_pointer_events();
                self.shared.events.emit(&DragEvent::Cancel(*session));
            }
        }
    }

    fn disable_pointer_events(&self) {
        if !self.shared.tracker.config().disable_pointer_events {
            return;
        }
        let mut state = self.shared.state.borrow_mut();
        if !state.pointer_events_disabled {
            trace!("Drag passed threshold, disabling pointer events");
            self.shared.tracker.element().set_pointer_events(false);
            state.pointer_events_disabled = true;
        }
    }

    fn restore_pointer_events(&self) {
        let mut state = self.shared.state.borrow_mut();
        if state.pointer_events_disabled {
            self.shared.tracker.element().set_pointer_events(true);
            state.pointer_events_disabled = false;
        }
    }
}
