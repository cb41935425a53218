use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use glide_core::math::clamp;
use glide_core::{Error, ListenerId, PointerConfig, Result, ScrollbarConfig, TimerHandle};
use serde::Serialize;
use tracing::{debug, trace};

use crate::context::Context;
use crate::dom::ElementRef;
use crate::input::PointerInput;
use crate::pointer::{Coords, DragEvent, DragTracker};
use crate::source::{Axis, ScrollMetrics, ScrollSource, SourceNotice, SourceSubscription};
use crate::surface::ScrollToOptions;
use crate::window::WindowEvent;

impl Axis {
    fn suffix(self) -> &'static str {
        match self {
            Axis::Horizontal => "x",
            Axis::Vertical => "y",
        }
    }

    fn size_property(self) -> &'static str {
        match self {
            Axis::Horizontal => "width",
            Axis::Vertical => "height",
        }
    }

    fn pick(self, coords: Coords) -> f64 {
        match self {
            Axis::Horizontal => coords.x,
            Axis::Vertical => coords.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ThumbState {
    /// Track length along the axis
    pub outer_size: f64,
    pub thumb_size: f64,
    /// Scroll progress in `[0, 1]`
    pub progress: f64,
    /// Thumb position inside the track
    pub offset: f64,
    pub hovered: bool,
    /// Source offset when the current thumb drag started
    pub drag_start_scroll: f64,
}

#[derive(Debug)]
struct BarState {
    config: ScrollbarConfig,
    thumb: ThumbState,
    dragging: bool,
    subscription: Option<SourceSubscription>,
    window_listener: Option<ListenerId>,
    hide_timer: Option<TimerHandle>,
    destroyed: bool,
}

impl BarState {
    fn class(&self, modifier: &str) -> String {
        format!("{}--{modifier}", self.config.class_prefix)
    }
}

struct Shared {
    ctx: Context,
    source: ScrollSource,
    axis: Axis,
    mount: ElementRef,
    track: ElementRef,
    thumb: ElementRef,
    drag: DragTracker,
    state: RefCell<BarState>,
}

/// One axis of a custom scrollbar following a [`ScrollSource`]
///
/// The track is appended to `mount` on creation and removed on destroy.
/// Positions are read from the notification that moved the source, so the
/// thumb always matches what was rendered in the same frame.
#[derive(Clone)]
pub struct ScrollbarSync {
    shared: Rc<Shared>,
}

impl fmt::Debug for ScrollbarSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollbarSync")
            .field("axis", &self.shared.axis)
            .field("state", &self.shared.state.borrow())
            .finish_non_exhaustive()
    }
}

impl ScrollbarSync {
    pub fn new(
        ctx: &Context,
        source: impl Into<ScrollSource>,
        axis: Axis,
        mount: ElementRef,
        config: ScrollbarConfig,
        pointer: PointerConfig,
    ) -> Result<Self> {
        let source = source.into();
        if let ScrollSource::Virtual(surface) = &source {
            if surface.is_destroyed() {
                return Err(Error::Destroyed("scroll surface"));
            }
        }

        let prefix = &config.class_prefix;
        let track = ctx
            .document
            .create_element(&format!("{prefix} {prefix}--{}", axis.suffix()));
        let thumb = ctx.document.create_element(&format!("{prefix}__thumb"));
        track.append_child(Rc::clone(&thumb));
        mount.append_child(Rc::clone(&track));

        let shared = Rc::new_cyclic(|weak: &Weak<Shared>| {
            let drag = DragTracker::new(ctx, Rc::clone(&thumb), pointer);
            let on_drag = weak.clone();
            drag.on(move |event| {
                if let Some(shared) = on_drag.upgrade() {
                    ScrollbarSync { shared }.handle_drag(event);
                }
            });

            let on_notice = weak.clone();
            let subscription = source.subscribe(move |notice| {
                if let Some(shared) = on_notice.upgrade() {
                    ScrollbarSync { shared }.handle_notice(notice);
                }
            });

            let on_window = weak.clone();
            let window_listener = ctx.window.add_listener(move |event| {
                if let WindowEvent::Resize(_) = event {
                    if let Some(shared) = on_window.upgrade() {
                        ScrollbarSync { shared }.resize();
                    }
                }
            });

            Shared {
                ctx: ctx.clone(),
                source,
                axis,
                mount,
                track,
                thumb,
                drag,
                state: RefCell::new(BarState {
                    config,
                    thumb: ThumbState::default(),
                    dragging: false,
                    subscription: Some(subscription),
                    window_listener: Some(window_listener),
                    hide_timer: None,
                    destroyed: false,
                }),
            }
        });

        let bar = Self { shared };
        bar.resize();
        Ok(bar)
    }

    pub fn axis(&self) -> Axis {
        self.shared.axis
    }

    pub fn source(&self) -> &ScrollSource {
        &self.shared.source
    }

    pub fn track(&self) -> ElementRef {
        Rc::clone(&self.shared.track)
    }

    pub fn thumb(&self) -> ElementRef {
        Rc::clone(&self.shared.thumb)
    }

    pub fn thumb_state(&self) -> ThumbState {
        self.shared.state.borrow().thumb
    }

    pub fn is_dragging(&self) -> bool {
        self.shared.state.borrow().dragging
    }

    pub fn config(&self) -> ScrollbarConfig {
        self.shared.state.borrow().config.clone()
    }

    pub fn set_config(&self, config: ScrollbarConfig) {
        self.shared.state.borrow_mut().config = config;
        self.resize();
    }

    /// Recompute the thumb length from the track and the source extents
    pub fn resize(&self) {
        let axis = self.shared.axis;
        let metrics = self.shared.source.metrics();

        let (thumb_size, empty_class) = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }

            let track = self.shared.track.client_size();
            let outer = match axis {
                Axis::Horizontal => track.width,
                Axis::Vertical => track.height,
            };
            let total = metrics.total(axis);
            let visible = metrics.visible(axis);
            let natural = if total > 0.0 && visible > 0.0 {
                outer / (total / visible)
            } else {
                outer
            };
            let thumb_size = natural.max(state.config.min_thumb_size).min(outer);

            state.thumb.outer_size = outer;
            state.thumb.thumb_size = thumb_size;
            (thumb_size, state.class("empty"))
        };

        trace!(?axis, thumb_size, "Scrollbar resized");
        self.shared
            .thumb
            .set_style(axis.size_property(), &format!("{thumb_size}px"));
        self.shared
            .track
            .set_class(&empty_class, metrics.scrollable(axis) <= 0.0);
        self.place(&metrics);
    }

    pub fn set_hovered(&self, hovered: bool) {
        let class = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.thumb.hovered = hovered;
            state.class("hovered")
        };
        self.shared.track.set_class(&class, hovered);
    }

    /// Press on the thumb; starts a thumb drag when dragging is allowed
    pub fn handle_thumb_pointer_down(&self, input: &PointerInput) -> bool {
        let enabled = {
            let state = self.shared.state.borrow();
            state.config.draggable && !state.destroyed
        };
        enabled && self.shared.drag.handle_start(input)
    }

    pub fn destroy(&self) {
        let (subscription, listener, timer) = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.dragging = false;
            (
                state.subscription.take(),
                state.window_listener.take(),
                state.hide_timer.take(),
            )
        };

        let shared = &self.shared;
        if let Some(subscription) = subscription {
            shared.source.unsubscribe(subscription);
        }
        if let Some(id) = listener {
            shared.ctx.window.remove_listener(id);
        }
        if let Some(handle) = timer {
            shared.ctx.host.timers.clear_timeout(handle);
        }
        shared.drag.destroy();
        shared.mount.remove_child(&shared.track);
        debug!(axis = ?shared.axis, "Scrollbar destroyed");
    }

    fn handle_notice(&self, notice: &SourceNotice) {
        if self.shared.state.borrow().destroyed {
            return;
        }
        match notice {
            SourceNotice::Scroll(metrics) => {
                self.place(metrics);
                self.show_in_action();
            }
            SourceNotice::Resize => self.resize(),
        }
    }

    fn place(&self, metrics: &ScrollMetrics) {
        let axis = self.shared.axis;
        let offset = {
            let mut state = self.shared.state.borrow_mut();
            let scrollable = metrics.scrollable(axis);
            let progress = if scrollable > 0.0 {
                clamp(metrics.offset(axis) / scrollable, 0.0, 1.0)
            } else {
                0.0
            };
            let thumb = &mut state.thumb;
            thumb.progress = progress;
            thumb.offset = progress * (thumb.outer_size - thumb.thumb_size).max(0.0);
            thumb.offset
        };

        match axis {
            Axis::Horizontal => self.shared.thumb.set_translate(offset, 0.0),
            Axis::Vertical => self.shared.thumb.set_translate(0.0, offset),
        }
    }

    fn show_in_action(&self) {
        let (previous, delay, class) = {
            let mut state = self.shared.state.borrow_mut();
            (
                state.hide_timer.take(),
                state.config.auto_hide_ms,
                state.class("in-action"),
            )
        };

        let timers = &self.shared.ctx.host.timers;
        if let Some(handle) = previous {
            timers.clear_timeout(handle);
        }
        self.shared.track.set_class(&class, true);

        let weak = Rc::downgrade(&self.shared);
        let handle = timers.set_timeout(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.state.borrow_mut().hide_timer = None;
                    shared.track.set_class(&class, false);
                }
            }),
        );
        self.shared.state.borrow_mut().hide_timer = Some(handle);
    }

    fn handle_drag(&self, event: &DragEvent) {
        let axis = self.shared.axis;
        match event {
            DragEvent::Start(_) => {
                let start = self.shared.source.metrics().offset(axis);
                let class = {
                    let mut state = self.shared.state.borrow_mut();
                    state.thumb.drag_start_scroll = start;
                    state.dragging = true;
                    state.class("dragging")
                };
                self.shared.track.set_class(&class, true);
            }
            DragEvent::Move { diff, .. } => {
                let value = {
                    let state = self.shared.state.borrow();
                    let room = state.thumb.outer_size - state.thumb.thumb_size;
                    if room <= 0.0 {
                        return;
                    }
                    let scrollable = self.shared.source.metrics().scrollable(axis);
                    state.thumb.drag_start_scroll + axis.pick(*diff) * scrollable / room
                };

                let options = match axis {
                    Axis::Horizontal => ScrollToOptions::left(value),
                    Axis::Vertical => ScrollToOptions::top(value),
                };
                self.shared
                    .source
                    .scroll_to(options.with_behavior(self.shared.source.write_behavior()));
            }
            DragEvent::End { .. } | DragEvent::Cancel(_) => {
                let class = {
                    let mut state = self.shared.state.borrow_mut();
                    state.dragging = false;
                    state.class("dragging")
                };
                self.shared.track.set_class(&class, false);
            }
        }
    }
}
