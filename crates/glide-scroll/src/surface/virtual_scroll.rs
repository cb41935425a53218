use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use glide_core::{
    AppConfig, ClockConfig, ClockEvent, ClockSource, EaseMode, Error, ListenerId, Listeners,
    PointerConfig, Result, ScrollConfig, Tick, TimerHandle,
};
use tracing::{debug, trace};

use super::state::{ScrollBehavior, ScrollBounds, ScrollPosition, ScrollSnapshot, ScrollToOptions};
use crate::context::Context;
use crate::dom::{move_children, ElementRef, ObserverId};
use crate::input::{normalize_wheel, NormalizedWheel, PointerInput, WheelInput};
use crate::pointer::{DragEvent, DragTracker};
use crate::window::WindowEvent;

/// Where to find the scroll container
pub enum ContainerRef {
    Selector(String),
    Element(ElementRef),
}

impl From<&str> for ContainerRef {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for ContainerRef {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<ElementRef> for ContainerRef {
    fn from(element: ElementRef) -> Self {
        Self::Element(element)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceOptions {
    pub scroll: ScrollConfig,
    pub clock: ClockConfig,
    pub pointer: PointerConfig,
}

impl From<&AppConfig> for SurfaceOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            scroll: config.scroll.clone(),
            clock: config.clock.clone(),
            pointer: config.pointer.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Measured extents changed
    Resize(ScrollBounds),
    /// Transforms were written for a new position
    Render(ScrollSnapshot),
    Wheel(NormalizedWheel),
}

struct TrackedNode {
    element: ElementRef,
    /// Per-element override of the surface ease
    ease: Option<f64>,
    current: ScrollPosition,
}

impl TrackedNode {
    fn new(element: ElementRef, ease_attribute: &str, current: ScrollPosition) -> Self {
        let ease = element
            .attribute(ease_attribute)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|ease| ease.is_finite() && *ease > 0.0);
        Self {
            element,
            ease,
            current,
        }
    }

    fn write_transform(&self) {
        self.element
            .set_translate(-self.current.left, -self.current.top);
    }
}

struct SurfaceState {
    config: ScrollConfig,
    current: ScrollPosition,
    target: ScrollPosition,
    bounds: ScrollBounds,
    nodes: Vec<TrackedNode>,
    render_count: u64,
    observer: Option<ObserverId>,
    window_listener: Option<ListenerId>,
    resize_timer: Option<TimerHandle>,
    destroyed: bool,
}

impl SurfaceState {
    fn is_settled(&self) -> bool {
        self.current == self.target && self.nodes.iter().all(|node| node.current == self.target)
    }

    fn snapshot(&self, frame: Option<u64>) -> ScrollSnapshot {
        ScrollSnapshot {
            current: self.current,
            target: self.target,
            bounds: self.bounds,
            frame,
        }
    }
}

struct Shared {
    ctx: Context,
    container: ElementRef,
    wrapper: ElementRef,
    created_wrapper: bool,
    clock: ClockSource,
    drag: DragTracker,
    state: RefCell<SurfaceState>,
    events: Listeners<SurfaceEvent>,
}

/// Smooth scrolling over a container with hidden native overflow
///
/// Wheel, drag and programmatic input move a target position; every clock
/// frame moves each tracked child of the wrapper toward that target and
/// writes it as a translate. The clock stops once everything has arrived.
#[derive(Clone)]
pub struct VirtualScrollSurface {
    shared: Rc<Shared>,
}

impl fmt::Debug for VirtualScrollSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("VirtualScrollSurface")
            .field("current", &state.current)
            .field("target", &state.target)
            .field("bounds", &state.bounds)
            .field("nodes", &state.nodes.len())
            .field("clock", &self.shared.clock)
            .finish()
    }
}

fn find_wrapper(container: &ElementRef, class: &str) -> Option<ElementRef> {
    container
        .children()
        .into_iter()
        .find(|child| child.has_class(class))
}

fn frame_ease(mode: EaseMode, ease: f64, tick: &Tick) -> f64 {
    match mode {
        EaseMode::FpsFactor => tick.scaled_ease(ease),
        EaseMode::Exponential => tick.lerp_factor(ease),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

impl VirtualScrollSurface {
    pub fn new(
        ctx: &Context,
        container: impl Into<ContainerRef>,
        options: SurfaceOptions,
    ) -> Result<Self> {
        let SurfaceOptions {
            scroll: config,
            clock: clock_config,
            pointer,
        } = options;

        let container = match container.into() {
            ContainerRef::Selector(selector) => ctx
                .document
                .query(&selector)
                .ok_or(Error::ContainerNotFound(selector))?,
            ContainerRef::Element(element) => element,
        };

        let (wrapper, created_wrapper) = match find_wrapper(&container, &config.wrapper_class) {
            Some(wrapper) => (wrapper, false),
            None => {
                let wrapper = ctx.document.create_element(&config.wrapper_class);
                move_children(&container, &wrapper);
                container.append_child(Rc::clone(&wrapper));
                debug!(class = %config.wrapper_class, "Created content wrapper");
                (wrapper, true)
            }
        };

        let nodes = wrapper
            .children()
            .into_iter()
            .map(|element| TrackedNode::new(element, &config.ease_attribute, ScrollPosition::default()))
            .collect();

        let shared = Rc::new_cyclic(|weak: &Weak<Shared>| {
            let clock = ClockSource::new(&ctx.host, clock_config);
            let on_clock = weak.clone();
            clock.on(move |event| {
                if let ClockEvent::Frame(tick) = event {
                    if let Some(shared) = on_clock.upgrade() {
                        VirtualScrollSurface { shared }.render(tick);
                    }
                }
            });

            let drag = DragTracker::new(ctx, Rc::clone(&container), pointer);
            let on_drag = weak.clone();
            drag.on(move |event| {
                if let Some(shared) = on_drag.upgrade() {
                    VirtualScrollSurface { shared }.handle_drag(event);
                }
            });

            Shared {
                ctx: ctx.clone(),
                container,
                wrapper,
                created_wrapper,
                clock,
                drag,
                state: RefCell::new(SurfaceState {
                    config,
                    current: ScrollPosition::default(),
                    target: ScrollPosition::default(),
                    bounds: ScrollBounds::default(),
                    nodes,
                    render_count: 0,
                    observer: None,
                    window_listener: None,
                    resize_timer: None,
                    destroyed: false,
                }),
                events: Listeners::new(),
            }
        });

        let surface = Self { shared };
        surface.watch_resize();
        surface.resize();
        Ok(surface)
    }

    pub fn container(&self) -> ElementRef {
        Rc::clone(&self.shared.container)
    }

    pub fn wrapper(&self) -> ElementRef {
        Rc::clone(&self.shared.wrapper)
    }

    pub fn clock(&self) -> &ClockSource {
        &self.shared.clock
    }

    pub fn config(&self) -> ScrollConfig {
        self.shared.state.borrow().config.clone()
    }

    pub fn set_config(&self, config: ScrollConfig) {
        self.shared.state.borrow_mut().config = config;
    }

    pub fn on(&self, callback: impl Fn(&SurfaceEvent) + 'static) -> ListenerId {
        self.shared.events.add(callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.shared.events.remove(id)
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.borrow().destroyed
    }

    /// Whether the clock is driving the surface
    pub fn is_animating(&self) -> bool {
        self.shared.clock.is_playing()
    }

    pub fn position(&self) -> ScrollPosition {
        self.shared.state.borrow().current
    }

    pub fn target(&self) -> ScrollPosition {
        self.shared.state.borrow().target
    }

    pub fn bounds(&self) -> ScrollBounds {
        self.shared.state.borrow().bounds
    }

    pub fn snapshot(&self) -> ScrollSnapshot {
        self.shared.state.borrow().snapshot(None)
    }

    pub fn scroll_left(&self) -> f64 {
        self.position().left
    }

    pub fn scroll_top(&self) -> f64 {
        self.position().top
    }

    pub fn target_left(&self) -> f64 {
        self.target().left
    }

    pub fn target_top(&self) -> f64 {
        self.target().top
    }

    pub fn scroll_width(&self) -> f64 {
        self.bounds().scroll_width
    }

    pub fn scroll_height(&self) -> f64 {
        self.bounds().scroll_height
    }

    pub fn client_width(&self) -> f64 {
        self.bounds().client_width
    }

    pub fn client_height(&self) -> f64 {
        self.bounds().client_height
    }

    /// Jump horizontally without interpolation
    pub fn set_scroll_left(&self, left: f64) {
        self.jump(Some(left), None);
    }

    /// Jump vertically without interpolation
    pub fn set_scroll_top(&self, top: f64) {
        self.jump(None, Some(top));
    }

    pub fn set_target_left(&self, left: f64) {
        self.retarget(Some(left), None);
    }

    pub fn set_target_top(&self, top: f64) {
        self.retarget(None, Some(top));
    }

    pub fn scroll_to(&self, options: ScrollToOptions) {
        match options.behavior {
            ScrollBehavior::Instant => self.jump(options.left, options.top),
            ScrollBehavior::Smooth => self.retarget(options.left, options.top),
        }
    }

    /// Move the target by a delta, with interpolation
    pub fn scroll_by(&self, delta_left: f64, delta_top: f64) {
        let target = self.target();
        self.retarget(Some(target.left + delta_left), Some(target.top + delta_top));
    }

    /// Feed one wheel event; returns false when wheel input is disabled
    pub fn handle_wheel(&self, input: &WheelInput) -> bool {
        let (enabled, speed, to_horizontal) = {
            let state = self.shared.state.borrow();
            (
                state.config.use_wheel && !state.destroyed,
                state.config.wheel_speed,
                state.config.wheel_to_horizontal,
            )
        };
        if !enabled {
            return false;
        }

        let wheel = normalize_wheel(input);
        let (delta_left, delta_top) = if to_horizontal {
            (wheel.pixel_x + wheel.pixel_y, 0.0)
        } else {
            (wheel.pixel_x, wheel.pixel_y)
        };
        self.scroll_by(delta_left * speed, delta_top * speed);
        self.shared.events.emit(&SurfaceEvent::Wheel(wheel));
        true
    }

    /// Press on the container; starts a drag when dragging is enabled
    pub fn handle_pointer_down(&self, input: &PointerInput) -> bool {
        let enabled = {
            let state = self.shared.state.borrow();
            state.config.use_drag && !state.destroyed
        };
        enabled && self.shared.drag.handle_start(input)
    }

    /// Track an extra element; `ease` wins over its ease attribute
    pub fn add_element(&self, element: ElementRef, ease: Option<f64>) {
        let mut state = self.shared.state.borrow_mut();
        if state.destroyed || state.nodes.iter().any(|node| Rc::ptr_eq(&node.element, &element)) {
            return;
        }
        let mut node = TrackedNode::new(element, &state.config.ease_attribute, state.current);
        if let Some(ease) = ease.filter(|ease| ease.is_finite() && *ease > 0.0) {
            node.ease = Some(ease);
        }
        node.write_transform();
        state.nodes.push(node);
    }

    /// Stop tracking `element` and clear its transform
    pub fn remove_element(&self, element: &ElementRef) -> bool {
        let mut state = self.shared.state.borrow_mut();
        let Some(index) = state
            .nodes
            .iter()
            .position(|node| Rc::ptr_eq(&node.element, element))
        else {
            return false;
        };
        state.nodes.remove(index).element.set_translate(0.0, 0.0);
        true
    }

    pub fn element_count(&self) -> usize {
        self.shared.state.borrow().nodes.len()
    }

    /// Re-measure the container and wrapper
    pub fn resize(&self) {
        let (changed, retargeted, bounds) = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }

            let client = self.shared.container.client_size();
            let content = self.shared.wrapper.scroll_size();
            let bounds = ScrollBounds {
                scroll_width: content.width.max(client.width),
                scroll_height: content.height.max(client.height),
                client_width: client.width,
                client_height: client.height,
            };

            let changed = bounds != state.bounds;
            state.bounds = bounds;
            let target = bounds.clamp(state.target);
            let retargeted = target != state.target;
            state.target = target;
            (changed, retargeted, bounds)
        };

        if changed {
            debug!(
                scroll_height = bounds.scroll_height,
                client_height = bounds.client_height,
                "Surface resized"
            );
            self.shared.events.emit(&SurfaceEvent::Resize(bounds));
        }
        if retargeted {
            self.shared.clock.play();
        }
    }

    pub fn destroy(&self) {
        let (listener, observer, timer, nodes) = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            (
                state.window_listener.take(),
                state.observer.take(),
                state.resize_timer.take(),
                std::mem::take(&mut state.nodes),
            )
        };

        let shared = &self.shared;
        shared.clock.destroy();
        shared.drag.destroy();
        if let Some(id) = listener {
            shared.ctx.window.remove_listener(id);
        }
        if let (Some(id), Some(resize_observer)) = (observer, &shared.ctx.resize_observer) {
            resize_observer.disconnect(id);
        }
        if let Some(handle) = timer {
            shared.ctx.host.timers.clear_timeout(handle);
        }

        for node in nodes {
            node.element.set_translate(0.0, 0.0);
        }
        if shared.created_wrapper {
            shared.container.remove_child(&shared.wrapper);
            move_children(&shared.wrapper, &shared.container);
        }

        debug!("Scroll surface destroyed");
        shared.events.clear();
    }

    fn watch_resize(&self) {
        let shared = &self.shared;
        let weak = Rc::downgrade(shared);

        if let Some(resize_observer) = &shared.ctx.resize_observer {
            let targets = [Rc::clone(&shared.container), Rc::clone(&shared.wrapper)];
            let id = resize_observer.observe(
                &targets,
                Rc::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        VirtualScrollSurface { shared }.resize();
                    }
                }),
            );
            shared.state.borrow_mut().observer = Some(id);
        } else {
            debug!("No resize observer, polling sizes while rendering");
            let id = shared.ctx.window.add_listener(move |event| {
                if let WindowEvent::Resize(_) = event {
                    if let Some(shared) = weak.upgrade() {
                        VirtualScrollSurface { shared }.schedule_resize();
                    }
                }
            });
            shared.state.borrow_mut().window_listener = Some(id);
        }
    }

    fn schedule_resize(&self) {
        let (previous, delay) = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            (state.resize_timer.take(), state.config.resize_debounce_ms)
        };

        let timers = &self.shared.ctx.host.timers;
        if let Some(handle) = previous {
            timers.clear_timeout(handle);
        }

        let weak = Rc::downgrade(&self.shared);
        let handle = timers.set_timeout(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.state.borrow_mut().resize_timer = None;
                    VirtualScrollSurface { shared }.resize();
                }
            }),
        );
        self.shared.state.borrow_mut().resize_timer = Some(handle);
    }

    fn jump(&self, left: Option<f64>, top: Option<f64>) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            let bounds = state.bounds;
            let SurfaceState {
                current,
                target,
                nodes,
                ..
            } = &mut *state;

            if let Some(left) = finite(left) {
                let left = bounds.clamp_left(left);
                target.left = left;
                current.left = left;
                nodes.iter_mut().for_each(|node| node.current.left = left);
            }
            if let Some(top) = finite(top) {
                let top = bounds.clamp_top(top);
                target.top = top;
                current.top = top;
                nodes.iter_mut().for_each(|node| node.current.top = top);
            }
        }
        self.commit(None);
    }

    fn retarget(&self, left: Option<f64>, top: Option<f64>) {
        let settled = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            let bounds = state.bounds;
            if let Some(left) = finite(left) {
                state.target.left = bounds.clamp_left(left);
            }
            if let Some(top) = finite(top) {
                state.target.top = bounds.clamp_top(top);
            }
            state.is_settled()
        };

        if !settled {
            self.shared.clock.play();
        }
    }

    fn render(&self, tick: &Tick) {
        let poll = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.render_count += 1;
            self.shared.ctx.resize_observer.is_none()
                && state.render_count % state.config.poll_every.max(1) == 0
        };
        if poll {
            self.resize();
        }

        {
            let mut state = self.shared.state.borrow_mut();
            let SurfaceState {
                config,
                current,
                target,
                nodes,
                ..
            } = &mut *state;

            let ease = frame_ease(config.ease_mode, config.ease, tick);
            *current = current.lerp_to(*target, ease, config.epsilon);
            for node in nodes.iter_mut() {
                let ease = frame_ease(config.ease_mode, node.ease.unwrap_or(config.ease), tick);
                node.current = node.current.lerp_to(*target, ease, config.epsilon);
            }
        }

        self.commit(Some(tick.index));
    }

    /// Write every transform, publish the snapshot, stop the clock when settled
    fn commit(&self, frame: Option<u64>) {
        let snapshot = {
            let state = self.shared.state.borrow();
            state.nodes.iter().for_each(TrackedNode::write_transform);
            state.snapshot(frame)
        };
        self.shared.events.emit(&SurfaceEvent::Render(snapshot));

        let settled = self.shared.state.borrow().is_settled();
        if settled && self.shared.clock.pause() {
            trace!(top = snapshot.current.top, "Surface settled");
        }
    }

    fn handle_drag(&self, event: &DragEvent) {
        if let DragEvent::Move { step, .. } = event {
            let speed = self.shared.state.borrow().config.drag_speed;
            self.scroll_by(-step.x * speed, -step.y * speed);
        }
    }
}
