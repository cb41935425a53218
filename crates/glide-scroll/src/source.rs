//! Scroll sources a scrollbar can follow
//!
//! A source is either a native overflow container or a
//! [`VirtualScrollSurface`]. The kind is fixed when the source is built, so
//! consumers branch on the variant instead of probing capabilities.

use std::fmt;
use std::rc::Rc;

use glide_core::{ListenerId, Listeners};
use serde::Serialize;

use crate::dom::ElementRef;
use crate::surface::{
    ScrollBehavior, ScrollBounds, ScrollPosition, ScrollToOptions, SurfaceEvent,
    VirtualScrollSurface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Position and extents read from a source at one instant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollMetrics {
    pub position: ScrollPosition,
    pub bounds: ScrollBounds,
}

impl ScrollMetrics {
    pub fn offset(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.position.left,
            Axis::Vertical => self.position.top,
        }
    }

    /// Full content length along `axis`
    pub fn total(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.bounds.scroll_width,
            Axis::Vertical => self.bounds.scroll_height,
        }
    }

    /// Visible length along `axis`
    pub fn visible(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.bounds.client_width,
            Axis::Vertical => self.bounds.client_height,
        }
    }

    /// Distance the content can travel along `axis`
    pub fn scrollable(&self, axis: Axis) -> f64 {
        (self.total(axis) - self.visible(axis)).max(0.0)
    }
}

struct NativeShared {
    element: ElementRef,
    events: Listeners<ScrollMetrics>,
}

/// Element scrolled by the host's own overflow
///
/// The host calls [`NativeScroll::dispatch_scroll`] from its scroll event.
#[derive(Clone)]
pub struct NativeScroll {
    shared: Rc<NativeShared>,
}

impl fmt::Debug for NativeScroll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeScroll")
            .field("metrics", &self.metrics())
            .field("listeners", &self.shared.events.len())
            .finish()
    }
}

impl NativeScroll {
    pub fn new(element: ElementRef) -> Self {
        Self {
            shared: Rc::new(NativeShared {
                element,
                events: Listeners::new(),
            }),
        }
    }

    pub fn element(&self) -> ElementRef {
        Rc::clone(&self.shared.element)
    }

    pub fn metrics(&self) -> ScrollMetrics {
        let element = &self.shared.element;
        let (left, top) = element.scroll_offset();
        let client = element.client_size();
        let scroll = element.scroll_size();
        ScrollMetrics {
            position: ScrollPosition::new(left, top),
            bounds: ScrollBounds {
                scroll_width: scroll.width,
                scroll_height: scroll.height,
                client_width: client.width,
                client_height: client.height,
            },
        }
    }

    pub fn scroll_to(&self, options: ScrollToOptions) {
        let (left, top) = self.shared.element.scroll_offset();
        self.shared.element.set_scroll_offset(
            options.left.unwrap_or(left),
            options.top.unwrap_or(top),
            options.behavior == ScrollBehavior::Smooth,
        );
    }

    pub fn on(&self, callback: impl Fn(&ScrollMetrics) + 'static) -> ListenerId {
        self.shared.events.add(callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.shared.events.remove(id)
    }

    /// Forward a host scroll event
    pub fn dispatch_scroll(&self) {
        let metrics = self.metrics();
        self.shared.events.emit(&metrics);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceNotice {
    /// Position changed; carries the values of the render that moved it
    Scroll(ScrollMetrics),
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSubscription {
    Native(ListenerId),
    Virtual(ListenerId),
}

#[derive(Debug, Clone)]
pub enum ScrollSource {
    Native(NativeScroll),
    Virtual(VirtualScrollSurface),
}

impl From<NativeScroll> for ScrollSource {
    fn from(native: NativeScroll) -> Self {
        Self::Native(native)
    }
}

impl From<VirtualScrollSurface> for ScrollSource {
    fn from(surface: VirtualScrollSurface) -> Self {
        Self::Virtual(surface)
    }
}

impl ScrollSource {
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }

    pub fn metrics(&self) -> ScrollMetrics {
        match self {
            Self::Native(native) => native.metrics(),
            Self::Virtual(surface) => ScrollMetrics {
                position: surface.position(),
                bounds: surface.bounds(),
            },
        }
    }

    /// Behavior for writes coming from a scrollbar drag
    ///
    /// A virtual surface jumps so the content stays under the thumb; a native
    /// container gets the host's smooth scrolling.
    pub fn write_behavior(&self) -> ScrollBehavior {
        match self {
            Self::Native(_) => ScrollBehavior::Smooth,
            Self::Virtual(_) => ScrollBehavior::Instant,
        }
    }

    pub fn scroll_to(&self, options: ScrollToOptions) {
        match self {
            Self::Native(native) => native.scroll_to(options),
            Self::Virtual(surface) => surface.scroll_to(options),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&SourceNotice) + 'static) -> SourceSubscription {
        match self {
            Self::Native(native) => SourceSubscription::Native(
                native.on(move |metrics| callback(&SourceNotice::Scroll(*metrics))),
            ),
            Self::Virtual(surface) => {
                SourceSubscription::Virtual(surface.on(move |event| match event {
                    SurfaceEvent::Render(snapshot) => callback(&SourceNotice::Scroll(ScrollMetrics {
                        position: snapshot.current,
                        bounds: snapshot.bounds,
                    })),
                    SurfaceEvent::Resize(_) => callback(&SourceNotice::Resize),
                    SurfaceEvent::Wheel(_) => {}
                }))
            }
        }
    }

    pub fn unsubscribe(&self, subscription: SourceSubscription) -> bool {
        match (self, subscription) {
            (Self::Native(native), SourceSubscription::Native(id)) => native.off(id),
            (Self::Virtual(surface), SourceSubscription::Virtual(id)) => surface.off(id),
            _ => false,
        }
    }
}
