//! Minimal DOM surface the engine renders into
//!
//! Components only need a handful of element operations: class toggles,
//! attribute reads, measuring, child moves, translate and a few inline styles.
//! The host implements [`Element`] and [`Document`] over its real tree;
//! [`memory`] provides an in-memory tree for tests and headless runs.

pub mod memory;

use std::rc::Rc;

use serde::Serialize;

pub use memory::{MemoryDocument, MemoryElement, MemoryResizeObserver};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub type ElementRef = Rc<dyn Element>;

pub trait Element {
    fn has_class(&self, class: &str) -> bool;

    fn set_class(&self, class: &str, enabled: bool);

    fn attribute(&self, name: &str) -> Option<String>;

    fn children(&self) -> Vec<ElementRef>;

    fn append_child(&self, child: ElementRef);

    /// Detach `child`, returns false if it is not a child of this element
    fn remove_child(&self, child: &ElementRef) -> bool;

    /// Visible box (`clientWidth` / `clientHeight`)
    fn client_size(&self) -> Size;

    /// Full content extent (`scrollWidth` / `scrollHeight`)
    fn scroll_size(&self) -> Size;

    /// Native scroll offset as `(left, top)`
    fn scroll_offset(&self) -> (f64, f64);

    fn set_scroll_offset(&self, left: f64, top: f64, smooth: bool);

    /// Write a 2D translate transform; `(0, 0)` clears it
    fn set_translate(&self, x: f64, y: f64);

    fn set_pointer_events(&self, enabled: bool);

    fn set_style(&self, property: &str, value: &str);
}

/// Moves every child of `from` into `to`, keeping their order
pub fn move_children(from: &ElementRef, to: &ElementRef) {
    for child in from.children() {
        from.remove_child(&child);
        to.append_child(child);
    }
}

pub trait Document {
    fn query(&self, selector: &str) -> Option<ElementRef>;

    fn create_element(&self, class: &str) -> ElementRef;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Size observation capability (`ResizeObserver` in a browser)
pub trait ResizeObserver {
    fn observe(&self, targets: &[ElementRef], callback: Rc<dyn Fn()>) -> ObserverId;

    fn disconnect(&self, id: ObserverId);
}
