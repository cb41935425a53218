//! In-memory DOM used by tests and the headless simulator
//!
//! Layout is a plain vertical stack: an element without an explicit size is
//! as wide as its widest child and as tall as all children together.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use super::{Document, Element, ElementRef, ObserverId, ResizeObserver, Size};

#[derive(Default)]
pub struct MemoryElement {
    classes: RefCell<BTreeSet<String>>,
    attributes: RefCell<HashMap<String, String>>,
    styles: RefCell<HashMap<String, String>>,
    children: RefCell<Vec<ElementRef>>,
    size: Cell<Option<Size>>,
    content: Cell<Option<Size>>,
    offset: Cell<(f64, f64)>,
    last_scroll_smooth: Cell<Option<bool>>,
    translate: Cell<(f64, f64)>,
    pointer_events: Cell<bool>,
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryElement")
            .field("classes", &self.classes.borrow())
            .field("children", &self.children.borrow().len())
            .field("size", &self.size.get())
            .field("translate", &self.translate.get())
            .finish()
    }
}

impl MemoryElement {
    pub fn new(class: &str) -> Rc<Self> {
        let element = Self {
            pointer_events: Cell::new(true),
            ..Self::default()
        };
        for name in class.split_whitespace() {
            element.classes.borrow_mut().insert(name.to_string());
        }
        Rc::new(element)
    }

    /// Element with a fixed box size
    pub fn sized(class: &str, width: f64, height: f64) -> Rc<Self> {
        let element = Self::new(class);
        element.set_size(Size::new(width, height));
        element
    }

    pub fn set_size(&self, size: Size) {
        self.size.set(Some(size));
    }

    /// Override the content extent instead of deriving it from children
    pub fn set_content_size(&self, size: Size) {
        self.content.set(Some(size));
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn translate(&self) -> (f64, f64) {
        self.translate.get()
    }

    pub fn pointer_events(&self) -> bool {
        self.pointer_events.get()
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.styles.borrow().get(property).cloned()
    }

    /// Whether the last `set_scroll_offset` asked for smooth scrolling
    pub fn last_scroll_smooth(&self) -> Option<bool> {
        self.last_scroll_smooth.get()
    }

    fn layout_size(&self) -> Size {
        self.children
            .borrow()
            .iter()
            .map(|child| child.client_size())
            .fold(Size::default(), |acc, child| Size {
                width: acc.width.max(child.width),
                height: acc.height + child.height,
            })
    }

    fn max_offset(&self) -> (f64, f64) {
        let client = self.client_size();
        let scroll = self.scroll_size();
        (
            (scroll.width - client.width).max(0.0),
            (scroll.height - client.height).max(0.0),
        )
    }
}

impl Element for MemoryElement {
    fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    fn set_class(&self, class: &str, enabled: bool) {
        let mut classes = self.classes.borrow_mut();
        if enabled {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn children(&self) -> Vec<ElementRef> {
        self.children.borrow().clone()
    }

    fn append_child(&self, child: ElementRef) {
        self.children.borrow_mut().push(child);
    }

    fn remove_child(&self, child: &ElementRef) -> bool {
        let mut children = self.children.borrow_mut();
        let before = children.len();
        children.retain(|existing| !Rc::ptr_eq(existing, child));
        children.len() != before
    }

    fn client_size(&self) -> Size {
        self.size.get().unwrap_or_else(|| self.layout_size())
    }

    fn scroll_size(&self) -> Size {
        let client = self.client_size();
        let content = self.content.get().unwrap_or_else(|| self.layout_size());
        Size {
            width: content.width.max(client.width),
            height: content.height.max(client.height),
        }
    }

    fn scroll_offset(&self) -> (f64, f64) {
        self.offset.get()
    }

    fn set_scroll_offset(&self, left: f64, top: f64, smooth: bool) {
        let (max_left, max_top) = self.max_offset();
        self.offset
            .set((left.clamp(0.0, max_left), top.clamp(0.0, max_top)));
        self.last_scroll_smooth.set(Some(smooth));
    }

    fn set_translate(&self, x: f64, y: f64) {
        self.translate.set((x, y));
    }

    fn set_pointer_events(&self, enabled: bool) {
        self.pointer_events.set(enabled);
    }

    fn set_style(&self, property: &str, value: &str) {
        self.styles
            .borrow_mut()
            .insert(property.to_string(), value.to_string());
    }
}

/// Selector registry plus a record of every element it created
#[derive(Default)]
pub struct MemoryDocument {
    registry: RefCell<HashMap<String, ElementRef>>,
    created: RefCell<Vec<Rc<MemoryElement>>>,
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("selectors", &self.registry.borrow().keys().collect::<Vec<_>>())
            .field("created", &self.created.borrow().len())
            .finish()
    }
}

impl MemoryDocument {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Make `element` resolvable through `selector`
    pub fn register(&self, selector: &str, element: ElementRef) {
        self.registry
            .borrow_mut()
            .insert(selector.to_string(), element);
    }

    /// First created element carrying `class`
    pub fn find_created(&self, class: &str) -> Option<Rc<MemoryElement>> {
        self.created
            .borrow()
            .iter()
            .find(|element| element.has_class(class))
            .cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.borrow().len()
    }
}

impl Document for MemoryDocument {
    fn query(&self, selector: &str) -> Option<ElementRef> {
        self.registry.borrow().get(selector).cloned()
    }

    fn create_element(&self, class: &str) -> ElementRef {
        let element = MemoryElement::new(class);
        self.created.borrow_mut().push(Rc::clone(&element));
        element
    }
}

type ObserverEntry = (ObserverId, Vec<ElementRef>, Rc<dyn Fn()>);

/// Resize observer fired manually through [`MemoryResizeObserver::notify`]
#[derive(Default)]
pub struct MemoryResizeObserver {
    next_id: Cell<u64>,
    entries: RefCell<Vec<ObserverEntry>>,
}

impl fmt::Debug for MemoryResizeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryResizeObserver")
            .field("observers", &self.entries.borrow().len())
            .finish()
    }
}

impl MemoryResizeObserver {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Run every observer watching `element`
    pub fn notify(&self, element: &ElementRef) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, targets, _)| targets.iter().any(|target| Rc::ptr_eq(target, element)))
            .map(|(_, _, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    pub fn observer_count(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl ResizeObserver for MemoryResizeObserver {
    fn observe(&self, targets: &[ElementRef], callback: Rc<dyn Fn()>) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries
            .borrow_mut()
            .push((id, targets.to_vec(), callback));
        id
    }

    fn disconnect(&self, id: ObserverId) {
        self.entries.borrow_mut().retain(|(entry, _, _)| *entry != id);
    }
}
