//! Window-level event routing
//!
//! The host forwards global pointer, blur and resize events here. Components
//! attach listeners only for as long as they need them, so the number of
//! live listeners is observable through [`Window::listener_count`].

use std::cell::Cell;
use std::rc::Rc;

use glide_core::{ListenerId, Listeners};

use crate::dom::Size;
use crate::input::PointerInput;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    Pointer(PointerInput),
    Blur,
    Resize(Size),
}

#[derive(Debug, Default)]
pub struct Window {
    size: Cell<Size>,
    listeners: Listeners<WindowEvent>,
}

impl Window {
    pub fn new(size: Size) -> Rc<Self> {
        Rc::new(Self {
            size: Cell::new(size),
            listeners: Listeners::new(),
        })
    }

    /// Viewport size
    pub fn size(&self) -> Size {
        self.size.get()
    }

    pub fn add_listener(&self, callback: impl Fn(&WindowEvent) + 'static) -> ListenerId {
        self.listeners.add(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn dispatch(&self, event: &WindowEvent) {
        if let WindowEvent::Resize(size) = event {
            self.size.set(*size);
        }
        self.listeners.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_resize_updates_size_before_listeners() {
        let window = Window::new(Size::new(800.0, 600.0));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&window);
        let sink = Rc::clone(&seen);
        window.add_listener(move |_| {
            if let Some(window) = weak.upgrade() {
                sink.borrow_mut().push(window.size());
            }
        });

        window.dispatch(&WindowEvent::Resize(Size::new(1024.0, 768.0)));
        assert_eq!(*seen.borrow(), vec![Size::new(1024.0, 768.0)]);
    }

    #[test]
    fn test_listener_count() {
        let window = Window::new(Size::default());
        let id = window.add_listener(|_| {});
        assert_eq!(window.listener_count(), 1);
        window.remove_listener(id);
        assert_eq!(window.listener_count(), 0);
    }
}
