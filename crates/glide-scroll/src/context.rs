use std::fmt;
use std::rc::Rc;

use glide_core::Host;

use crate::dom::{Document, ResizeObserver};
use crate::window::Window;

/// Everything a component needs from its environment, passed at construction
#[derive(Clone)]
pub struct Context {
    pub host: Host,
    pub window: Rc<Window>,
    pub document: Rc<dyn Document>,
    /// `None` when the host cannot observe element sizes
    pub resize_observer: Option<Rc<dyn ResizeObserver>>,
}

impl Context {
    pub fn new(host: Host, window: Rc<Window>, document: Rc<dyn Document>) -> Self {
        Self {
            host,
            window,
            document,
            resize_observer: None,
        }
    }

    pub fn with_resize_observer(mut self, observer: Rc<dyn ResizeObserver>) -> Self {
        self.resize_observer = Some(observer);
        self
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("window", &self.window)
            .field("resize_observer", &self.resize_observer.is_some())
            .finish_non_exhaustive()
    }
}
