use std::rc::Rc;

use glide_core::{Host, ManualHost, PointerConfig, ScrollConfig, ScrollbarConfig};
use glide_scroll::dom::{Element, ElementRef, MemoryDocument, MemoryElement, Size};
use glide_scroll::{
    Axis, Context, ScrollToOptions, ScrollbarSync, SurfaceOptions, VirtualScrollSurface,
    WheelInput, Window,
};

const FRAME_MS: f64 = 1000.0 / 60.0;

struct Page {
    host: Rc<ManualHost>,
    document: Rc<MemoryDocument>,
    ctx: Context,
}

impl Page {
    fn new() -> Self {
        let host = ManualHost::new();
        let document = MemoryDocument::new();
        let ctx = Context::new(
            Host::manual(&host),
            Window::new(Size::new(800.0, 500.0)),
            document.clone(),
        );
        Self {
            host,
            document,
            ctx,
        }
    }

    fn container(&self, children: &[Rc<MemoryElement>]) -> ElementRef {
        let container = MemoryElement::sized("page", 800.0, 500.0);
        for child in children {
            container.append_child(child.clone());
        }
        self.document.register("#page", container.clone());
        container
    }

    fn surface(&self, scroll: ScrollConfig) -> VirtualScrollSurface {
        VirtualScrollSurface::new(
            &self.ctx,
            "#page",
            SurfaceOptions {
                scroll,
                ..SurfaceOptions::default()
            },
        )
        .unwrap()
    }

    fn frames(&self, count: usize) {
        for _ in 0..count {
            self.host.advance(FRAME_MS);
        }
    }
}

#[test]
fn scroll_to_past_end_targets_max() {
    let page = Page::new();
    page.container(&[MemoryElement::sized("content", 800.0, 2000.0)]);
    let surface = page.surface(ScrollConfig::default());

    assert_eq!(surface.scroll_height(), 2000.0);
    assert_eq!(surface.client_height(), 500.0);

    surface.scroll_to(ScrollToOptions::top(5000.0).smooth());
    assert_eq!(surface.target_top(), 1500.0);
}

#[test]
fn wheel_notch_moves_target_by_its_pixels() {
    let page = Page::new();
    page.container(&[MemoryElement::sized("content", 800.0, 2000.0)]);
    let surface = page.surface(ScrollConfig::default());

    surface.handle_wheel(&WheelInput::pixels(0.0, 120.0));
    assert_eq!(surface.target_top(), 120.0);

    // Far past the end is clamped
    surface.handle_wheel(&WheelInput::lines(0.0, 100.0));
    assert_eq!(surface.target_top(), 1500.0);
}

#[test]
fn faster_node_is_closer_after_same_ticks() {
    let page = Page::new();
    let a = MemoryElement::sized("a", 800.0, 1000.0);
    a.set_attribute("data-scroll-ease", "0.5");
    let b = MemoryElement::sized("b", 800.0, 1000.0);
    page.container(&[a.clone(), b.clone()]);
    let surface = page.surface(ScrollConfig::default());

    surface.set_target_top(1200.0);
    page.frames(8);

    let target = surface.target_top();
    let gap_a = (-a.translate().1 - target).abs();
    let gap_b = (-b.translate().1 - target).abs();
    assert!(gap_a < gap_b, "a={gap_a} b={gap_b}");
}

#[test]
fn instant_set_needs_no_frames() {
    let page = Page::new();
    page.container(&[MemoryElement::sized("content", 800.0, 2000.0)]);
    let surface = page.surface(ScrollConfig::default());

    surface.set_scroll_top(9000.0);
    assert_eq!(surface.scroll_top(), 1500.0);
    assert_eq!(surface.target_top(), 1500.0);
    assert_eq!(page.host.frames_fired(), 0);
}

#[test]
fn settles_and_resumes_on_new_input() {
    let page = Page::new();
    page.container(&[MemoryElement::sized("content", 800.0, 2000.0)]);
    let surface = page.surface(ScrollConfig::default());

    surface.set_target_top(300.0);
    page.frames(400);
    assert!(!surface.is_animating());
    assert_eq!(surface.scroll_top(), 300.0);
    assert_eq!(page.host.pending_frames(), 0);

    let fired = page.host.frames_fired();
    page.frames(10);
    assert_eq!(page.host.frames_fired(), fired);

    surface.handle_wheel(&WheelInput::pixels(0.0, 50.0));
    assert!(surface.is_animating());
    page.frames(400);
    assert_eq!(surface.scroll_top(), 350.0);
}

#[test]
fn scrollbar_tracks_start_and_end() {
    let page = Page::new();
    page.container(&[MemoryElement::sized("content", 800.0, 2000.0)]);
    let surface = page.surface(ScrollConfig::default());
    let mount = MemoryElement::new("chrome");
    let bar = ScrollbarSync::new(
        &page.ctx,
        surface.clone(),
        Axis::Vertical,
        mount,
        ScrollbarConfig::default(),
        PointerConfig::default(),
    )
    .unwrap();
    let track = page.document.find_created("glide-scrollbar--y").unwrap();
    let thumb = page.document.find_created("glide-scrollbar__thumb").unwrap();
    track.set_size(Size::new(8.0, 500.0));
    bar.resize();

    assert_eq!(bar.thumb_state().progress, 0.0);
    assert_eq!(thumb.translate(), (0.0, 0.0));

    surface.scroll_to(ScrollToOptions::top(1500.0).smooth());
    page.frames(400);

    let state = bar.thumb_state();
    assert_eq!(state.progress, 1.0);
    assert_eq!(thumb.translate(), (0.0, state.outer_size - state.thumb_size));
}

#[test]
fn scrollbar_matches_every_render() {
    let page = Page::new();
    page.container(&[MemoryElement::sized("content", 800.0, 2000.0)]);
    let surface = page.surface(ScrollConfig::default());
    let bar = ScrollbarSync::new(
        &page.ctx,
        surface.clone(),
        Axis::Vertical,
        MemoryElement::new("chrome"),
        ScrollbarConfig::default(),
        PointerConfig::default(),
    )
    .unwrap();

    let observed = Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = Rc::clone(&observed);
    let reader = bar.clone();
    surface.on(move |event| {
        if let glide_scroll::SurfaceEvent::Render(snapshot) = event {
            sink.borrow_mut()
                .push((snapshot.current.top / 1500.0, reader.thumb_state().progress));
        }
    });

    surface.set_target_top(1500.0);
    page.frames(30);

    assert!(!observed.borrow().is_empty());
    for (expected, progress) in observed.borrow().iter() {
        assert_eq!(expected, progress);
    }
}

#[test]
fn destroyed_surface_ignores_frames() {
    let page = Page::new();
    let content = MemoryElement::sized("content", 800.0, 2000.0);
    let container = page.container(&[content.clone()]);
    let surface = page.surface(ScrollConfig::default());

    surface.set_target_top(800.0);
    page.frames(3);
    surface.destroy();
    page.frames(3);

    assert_eq!(content.translate(), (0.0, 0.0));
    assert_eq!(container.children().len(), 1);
    assert_eq!(page.host.pending_frames(), 0);
    assert_eq!(page.host.pending_timers(), 0);
}

#[test]
fn missing_animation_frames_never_tick() {
    let host = ManualHost::without_frames();
    let document = MemoryDocument::new();
    let container = MemoryElement::sized("page", 800.0, 500.0);
    container.append_child(MemoryElement::sized("content", 800.0, 2000.0));
    document.register("#page", container);
    let ctx = Context::new(Host::manual(&host), Window::new(Size::default()), document);

    let surface = VirtualScrollSurface::new(&ctx, "#page", SurfaceOptions::default()).unwrap();
    surface.set_target_top(400.0);
    host.advance(FRAME_MS);
    host.advance(FRAME_MS);

    assert_eq!(surface.scroll_top(), 0.0);
    assert_eq!(surface.target_top(), 400.0);

    // Instant writes still work without frames
    surface.set_scroll_top(400.0);
    assert_eq!(surface.scroll_top(), 400.0);
}
