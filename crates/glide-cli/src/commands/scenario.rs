use std::rc::Rc;

use anyhow::{ensure, Context as _, Result};
use clap::Args;

use glide_core::{AppConfig, FpsTarget, Host, ManualHost};
use glide_scroll::dom::{Element, MemoryDocument, MemoryElement, Size};
use glide_scroll::{
    Axis, Context, ScrollToOptions, ScrollbarSync, VirtualScrollSurface, WheelInput, Window,
};

const CONTAINER_SELECTOR: &str = "#viewport";
const SCROLLBAR_THICKNESS: f64 = 8.0;

/// Page layout and inputs shared by `simulate` and `watch`
#[derive(Args, Debug, Clone)]
pub struct ScenarioArgs {
    /// Viewport width in pixels
    #[arg(long, default_value_t = 800.0)]
    pub width: f64,
    /// Viewport height in pixels
    #[arg(long, default_value_t = 600.0)]
    pub height: f64,
    /// Content height in pixels
    #[arg(long, default_value_t = 3000.0)]
    pub content_height: f64,
    /// Content width in pixels (defaults to the viewport width)
    #[arg(long)]
    pub content_width: Option<f64>,
    /// Scroll to this offset
    #[arg(short = 't', long)]
    pub scroll_to: Option<f64>,
    /// Jump instead of animating `--scroll-to`
    #[arg(long)]
    pub instant: bool,
    /// Vertical wheel deltas in pixels, applied in order
    #[arg(short, long, allow_negative_numbers = true)]
    pub wheel: Vec<f64>,
    /// Clock frame rate: "auto" or a number
    #[arg(long)]
    pub fps: Option<FpsTarget>,
    /// Override the scroll ease
    #[arg(long)]
    pub ease: Option<f64>,
    /// Display refresh rate of the simulated host
    #[arg(long, default_value_t = 60.0)]
    pub refresh: f64,
}

impl ScenarioArgs {
    /// Milliseconds between two host frames
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.refresh.max(1.0)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.refresh.is_finite() && self.refresh > 0.0,
            "--refresh must be a finite rate above 0, got {}",
            self.refresh
        );
        for (name, value) in [
            ("--width", self.width),
            ("--height", self.height),
            ("--content-height", self.content_height),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be a finite size, got {value}"
            );
        }
        if let Some(width) = self.content_width {
            ensure!(
                width.is_finite() && width >= 0.0,
                "--content-width must be a finite size, got {width}"
            );
        }
        Ok(())
    }
}

/// A headless page: one virtual surface with a vertical scrollbar
pub struct Rig {
    pub host: Rc<ManualHost>,
    pub surface: VirtualScrollSurface,
    pub scrollbar: ScrollbarSync,
}

impl Rig {
    pub fn build(config: &AppConfig, args: &ScenarioArgs) -> Result<Self> {
        args.validate()?;
        let mut config = config.clone();
        if let Some(fps) = args.fps {
            config.clock.fps = fps;
        }
        if let Some(ease) = args.ease {
            config.scroll.ease = ease;
        }
        config.validate()?;

        let host = ManualHost::new();
        let window = Window::new(Size::new(args.width, args.height));
        let document = MemoryDocument::new();

        let container = MemoryElement::sized("viewport", args.width, args.height);
        container.append_child(MemoryElement::sized(
            "content",
            args.content_width.unwrap_or(args.width),
            args.content_height,
        ));
        document.register(CONTAINER_SELECTOR, container);
        let chrome = MemoryElement::new("chrome");

        let ctx = Context::new(Host::manual(&host), window, document.clone());
        let surface = VirtualScrollSurface::new(&ctx, CONTAINER_SELECTOR, (&config).into())?;
        let scrollbar = ScrollbarSync::new(
            &ctx,
            surface.clone(),
            Axis::Vertical,
            chrome,
            config.scrollbar.clone(),
            config.pointer.clone(),
        )?;

        let track_class = format!("{}--y", config.scrollbar.class_prefix);
        let track = document
            .find_created(&track_class)
            .with_context(|| format!("Scrollbar track .{track_class} was not created"))?;
        track.set_size(Size::new(SCROLLBAR_THICKNESS, args.height));
        scrollbar.resize();

        Ok(Self {
            host,
            surface,
            scrollbar,
        })
    }

    /// Feed the wheel deltas, then the scroll request
    pub fn apply_inputs(&self, args: &ScenarioArgs) {
        for delta in &args.wheel {
            self.surface.handle_wheel(&WheelInput::pixels(0.0, *delta));
        }
        if let Some(top) = args.scroll_to {
            let options = ScrollToOptions::top(top);
            self.surface
                .scroll_to(if args.instant { options } else { options.smooth() });
        }
    }
}

#[cfg(test)]
pub(crate) fn args(content_height: f64) -> ScenarioArgs {
    ScenarioArgs {
        width: 800.0,
        height: 500.0,
        content_height,
        content_width: None,
        scroll_to: None,
        instant: false,
        wheel: Vec::new(),
        fps: None,
        ease: None,
        refresh: 60.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rig_measures_layout() {
        let rig = Rig::build(&AppConfig::default(), &args(2000.0)).unwrap();
        assert_eq!(rig.surface.bounds().max_top(), 1500.0);
        assert_eq!(rig.scrollbar.thumb_state().thumb_size, 125.0);
        assert_eq!(rig.scrollbar.thumb_state().outer_size, 500.0);
    }

    #[test]
    fn test_rig_rejects_unusable_refresh() {
        for refresh in [f64::INFINITY, f64::NAN, 0.0, -60.0] {
            let mut scenario = args(2000.0);
            scenario.refresh = refresh;
            let err = Rig::build(&AppConfig::default(), &scenario).err();
            assert!(
                err.is_some_and(|e| e.to_string().contains("--refresh")),
                "refresh {refresh} was accepted"
            );
        }
    }

    #[test]
    fn test_rig_rejects_infinite_sizes() {
        let mut scenario = args(f64::INFINITY);
        assert!(Rig::build(&AppConfig::default(), &scenario).is_err());

        scenario.content_height = 2000.0;
        scenario.content_width = Some(f64::NAN);
        assert!(Rig::build(&AppConfig::default(), &scenario).is_err());
    }

    #[test]
    fn test_rig_rejects_bad_ease() {
        let mut scenario = args(2000.0);
        scenario.ease = Some(3.0);
        assert!(Rig::build(&AppConfig::default(), &scenario).is_err());
    }

    #[test]
    fn test_wheel_then_scroll_to() {
        let rig = Rig::build(&AppConfig::default(), &args(2000.0)).unwrap();
        let mut scenario = args(2000.0);
        scenario.wheel = vec![120.0, 120.0];
        rig.apply_inputs(&scenario);
        assert_eq!(rig.surface.target_top(), 240.0);

        scenario.wheel.clear();
        scenario.scroll_to = Some(900.0);
        scenario.instant = true;
        rig.apply_inputs(&scenario);
        assert_eq!(rig.surface.scroll_top(), 900.0);
    }
}
