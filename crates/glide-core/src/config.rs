use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
    #[serde(default)]
    pub scrollbar: ScrollbarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Target frame rate of a clock
///
/// Can be specified as the string `"auto"` (follow the display) or as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FpsTarget {
    #[default]
    Auto,
    Fixed(u32),
}

impl FpsTarget {
    /// Minimum time in milliseconds between two emitted frames
    pub fn min_frame_duration(&self) -> f64 {
        match self {
            FpsTarget::Auto => 1.0,
            FpsTarget::Fixed(fps) => 1000.0 / (*fps).max(1) as f64,
        }
    }

    /// Frame rate assumed before any measurement
    pub fn initial_fps(&self) -> f64 {
        match self {
            FpsTarget::Auto => 60.0,
            FpsTarget::Fixed(fps) => (*fps).max(1) as f64,
        }
    }
}

impl std::str::FromStr for FpsTarget {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("auto") {
            return Ok(FpsTarget::Auto);
        }
        match value.parse::<u32>() {
            Ok(fps) if fps > 0 => Ok(FpsTarget::Fixed(fps)),
            _ => Err(crate::Error::InvalidConfig(format!(
                "fps must be \"auto\" or a positive integer, got {value:?}"
            ))),
        }
    }
}

impl Serialize for FpsTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            FpsTarget::Auto => serializer.serialize_str("auto"),
            FpsTarget::Fixed(fps) => serializer.serialize_u32(*fps),
        }
    }
}

// Accept either "auto" or an integer
impl<'de> Deserialize<'de> for FpsTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct FpsTargetVisitor;

        impl<'de> Visitor<'de> for FpsTargetVisitor {
            type Value = FpsTarget;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("the string \"auto\" or a positive frame rate")
            }

            fn visit_str<E>(self, value: &str) -> Result<FpsTarget, E>
            where
                E: de::Error,
            {
                if value.eq_ignore_ascii_case("auto") {
                    return Ok(FpsTarget::Auto);
                }
                value
                    .trim()
                    .parse::<u32>()
                    .map(FpsTarget::Fixed)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
            }

            fn visit_i64<E>(self, value: i64) -> Result<FpsTarget, E>
            where
                E: de::Error,
            {
                u32::try_from(value)
                    .map(FpsTarget::Fixed)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
            }

            fn visit_u64<E>(self, value: u64) -> Result<FpsTarget, E>
            where
                E: de::Error,
            {
                u32::try_from(value)
                    .map(FpsTarget::Fixed)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
            }
        }

        deserializer.deserialize_any(FpsTargetVisitor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Target frame rate ("auto" or a number)
    #[serde(default)]
    pub fps: FpsTarget,
    /// Recompute the measured fps every N frames
    #[serde(default = "default_fps_recalc_frames")]
    pub fps_recalc_frames: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fps: FpsTarget::Auto,
            fps_recalc_frames: default_fps_recalc_frames(),
        }
    }
}

/// How the configured ease is normalized against the real frame duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseMode {
    /// `ease * fpsFactor`
    #[default]
    FpsFactor,
    /// `1 - e^(-ease * 60 * duration / 1000)`
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Interpolation weight per frame at 60fps
    #[serde(default = "default_ease")]
    pub ease: f64,
    #[serde(default)]
    pub ease_mode: EaseMode,
    /// Distance under which interpolation snaps to the target
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// React to wheel input
    #[serde(default = "default_true")]
    pub use_wheel: bool,
    /// Multiplier applied to normalized wheel pixels
    #[serde(default = "default_speed")]
    pub wheel_speed: f64,
    /// Route vertical wheel movement to the horizontal axis
    #[serde(default)]
    pub wheel_to_horizontal: bool,
    /// Scroll by dragging the container
    #[serde(default)]
    pub use_drag: bool,
    /// Multiplier applied to drag steps
    #[serde(default = "default_speed")]
    pub drag_speed: f64,
    /// Debounce for viewport resize events
    #[serde(default = "default_resize_debounce")]
    pub resize_debounce_ms: f64,
    /// Re-measure every N rendered frames when no resize observer exists
    #[serde(default = "default_poll_every")]
    pub poll_every: u64,
    /// Class marking the content wrapper
    #[serde(default = "default_wrapper_class")]
    pub wrapper_class: String,
    /// Attribute carrying a per-element ease override
    #[serde(default = "default_ease_attribute")]
    pub ease_attribute: String,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            ease: default_ease(),
            ease_mode: EaseMode::default(),
            epsilon: default_epsilon(),
            use_wheel: default_true(),
            wheel_speed: default_speed(),
            wheel_to_horizontal: false,
            use_drag: false,
            drag_speed: default_speed(),
            resize_debounce_ms: default_resize_debounce(),
            poll_every: default_poll_every(),
            wrapper_class: default_wrapper_class(),
            ease_attribute: default_ease_attribute(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerConfig {
    /// Travel in pixels after which a press counts as a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,
    /// Disable pointer-events on the dragged element past the threshold
    #[serde(default = "default_true")]
    pub disable_pointer_events: bool,
    /// Deferral of end events before they are reconciled
    #[serde(default)]
    pub end_delay_ms: f64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            drag_threshold: default_drag_threshold(),
            disable_pointer_events: default_true(),
            end_delay_ms: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollbarConfig {
    /// Smallest thumb length in pixels
    #[serde(default = "default_min_thumb_size")]
    pub min_thumb_size: f64,
    /// Delay before the in-action class is removed
    #[serde(default = "default_auto_hide")]
    pub auto_hide_ms: f64,
    /// Prefix for the generated class names
    #[serde(default = "default_class_prefix")]
    pub class_prefix: String,
    /// Allow dragging the thumb
    #[serde(default = "default_true")]
    pub draggable: bool,
}

impl Default for ScrollbarConfig {
    fn default() -> Self {
        Self {
            min_thumb_size: default_min_thumb_size(),
            auto_hide_ms: default_auto_hide(),
            class_prefix: default_class_prefix(),
            draggable: default_true(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_fps_recalc_frames() -> u64 {
    10
}

fn default_ease() -> f64 {
    0.1
}

fn default_epsilon() -> f64 {
    0.001
}

fn default_speed() -> f64 {
    1.0
}

fn default_resize_debounce() -> f64 {
    16.0
}

fn default_poll_every() -> u64 {
    10
}

fn default_wrapper_class() -> String {
    "glide-scroll__wrapper".to_string()
}

fn default_ease_attribute() -> String {
    "data-scroll-ease".to_string()
}

fn default_drag_threshold() -> f64 {
    5.0
}

fn default_min_thumb_size() -> f64 {
    50.0
}

fn default_auto_hide() -> f64 {
    500.0
}

fn default_class_prefix() -> String {
    "glide-scrollbar".to_string()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/glide/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("glide")
            .join("config.toml")
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: &str| Err(crate::Error::InvalidConfig(msg.to_string()));

        let ease = self.scroll.ease;
        if ease.is_nan() || ease <= 0.0 || ease > 1.0 {
            return invalid("scroll.ease must be in (0, 1]");
        }
        // Zero disables the snap and lerp can stall one ulp short of the target
        if self.scroll.epsilon.is_nan() || self.scroll.epsilon <= 0.0 {
            return invalid("scroll.epsilon must be greater than 0");
        }
        if self.scroll.poll_every == 0 {
            return invalid("scroll.poll_every must be at least 1");
        }
        if self.scroll.resize_debounce_ms < 0.0 {
            return invalid("scroll.resize_debounce_ms must not be negative");
        }
        if self.clock.fps == FpsTarget::Fixed(0) {
            return invalid("clock.fps must be \"auto\" or greater than 0");
        }
        if self.clock.fps_recalc_frames == 0 {
            return invalid("clock.fps_recalc_frames must be at least 1");
        }
        if self.pointer.drag_threshold < 0.0 || self.pointer.end_delay_ms < 0.0 {
            return invalid("pointer sizes and delays must not be negative");
        }
        if self.scrollbar.min_thumb_size < 0.0 || self.scrollbar.auto_hide_ms < 0.0 {
            return invalid("scrollbar sizes and delays must not be negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.clock.fps, FpsTarget::Auto);
        assert_eq!(config.clock.fps_recalc_frames, 10);
        assert!((config.scroll.ease - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.scroll.ease_mode, EaseMode::FpsFactor);
        assert_eq!(config.scroll.poll_every, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fps_from_str() {
        assert_eq!("auto".parse::<FpsTarget>().unwrap(), FpsTarget::Auto);
        assert_eq!(" 30 ".parse::<FpsTarget>().unwrap(), FpsTarget::Fixed(30));
        assert!("0".parse::<FpsTarget>().is_err());
        assert!("fast".parse::<FpsTarget>().is_err());
    }

    #[test]
    fn test_fps_accepts_string_or_number() {
        let config: AppConfig = toml::from_str("[clock]\nfps = \"auto\"").unwrap();
        assert_eq!(config.clock.fps, FpsTarget::Auto);

        let config: AppConfig = toml::from_str("[clock]\nfps = 30").unwrap();
        assert_eq!(config.clock.fps, FpsTarget::Fixed(30));

        let config: AppConfig = toml::from_str("[clock]\nfps = \"120\"").unwrap();
        assert_eq!(config.clock.fps, FpsTarget::Fixed(120));

        assert!(toml::from_str::<AppConfig>("[clock]\nfps = \"fast\"").is_err());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: AppConfig = toml::from_str("[scroll]\nease = 0.25\nuse_drag = true").unwrap();
        assert!((config.scroll.ease - 0.25).abs() < f64::EPSILON);
        assert!(config.scroll.use_drag);
        assert_eq!(config.scroll.wrapper_class, "glide-scroll__wrapper");
        assert!((config.scrollbar.min_thumb_size - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_round_trip_keeps_fps() {
        let mut config = AppConfig::default();
        config.clock.fps = FpsTarget::Fixed(24);
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.clock.fps, FpsTarget::Fixed(24));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.scroll.ease = 0.0;
        assert!(matches!(config.validate(), Err(crate::Error::InvalidConfig(_))));

        let mut config = AppConfig::default();
        config.clock.fps = FpsTarget::Fixed(0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scroll.poll_every = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scroll.epsilon = 0.0;
        assert!(matches!(config.validate(), Err(crate::Error::InvalidConfig(_))));

        config.scroll.epsilon = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_frame_duration() {
        assert!((FpsTarget::Auto.min_frame_duration() - 1.0).abs() < f64::EPSILON);
        assert!((FpsTarget::Fixed(50).min_frame_duration() - 20.0).abs() < 1e-9);
    }
}
