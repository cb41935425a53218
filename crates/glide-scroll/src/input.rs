use serde::Serialize;

/// Pointer id reported for the mouse; touch identifiers are never negative
pub const MOUSE_POINTER_ID: i64 = -1;

/// `MouseEvent.button` of the primary button
pub const PRIMARY_BUTTON: i16 = 0;

// Wheel normalization constants
const PIXEL_STEP: f64 = 10.0;
const LINE_HEIGHT: f64 = 40.0;
const PAGE_HEIGHT: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// One mouse or touch event, reduced to what the trackers need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub kind: PointerKind,
    pub pointer_id: i64,
    pub button: i16,
    pub x: f64,
    pub y: f64,
}

impl PointerInput {
    fn mouse(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            phase,
            kind: PointerKind::Mouse,
            pointer_id: MOUSE_POINTER_ID,
            button: PRIMARY_BUTTON,
            x,
            y,
        }
    }

    fn touch(phase: PointerPhase, id: i64, x: f64, y: f64) -> Self {
        Self {
            phase,
            kind: PointerKind::Touch,
            pointer_id: id,
            button: PRIMARY_BUTTON,
            x,
            y,
        }
    }

    pub fn mouse_down(x: f64, y: f64) -> Self {
        Self::mouse(PointerPhase::Start, x, y)
    }

    pub fn mouse_move(x: f64, y: f64) -> Self {
        Self::mouse(PointerPhase::Move, x, y)
    }

    pub fn mouse_up(x: f64, y: f64) -> Self {
        Self::mouse(PointerPhase::End, x, y)
    }

    pub fn touch_start(id: i64, x: f64, y: f64) -> Self {
        Self::touch(PointerPhase::Start, id, x, y)
    }

    pub fn touch_move(id: i64, x: f64, y: f64) -> Self {
        Self::touch(PointerPhase::Move, id, x, y)
    }

    pub fn touch_end(id: i64, x: f64, y: f64) -> Self {
        Self::touch(PointerPhase::End, id, x, y)
    }

    pub fn touch_cancel(id: i64) -> Self {
        Self::touch(PointerPhase::Cancel, id, 0.0, 0.0)
    }

    pub fn with_button(mut self, button: i16) -> Self {
        self.button = button;
        self
    }
}

/// `WheelEvent.deltaMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

/// Raw wheel event fields, including the legacy vendor ones
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_mode: DeltaMode,
    /// Legacy `wheelDelta` in 120ths of a notch, positive when scrolling up
    pub wheel_delta: Option<f64>,
    pub wheel_delta_x: Option<f64>,
    pub wheel_delta_y: Option<f64>,
    /// Legacy `detail` line count
    pub detail: Option<f64>,
}

impl WheelInput {
    pub fn pixels(delta_x: f64, delta_y: f64) -> Self {
        Self {
            delta_x,
            delta_y,
            ..Self::default()
        }
    }

    pub fn lines(delta_x: f64, delta_y: f64) -> Self {
        Self {
            delta_x,
            delta_y,
            delta_mode: DeltaMode::Line,
            ..Self::default()
        }
    }
}

/// Wheel movement reconciled across browsers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NormalizedWheel {
    /// Notches, sign gives direction
    pub spin_x: f64,
    pub spin_y: f64,
    /// Movement in pixels
    pub pixel_x: f64,
    pub pixel_y: f64,
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|value| *value != 0.0)
}

/// Reconcile `wheelDelta`, `detail`, `deltaX/Y` and `deltaMode` into pixels
pub fn normalize_wheel(input: &WheelInput) -> NormalizedWheel {
    let mut spin_x = 0.0;
    let mut spin_y = 0.0;

    if let Some(detail) = nonzero(input.detail) {
        spin_y = detail;
    }
    if let Some(delta) = nonzero(input.wheel_delta) {
        spin_y = -delta / 120.0;
    }
    if let Some(delta) = nonzero(input.wheel_delta_y) {
        spin_y = -delta / 120.0;
    }
    if let Some(delta) = nonzero(input.wheel_delta_x) {
        spin_x = -delta / 120.0;
    }

    let mut pixel_x = spin_x * PIXEL_STEP;
    let mut pixel_y = spin_y * PIXEL_STEP;

    if input.delta_y != 0.0 {
        pixel_y = input.delta_y;
    }
    if input.delta_x != 0.0 {
        pixel_x = input.delta_x;
    }

    if pixel_x != 0.0 || pixel_y != 0.0 {
        let scale = match input.delta_mode {
            DeltaMode::Pixel => 1.0,
            DeltaMode::Line => LINE_HEIGHT,
            DeltaMode::Page => PAGE_HEIGHT,
        };
        pixel_x *= scale;
        pixel_y *= scale;
    }

    if pixel_x != 0.0 && spin_x == 0.0 {
        spin_x = if pixel_x < 1.0 { -1.0 } else { 1.0 };
    }
    if pixel_y != 0.0 && spin_y == 0.0 {
        spin_y = if pixel_y < 1.0 { -1.0 } else { 1.0 };
    }

    NormalizedWheel {
        spin_x,
        spin_y,
        pixel_x,
        pixel_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_delta_passes_through() {
        let wheel = normalize_wheel(&WheelInput::pixels(0.0, 120.0));
        assert_eq!(wheel.pixel_y, 120.0);
        assert_eq!(wheel.pixel_x, 0.0);
        assert_eq!(wheel.spin_y, 1.0);
    }

    #[test]
    fn test_line_mode_scaled() {
        let wheel = normalize_wheel(&WheelInput::lines(0.0, 3.0));
        assert_eq!(wheel.pixel_y, 120.0);
    }

    #[test]
    fn test_page_mode_scaled() {
        let wheel = normalize_wheel(&WheelInput {
            delta_y: -1.0,
            delta_mode: DeltaMode::Page,
            ..WheelInput::default()
        });
        assert_eq!(wheel.pixel_y, -800.0);
        assert_eq!(wheel.spin_y, -1.0);
    }

    #[test]
    fn test_legacy_wheel_delta() {
        // One notch down reported by an old engine: wheelDelta is -120
        let wheel = normalize_wheel(&WheelInput {
            wheel_delta: Some(-120.0),
            ..WheelInput::default()
        });
        assert_eq!(wheel.spin_y, 1.0);
        assert_eq!(wheel.pixel_y, 10.0);
    }

    #[test]
    fn test_delta_wins_over_legacy() {
        let wheel = normalize_wheel(&WheelInput {
            delta_y: 53.0,
            wheel_delta_y: Some(-120.0),
            ..WheelInput::default()
        });
        assert_eq!(wheel.spin_y, 1.0);
        assert_eq!(wheel.pixel_y, 53.0);
    }

    #[test]
    fn test_horizontal_legacy() {
        let wheel = normalize_wheel(&WheelInput {
            wheel_delta_x: Some(240.0),
            ..WheelInput::default()
        });
        assert_eq!(wheel.spin_x, -2.0);
        assert_eq!(wheel.pixel_x, -20.0);
    }

    #[test]
    fn test_pointer_constructors() {
        let down = PointerInput::mouse_down(4.0, 5.0);
        assert_eq!(down.kind, PointerKind::Mouse);
        assert_eq!(down.pointer_id, MOUSE_POINTER_ID);
        assert_eq!(down.with_button(2).button, 2);

        let touch = PointerInput::touch_move(3, 1.0, 2.0);
        assert_eq!(touch.phase, PointerPhase::Move);
        assert_eq!(touch.pointer_id, 3);
    }
}
