use serde::Serialize;

/// One emitted frame of a [`super::ClockSource`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tick {
    /// Strictly increasing frame counter, starting at 1
    pub index: u64,
    /// Host timestamp of the frame in milliseconds
    pub timestamp: f64,
    /// Milliseconds since the previous emitted frame
    pub duration: f64,
    /// Smoothed frame rate
    pub fps: f64,
    /// `60 / fps`, scales per-frame eases to constant speed
    pub fps_factor: f64,
}

impl Tick {
    /// Exponential interpolation factor for this frame's duration
    ///
    /// `1 - e^(-ease * 60 * duration / 1000)`. Longer frames get a larger
    /// factor so the distance covered per second does not depend on frame rate.
    pub fn lerp_factor(&self, ease: f64) -> f64 {
        1.0 - (-ease * 60.0 * self.duration / 1000.0).exp()
    }

    /// `ease` scaled by the fps factor, capped at 1
    pub fn scaled_ease(&self, ease: f64) -> f64 {
        (ease * self.fps_factor).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(duration: f64, fps: f64) -> Tick {
        Tick {
            index: 1,
            timestamp: 0.0,
            duration,
            fps,
            fps_factor: 60.0 / fps,
        }
    }

    #[test]
    fn test_lerp_factor_frame_rate_independent() {
        // Two 60fps frames should cover the same ground as one 30fps frame
        let fast = tick(1000.0 / 60.0, 60.0).lerp_factor(0.1);
        let slow = tick(1000.0 / 30.0, 30.0).lerp_factor(0.1);
        let remaining_fast = (1.0 - fast) * (1.0 - fast);
        let remaining_slow = 1.0 - slow;
        assert!((remaining_fast - remaining_slow).abs() < 1e-12);
    }

    #[test]
    fn test_lerp_factor_zero_duration() {
        assert_eq!(tick(0.0, 60.0).lerp_factor(0.5), 0.0);
    }

    #[test]
    fn test_scaled_ease() {
        assert!((tick(33.3, 30.0).scaled_ease(0.1) - 0.2).abs() < 1e-9);
        assert_eq!(tick(500.0, 1.0).scaled_ease(0.5), 1.0);
    }
}
