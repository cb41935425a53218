//! Pure numeric primitives shared by every animated component
//!
//! Nothing here holds state. `lerp` snaps to its target once the remaining
//! distance is within `epsilon`, which is what lets an eased value actually
//! arrive instead of approaching forever.

/// Default snap distance for [`lerp`]
pub const DEFAULT_EPSILON: f64 = 0.001;

/// Clamp `value` into `[min, max]`
///
/// Unlike `f64::clamp` this never panics: when `min > max` the result is `min`.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Blend `current` toward `target` by `ease`
///
/// Returns `target` exactly when the blended value lands within `epsilon` of it.
#[inline]
pub fn lerp(current: f64, target: f64, ease: f64, epsilon: f64) -> f64 {
    let value = current * (1.0 - ease) + target * ease;
    if (target - value).abs() <= epsilon {
        target
    } else {
        value
    }
}

/// Position of `value` inside `scope`, where `scope.0` maps to 0 and `scope.1` to 1
///
/// A zero-length scope yields 0.
#[inline]
pub fn scoped(value: f64, scope: (f64, f64)) -> f64 {
    let (start, end) = scope;
    let length = end - start;
    if length == 0.0 {
        return 0.0;
    }
    (value - start) / length
}

/// [`scoped`] followed by [`clamp`] into `bounds`
#[inline]
pub fn clamp_scope(value: f64, scope: (f64, f64), bounds: (f64, f64)) -> f64 {
    clamp(scoped(value, scope), bounds.0, bounds.1)
}
