//! Interpolation helpers shared by every animated subsystem.
//!
//! The point-cloud shader in [`crate::foliage`] re-expresses [`ease_in_out_cubic`]
//! in WGSL; both must stay numerically identical.

/// Cubic ease-in-out on `[0, 1]`.
///
/// `t < 0.5 ? 4t³ : 1 − (−2t + 2)³ / 2`
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate independent exponential approach of `current` toward `target`.
///
/// Moves by `(target − current) × min(1, rate × dt)`, so the result always lies
/// between `current` and `target` and never overshoots.
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    let factor = (rate * dt).clamp(0.0, 1.0);
    current + (target - current) * factor
}

/// Hermite smoothstep, matching the WGSL/GLSL builtin.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert!((ease_in_out_cubic(1.0) - 1.0).abs() < 1e-6);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ease_is_monotonic() {
        let mut last = 0.0;
        for i in 1..=100 {
            let v = ease_in_out_cubic(i as f32 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_approach_never_overshoots() {
        // A huge dt would overshoot with a naive lerp(rate * dt)
        assert_eq!(approach(0.2, 1.0, 2.0, 10.0), 1.0);
        assert_eq!(approach(0.8, 0.0, 2.0, 10.0), 0.0);
        let v = approach(0.0, 1.0, 2.0, 0.016);
        assert!(v > 0.0 && v < 1.0);
    }

    #[test]
    fn test_approach_ignores_negative_dt() {
        assert_eq!(approach(0.3, 1.0, 2.0, -1.0), 0.3);
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }
}
