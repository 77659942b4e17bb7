//! Grain amplitude windows.

use std::f32::consts::PI;

// -------------------------------------------------------------------------------------------------

/// Hann (raised cosine) window: cosine-squared rise and fall over the normalized grain lifetime.
///
/// Returns 0 at phase 0 and 1 and peaks with 1 at phase 0.5. Phases outside of `[0.0, 1.0]`
/// are silent.
#[inline]
pub fn hann_window(phase: f32) -> f32 {
    if !(0.0..=1.0).contains(&phase) {
        return 0.0;
    }
    0.5 * (1.0 - (2.0 * PI * phase).cos())
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_edges_and_peak() {
        assert_eq!(hann_window(0.0), 0.0);
        assert!(hann_window(1.0).abs() < 1e-6);
        assert!((hann_window(0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn silent_outside_of_lifetime() {
        assert_eq!(hann_window(-0.1), 0.0);
        assert_eq!(hann_window(1.1), 0.0);
        assert_eq!(hann_window(f32::NAN), 0.0);
    }

    #[test]
    fn symmetric() {
        for step in 0..=100 {
            let phase = step as f32 / 200.0;
            assert!((hann_window(phase) - hann_window(1.0 - phase)).abs() < 1e-5);
        }
    }
}
