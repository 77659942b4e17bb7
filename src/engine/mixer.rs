//! Stereo grain mixing and density dependent gain compensation.

// -------------------------------------------------------------------------------------------------

/// A single stereo output sample pair.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Mono mixdown of both channels.
    #[inline]
    pub fn mono(&self) -> f32 {
        (self.left + self.right) * 0.5
    }
}

// -------------------------------------------------------------------------------------------------

/// Equal-power panning gains for a pan position in range `[0.0, 1.0]`
/// (0.0 = full left, 1.0 = full right).
#[inline]
pub fn panning_gains(pan: f32) -> (f32, f32) {
    debug_assert!((0.0..=1.0).contains(&pan), "Invalid pan: {pan}");
    let pan = pan.clamp(0.0, 1.0);
    ((1.0 - pan).sqrt(), pan.sqrt())
}

/// Gain compensation for the given number of simultaneously sounding grains.
///
/// Grain phases are uncorrelated, so their power, not their amplitude, sums up: the gain falls
/// with the inverse square root of the count, from 1.0 down to a floor of 0.15.
#[inline]
pub fn density_gain(active_grain_count: usize) -> f32 {
    if active_grain_count == 0 {
        return 1.0;
    }
    (1.0 / (active_grain_count as f32 * 0.5).sqrt()).clamp(
        GrainMixer::MIN_DENSITY_GAIN,
        GrainMixer::MAX_DENSITY_GAIN,
    )
}

// -------------------------------------------------------------------------------------------------

/// Accumulates panned grain samples of a single tick and produces the final, gain compensated
/// and clamped stereo output frame.
#[derive(Debug, Default, Clone)]
pub struct GrainMixer {
    left: f32,
    right: f32,
    grain_count: usize,
}

impl GrainMixer {
    pub const MIN_DENSITY_GAIN: f32 = 0.15;
    pub const MAX_DENSITY_GAIN: f32 = 1.0;

    /// Output values are hard clipped into +/- this range.
    pub const OUTPUT_LIMIT: f32 = 10.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of grains added since the last [`Self::finish`].
    pub fn grain_count(&self) -> usize {
        self.grain_count
    }

    /// Add a single windowed grain sample at the given pan position.
    #[inline]
    pub fn add(&mut self, sample: f32, pan: f32) {
        let (left_gain, right_gain) = panning_gains(pan);
        self.left += sample * left_gain;
        self.right += sample * right_gain;
        self.grain_count += 1;
    }

    /// Apply density compensation and the given linear output gain, clamp, and reset the
    /// accumulator for the next tick.
    #[inline]
    pub fn finish(&mut self, output_gain: f32) -> StereoFrame {
        let gain = density_gain(self.grain_count) * output_gain;
        let frame = StereoFrame {
            left: (self.left * gain).clamp(-Self::OUTPUT_LIMIT, Self::OUTPUT_LIMIT),
            right: (self.right * gain).clamp(-Self::OUTPUT_LIMIT, Self::OUTPUT_LIMIT),
        };
        self.left = 0.0;
        self.right = 0.0;
        self.grain_count = 0;
        frame
    }
}

// -------------------------------------------------------------------------------------------------
