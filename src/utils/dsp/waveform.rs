//! Morphable, non bandlimited oscillator waveforms for grains.

use std::f32::consts::PI;

// -------------------------------------------------------------------------------------------------

/// The anchor waveforms of the shape morph, ordered by their position on the morph axis.
///
/// All anchors are phase aligned: they start at value 0 at phase 0, so grains always start
/// without a discontinuity, no matter which shape is selected.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, strum::Display, strum::EnumString, strum::VariantNames,
)]
pub enum AnchorWaveform {
    #[default]
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl AnchorWaveform {
    /// Shape morph value at which the morphed waveform equals this anchor.
    pub fn shape(&self) -> f32 {
        match self {
            AnchorWaveform::Sine => 0.0,
            AnchorWaveform::Triangle => 1.0 / 3.0,
            AnchorWaveform::Sawtooth => 2.0 / 3.0,
            AnchorWaveform::Square => 1.0,
        }
    }

    /// Evaluate the anchor waveform at the given normalized phase `[0.0, 1.0)`.
    #[inline]
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            AnchorWaveform::Sine => (2.0 * PI * phase).sin(),
            AnchorWaveform::Triangle => {
                // 0 -> +1 at 0.25 -> -1 at 0.75 -> 0
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            AnchorWaveform::Sawtooth => {
                // 0 -> +1 at 0.5, jumps to -1 -> 0
                if phase < 0.5 {
                    2.0 * phase
                } else {
                    2.0 * phase - 2.0
                }
            }
            AnchorWaveform::Square => {
                if phase <= 0.0 {
                    0.0
                } else if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Evaluate the morphed grain waveform at the given normalized `phase` in range `[0.0, 1.0)`.
///
/// `shape` in range `[0.0, 1.0]` crossfades linearly through the anchors in three equal bands:
/// sine -> triangle, triangle -> sawtooth and sawtooth -> square.
#[inline]
pub fn morphed_waveform(phase: f32, shape: f32) -> f32 {
    debug_assert!((0.0..=1.0).contains(&shape), "Invalid shape: {shape}");

    let band_position = shape.clamp(0.0, 1.0) * 3.0;
    let (from, to, mix) = if band_position <= 1.0 {
        (AnchorWaveform::Sine, AnchorWaveform::Triangle, band_position)
    } else if band_position <= 2.0 {
        (
            AnchorWaveform::Triangle,
            AnchorWaveform::Sawtooth,
            band_position - 1.0,
        )
    } else {
        (
            AnchorWaveform::Sawtooth,
            AnchorWaveform::Square,
            band_position - 2.0,
        )
    };
    from.sample(phase) * (1.0 - mix) + to.sample(phase) * mix
}

// -------------------------------------------------------------------------------------------------
