//! Resolved, per-tick parameters of the granular engine.

use std::ops::RangeInclusive;

use crate::{
    utils::{db_to_linear, linear_to_db},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Parameters controlling the granular engine's streams, grain spawning and output.
///
/// Values are expected to be resolved already: the engine consumes them as they are each tick.
/// Use [`GranularParameters::validate`] or [`GranularParameters::clamped`] when values come
/// from untrusted sources.
#[derive(Clone, Debug, PartialEq)]
pub struct GranularParameters {
    /// Center frequency of spawned grains in Hz (50.0 - 2000.0).
    pub frequency: f32,
    /// Number of concurrently running grain streams (1 - 20).
    pub streams: usize,
    /// Waveform morph (0.0 = sine, 1/3 = triangle, 2/3 = sawtooth, 1.0 = square).
    pub shape: f32,
    /// Frequency spread range in Hz around the center frequency (0.0 - 500.0).
    pub range: f32,
    /// Base grain duration in seconds (0.001 - 0.1).
    pub duration: f32,
    /// Retrigger delay in seconds (0.0001 - 0.2).
    /// Overrides the density based retrigger interval when above [`Self::DELAY_OVERRIDE_THRESHOLD`].
    pub delay: f32,
    /// Grain density in grains per second and stream (1.0 - 1000.0).
    pub density: f32,
    /// Amount of randomization of pitch, duration and retrigger timing (0.0 - 1.0).
    pub variation: f32,
    /// Random stereo spread of grains (0.0 = center, 1.0 = full left/right).
    pub spread: f32,
    /// Linear output gain (0.0 - 1.0).
    pub gain: f32,
}

impl Default for GranularParameters {
    fn default() -> Self {
        Self {
            frequency: 130.81,
            streams: 10,
            shape: 0.0,
            range: 100.0,
            duration: 0.02,
            delay: 0.0001,
            density: 100.0,
            variation: 0.5,
            spread: 0.5,
            gain: 1.0,
        }
    }
}

impl GranularParameters {
    pub const FREQUENCY_RANGE: RangeInclusive<f32> = 50.0..=2000.0;
    pub const STREAMS_RANGE: RangeInclusive<usize> = 1..=20;
    pub const SHAPE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    pub const RANGE_RANGE: RangeInclusive<f32> = 0.0..=500.0;
    pub const DURATION_RANGE: RangeInclusive<f32> = 0.001..=0.1;
    pub const DELAY_RANGE: RangeInclusive<f32> = 0.0001..=0.2;
    pub const DENSITY_RANGE: RangeInclusive<f32> = 1.0..=1000.0;
    pub const VARIATION_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    pub const SPREAD_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    pub const GAIN_RANGE: RangeInclusive<f32> = 0.0..=1.0;

    /// Delay values above this threshold replace the density derived retrigger interval.
    pub const DELAY_OVERRIDE_THRESHOLD: f32 = 0.0002;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_streams(mut self, streams: usize) -> Self {
        self.streams = streams;
        self
    }

    pub fn with_shape(mut self, shape: f32) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_variation(mut self, variation: f32) -> Self {
        self.variation = variation;
        self
    }

    pub fn with_spread(mut self, spread: f32) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Set the output gain in decibels. Values above 0 dB are clamped.
    pub fn with_gain_db(mut self, gain_db: f32) -> Self {
        self.gain = db_to_linear(gain_db.min(0.0));
        self
    }

    /// The output gain in decibels.
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.gain)
    }

    /// Base interval in seconds between two grain spawns of a single stream, before variation
    /// is applied. The density defines the interval, unless the delay overrides it.
    pub fn retrigger_interval(&self) -> f32 {
        if self.delay > Self::DELAY_OVERRIDE_THRESHOLD {
            self.delay
        } else {
            1.0 / self.density
        }
    }

    /// Validate all parameters. Returns Error::ParameterError on errors.
    pub fn validate(&self) -> Result<(), Error> {
        Self::validate_float("frequency", self.frequency, &Self::FREQUENCY_RANGE, "Hz")?;
        if !Self::STREAMS_RANGE.contains(&self.streams) {
            return Err(Error::ParameterError(format!(
                "Stream count must be between {} and {}, but is {}",
                Self::STREAMS_RANGE.start(),
                Self::STREAMS_RANGE.end(),
                self.streams
            )));
        }
        Self::validate_float("shape", self.shape, &Self::SHAPE_RANGE, "")?;
        Self::validate_float("range", self.range, &Self::RANGE_RANGE, "Hz")?;
        Self::validate_float("duration", self.duration, &Self::DURATION_RANGE, "s")?;
        Self::validate_float("delay", self.delay, &Self::DELAY_RANGE, "s")?;
        Self::validate_float("density", self.density, &Self::DENSITY_RANGE, "grains/s")?;
        Self::validate_float("variation", self.variation, &Self::VARIATION_RANGE, "")?;
        Self::validate_float("spread", self.spread, &Self::SPREAD_RANGE, "")?;
        Self::validate_float("gain", self.gain, &Self::GAIN_RANGE, "")?;
        Ok(())
    }

    /// Returns a copy with all values clamped into their valid ranges.
    /// Non finite values are replaced with the parameter's default value.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let clamp = |value: f32, default: f32, range: &RangeInclusive<f32>| {
            if value.is_finite() {
                value.clamp(*range.start(), *range.end())
            } else {
                default
            }
        };
        Self {
            frequency: clamp(self.frequency, defaults.frequency, &Self::FREQUENCY_RANGE),
            streams: self
                .streams
                .clamp(*Self::STREAMS_RANGE.start(), *Self::STREAMS_RANGE.end()),
            shape: clamp(self.shape, defaults.shape, &Self::SHAPE_RANGE),
            range: clamp(self.range, defaults.range, &Self::RANGE_RANGE),
            duration: clamp(self.duration, defaults.duration, &Self::DURATION_RANGE),
            delay: clamp(self.delay, defaults.delay, &Self::DELAY_RANGE),
            density: clamp(self.density, defaults.density, &Self::DENSITY_RANGE),
            variation: clamp(self.variation, defaults.variation, &Self::VARIATION_RANGE),
            spread: clamp(self.spread, defaults.spread, &Self::SPREAD_RANGE),
            gain: clamp(self.gain, defaults.gain, &Self::GAIN_RANGE),
        }
    }

    fn validate_float(
        name: &str,
        value: f32,
        range: &RangeInclusive<f32>,
        unit: &str,
    ) -> Result<(), Error> {
        if !range.contains(&value) {
            // NB: NaN is never contained in a range
            return Err(Error::ParameterError(format!(
                "Grain {name} must be between {} and {} {unit}, but is {value}",
                range.start(),
                range.end(),
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
