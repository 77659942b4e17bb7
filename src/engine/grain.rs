use crate::utils::dsp::{waveform::morphed_waveform, window::hann_window};

// -------------------------------------------------------------------------------------------------

/// Single sample processing result of a [`Grain`].
#[derive(Debug, Copy, Clone)]
pub(crate) struct GrainOutput {
    /// Windowed waveform sample.
    pub sample: f32,
    /// Stereo panning position (0.0 = full left, 0.5 = center, 1.0 = full right).
    pub pan: f32,
}

// -------------------------------------------------------------------------------------------------

/// Represents a single grain: a short, Hann windowed tone burst.
///
/// Grains live in fixed slots of a [`GrainStream`](super::stream::GrainStream). Activating a
/// grain writes the slot, reaching the end of the envelope frees it again.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Grain {
    /// Is this grain currently active?
    active: bool,
    /// Seconds since birth. Accumulated in f64, so sums of equal ticks stay exact and
    /// the grain ends on the first tick that reaches its duration.
    elapsed: f64,
    /// Phase of the grain's oscillator, wrapped into [0.0, 1.0).
    wave_phase: f32,
    /// Oscillator frequency in Hz.
    frequency: f32,
    /// Grain lifetime in seconds.
    duration: f32,
    /// Stereo panning position (0.0 = full left, 0.5 = center, 1.0 = full right).
    pan: f32,
}

impl Default for Grain {
    fn default() -> Self {
        Self::new()
    }
}

impl Grain {
    /// Smallest grain duration in seconds which is accepted when activating grains.
    pub const MIN_DURATION: f32 = 0.0001;

    /// Create a new inactive grain.
    pub const fn new() -> Self {
        Self {
            active: false,
            elapsed: 0.0,
            wave_phase: 0.0,
            frequency: 440.0,
            duration: 0.02,
            pan: 0.5,
        }
    }

    /// Check if this grain is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Position in the envelope window: 0.0 at birth, 1.0 at its end.
    #[inline]
    fn envelope_phase(&self) -> f32 {
        (self.elapsed / self.duration as f64) as f32
    }

    #[cfg(test)]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[cfg(test)]
    pub fn wave_phase(&self) -> f32 {
        self.wave_phase
    }

    #[cfg(test)]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[cfg(test)]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[cfg(test)]
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Activate this grain with the given frequency, duration and panning.
    pub fn activate(&mut self, frequency: f32, duration: f32, pan: f32) {
        debug_assert!(
            duration >= Self::MIN_DURATION,
            "Grain duration must be >= {}, but is {duration}",
            Self::MIN_DURATION
        );
        self.active = true;
        self.elapsed = 0.0;
        self.wave_phase = 0.0;
        self.frequency = frequency;
        self.duration = duration.max(Self::MIN_DURATION);
        self.pan = pan.clamp(0.0, 1.0);
    }

    /// Deactivate this grain immediately.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.elapsed = 0.0;
        self.wave_phase = 0.0;
    }

    /// Process this grain for one tick of `tick_duration` seconds.
    ///
    /// Returns the windowed sample at the grain's current phases, then advances both phases.
    /// The grain deactivates as soon as the envelope phase reaches 1.0, so the last emitted
    /// sample is the one right before the envelope ends.
    #[inline]
    pub fn process(&mut self, shape: f32, tick_duration: f32) -> GrainOutput {
        debug_assert!(self.active, "Should only process active grains");
        debug_assert!(
            self.elapsed < self.duration as f64,
            "Active grain exceeded its duration: {}s of {}s",
            self.elapsed,
            self.duration
        );

        let sample = morphed_waveform(self.wave_phase, shape) * hann_window(self.envelope_phase());

        // Advance the oscillator. Increments may exceed a full cycle with high frequencies
        // at low sample rates.
        self.wave_phase += self.frequency * tick_duration;
        while self.wave_phase >= 1.0 {
            self.wave_phase -= 1.0;
        }
        while self.wave_phase < 0.0 {
            self.wave_phase += 1.0;
        }

        // Advance the envelope and die at its end
        self.elapsed += tick_duration as f64;
        if self.elapsed >= self.duration as f64 {
            self.deactivate();
        }

        GrainOutput {
            sample,
            pan: self.pan,
        }
    }
}

// -------------------------------------------------------------------------------------------------
