//! Multi stream granular synthesis engine.

use assume::assume;
use rand::{rngs::SmallRng, SeedableRng};

use crate::{parameters::GranularParameters, utils::random::RandomSource};

// -------------------------------------------------------------------------------------------------

pub(crate) mod grain;
pub mod mixer;
pub(crate) mod stream;

use mixer::{GrainMixer, StereoFrame};
use stream::{GrainStream, SpawnEvent};

// -------------------------------------------------------------------------------------------------

const MAX_STREAMS: usize = 20;
const GRAINS_PER_STREAM: usize = 20;

// -------------------------------------------------------------------------------------------------

/// Runs up to [`GranularEngine::MAX_STREAMS`] concurrent grain streams, each with a pool of
/// [`GranularEngine::GRAINS_PER_STREAM`] overlapping grains, and mixes them into a stereo signal.
///
/// The engine is driven by calling [`GranularEngine::tick`] once per output sample frame. All
/// stream and grain state is preallocated on construction, so ticking never allocates.
/// Streams beyond the active stream count are not processed, but keep their state.
///
/// Grain parameters are randomized with a [`RandomSource`]: by default a [`SmallRng`] which is
/// seeded by the OS. Use [`GranularEngine::with_seed`] for reproducible output or
/// [`GranularEngine::with_random_source`] to inject a custom source.
pub struct GranularEngine<R: RandomSource = SmallRng> {
    streams: [GrainStream<GRAINS_PER_STREAM>; MAX_STREAMS],
    mixer: GrainMixer,
    random: R,
    active_grain_count: usize,
    spawned_grain_count: u64,
    dropped_grain_count: u64,
}

impl GranularEngine {
    /// Max number of concurrently running streams.
    pub const MAX_STREAMS: usize = MAX_STREAMS;
    /// Max number of overlapping grains in a single stream.
    pub const GRAINS_PER_STREAM: usize = GRAINS_PER_STREAM;

    /// Create a new engine with an OS seeded random number generator.
    pub fn new() -> Self {
        Self::with_random_source(SmallRng::from_os_rng())
    }

    /// Create a new engine with a seeded random number generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_random_source(SmallRng::seed_from_u64(seed))
    }
}

impl Default for GranularEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> GranularEngine<R> {
    /// Create a new engine which draws random values from the given source.
    pub fn with_random_source(random: R) -> Self {
        log::debug!(
            "Creating granular engine with {} streams of {} grains",
            MAX_STREAMS,
            GRAINS_PER_STREAM
        );
        Self {
            streams: std::array::from_fn(|_| GrainStream::new()),
            mixer: GrainMixer::new(),
            random,
            active_grain_count: 0,
            spawned_grain_count: 0,
            dropped_grain_count: 0,
        }
    }

    /// Number of grains that sounded in the last tick.
    pub fn active_grain_count(&self) -> usize {
        self.active_grain_count
    }

    /// Number of grains spawned since the engine got created or reset.
    pub fn spawned_grain_count(&self) -> u64 {
        self.spawned_grain_count
    }

    /// Number of spawns which got dropped, because all grain slots of a stream were busy.
    pub fn dropped_grain_count(&self) -> u64 {
        self.dropped_grain_count
    }

    /// Deactivate all grains and restart all stream timers.
    pub fn reset(&mut self) {
        for stream in self.streams.iter_mut() {
            stream.reset();
        }
        self.active_grain_count = 0;
        self.spawned_grain_count = 0;
        self.dropped_grain_count = 0;
    }

    /// Run the engine for a single tick of `tick_duration` seconds (the reciprocal of the
    /// sample rate) and return the resulting stereo sample frame.
    ///
    /// Parameters are used as they are: they are expected to be in valid ranges already.
    /// See [`GranularParameters::validate`].
    pub fn tick(&mut self, parameters: &GranularParameters, tick_duration: f32) -> StereoFrame {
        debug_assert!(
            tick_duration.is_finite() && tick_duration > 0.0,
            "Invalid tick duration: {tick_duration}"
        );
        debug_assert!(
            parameters.validate().is_ok(),
            "Invalid granular parameters: {parameters:?}"
        );

        let stream_count = parameters.streams.clamp(1, MAX_STREAMS);
        assume!(unsafe: stream_count <= self.streams.len(), "Stream count is clamped above");

        for stream in &mut self.streams[..stream_count] {
            match stream.process(parameters, tick_duration, &mut self.random, &mut self.mixer) {
                SpawnEvent::Spawned(_) => self.spawned_grain_count += 1,
                SpawnEvent::Dropped => self.dropped_grain_count += 1,
                SpawnEvent::None => (),
            }
        }

        self.active_grain_count = self.mixer.grain_count();
        self.mixer.finish(parameters.gain)
    }

    /// Active grains of all streams, including the ones which are currently not processed.
    #[cfg(test)]
    pub(crate) fn total_active_grain_count(&self) -> usize {
        self.streams.iter().map(|s| s.active_grain_count()).sum()
    }
}

// -------------------------------------------------------------------------------------------------
