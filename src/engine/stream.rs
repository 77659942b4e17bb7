use crate::{parameters::GranularParameters, utils::random::RandomSource};

use super::{grain::Grain, mixer::GrainMixer};

// -------------------------------------------------------------------------------------------------

/// Randomized parameters of a grain that is about to be spawned.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct GrainSpawn {
    pub frequency: f32,
    pub duration: f32,
    pub pan: f32,
}

impl GrainSpawn {
    /// Valid frequency range of spawned grains in Hz.
    pub const FREQUENCY_RANGE: (f32, f32) = (20.0, 20000.0);
    /// Valid duration range of spawned grains in seconds.
    pub const DURATION_RANGE: (f32, f32) = (0.001, 0.2);

    /// Variation and spread amounts at or below this value apply no randomization at all.
    pub const RANDOMIZATION_THRESHOLD: f32 = 0.01;
    /// Below this variation amount, frequency variation uses a quadratic curve.
    pub const QUADRATIC_VARIATION_THRESHOLD: f32 = 0.3;
    /// Duration variation is scaled down by this factor.
    const DURATION_VARIATION_SCALE: f32 = 0.3;

    /// Draw new randomized grain parameters around the given parameter's centers.
    pub fn randomized<R: RandomSource + ?Sized>(
        parameters: &GranularParameters,
        random: &mut R,
    ) -> Self {
        let variation = parameters.variation;
        let randomize = variation > Self::RANDOMIZATION_THRESHOLD;

        // Frequency: tight, quasi synchronous clustering at low variation amounts
        let mut frequency = parameters.frequency;
        if randomize && parameters.range > 0.0 {
            let variation_scale = if variation < Self::QUADRATIC_VARIATION_THRESHOLD {
                variation * variation / Self::QUADRATIC_VARIATION_THRESHOLD
            } else {
                variation
            };
            frequency += bipolar(random) * parameters.range * variation_scale;
        }
        let frequency = frequency.clamp(Self::FREQUENCY_RANGE.0, Self::FREQUENCY_RANGE.1);

        // Duration: always uses the gentler quadratic curve
        let mut duration = parameters.duration;
        if randomize {
            let variation_scale = variation * variation * Self::DURATION_VARIATION_SCALE;
            duration *= 1.0 + bipolar(random) * variation_scale;
        }
        let duration = duration.clamp(Self::DURATION_RANGE.0, Self::DURATION_RANGE.1);

        // Pan: sqrt curve pushes grains towards the extremes
        let mut pan = 0.5;
        if parameters.spread > Self::RANDOMIZATION_THRESHOLD {
            let offset = random.uniform() - 0.5;
            let pushed = (offset.abs() * 2.0).sqrt() * 0.5 * offset.signum();
            pan = (0.5 + pushed * parameters.spread).clamp(0.0, 1.0);
        }

        Self {
            frequency,
            duration,
            pan,
        }
    }
}

/// Draw a value uniformly distributed in range `[-1.0, 1.0)`.
#[inline]
fn bipolar<R: RandomSource + ?Sized>(random: &mut R) -> f32 {
    (random.uniform() - 0.5) * 2.0
}

// -------------------------------------------------------------------------------------------------

/// A single grain stream: a retrigger timer and a fixed pool of `POOL_SIZE` grain slots.
///
/// When the timer expires the stream spawns a grain into its first free slot, then schedules
/// the next spawn. When all slots are busy, the spawn is dropped.
#[derive(Debug, Clone)]
pub(crate) struct GrainStream<const POOL_SIZE: usize> {
    /// Pool of grain slots.
    grains: [Grain; POOL_SIZE],
    /// Time in seconds until the next grain spawn.
    next_grain_time: f32,
}

/// Outcome of a stream's spawn attempt within a single tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SpawnEvent {
    /// The retrigger timer did not expire.
    None,
    /// A grain got spawned into the slot with the given index.
    Spawned(usize),
    /// The timer expired, but all slots were busy.
    Dropped,
}

impl<const POOL_SIZE: usize> Default for GrainStream<POOL_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const POOL_SIZE: usize> GrainStream<POOL_SIZE> {
    /// Smallest possible interval between two spawns in seconds.
    pub const MIN_RETRIGGER_INTERVAL: f32 = 0.001;

    /// Create a new stream with inactive grains, which spawns its first grain on the next tick.
    pub const fn new() -> Self {
        Self {
            grains: [Grain::new(); POOL_SIZE],
            next_grain_time: 0.0,
        }
    }

    #[cfg(test)]
    pub fn next_grain_time(&self) -> f32 {
        self.next_grain_time
    }

    #[cfg(test)]
    pub fn grains(&self) -> &[Grain; POOL_SIZE] {
        &self.grains
    }

    /// Number of currently active grains.
    #[cfg(test)]
    pub fn active_grain_count(&self) -> usize {
        self.grains.iter().filter(|g| g.is_active()).count()
    }

    /// Deactivate all grains and reset the retrigger timer.
    pub fn reset(&mut self) {
        for grain in &mut self.grains {
            grain.deactivate();
        }
        self.next_grain_time = 0.0;
    }

    /// Run the stream for one tick: update the retrigger timer, possibly spawn a new grain and
    /// then process all active grains into the given mixer.
    #[inline]
    pub fn process<R: RandomSource + ?Sized>(
        &mut self,
        parameters: &GranularParameters,
        tick_duration: f32,
        random: &mut R,
        mixer: &mut GrainMixer,
    ) -> SpawnEvent {
        let event = self.update_trigger(parameters, tick_duration, random);

        for grain in &mut self.grains {
            if grain.is_active() {
                let output = grain.process(parameters.shape, tick_duration);
                mixer.add(output.sample, output.pan);
            }
        }

        event
    }

    /// Advance the retrigger timer and spawn a grain when it expired.
    fn update_trigger<R: RandomSource + ?Sized>(
        &mut self,
        parameters: &GranularParameters,
        tick_duration: f32,
        random: &mut R,
    ) -> SpawnEvent {
        self.next_grain_time -= tick_duration;
        if self.next_grain_time > 0.0 {
            return SpawnEvent::None;
        }

        let event = match self.grains.iter().position(|g| !g.is_active()) {
            Some(index) => {
                let spawn = GrainSpawn::randomized(parameters, random);
                self.grains[index].activate(spawn.frequency, spawn.duration, spawn.pan);
                SpawnEvent::Spawned(index)
            }
            None => SpawnEvent::Dropped,
        };

        self.next_grain_time = Self::next_retrigger_interval(parameters, random);
        event
    }

    /// Randomized interval in seconds until the next spawn.
    fn next_retrigger_interval<R: RandomSource + ?Sized>(
        parameters: &GranularParameters,
        random: &mut R,
    ) -> f32 {
        let mut interval = parameters.retrigger_interval();
        let variation = parameters.variation;
        if variation > GrainSpawn::RANDOMIZATION_THRESHOLD && interval > 0.0 {
            let variation_scale = variation * variation;
            interval *= 1.0 + bipolar(random) * variation_scale;
        }
        interval.max(Self::MIN_RETRIGGER_INTERVAL)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::SmallRng, SeedableRng};

    use crate::utils::random::{ConstantRandom, SequenceRandom};

    const TICK: f32 = 1.0 / 48000.0;

    fn steady_parameters() -> GranularParameters {
        GranularParameters::new()
            .with_frequency(440.0)
            .with_variation(0.0)
            .with_spread(0.0)
    }

    #[test]
    fn no_randomization_without_variation() {
        let parameters = steady_parameters().with_range(500.0).with_duration(0.05);
        let mut rng = SmallRng::seed_from_u64(1234);
        for _ in 0..1000 {
            let spawn = GrainSpawn::randomized(&parameters, &mut rng);
            assert_eq!(spawn.frequency, 440.0);
            assert_eq!(spawn.duration, 0.05);
            assert_eq!(spawn.pan, 0.5);
        }
    }

    #[test]
    fn randomization_bounds() {
        let parameters = GranularParameters::new()
            .with_frequency(1000.0)
            .with_range(500.0)
            .with_duration(0.1)
            .with_variation(1.0)
            .with_spread(1.0);
        // lowest possible draw
        let spawn = GrainSpawn::randomized(&parameters, &mut ConstantRandom::new(0.0));
        assert_eq!(spawn.frequency, 500.0);
        assert!((spawn.duration - 0.07).abs() < 1e-6);
        assert_eq!(spawn.pan, 0.0);
        // center draw
        let spawn = GrainSpawn::randomized(&parameters, &mut ConstantRandom::new(0.5));
        assert_eq!(spawn.frequency, 1000.0);
        assert_eq!(spawn.duration, 0.1);
        assert_eq!(spawn.pan, 0.5);
        // random draws stay within their bands
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1000 {
            let spawn = GrainSpawn::randomized(&parameters, &mut rng);
            assert!((500.0..=1500.0).contains(&spawn.frequency));
            assert!((0.07..=0.13 + 1e-6).contains(&spawn.duration));
            assert!((0.0..=1.0).contains(&spawn.pan));
        }
    }

    #[test]
    fn quadratic_frequency_variation() {
        let parameters = GranularParameters::new()
            .with_frequency(1000.0)
            .with_range(300.0)
            .with_variation(0.15)
            .with_spread(0.0);
        // 0.15^2 / 0.3 = 0.075 of the range at most
        let spawn = GrainSpawn::randomized(&parameters, &mut SequenceRandom::new(vec![0.0]));
        assert!((spawn.frequency - (1000.0 - 300.0 * 0.075)).abs() < 1e-3);
        // linear above the threshold
        let parameters = parameters.with_variation(0.6);
        let spawn = GrainSpawn::randomized(&parameters, &mut SequenceRandom::new(vec![0.0]));
        assert!((spawn.frequency - (1000.0 - 300.0 * 0.6)).abs() < 1e-3);
    }

    #[test]
    fn pan_pushed_to_extremes() {
        let parameters = steady_parameters().with_spread(1.0);
        // a quarter off center lands at ~0.146: pushed further out than linear
        let spawn = GrainSpawn::randomized(&parameters, &mut ConstantRandom::new(0.25));
        assert!((spawn.pan - (0.5 - 0.5f32.sqrt() * 0.5)).abs() < 1e-5);
        // half spread
        let parameters = parameters.with_spread(0.5);
        let spawn = GrainSpawn::randomized(&parameters, &mut ConstantRandom::new(0.0));
        assert!((spawn.pan - 0.25).abs() < 1e-6);
    }

    #[test]
    fn spawns_on_first_tick_and_retriggers() {
        let parameters = steady_parameters().with_density(100.0);
        let mut stream = GrainStream::<20>::new();
        let mut random = ConstantRandom::new(0.5);
        let mut mixer = GrainMixer::new();

        let event = stream.process(&parameters, TICK, &mut random, &mut mixer);
        assert_eq!(event, SpawnEvent::Spawned(0));
        assert_eq!(stream.active_grain_count(), 1);
        assert!((stream.next_grain_time() - 0.01).abs() < 1e-6);
        // the new grain already rendered its first, silent sample
        assert_eq!(mixer.grain_count(), 1);

        let mut spawned = 1;
        for _ in 1..48000 {
            if let SpawnEvent::Spawned(_) =
                stream.process(&parameters, TICK, &mut random, &mut mixer)
            {
                spawned += 1;
            }
            mixer.finish(1.0);
        }
        assert!((98..=102).contains(&spawned), "spawned {spawned} grains");
    }

    #[test]
    fn minimum_retrigger_interval() {
        let parameters = GranularParameters::new()
            .with_density(1000.0)
            .with_variation(1.0);
        // the lowest draw shrinks the interval to zero: floored at 1ms
        let interval =
            GrainStream::<20>::next_retrigger_interval(&parameters, &mut ConstantRandom::new(0.0));
        assert_eq!(interval, GrainStream::<20>::MIN_RETRIGGER_INTERVAL);
    }

    #[test]
    fn quadratic_retrigger_jitter() {
        let parameters = GranularParameters::new()
            .with_density(100.0)
            .with_variation(0.5);
        // +/- 0.5^2 of the 10ms base interval
        let shortest =
            GrainStream::<20>::next_retrigger_interval(&parameters, &mut ConstantRandom::new(0.0));
        assert!((shortest - 0.0075).abs() < 1e-6);
        let longest = GrainStream::<20>::next_retrigger_interval(
            &parameters,
            &mut ConstantRandom::new(0.999),
        );
        assert!((longest - 0.012495).abs() < 1e-6);
        let center =
            GrainStream::<20>::next_retrigger_interval(&parameters, &mut ConstantRandom::new(0.5));
        assert!((center - 0.01).abs() < 1e-7);
    }

    #[test]
    fn full_pool_drops_spawns() {
        // long grains, spawned every millisecond
        let parameters = steady_parameters()
            .with_duration(0.1)
            .with_delay(0.001);
        let mut stream = GrainStream::<20>::new();
        let mut random = ConstantRandom::new(0.5);
        let mut mixer = GrainMixer::new();

        let mut events = Vec::new();
        let mut ticks = 0;
        while stream.active_grain_count() < 20 {
            let event = stream.process(&parameters, TICK, &mut random, &mut mixer);
            if event != SpawnEvent::None {
                events.push(event);
            }
            mixer.finish(1.0);
            ticks += 1;
            assert!(ticks < 48000, "pool never got filled");
        }
        assert_eq!(events.len(), 20);
        assert!(events
            .iter()
            .enumerate()
            .all(|(index, event)| *event == SpawnEvent::Spawned(index)));

        // run until the next spawn is due, then check the drop
        while stream.next_grain_time() - TICK > 0.0 {
            stream.process(&parameters, TICK, &mut random, &mut mixer);
            mixer.finish(1.0);
        }
        let before = *stream.grains();
        let event = stream.process(&parameters, TICK, &mut random, &mut mixer);
        assert_eq!(event, SpawnEvent::Dropped);
        assert_eq!(stream.active_grain_count(), 20);
        for (before, after) in before.iter().zip(stream.grains()) {
            // all grains just advanced by one tick
            assert_eq!(before.frequency(), after.frequency());
            assert_eq!(before.duration(), after.duration());
            assert_eq!(before.pan(), after.pan());
            assert!(after.elapsed() > before.elapsed());
        }
        // timer got rescheduled
        assert!(stream.next_grain_time() > 0.0);
    }

    #[test]
    fn reset_deactivates_grains() {
        let parameters = steady_parameters();
        let mut stream = GrainStream::<4>::new();
        let mut random = ConstantRandom::new(0.5);
        let mut mixer = GrainMixer::new();
        stream.process(&parameters, TICK, &mut random, &mut mixer);
        assert_eq!(stream.active_grain_count(), 1);
        stream.reset();
        assert_eq!(stream.active_grain_count(), 0);
        assert_eq!(stream.next_grain_time(), 0.0);
    }
}
