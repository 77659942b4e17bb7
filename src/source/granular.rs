use rand::rngs::SmallRng;

use crate::{
    engine::GranularEngine, parameters::GranularParameters, utils::random::RandomSource, Error,
};

use super::Source;

// -------------------------------------------------------------------------------------------------

/// A [`Source`] which renders a [`GranularEngine`] into interleaved sample buffers.
///
/// Mono outputs receive a mixdown of the engine's stereo signal. Outputs with more than two
/// channels get the stereo signal in the first two channels and silence in all others.
pub struct GranularSource<R: RandomSource + Send + 'static = SmallRng> {
    engine: GranularEngine<R>,
    parameters: GranularParameters,
    channel_count: usize,
    sample_rate: u32,
    tick_duration: f32,
}

impl GranularSource {
    /// Create a new granular source with an OS seeded engine.
    pub fn new(
        parameters: GranularParameters,
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, Error> {
        Self::with_engine(GranularEngine::new(), parameters, channel_count, sample_rate)
    }
}

impl<R: RandomSource + Send + 'static> GranularSource<R> {
    /// Create a new granular source which renders the given engine.
    pub fn with_engine(
        engine: GranularEngine<R>,
        parameters: GranularParameters,
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, Error> {
        if channel_count == 0 {
            return Err(Error::ParameterError(
                "Granular source needs at least one output channel".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(Error::ParameterError(
                "Granular source needs a valid sample rate".to_string(),
            ));
        }
        parameters.validate()?;
        let tick_duration = 1.0 / sample_rate as f32;
        Ok(Self {
            engine,
            parameters,
            channel_count,
            sample_rate,
            tick_duration,
        })
    }

    /// Access to the rendered engine.
    pub fn engine(&self) -> &GranularEngine<R> {
        &self.engine
    }

    /// Mutable access to the rendered engine, e.g. to reset it.
    pub fn engine_mut(&mut self) -> &mut GranularEngine<R> {
        &mut self.engine
    }

    /// The currently applied parameters.
    pub fn parameters(&self) -> &GranularParameters {
        &self.parameters
    }

    /// Apply new parameters, which will be used for all following writes.
    /// Invalid values get clamped into their valid ranges.
    pub fn set_parameters(&mut self, parameters: GranularParameters) {
        if let Err(err) = parameters.validate() {
            log::warn!("{err}. Clamping granular parameters into valid ranges...");
            self.parameters = parameters.clamped();
        } else {
            self.parameters = parameters;
        }
    }

    fn render(&mut self, output: &mut [f32]) -> usize {
        let channel_count = self.channel_count;
        let written = output.len() - output.len() % channel_count;
        match channel_count {
            1 => {
                for sample in output[..written].iter_mut() {
                    *sample = self.engine.tick(&self.parameters, self.tick_duration).mono();
                }
            }
            2 => {
                for frame in output[..written].chunks_exact_mut(2) {
                    let stereo = self.engine.tick(&self.parameters, self.tick_duration);
                    frame[0] = stereo.left;
                    frame[1] = stereo.right;
                }
            }
            _ => {
                for frame in output[..written].chunks_exact_mut(channel_count) {
                    let stereo = self.engine.tick(&self.parameters, self.tick_duration);
                    frame[0] = stereo.left;
                    frame[1] = stereo.right;
                    frame[2..].fill(0.0);
                }
            }
        }
        written
    }
}

impl<R: RandomSource + Send + 'static> Source for GranularSource<R> {
    fn write(&mut self, output: &mut [f32]) -> usize {
        #[cfg(not(feature = "assert-allocs"))]
        let written = self.render(output);
        #[cfg(feature = "assert-allocs")]
        let written = assert_no_alloc::assert_no_alloc(|| self.render(output));
        written
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_exhausted(&self) -> bool {
        // grain streams run endlessly
        false
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::utils::random::ConstantRandom;

    fn steady_parameters() -> GranularParameters {
        GranularParameters::new()
            .with_streams(2)
            .with_variation(0.0)
            .with_spread(0.0)
    }

    #[test]
    fn invalid_layouts() {
        let parameters = GranularParameters::default();
        assert!(GranularSource::new(parameters.clone(), 0, 44100).is_err());
        assert!(GranularSource::new(parameters.clone(), 2, 0).is_err());
        assert!(GranularSource::new(parameters.with_streams(0), 2, 44100).is_err());
    }

    #[test]
    fn writes_full_frames_only() -> Result<(), Box<Error>> {
        let mut source = GranularSource::new(GranularParameters::default(), 2, 44100)?;
        let mut buffer = vec![0.0; 1025];
        assert_eq!(source.write(&mut buffer), 1024);
        assert!(!source.is_exhausted());
        Ok(())
    }

    #[test]
    fn channel_layouts() -> Result<(), Box<Error>> {
        let engine = || GranularEngine::with_random_source(ConstantRandom::new(0.5));
        let mut mono = GranularSource::with_engine(engine(), steady_parameters(), 1, 48000)?;
        let mut stereo = GranularSource::with_engine(engine(), steady_parameters(), 2, 48000)?;
        let mut quad = GranularSource::with_engine(engine(), steady_parameters(), 4, 48000)?;

        let mut mono_buffer = vec![0.0; 512];
        let mut stereo_buffer = vec![0.0; 512 * 2];
        let mut quad_buffer = vec![1.0; 512 * 4];
        mono.write(&mut mono_buffer);
        stereo.write(&mut stereo_buffer);
        quad.write(&mut quad_buffer);

        assert!(stereo_buffer.iter().any(|s| *s != 0.0));
        for (index, frame) in stereo_buffer.chunks_exact(2).enumerate() {
            assert!((mono_buffer[index] - (frame[0] + frame[1]) * 0.5).abs() < 1e-6);
            assert_eq!(frame, &quad_buffer[index * 4..index * 4 + 2]);
            assert!(quad_buffer[index * 4 + 2..index * 4 + 4]
                .iter()
                .all(|s| *s == 0.0));
        }
        Ok(())
    }

    #[test]
    fn clamps_invalid_parameters() -> Result<(), Box<Error>> {
        let mut source = GranularSource::new(GranularParameters::default(), 2, 44100)?;
        source.set_parameters(GranularParameters::default().with_streams(64).with_gain(2.0));
        assert_eq!(source.parameters().streams, 20);
        assert_eq!(source.parameters().gain, 1.0);
        source.set_parameters(GranularParameters::default().with_streams(3));
        assert_eq!(source.parameters().streams, 3);
        Ok(())
    }
}
