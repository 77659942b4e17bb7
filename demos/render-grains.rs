//! Renders a few seconds of a granular texture into a wav file.

use std::{path::PathBuf, time::Duration};

use arg::{parse_args, Args};

use gsx::{
    waveforms::AnchorWaveform, Error, GranularParameters, GranularSource, Source, WavOutput,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Info
};

const DEFAULT_OUTPUT_PATH: &str = "grains.wav";
const DEFAULT_SECONDS: f32 = 5.0;

const SAMPLE_RATE: u32 = 48000;
const CHANNEL_COUNT: usize = 2;

// Granular parameter consts (tweak as needed!)
const GRAIN_FREQUENCY: f32 = 220.0; // 50Hz - 2000Hz
const GRAIN_STREAMS: usize = 8; // 1 - 20
const GRAIN_RANGE: f32 = 80.0; // +/- Hz around GRAIN_FREQUENCY
const GRAIN_DURATION: f32 = 0.04; // 1ms - 100ms
const GRAIN_DELAY: f32 = 0.0001; // > 0.2ms overrides the density
const GRAIN_DENSITY: f32 = 60.0; // grains per second and stream
const GRAIN_VARIATION: f32 = 0.4; // 0.0 = steady, 1.0 = full randomization
const GRAIN_SPREAD: f32 = 0.7; // 0.0 = center, 1.0 = full left/right
const GRAIN_GAIN_DB: f32 = -3.0;

// -------------------------------------------------------------------------------------------------

/// Program arguments.
#[derive(Args, Debug, Default)]
struct Arguments {
    #[arg(short = "o", long = "output")]
    /// Path of the rendered wav file. By default \"grains.wav\".
    output_path: Option<PathBuf>,
    #[arg(short = "s", long = "seconds")]
    /// Number of seconds to render. By default 5.
    seconds: Option<f32>,
    #[arg(short = "w", long = "waveform")]
    /// Grain waveform: \"Sine\", \"Triangle\", \"Sawtooth\" or \"Square\".
    waveform: Option<AnchorWaveform>,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    /// By default \"debug\" in dev builds and \"info\" in release builds.
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    // Parse optional arguments
    let args = parse_args::<Arguments>();

    // Init logger
    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()
        .expect("Failed to set logger");

    let seconds = args.seconds.unwrap_or(DEFAULT_SECONDS);
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(Error::ParameterError(format!(
            "Render duration must be a positive number of seconds, but is {seconds}"
        )));
    }
    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

    // Create granular parameters
    let parameters = GranularParameters::new()
        .with_frequency(GRAIN_FREQUENCY)
        .with_streams(GRAIN_STREAMS)
        .with_shape(args.waveform.unwrap_or_default().shape())
        .with_range(GRAIN_RANGE)
        .with_duration(GRAIN_DURATION)
        .with_delay(GRAIN_DELAY)
        .with_density(GRAIN_DENSITY)
        .with_variation(GRAIN_VARIATION)
        .with_spread(GRAIN_SPREAD)
        .with_gain_db(GRAIN_GAIN_DB);

    // Render the granular source
    let mut source = GranularSource::new(parameters, CHANNEL_COUNT, SAMPLE_RATE)?;
    let frames = WavOutput::render(
        &mut source,
        &output_path,
        Duration::from_secs_f32(seconds),
    )?;

    let engine = source.engine();
    println!(
        "Wrote {frames} frames at {}Hz into '{}': {} grains spawned, {} dropped",
        source.sample_rate(),
        output_path.display(),
        engine.spawned_grain_count(),
        engine.dropped_grain_count()
    );

    Ok(())
}
