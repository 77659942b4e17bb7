use std::{path::Path, time::Duration};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::{error::Error, source::Source};

// -------------------------------------------------------------------------------------------------

const BUFFER_SIZE_FRAMES: usize = 1024;

// -------------------------------------------------------------------------------------------------

/// Offline audio output, which renders a source into a wav file instead of playing it back.
///
/// Wav files contents are always saved as 32bit floats, using the source's sample rate and
/// channel layout.
pub struct WavOutput;

impl WavOutput {
    /// Render `duration` of the given source into a new wav file at `file_path`.
    ///
    /// Rendering stops early when the source is exhausted. Returns the number of written
    /// sample frames.
    pub fn render<S: Source + ?Sized, P: AsRef<Path>>(
        source: &mut S,
        file_path: P,
        duration: Duration,
    ) -> Result<u64, Error> {
        let channel_count = source.channel_count();
        let sample_rate = source.sample_rate();
        let spec = WavSpec {
            channels: u16::try_from(channel_count).map_err(|_| {
                Error::ParameterError(format!("Unsupported channel count: {channel_count}"))
            })?,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let total_frames = (duration.as_secs_f64() * sample_rate as f64).round() as u64;

        log::info!(
            "Rendering {:.2}s of audio into '{}'...",
            duration.as_secs_f64(),
            file_path.as_ref().display()
        );

        let mut writer = WavWriter::create(file_path.as_ref(), spec)?;
        let mut buffer = vec![0.0; BUFFER_SIZE_FRAMES * channel_count];
        let mut written_frames = 0;
        while written_frames < total_frames && !source.is_exhausted() {
            let frames = (total_frames - written_frames).min(BUFFER_SIZE_FRAMES as u64) as usize;
            let written = source.write(&mut buffer[..frames * channel_count]);
            // Stop writing when no more output is produced
            if written == 0 {
                break;
            }
            for sample in &buffer[..written] {
                writer.write_sample(*sample)?;
            }
            written_frames += (written / channel_count) as u64;
        }

        if let Err(err) = writer.finalize() {
            log::error!("Failed to finalize WAV file: {err}");
            return Err(err.into());
        }
        log::info!("Rendered {written_frames} sample frames");
        Ok(written_frames)
    }
}

// -------------------------------------------------------------------------------------------------
