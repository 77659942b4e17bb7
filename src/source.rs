//! Block based audio sources.

pub mod granular;

// -------------------------------------------------------------------------------------------------

/// Types that can produce audio samples in `f32` format. `Send`able across threads.
pub trait Source: Send + 'static {
    /// Write at most of `output.len()` samples into the interleaved `output`. Returns the
    /// number of written samples. Should take care to always output full frames, and should
    /// _never_ block or allocate.
    fn write(&mut self, output: &mut [f32]) -> usize;

    /// The source's output channel layout.
    fn channel_count(&self) -> usize;

    /// The source's output sample rate.
    fn sample_rate(&self) -> u32;

    /// Returns true when the source finished playback and won't produce any more samples.
    fn is_exhausted(&self) -> bool;
}
