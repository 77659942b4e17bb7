//! Pure, stateless DSP building blocks for grains.

pub mod waveform;
pub mod window;
