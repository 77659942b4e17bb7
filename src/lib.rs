#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod engine;
mod error;
mod output;
mod parameters;
mod source;

// public, flat re-exports
pub use error::Error;

pub use engine::{
    mixer::{density_gain, panning_gains, GrainMixer, StereoFrame},
    GranularEngine,
};

pub use parameters::GranularParameters;

pub use source::{granular::GranularSource, Source};

#[cfg(feature = "wav-output")]
pub use output::wav::WavOutput;

// public mods
pub mod utils;

pub mod waveforms {
    //! Grain oscillator waveforms and windows.

    pub use super::utils::dsp::{
        waveform::{morphed_waveform, AnchorWaveform},
        window::hann_window,
    };
}
