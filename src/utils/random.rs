//! Uniform random sources for grain parameter randomization.

use rand::Rng;

// -------------------------------------------------------------------------------------------------

/// Source of uniformly distributed random values, consumed by the grain scheduler.
///
/// Any [`rand::Rng`] is a random source. Tests can inject [`ConstantRandom`] or
/// [`SequenceRandom`] to make spawned grain parameters reproducible.
pub trait RandomSource {
    /// Draw a value uniformly distributed in range `[0.0, 1.0)`.
    fn uniform(&mut self) -> f32;
}

impl<R: Rng> RandomSource for R {
    #[inline]
    fn uniform(&mut self) -> f32 {
        self.random::<f32>()
    }
}

// -------------------------------------------------------------------------------------------------

/// A random source which always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRandom(f32);

impl ConstantRandom {
    pub fn new(value: f32) -> Self {
        debug_assert!((0.0..1.0).contains(&value), "Invalid uniform value: {value}");
        Self(value)
    }
}

impl RandomSource for ConstantRandom {
    fn uniform(&mut self) -> f32 {
        self.0
    }
}

// -------------------------------------------------------------------------------------------------

/// A random source which cycles through a fixed sequence of values.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f32>,
    position: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f32>) -> Self {
        debug_assert!(!values.is_empty(), "Need at least one value");
        debug_assert!(
            values.iter().all(|v| (0.0..1.0).contains(v)),
            "Invalid uniform values: {values:?}"
        );
        Self {
            values,
            position: 0,
        }
    }
}

impl RandomSource for SequenceRandom {
    fn uniform(&mut self) -> f32 {
        let value = self.values[self.position];
        self.position = (self.position + 1) % self.values.len();
        value
    }
}

// -------------------------------------------------------------------------------------------------
