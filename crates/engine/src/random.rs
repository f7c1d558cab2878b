//! Uniform integer selection over a fallible entropy source.
//!
//! Every chance-based decision in the engine goes through [`RandomSource`].
//! Production uses the operating system's CSPRNG ([`OsRandom`]); tests plug in
//! [`SeededRandom`] or a scripted source.

use std::ops::Range;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RandomError {
    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("empty range [{min}, {max})")]
    EmptyRange { min: usize, max: usize },
}

/// A source of raw 64-bit words. Reduction to a range lives in the provided
/// [`RandomSource::int_in`] so every source shares one unbiased algorithm.
pub trait RandomSource: Send {
    fn next_u64(&mut self) -> Result<u64, RandomError>;

    /// Uniform integer in the half-open `range`.
    ///
    /// Rejection sampling over the largest multiple of the span that fits in
    /// a `u64`, so no value is favoured.
    fn int_in(&mut self, range: Range<usize>) -> Result<usize, RandomError> {
        if range.end <= range.start {
            return Err(RandomError::EmptyRange {
                min: range.start,
                max: range.end,
            });
        }

        let span = (range.end - range.start) as u64;
        let zone = u64::MAX - (u64::MAX - span + 1) % span;
        loop {
            let v = self.next_u64()?;
            if v <= zone {
                return Ok(range.start + (v % span) as usize);
            }
        }
    }
}

/// Operating-system entropy. Failures surface as [`RandomError::Entropy`]
/// instead of panicking.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_u64(&mut self) -> Result<u64, RandomError> {
        OsRng
            .try_next_u64()
            .map_err(|e| RandomError::Entropy(e.to_string()))
    }
}

/// Deterministic source for tests and reproducible demo runs.
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_u64(&mut self) -> Result<u64, RandomError> {
        Ok(self.0.next_u64())
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn next_u64(&mut self) -> Result<u64, RandomError> {
        (**self).next_u64()
    }
}
