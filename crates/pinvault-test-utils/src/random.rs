// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic random sources.

use pinvault_core::{PinvaultError, RandomSource};

/// Fills every buffer by cycling through a fixed byte pattern.
#[derive(Debug, Clone)]
pub struct FixedRandom {
    pattern: Vec<u8>,
}

impl FixedRandom {
    /// Create a source that repeats `pattern`. An empty pattern yields zeros.
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl RandomSource for FixedRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), PinvaultError> {
        if self.pattern.is_empty() {
            dest.fill(0);
            return Ok(());
        }
        for (slot, byte) in dest.iter_mut().zip(self.pattern.iter().cycle()) {
            *slot = *byte;
        }
        Ok(())
    }
}

/// A random source that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRandom;

impl RandomSource for FailingRandom {
    fn fill(&self, _dest: &mut [u8]) -> Result<(), PinvaultError> {
        Err(PinvaultError::external_msg("random source unavailable"))
    }
}
