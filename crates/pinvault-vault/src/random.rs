// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System CSPRNG adapter for salt generation.

use pinvault_core::{PinvaultError, RandomSource};
use ring::rand::{SecureRandom, SystemRandom};

/// [`RandomSource`] backed by the operating system CSPRNG via `ring`.
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), PinvaultError> {
        self.rng
            .fill(dest)
            .map_err(|_| PinvaultError::external_msg("failed to read from the system random source"))
    }
}
