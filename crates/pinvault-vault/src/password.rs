// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random password generation.
//!
//! One character from each class is placed first, the rest are drawn
//! uniformly from the combined alphabet, and the whole sequence is shuffled.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};

pub const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &[u8] = b"0123456789";
pub const SYMBOLS: &[u8] = b"!@#$%^&*()_+";

/// Length used when none is configured.
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

const CLASSES: [&[u8]; 4] = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS];

/// Generate a 16-character password using OS randomness.
pub fn generate_password() -> String {
    generate_password_with(&mut OsRng, DEFAULT_PASSWORD_LENGTH)
}

/// Generate a password of `length` characters using OS randomness.
///
/// Lengths below the number of character classes are raised to it.
pub fn generate_password_of_length(length: usize) -> String {
    generate_password_with(&mut OsRng, length)
}

/// Generate a password from the supplied CSPRNG.
pub fn generate_password_with<R: Rng + CryptoRng>(rng: &mut R, length: usize) -> String {
    let length = length.max(CLASSES.len());

    let mut chars: Vec<u8> = CLASSES.iter().map(|class| pick(rng, class)).collect();
    let alphabet: Vec<u8> = CLASSES.concat();
    while chars.len() < length {
        chars.push(pick(rng, &alphabet));
    }
    chars.shuffle(rng);

    chars.into_iter().map(char::from).collect()
}

fn pick<R: Rng>(rng: &mut R, class: &[u8]) -> u8 {
    class[rng.gen_range(0..class.len())]
}
