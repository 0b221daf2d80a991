// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Salted key derivation for entry sealing.
//!
//! The key is the lowercase hex SHA-256 digest of `secret || salt`, where the
//! salt is used in its hex text form. Sealing consumes the 64 ASCII bytes of
//! that hex string as keystream, so stored tokens stay readable by every
//! existing client of the vault format.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of a derived key in hex characters.
pub const DERIVED_KEY_LEN: usize = 64;

/// Derive the per-entry key from the master secret and a hex salt.
///
/// The returned key is wrapped in [`Zeroizing`] for automatic memory zeroing
/// on drop.
pub fn derive(secret: &str, salt_hex: &str) -> Zeroizing<String> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(salt_hex.as_bytes());
    Zeroizing::new(hex::encode(hasher.finalize()))
}
