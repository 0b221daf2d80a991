// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seal/open operations for the `salt:cipherHex` entry token.
//!
//! Every call to [`seal`] draws a fresh 8-byte salt from the injected
//! [`RandomSource`]. The plaintext is XORed with the derived key repeated
//! every 64 bytes. There is no authentication tag: a flipped ciphertext bit
//! flips the same plaintext bit, and nothing detects it. The format is kept
//! byte-for-byte so previously stored vaults stay readable.

use std::fmt;
use std::str::FromStr;

use pinvault_core::{PinvaultError, RandomSource};
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::kdf;

/// Number of random salt bytes drawn per seal.
pub const SALT_LEN: usize = 8;

/// Separator between the salt and the cipher half of a token.
pub const TOKEN_SEPARATOR: char = ':';

/// A parsed ciphertext token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherToken {
    salt: String,
    cipher: Vec<u8>,
}

impl CipherToken {
    /// The salt, in the hex text form that feeds key derivation.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// The raw cipher bytes (same length as the plaintext).
    pub fn cipher(&self) -> &[u8] {
        &self.cipher
    }
}

impl FromStr for CipherToken {
    type Err = PinvaultError;

    /// Split on the first `:` and check both halves are hex.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (salt, cipher_hex) = token
            .split_once(TOKEN_SEPARATOR)
            .ok_or_else(|| PinvaultError::MalformedToken("missing `:` separator".to_string()))?;

        if salt.is_empty() {
            return Err(PinvaultError::MalformedToken("empty salt".to_string()));
        }
        hex::decode(salt)
            .map_err(|e| PinvaultError::MalformedToken(format!("salt is not valid hex: {e}")))?;
        let cipher = hex::decode(cipher_hex)
            .map_err(|e| PinvaultError::MalformedToken(format!("cipher is not valid hex: {e}")))?;

        Ok(Self {
            salt: salt.to_string(),
            cipher,
        })
    }
}

impl fmt::Display for CipherToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{TOKEN_SEPARATOR}{}", self.salt, hex::encode(&self.cipher))
    }
}

/// XOR `data` with `key` repeated to cover it.
fn apply_keystream(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}

/// Seal `plaintext` under `secret`, returning a `salt:cipherHex` token.
///
/// Fails only if the random source fails.
pub fn seal(
    plaintext: &str,
    secret: &str,
    rng: &dyn RandomSource,
) -> Result<String, PinvaultError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    rng.fill(&mut salt_bytes)?;
    let salt = hex::encode(salt_bytes);

    let key = kdf::derive(secret, &salt);
    let cipher = apply_keystream(plaintext.as_bytes(), key.as_bytes());

    Ok(CipherToken { salt, cipher }.to_string())
}

/// Open a token and return the raw plaintext bytes.
///
/// A wrong secret does not fail here; it yields different bytes.
pub fn open_bytes(token: &str, secret: &str) -> Result<Zeroizing<Vec<u8>>, PinvaultError> {
    let token: CipherToken = token.parse()?;
    let key = kdf::derive(secret, token.salt());
    Ok(Zeroizing::new(apply_keystream(token.cipher(), key.as_bytes())))
}

/// Open a token and decode the plaintext as UTF-8.
///
/// Invalid UTF-8 fails with [`PinvaultError::InvalidEncoding`]; no partial or
/// lossy output is ever returned.
pub fn open(token: &str, secret: &str) -> Result<SecretString, PinvaultError> {
    let bytes = open_bytes(token, secret)?;
    let text = std::str::from_utf8(&bytes).map_err(|_| PinvaultError::InvalidEncoding)?;
    Ok(SecretString::from(text.to_string()))
}

/// Stored size of a token in bytes.
pub fn encrypted_size(token: &str) -> usize {
    token.len()
}
