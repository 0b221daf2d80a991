// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Pinvault credential vault.

use thiserror::Error;

/// The primary error type used across all Pinvault crates.
///
/// None of these are retried by the vault itself; every variant is surfaced to
/// the caller so the surrounding UI can present it.
#[derive(Debug, Error)]
pub enum PinvaultError {
    /// One or more required fields were empty.
    #[error("missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    /// An entry with the same title already exists for this user.
    #[error("an entry titled `{title}` already exists")]
    DuplicateTitle { title: String },

    /// The presented master secret did not match the stored one.
    #[error("master key rejected")]
    Unauthorized,

    /// No master-key record (or no PIN / face templates) exists for the user.
    #[error("biometrics not configured for user `{user}`")]
    BiometricsNotConfigured { user: String },

    /// The PIN is shorter than the configured minimum.
    #[error("PIN must be at least {min_length} characters")]
    WeakPin { min_length: usize },

    /// PIN and confirmation PIN differ.
    #[error("PIN confirmation does not match")]
    Mismatch,

    /// A ciphertext token could not be parsed.
    #[error("malformed ciphertext token: {0}")]
    MalformedToken(String),

    /// Decrypted bytes are not valid UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidEncoding,

    /// A collaborator (document store, prompt, random source) failed.
    #[error("external I/O failure: {message}")]
    ExternalIoFailure {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user dismissed a secret-entry prompt.
    #[error("secret prompt was cancelled")]
    PromptCancelled,

    /// An enrollment step was attempted out of order.
    #[error("cannot {attempted} while enrollment is in the {current} step")]
    InvalidState {
        current: String,
        attempted: &'static str,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PinvaultError {
    /// Build an [`ExternalIoFailure`](Self::ExternalIoFailure) carrying the underlying cause.
    pub fn external<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ExternalIoFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build an [`ExternalIoFailure`](Self::ExternalIoFailure) with only a message.
    pub fn external_msg(message: impl Into<String>) -> Self {
        Self::ExternalIoFailure {
            message: message.into(),
            source: None,
        }
    }
}
