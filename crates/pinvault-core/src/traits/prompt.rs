// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret-entry prompt trait (terminal, biometric sheet, test script).

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::PinvaultError;

/// Asks the user for a secret.
///
/// May block for as long as the user takes to answer; no timeout is applied.
#[async_trait]
pub trait SecretPrompt: Send + Sync {
    /// Returns `Ok(None)` when the user cancels the prompt.
    async fn request_secret(&self, message: &str) -> Result<Option<SecretString>, PinvaultError>;
}
