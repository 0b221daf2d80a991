// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master PIN acquisition via TTY prompt or PINVAULT_MASTER_KEY environment variable.

use async_trait::async_trait;
use pinvault_core::{PinvaultError, SecretPrompt};
use secrecy::{ExposeSecret, SecretString};

/// The environment variable name for providing the master PIN.
pub const MASTER_KEY_ENV_VAR: &str = "PINVAULT_MASTER_KEY";

/// Reads the master PIN for headless runs or from the terminal.
///
/// Priority:
/// 1. `PINVAULT_MASTER_KEY` environment variable (for scripts and CI)
/// 2. Interactive TTY prompt via `rpassword`
///
/// An empty answer at the terminal counts as dismissing the prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtyPrompt;

fn env_secret() -> Option<SecretString> {
    std::env::var(MASTER_KEY_ENV_VAR)
        .ok()
        .filter(|key| !key.is_empty())
        .map(SecretString::from)
}

fn read_line(label: &str) -> Result<String, PinvaultError> {
    rpassword::prompt_password(label)
        .map_err(|e| PinvaultError::external(format!("failed to read {label}"), e))
}

fn require_terminal() -> Result<(), PinvaultError> {
    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        Ok(())
    } else {
        Err(PinvaultError::external_msg(format!(
            "no PIN provided. Set {MASTER_KEY_ENV_VAR} or run interactively."
        )))
    }
}

#[async_trait]
impl SecretPrompt for TtyPrompt {
    async fn request_secret(&self, message: &str) -> Result<Option<SecretString>, PinvaultError> {
        if let Some(secret) = env_secret() {
            return Ok(Some(secret));
        }
        require_terminal()?;

        let label = format!("{message}: ");
        let answer = tokio::task::spawn_blocking(move || read_line(&label))
            .await
            .map_err(|e| PinvaultError::Internal(format!("prompt task failed: {e}")))??;

        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SecretString::from(answer)))
        }
    }
}

/// Read a new PIN and its confirmation (for enrollment).
///
/// The environment variable, when set, supplies both. Policy checks are left
/// to the caller.
pub fn read_new_pin() -> Result<(SecretString, SecretString), PinvaultError> {
    if let Some(pin) = env_secret() {
        let confirm = SecretString::from(pin.expose_secret().to_string());
        return Ok((pin, confirm));
    }
    require_terminal()?;

    let pin = read_line("New master PIN: ")?;
    if pin.is_empty() {
        return Err(PinvaultError::PromptCancelled);
    }
    let confirm = read_line("Confirm master PIN: ")?;
    Ok((SecretString::from(pin), SecretString::from(confirm)))
}
