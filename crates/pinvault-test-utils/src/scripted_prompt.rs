// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret prompt that replays scripted answers.

use std::collections::VecDeque;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::Mutex;

use pinvault_core::{PinvaultError, SecretPrompt};

/// A [`SecretPrompt`] whose answers are queued up front.
///
/// `Some(secret)` answers the prompt; `None` simulates the user dismissing it.
/// Once the script is exhausted every further prompt is treated as dismissed.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    /// Create a prompt that replays `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(Into::into)).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// A prompt that answers once with `secret`.
    pub fn answering(secret: &str) -> Self {
        Self::new([Some(secret)])
    }

    /// A prompt that is always dismissed.
    pub fn cancelled() -> Self {
        Self::new(Vec::<Option<String>>::new())
    }

    /// Messages shown so far, in order.
    pub async fn asked(&self) -> Vec<String> {
        self.asked.lock().await.clone()
    }
}

#[async_trait]
impl SecretPrompt for ScriptedPrompt {
    async fn request_secret(&self, message: &str) -> Result<Option<SecretString>, PinvaultError> {
        self.asked.lock().await.push(message.to_string());
        let answer = self.answers.lock().await.pop_front().flatten();
        Ok(answer.map(SecretString::from))
    }
}
