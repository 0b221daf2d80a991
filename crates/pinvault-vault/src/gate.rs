// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-key gate: the per-user PIN record and everything that checks it.
//!
//! The stored PIN doubles as the secret every entry is sealed under, so it is
//! fetched per call, compared in constant time, and never cached or logged.

use std::sync::Arc;

use pinvault_config::PinvaultConfig;
use pinvault_core::{DocumentStore, FaceTemplate, MasterKeyUpdate, PinvaultError, UserId};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::face::FaceMatcher;

/// Compare two byte strings without early exit on the first difference.
///
/// Length is not secret: unequal lengths return `false` immediately.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Guards access to the master secret stored in each user's record.
#[derive(Clone)]
pub struct MasterKeyGate {
    store: Arc<dyn DocumentStore>,
    min_pin_length: usize,
    matcher: FaceMatcher,
}

impl MasterKeyGate {
    pub fn new(store: Arc<dyn DocumentStore>, min_pin_length: usize, matcher: FaceMatcher) -> Self {
        Self {
            store,
            min_pin_length,
            matcher,
        }
    }

    /// Build a gate using the `[security]` and `[face]` sections.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &PinvaultConfig) -> Self {
        Self::new(
            store,
            config.security.min_pin_length,
            FaceMatcher::from(&config.face),
        )
    }

    pub fn min_pin_length(&self) -> usize {
        self.min_pin_length
    }

    pub fn matcher(&self) -> &FaceMatcher {
        &self.matcher
    }

    /// Read the user's master secret.
    pub async fn fetch_master_secret(&self, user: &UserId) -> Result<SecretString, PinvaultError> {
        self.store
            .master_record(user)
            .await?
            .and_then(|record| record.pin)
            .ok_or_else(|| PinvaultError::BiometricsNotConfigured {
                user: user.to_string(),
            })
    }

    /// Whether `presented` exactly equals the stored master secret.
    pub async fn authorize(
        &self,
        presented: &SecretString,
        user: &UserId,
    ) -> Result<bool, PinvaultError> {
        Ok(self.check(presented, user).await?.is_some())
    }

    /// Return the stored secret if `presented` matches it.
    ///
    /// Fails with [`PinvaultError::Unauthorized`] on mismatch. Callers that
    /// need the secret after authorizing use this to avoid a second read.
    pub async fn unlock(
        &self,
        presented: &SecretString,
        user: &UserId,
    ) -> Result<SecretString, PinvaultError> {
        self.check(presented, user)
            .await?
            .ok_or(PinvaultError::Unauthorized)
    }

    async fn check(
        &self,
        presented: &SecretString,
        user: &UserId,
    ) -> Result<Option<SecretString>, PinvaultError> {
        let stored = self.fetch_master_secret(user).await?;
        if constant_time_eq(
            presented.expose_secret().as_bytes(),
            stored.expose_secret().as_bytes(),
        ) {
            Ok(Some(stored))
        } else {
            warn!(user = %user, "master key rejected");
            Ok(None)
        }
    }

    /// Check a new PIN and its confirmation against the policy.
    pub fn validate_pin(
        &self,
        pin: &SecretString,
        confirm: &SecretString,
    ) -> Result<(), PinvaultError> {
        if pin.expose_secret().chars().count() < self.min_pin_length {
            return Err(PinvaultError::WeakPin {
                min_length: self.min_pin_length,
            });
        }
        if !constant_time_eq(
            pin.expose_secret().as_bytes(),
            confirm.expose_secret().as_bytes(),
        ) {
            return Err(PinvaultError::Mismatch);
        }
        Ok(())
    }

    /// Validate and persist a new master PIN. Other record fields are kept.
    pub async fn enroll(
        &self,
        user: &UserId,
        pin: &SecretString,
        confirm: &SecretString,
    ) -> Result<(), PinvaultError> {
        self.validate_pin(pin, confirm)?;
        self.store
            .merge_master_record(
                user,
                MasterKeyUpdate {
                    pin: Some(SecretString::from(pin.expose_secret().to_string())),
                    ..Default::default()
                },
            )
            .await?;
        info!(user = %user, "master PIN enrolled");
        Ok(())
    }

    /// Persist the PIN and mark biometrics enabled after fingerprint enrollment.
    pub async fn enable_biometrics(
        &self,
        user: &UserId,
        pin: SecretString,
    ) -> Result<(), PinvaultError> {
        self.store
            .merge_master_record(
                user,
                MasterKeyUpdate {
                    pin: Some(pin),
                    biometric_enabled: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        info!(user = %user, "biometric unlock enabled");
        Ok(())
    }

    /// Persist enrolled face templates and mark face registration complete.
    pub async fn store_face_templates(
        &self,
        user: &UserId,
        templates: Vec<FaceTemplate>,
    ) -> Result<(), PinvaultError> {
        let count = templates.len();
        self.store
            .merge_master_record(
                user,
                MasterKeyUpdate {
                    face_templates: Some(templates),
                    face_registration_completed: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        info!(user = %user, templates = count, "face registration completed");
        Ok(())
    }

    /// Whether `candidate` matches one of the user's enrolled face templates.
    pub async fn verify_face(
        &self,
        user: &UserId,
        candidate: &FaceTemplate,
    ) -> Result<bool, PinvaultError> {
        let record = self.store.master_record(user).await?;
        let templates = match record {
            Some(record) if !record.face_templates.is_empty() => record.face_templates,
            _ => {
                return Err(PinvaultError::BiometricsNotConfigured {
                    user: user.to_string(),
                });
            }
        };

        let matched = self.matcher.matches(candidate, &templates);
        let score = self.matcher.best_match(candidate, &templates);
        debug!(user = %user, ?score, matched, "face verification");
        Ok(matched)
    }
}
