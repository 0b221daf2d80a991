// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guided biometric setup: PIN, then fingerprint, then face captures.
//!
//! Each step may only run in its own state; anything else fails with
//! [`PinvaultError::InvalidState`]. Nothing is persisted until the
//! fingerprint step succeeds.

use std::fmt;

use pinvault_core::{FaceTemplate, PinvaultError, UserId};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::face::{CaptureOutcome, FaceEnrollment};
use crate::gate::MasterKeyGate;

/// Where a user is in biometric setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStep {
    PinSetup,
    FingerprintSetup,
    FaceSetup,
    Complete,
}

impl fmt::Display for EnrollmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PinSetup => "PIN setup",
            Self::FingerprintSetup => "fingerprint setup",
            Self::FaceSetup => "face setup",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// What the platform fingerprint sensor reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintOutcome {
    Enrolled,
    Failed,
}

/// Drives one user through biometric setup.
pub struct EnrollmentFlow {
    gate: MasterKeyGate,
    user: UserId,
    step: EnrollmentStep,
    pending_pin: Option<SecretString>,
    face: FaceEnrollment,
}

impl EnrollmentFlow {
    pub fn new(gate: MasterKeyGate, user: UserId) -> Self {
        let face = FaceEnrollment::new(*gate.matcher());
        Self {
            gate,
            user,
            step: EnrollmentStep::PinSetup,
            pending_pin: None,
            face,
        }
    }

    pub fn step(&self) -> EnrollmentStep {
        self.step
    }

    /// Fraction of face captures collected so far.
    pub fn face_progress(&self) -> f64 {
        self.face.progress()
    }

    fn ensure_step(&self, step: EnrollmentStep, attempted: &'static str) -> Result<(), PinvaultError> {
        if self.step == step {
            Ok(())
        } else {
            Err(PinvaultError::InvalidState {
                current: self.step.to_string(),
                attempted,
            })
        }
    }

    /// Validate the chosen PIN and hold it until fingerprint enrollment.
    pub fn submit_pin(
        &mut self,
        pin: SecretString,
        confirm: SecretString,
    ) -> Result<EnrollmentStep, PinvaultError> {
        self.ensure_step(EnrollmentStep::PinSetup, "submit a PIN")?;
        self.gate.validate_pin(&pin, &confirm)?;
        self.pending_pin = Some(pin);
        self.step = EnrollmentStep::FingerprintSetup;
        debug!(user = %self.user, "PIN accepted; awaiting fingerprint");
        Ok(self.step)
    }

    /// Record the fingerprint result. Success persists the PIN with
    /// biometrics enabled; failure leaves the flow where it is.
    pub async fn fingerprint_result(
        &mut self,
        outcome: FingerprintOutcome,
    ) -> Result<EnrollmentStep, PinvaultError> {
        self.ensure_step(EnrollmentStep::FingerprintSetup, "record a fingerprint")?;
        if outcome == FingerprintOutcome::Failed {
            warn!(user = %self.user, "fingerprint enrollment failed");
            return Ok(self.step);
        }

        let pin = self.pending_pin.take().ok_or_else(|| {
            PinvaultError::Internal("fingerprint step reached without a pending PIN".to_string())
        })?;
        self.gate.enable_biometrics(&self.user, pin).await?;
        self.step = EnrollmentStep::FaceSetup;
        Ok(self.step)
    }

    /// Offer one face snapshot. When enough are collected the templates are
    /// persisted and the flow completes.
    pub async fn capture_face(
        &mut self,
        snapshot: FaceTemplate,
    ) -> Result<CaptureOutcome, PinvaultError> {
        self.ensure_step(EnrollmentStep::FaceSetup, "capture a face")?;
        let outcome = self.face.offer(snapshot);
        if outcome == CaptureOutcome::Complete {
            self.gate
                .store_face_templates(&self.user, self.face.templates().to_vec())
                .await?;
            self.step = EnrollmentStep::Complete;
            info!(user = %self.user, "biometric enrollment complete");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use pinvault_core::{DocumentStore, HeadAngles, Point};
    use pinvault_test_utils::MemoryStore;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::face::FaceMatcher;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn flow(store: Arc<MemoryStore>) -> EnrollmentFlow {
        let matcher = FaceMatcher {
            required_templates: 2,
            ..FaceMatcher::default()
        };
        EnrollmentFlow::new(MasterKeyGate::new(store, 6, matcher), UserId::from("u1"))
    }

    fn face(yaw: f64) -> FaceTemplate {
        FaceTemplate {
            landmarks: BTreeMap::from([("noseBase".to_string(), Point { x: 50.0, y: 60.0 })]),
            angles: HeadAngles {
                yaw,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn full_flow_persists_pin_and_templates() {
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow(store.clone());
        let user = UserId::from("u1");

        assert_eq!(
            flow.submit_pin(secret("123456"), secret("123456")).unwrap(),
            EnrollmentStep::FingerprintSetup
        );
        assert!(store.master_record(&user).await.unwrap().is_none());

        assert_eq!(
            flow.fingerprint_result(FingerprintOutcome::Enrolled)
                .await
                .unwrap(),
            EnrollmentStep::FaceSetup
        );

        assert_eq!(flow.face_progress(), 0.0);
        assert_eq!(
            flow.capture_face(face(45.0)).await.unwrap(),
            CaptureOutcome::Rejected
        );
        assert_eq!(flow.face_progress(), 0.0);
        assert_eq!(
            flow.capture_face(face(5.0)).await.unwrap(),
            CaptureOutcome::Accepted {
                captured: 1,
                required: 2
            }
        );
        assert_eq!(flow.face_progress(), 0.5);
        assert_eq!(
            flow.capture_face(face(-5.0)).await.unwrap(),
            CaptureOutcome::Complete
        );
        assert_eq!(flow.face_progress(), 1.0);
        assert_eq!(flow.step(), EnrollmentStep::Complete);

        let record = store.master_record(&user).await.unwrap().unwrap();
        assert_eq!(record.pin.unwrap().expose_secret(), "123456");
        assert!(record.biometric_enabled);
        assert!(record.face_registration_completed);
        assert_eq!(record.face_templates.len(), 2);
    }

    #[tokio::test]
    async fn weak_or_mismatched_pin_stays_in_pin_setup() {
        let mut flow = flow(Arc::new(MemoryStore::new()));

        let err = flow.submit_pin(secret("123"), secret("123")).unwrap_err();
        assert!(matches!(err, PinvaultError::WeakPin { .. }));
        let err = flow
            .submit_pin(secret("123456"), secret("654321"))
            .unwrap_err();
        assert!(matches!(err, PinvaultError::Mismatch));
        assert_eq!(flow.step(), EnrollmentStep::PinSetup);
    }

    #[tokio::test]
    async fn failed_fingerprint_allows_retry() {
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow(store.clone());
        flow.submit_pin(secret("123456"), secret("123456")).unwrap();

        assert_eq!(
            flow.fingerprint_result(FingerprintOutcome::Failed)
                .await
                .unwrap(),
            EnrollmentStep::FingerprintSetup
        );
        assert_eq!(store.call_count("merge_master_record").await, 0);

        assert_eq!(
            flow.fingerprint_result(FingerprintOutcome::Enrolled)
                .await
                .unwrap(),
            EnrollmentStep::FaceSetup
        );
    }

    #[tokio::test]
    async fn out_of_order_steps_are_rejected() {
        let mut flow = flow(Arc::new(MemoryStore::new()));

        let err = flow
            .fingerprint_result(FingerprintOutcome::Enrolled)
            .await
            .unwrap_err();
        assert!(matches!(err, PinvaultError::InvalidState { .. }));

        let err = flow.capture_face(face(0.0)).await.unwrap_err();
        assert!(err.to_string().contains("PIN setup"));

        flow.submit_pin(secret("123456"), secret("123456")).unwrap();
        let err = flow
            .submit_pin(secret("123456"), secret("123456"))
            .unwrap_err();
        assert!(matches!(err, PinvaultError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn template_write_failure_can_be_retried() {
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow(store.clone());
        flow.submit_pin(secret("123456"), secret("123456")).unwrap();
        flow.fingerprint_result(FingerprintOutcome::Enrolled)
            .await
            .unwrap();
        flow.capture_face(face(0.0)).await.unwrap();

        store.fail_operation("merge_master_record").await;
        assert!(flow.capture_face(face(0.0)).await.is_err());
        assert_eq!(flow.step(), EnrollmentStep::FaceSetup);

        store.heal_operation("merge_master_record").await;
        assert_eq!(
            flow.capture_face(face(0.0)).await.unwrap(),
            CaptureOutcome::Complete
        );
        assert_eq!(flow.step(), EnrollmentStep::Complete);
    }
}
