// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential vault engine for Pinvault.
//!
//! Entries are sealed under the user's master PIN into a `salt:cipherHex`
//! token (salted SHA-256 keystream, XOR), so the PIN is required again for
//! every reveal. Around that sit the master-key gate, the biometric
//! enrollment flow, per-folder counts, and live queries over the document
//! store.

pub mod crypto;
pub mod enrollment;
pub mod face;
pub mod gate;
pub mod kdf;
pub mod ledger;
pub mod password;
pub mod prompt;
pub mod random;
pub mod store;
pub mod subscription;

pub use crypto::{encrypted_size, open, seal};
pub use enrollment::{EnrollmentFlow, EnrollmentStep, FingerprintOutcome};
pub use face::{CaptureOutcome, FaceEnrollment, FaceMatcher};
pub use gate::MasterKeyGate;
pub use ledger::FolderLedger;
pub use password::generate_password;
pub use prompt::TtyPrompt;
pub use random::SystemRandomSource;
pub use store::{NewEntry, VaultEntryStore, VaultSession};
pub use subscription::Subscription;
