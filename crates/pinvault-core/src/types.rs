// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the vault engine and its storage backends.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identity of the authenticated user owning a set of entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque identifier of a stored vault entry, assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a folder document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(pub String);

impl FolderId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored credential. `ciphertext` holds a `salt:cipherHex` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub title: String,
    pub username: String,
    pub ciphertext: String,
    pub folder_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a store needs to insert a new, already-sealed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInsert {
    pub title: String,
    pub username: String,
    pub ciphertext: String,
    pub folder_name: String,
}

/// A named grouping of entries with an incrementally maintained item count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub user_id: UserId,
    pub name: String,
    pub num_items: u64,
    pub created_at: DateTime<Utc>,
}

/// A 2D landmark position reported by the face detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Head rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Snapshot of facial features used for similarity-based verification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceTemplate {
    /// Landmark name (e.g. `leftEye`) to position.
    pub landmarks: BTreeMap<String, Point>,
    pub angles: HeadAngles,
}

/// Per-user master-key record.
///
/// Debug output never shows the PIN.
#[derive(Debug)]
pub struct MasterKeyRecord {
    pub user_id: UserId,
    pub pin: Option<SecretString>,
    pub biometric_enabled: bool,
    pub face_templates: Vec<FaceTemplate>,
    pub face_registration_completed: bool,
    pub last_updated: DateTime<Utc>,
}

/// A merge-write against a [`MasterKeyRecord`]. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct MasterKeyUpdate {
    pub pin: Option<SecretString>,
    pub biometric_enabled: Option<bool>,
    pub face_templates: Option<Vec<FaceTemplate>>,
    pub face_registration_completed: Option<bool>,
}

/// The document collections a store keeps per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Passwords,
    Folders,
    MasterKeys,
}

/// Change notification pushed by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Documents in `collection` changed. `folder` names the folder the
    /// changed entry belongs to, when applicable.
    Changed {
        user: UserId,
        collection: Collection,
        folder: Option<String>,
    },
    /// The store failed to deliver updates for `collection`.
    Failed {
        user: UserId,
        collection: Collection,
        message: String,
    },
}

impl StoreEvent {
    /// The user whose documents this event concerns.
    pub fn user(&self) -> &UserId {
        match self {
            Self::Changed { user, .. } | Self::Failed { user, .. } => user,
        }
    }

    /// The collection this event concerns.
    pub fn collection(&self) -> Collection {
        match self {
            Self::Changed { collection, .. } | Self::Failed { collection, .. } => *collection,
        }
    }
}
