// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pinvault credential vault.
//!
//! This crate provides the error taxonomy, the domain types (entries, folders,
//! master-key records, face templates), and the collaborator traits the vault
//! engine consumes: a document store with change notifications, a random
//! source, and a secret prompt.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PinvaultError;
pub use traits::{DocumentStore, RandomSource, SecretPrompt};
pub use types::{
    Collection, EntryId, EntryInsert, FaceTemplate, Folder, FolderId, HeadAngles,
    MasterKeyRecord, MasterKeyUpdate, Point, StoreEvent, UserId, VaultEntry,
};
