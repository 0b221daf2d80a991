// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store trait for the per-user `passwords` and `folders` collections.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::PinvaultError;
use crate::types::{
    EntryId, EntryInsert, Folder, FolderId, MasterKeyRecord, MasterKeyUpdate, StoreEvent, UserId,
    VaultEntry,
};

/// Backend holding vault entries, folders, and master-key records.
///
/// Implementations must broadcast a [`StoreEvent`] after every successful
/// write so that live queries can re-deliver their snapshots. Backend failures
/// are reported as [`PinvaultError::ExternalIoFailure`].
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Human-readable backend name, used in log fields.
    fn name(&self) -> &str;

    /// Insert a new entry and return it with its assigned id and timestamps.
    async fn insert_entry(&self, user: &UserId, entry: EntryInsert)
    -> Result<VaultEntry, PinvaultError>;

    /// Fetch one entry by id.
    async fn get_entry(&self, user: &UserId, id: &EntryId)
    -> Result<Option<VaultEntry>, PinvaultError>;

    /// Find the first entry whose title equals `title`.
    async fn find_entry_by_title(
        &self,
        user: &UserId,
        title: &str,
    ) -> Result<Option<VaultEntry>, PinvaultError>;

    /// Entries whose folder equals `folder_name`, ordered by title ascending.
    async fn query_entries(
        &self,
        user: &UserId,
        folder_name: &str,
    ) -> Result<Vec<VaultEntry>, PinvaultError>;

    /// Delete an entry. Deleting a missing entry is not an error.
    async fn delete_entry(&self, user: &UserId, id: &EntryId) -> Result<(), PinvaultError>;

    /// All folders for the user, newest first.
    async fn list_folders(&self, user: &UserId) -> Result<Vec<Folder>, PinvaultError>;

    /// Find a folder by exact name.
    async fn find_folder(&self, user: &UserId, name: &str)
    -> Result<Option<Folder>, PinvaultError>;

    /// Create a folder with an initial item count.
    async fn create_folder(
        &self,
        user: &UserId,
        name: &str,
        num_items: u64,
    ) -> Result<Folder, PinvaultError>;

    /// Atomically add `delta` to a folder's item count.
    async fn increment_folder(
        &self,
        user: &UserId,
        id: &FolderId,
        delta: u64,
    ) -> Result<(), PinvaultError>;

    /// Read the user's master-key record.
    async fn master_record(&self, user: &UserId)
    -> Result<Option<MasterKeyRecord>, PinvaultError>;

    /// Merge `update` into the user's master-key record, creating it if needed.
    async fn merge_master_record(
        &self,
        user: &UserId,
        update: MasterKeyUpdate,
    ) -> Result<(), PinvaultError>;

    /// Subscribe to change notifications for all users.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
