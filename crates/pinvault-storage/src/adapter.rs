// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the DocumentStore trait.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use pinvault_config::model::StorageConfig;
use pinvault_core::{
    Collection, DocumentStore, EntryId, EntryInsert, Folder, FolderId, MasterKeyRecord,
    MasterKeyUpdate, PinvaultError, StoreEvent, UserId, VaultEntry,
};

use crate::database::Database;
use crate::queries;

const EVENT_CAPACITY: usize = 256;

/// SQLite-backed document store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. Every successful write is broadcast as a
/// [`StoreEvent`] so live queries can re-read their snapshot.
pub struct SqliteStore {
    db: Database,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteStore {
    /// Open the database named in `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, PinvaultError> {
        let db = Database::open(&config.database_path).await?;
        debug!(path = %config.database_path, "SQLite store opened");
        Ok(Self::with_database(db))
    }

    /// Open a private in-memory store.
    pub async fn open_in_memory() -> Result<Self, PinvaultError> {
        Ok(Self::with_database(Database::open_in_memory().await?))
    }

    /// Wrap an already opened database.
    pub fn with_database(db: Database) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { db, events }
    }

    /// Flush the WAL into the main database file.
    pub async fn close(&self) -> Result<(), PinvaultError> {
        self.db.checkpoint().await
    }

    fn notify(&self, user: &UserId, collection: Collection, folder: Option<String>) {
        // Nobody listening is not an error.
        let _ = self.events.send(StoreEvent::Changed {
            user: user.clone(),
            collection,
            folder,
        });
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert_entry(
        &self,
        user: &UserId,
        entry: EntryInsert,
    ) -> Result<VaultEntry, PinvaultError> {
        let now = Utc::now();
        let stored = VaultEntry {
            id: EntryId::generate(),
            user_id: user.clone(),
            title: entry.title,
            username: entry.username,
            ciphertext: entry.ciphertext,
            folder_name: entry.folder_name,
            created_at: now,
            updated_at: now,
        };
        queries::entries::insert_entry(&self.db, &stored).await?;
        self.notify(user, Collection::Passwords, Some(stored.folder_name.clone()));
        Ok(stored)
    }

    async fn get_entry(
        &self,
        user: &UserId,
        id: &EntryId,
    ) -> Result<Option<VaultEntry>, PinvaultError> {
        queries::entries::get_entry(&self.db, user, id).await
    }

    async fn find_entry_by_title(
        &self,
        user: &UserId,
        title: &str,
    ) -> Result<Option<VaultEntry>, PinvaultError> {
        queries::entries::find_by_title(&self.db, user, title).await
    }

    async fn query_entries(
        &self,
        user: &UserId,
        folder_name: &str,
    ) -> Result<Vec<VaultEntry>, PinvaultError> {
        queries::entries::list_in_folder(&self.db, user, folder_name).await
    }

    async fn delete_entry(&self, user: &UserId, id: &EntryId) -> Result<(), PinvaultError> {
        if let Some(folder) = queries::entries::delete_entry(&self.db, user, id).await? {
            self.notify(user, Collection::Passwords, Some(folder));
        }
        Ok(())
    }

    async fn list_folders(&self, user: &UserId) -> Result<Vec<Folder>, PinvaultError> {
        queries::folders::list_folders(&self.db, user).await
    }

    async fn find_folder(
        &self,
        user: &UserId,
        name: &str,
    ) -> Result<Option<Folder>, PinvaultError> {
        queries::folders::find_folder(&self.db, user, name).await
    }

    async fn create_folder(
        &self,
        user: &UserId,
        name: &str,
        num_items: u64,
    ) -> Result<Folder, PinvaultError> {
        let folder = Folder {
            id: FolderId::generate(),
            user_id: user.clone(),
            name: name.to_string(),
            num_items,
            created_at: Utc::now(),
        };
        queries::folders::create_folder(&self.db, &folder).await?;
        self.notify(user, Collection::Folders, None);
        Ok(folder)
    }

    async fn increment_folder(
        &self,
        user: &UserId,
        id: &FolderId,
        delta: u64,
    ) -> Result<(), PinvaultError> {
        if !queries::folders::increment_folder(&self.db, user, id, delta).await? {
            return Err(PinvaultError::external_msg(format!("folder {id} not found")));
        }
        self.notify(user, Collection::Folders, None);
        Ok(())
    }

    async fn master_record(
        &self,
        user: &UserId,
    ) -> Result<Option<MasterKeyRecord>, PinvaultError> {
        queries::master_keys::get_record(&self.db, user).await
    }

    async fn merge_master_record(
        &self,
        user: &UserId,
        update: MasterKeyUpdate,
    ) -> Result<(), PinvaultError> {
        queries::master_keys::merge_record(&self.db, user, update).await?;
        self.notify(user, Collection::MasterKeys, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
