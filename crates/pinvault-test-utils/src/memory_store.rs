// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document store for deterministic testing.
//!
//! `MemoryStore` implements `DocumentStore` with the same ordering and event
//! semantics as the SQLite backend, plus hooks to make individual operations
//! fail and to inspect which operations were called.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, broadcast};

use pinvault_core::{
    Collection, DocumentStore, EntryId, EntryInsert, FaceTemplate, Folder, FolderId,
    MasterKeyRecord, MasterKeyUpdate, PinvaultError, StoreEvent, UserId, VaultEntry,
};

const EVENT_CAPACITY: usize = 64;

/// Master-key document as held in memory. The PIN is re-wrapped on every read.
#[derive(Default)]
struct MasterDoc {
    pin: Option<String>,
    biometric_enabled: bool,
    face_templates: Vec<FaceTemplate>,
    face_registration_completed: bool,
    last_updated: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    entries: Vec<VaultEntry>,
    folders: Vec<Folder>,
    masters: HashMap<UserId, MasterDoc>,
}

/// An in-memory [`DocumentStore`].
///
/// Operation names used by [`fail_operation`](Self::fail_operation) and
/// [`calls`](Self::calls) match the trait method names (`insert_entry`,
/// `find_folder`, ...).
pub struct MemoryStore {
    state: Mutex<State>,
    events: broadcast::Sender<StoreEvent>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<&'static str>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(State::default()),
            events,
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent call to `operation` fail with `ExternalIoFailure`.
    pub async fn fail_operation(&self, operation: &'static str) {
        self.failing.lock().await.insert(operation);
    }

    /// Undo [`fail_operation`](Self::fail_operation).
    pub async fn heal_operation(&self, operation: &'static str) {
        self.failing.lock().await.remove(operation);
    }

    /// Operation names called so far, in order.
    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    /// Number of times `operation` was called.
    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|name| **name == operation)
            .count()
    }

    /// Broadcast a listener failure for `collection`, as a remote store would
    /// when a live query breaks.
    pub fn emit_failure(&self, user: &UserId, collection: Collection, message: &str) {
        let _ = self.events.send(StoreEvent::Failed {
            user: user.clone(),
            collection,
            message: message.to_string(),
        });
    }

    /// Snapshot of every stored entry across all users.
    pub async fn all_entries(&self) -> Vec<VaultEntry> {
        self.state.lock().await.entries.clone()
    }

    async fn enter(&self, operation: &'static str) -> Result<(), PinvaultError> {
        self.calls.lock().await.push(operation);
        if self.failing.lock().await.contains(operation) {
            return Err(PinvaultError::external_msg(format!(
                "memory store: injected failure in {operation}"
            )));
        }
        Ok(())
    }

    fn notify(&self, user: &UserId, collection: Collection, folder: Option<String>) {
        // No receivers is fine.
        let _ = self.events.send(StoreEvent::Changed {
            user: user.clone(),
            collection,
            folder,
        });
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert_entry(
        &self,
        user: &UserId,
        entry: EntryInsert,
    ) -> Result<VaultEntry, PinvaultError> {
        self.enter("insert_entry").await?;
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
        self.state.lock().await.entries.push(stored.clone());
        self.notify(user, Collection::Passwords, Some(stored.folder_name.clone()));
        Ok(stored)
    }

    async fn get_entry(
        &self,
        user: &UserId,
        id: &EntryId,
    ) -> Result<Option<VaultEntry>, PinvaultError> {
        self.enter("get_entry").await?;
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .find(|e| &e.user_id == user && &e.id == id)
            .cloned())
    }

    async fn find_entry_by_title(
        &self,
        user: &UserId,
        title: &str,
    ) -> Result<Option<VaultEntry>, PinvaultError> {
        self.enter("find_entry_by_title").await?;
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .find(|e| &e.user_id == user && e.title == title)
            .cloned())
    }

    async fn query_entries(
        &self,
        user: &UserId,
        folder_name: &str,
    ) -> Result<Vec<VaultEntry>, PinvaultError> {
        self.enter("query_entries").await?;
        let state = self.state.lock().await;
        let mut entries: Vec<VaultEntry> = state
            .entries
            .iter()
            .filter(|e| &e.user_id == user && e.folder_name == folder_name)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(entries)
    }

    async fn delete_entry(&self, user: &UserId, id: &EntryId) -> Result<(), PinvaultError> {
        self.enter("delete_entry").await?;
        let removed = {
            let mut state = self.state.lock().await;
            let position = state
                .entries
                .iter()
                .position(|e| &e.user_id == user && &e.id == id);
            position.map(|i| state.entries.remove(i))
        };
        if let Some(entry) = removed {
            self.notify(user, Collection::Passwords, Some(entry.folder_name));
        }
        Ok(())
    }

    async fn list_folders(&self, user: &UserId) -> Result<Vec<Folder>, PinvaultError> {
        self.enter("list_folders").await?;
        let state = self.state.lock().await;
        // Insertion order reversed is newest first.
        Ok(state
            .folders
            .iter()
            .rev()
            .filter(|f| &f.user_id == user)
            .cloned()
            .collect())
    }

    async fn find_folder(
        &self,
        user: &UserId,
        name: &str,
    ) -> Result<Option<Folder>, PinvaultError> {
        self.enter("find_folder").await?;
        let state = self.state.lock().await;
        Ok(state
            .folders
            .iter()
            .find(|f| &f.user_id == user && f.name == name)
            .cloned())
    }

    async fn create_folder(
        &self,
        user: &UserId,
        name: &str,
        num_items: u64,
    ) -> Result<Folder, PinvaultError> {
        self.enter("create_folder").await?;
        let folder = Folder {
            id: FolderId::generate(),
            user_id: user.clone(),
            name: name.to_string(),
            num_items,
            created_at: Utc::now(),
        };
        self.state.lock().await.folders.push(folder.clone());
        self.notify(user, Collection::Folders, None);
        Ok(folder)
    }

    async fn increment_folder(
        &self,
        user: &UserId,
        id: &FolderId,
        delta: u64,
    ) -> Result<(), PinvaultError> {
        self.enter("increment_folder").await?;
        {
            let mut state = self.state.lock().await;
            let folder = state
                .folders
                .iter_mut()
                .find(|f| &f.user_id == user && &f.id == id)
                .ok_or_else(|| PinvaultError::external_msg(format!("folder {id} not found")))?;
            folder.num_items += delta;
        }
        self.notify(user, Collection::Folders, None);
        Ok(())
    }

    async fn master_record(
        &self,
        user: &UserId,
    ) -> Result<Option<MasterKeyRecord>, PinvaultError> {
        self.enter("master_record").await?;
        let state = self.state.lock().await;
        Ok(state.masters.get(user).map(|doc| MasterKeyRecord {
            user_id: user.clone(),
            pin: doc.pin.clone().map(SecretString::from),
            biometric_enabled: doc.biometric_enabled,
            face_templates: doc.face_templates.clone(),
            face_registration_completed: doc.face_registration_completed,
            last_updated: doc.last_updated,
        }))
    }

    async fn merge_master_record(
        &self,
        user: &UserId,
        update: MasterKeyUpdate,
    ) -> Result<(), PinvaultError> {
        self.enter("merge_master_record").await?;
        {
            let mut state = self.state.lock().await;
            let doc = state.masters.entry(user.clone()).or_default();
            if let Some(pin) = update.pin {
                doc.pin = Some(pin.expose_secret().to_string());
            }
            if let Some(enabled) = update.biometric_enabled {
                doc.biometric_enabled = enabled;
            }
            if let Some(templates) = update.face_templates {
                doc.face_templates = templates;
            }
            if let Some(completed) = update.face_registration_completed {
                doc.face_registration_completed = completed;
            }
            doc.last_updated = Utc::now();
        }
        self.notify(user, Collection::MasterKeys, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(title: &str, folder: &str) -> EntryInsert {
        EntryInsert {
            title: title.to_string(),
            username: "alice".to_string(),
            ciphertext: "00:ff".to_string(),
            folder_name: folder.to_string(),
        }
    }

    #[tokio::test]
    async fn entries_are_scoped_per_user_and_sorted_by_title() {
        let store = MemoryStore::new();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        store.insert_entry(&alice, insert("zeta", "Work")).await.unwrap();
        store.insert_entry(&alice, insert("alpha", "Work")).await.unwrap();
        store.insert_entry(&bob, insert("beta", "Work")).await.unwrap();

        let titles: Vec<String> = store
            .query_entries(&alice, "Work")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn injected_failure_applies_only_to_named_operation() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        store.fail_operation("find_folder").await;

        assert!(store.find_folder(&user, "Work").await.is_err());
        assert!(store.list_folders(&user).await.is_ok());

        store.heal_operation("find_folder").await;
        assert!(store.find_folder(&user, "Work").await.is_ok());
        assert_eq!(store.call_count("find_folder").await, 2);
    }

    #[tokio::test]
    async fn writes_broadcast_change_events() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        let mut events = store.subscribe();

        store.insert_entry(&user, insert("mail", "Personal")).await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            StoreEvent::Changed {
                user: user.clone(),
                collection: Collection::Passwords,
                folder: Some("Personal".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn merge_keeps_untouched_fields() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");

        store
            .merge_master_record(
                &user,
                MasterKeyUpdate {
                    pin: Some(SecretString::from("123456".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .merge_master_record(
                &user,
                MasterKeyUpdate {
                    biometric_enabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let record = store.master_record(&user).await.unwrap().unwrap();
        assert_eq!(record.pin.unwrap().expose_secret(), "123456");
        assert!(record.biometric_enabled);
    }

    #[tokio::test]
    async fn last_updated_is_stamped_on_merge_not_on_read() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        let enable = || MasterKeyUpdate {
            biometric_enabled: Some(true),
            ..Default::default()
        };

        store.merge_master_record(&user, enable()).await.unwrap();
        let first = store.master_record(&user).await.unwrap().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let reread = store.master_record(&user).await.unwrap().unwrap();
        assert_eq!(first.last_updated, reread.last_updated);

        store.merge_master_record(&user, enable()).await.unwrap();
        let merged = store.master_record(&user).await.unwrap().unwrap();
        assert!(merged.last_updated > first.last_updated);
    }

    #[tokio::test]
    async fn calls_are_recorded_in_order_including_failures() {
        let store = MemoryStore::new();
        let user = UserId::from("u1");
        store.fail_operation("create_folder").await;

        store.find_folder(&user, "Work").await.unwrap();
        assert!(store.create_folder(&user, "Work", 1).await.is_err());
        store.list_folders(&user).await.unwrap();

        assert_eq!(
            store.calls().await,
            vec!["find_folder", "create_folder", "list_folders"]
        );
    }
}
