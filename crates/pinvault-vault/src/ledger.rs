// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-folder item counts.
//!
//! Counts only ever go up: deleting an entry leaves its folder's count as is.

use std::sync::Arc;

use pinvault_core::{Collection, DocumentStore, Folder, PinvaultError, UserId};
use tracing::debug;

use crate::subscription::{EventFilter, Subscription};

/// Keeps the `folders` collection in step with saved entries.
#[derive(Clone)]
pub struct FolderLedger {
    store: Arc<dyn DocumentStore>,
}

impl FolderLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Count one new entry in `folder_name`, creating the folder on first use.
    ///
    /// Runs after the entry insert and is not atomic with it.
    pub async fn record_new_entry(
        &self,
        user: &UserId,
        folder_name: &str,
    ) -> Result<(), PinvaultError> {
        match self.store.find_folder(user, folder_name).await? {
            Some(folder) => {
                self.store.increment_folder(user, &folder.id, 1).await?;
                debug!(user = %user, folder = %folder_name, "folder count incremented");
            }
            None => {
                self.store.create_folder(user, folder_name, 1).await?;
                debug!(user = %user, folder = %folder_name, "folder created");
            }
        }
        Ok(())
    }

    /// Live view of the user's folders, newest first.
    ///
    /// Must be called within a Tokio runtime.
    pub fn folders(&self, user: &UserId) -> Subscription<Vec<Folder>> {
        let filter = EventFilter {
            user: user.clone(),
            collection: Collection::Folders,
            folder: None,
        };
        let store = self.store.clone();
        let user = user.clone();
        Subscription::spawn(self.store.clone(), filter, move || {
            let store = store.clone();
            let user = user.clone();
            async move { store.list_folders(&user).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use pinvault_test_utils::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn first_entry_creates_folder_with_one_item() {
        let store = Arc::new(MemoryStore::new());
        let ledger = FolderLedger::new(store.clone());
        let user = UserId::from("u1");

        ledger.record_new_entry(&user, "Work").await.unwrap();

        let folder = store.find_folder(&user, "Work").await.unwrap().unwrap();
        assert_eq!(folder.num_items, 1);
    }

    #[tokio::test]
    async fn later_entries_increment_existing_folder() {
        let store = Arc::new(MemoryStore::new());
        let ledger = FolderLedger::new(store.clone());
        let user = UserId::from("u1");

        for _ in 0..3 {
            ledger.record_new_entry(&user, "Work").await.unwrap();
        }

        let folders = store.list_folders(&user).await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].num_items, 3);
        assert_eq!(store.call_count("create_folder").await, 1);
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        let ledger = FolderLedger::new(store.clone());
        store.fail_operation("find_folder").await;

        let err = ledger
            .record_new_entry(&UserId::from("u1"), "Work")
            .await
            .unwrap_err();
        assert!(matches!(err, PinvaultError::ExternalIoFailure { .. }));
        assert_eq!(store.call_count("create_folder").await, 0);
    }

    #[tokio::test]
    async fn folder_subscription_lists_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let ledger = FolderLedger::new(store.clone());
        let user = UserId::from("u1");
        ledger.record_new_entry(&user, "Work").await.unwrap();

        let mut folders = ledger.folders(&user);
        let initial = folders.next().await.unwrap().unwrap();
        assert_eq!(initial.len(), 1);

        ledger.record_new_entry(&user, "Personal").await.unwrap();
        let names: Vec<String> = folders
            .next()
            .await
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Personal", "Work"]);
    }
}
