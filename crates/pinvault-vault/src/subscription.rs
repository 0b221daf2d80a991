// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable live queries over a [`DocumentStore`].
//!
//! A subscription listens for store change events *before* running its first
//! query, so no write between the two is missed. Each relevant change triggers
//! a fresh query and the full ordered snapshot is delivered again. Store
//! failures arrive as `Err` items; the subscription keeps running.

use std::future::Future;
use std::sync::Arc;

use pinvault_core::{Collection, DocumentStore, PinvaultError, StoreEvent, UserId};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Snapshots buffered before the producer waits for the consumer.
const SNAPSHOT_BUFFER: usize = 16;

/// Which change events should trigger a re-query.
#[derive(Debug, Clone)]
pub(crate) struct EventFilter {
    pub user: UserId,
    pub collection: Collection,
    /// When set, `Changed` events naming a different folder are ignored.
    pub folder: Option<String>,
}

impl EventFilter {
    fn matches(&self, event: &StoreEvent) -> bool {
        if event.user() != &self.user || event.collection() != self.collection {
            return false;
        }
        match (event, &self.folder) {
            (
                StoreEvent::Changed {
                    folder: Some(changed),
                    ..
                },
                Some(wanted),
            ) => changed == wanted,
            _ => true,
        }
    }
}

/// A live, ordered view that re-delivers its full snapshot on every change.
///
/// Dropping the subscription cancels it.
pub struct Subscription<T> {
    rx: mpsc::Receiver<Result<T, PinvaultError>>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> Subscription<T> {
    /// Spawn the delivery task. Must be called within a Tokio runtime.
    pub(crate) fn spawn<F, Fut>(store: Arc<dyn DocumentStore>, filter: EventFilter, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, PinvaultError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut events = store.subscribe();

        tokio::spawn(async move {
            debug!(user = %filter.user, collection = %filter.collection, "subscription started");

            let initial = tokio::select! {
                _ = token.cancelled() => None,
                snapshot = fetch() => Some(snapshot),
            };
            let Some(initial) = initial else {
                return;
            };
            if tx.send(initial).await.is_err() {
                return;
            }

            loop {
                let item = tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(event) if filter.matches(&event) => match event {
                            StoreEvent::Failed { message, .. } => {
                                Some(Err(PinvaultError::external_msg(message)))
                            }
                            StoreEvent::Changed { .. } => Some(fetch().await),
                        },
                        Ok(_) => None,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "subscription lagged behind store events; re-querying");
                            Some(fetch().await)
                        }
                        Err(RecvError::Closed) => break,
                    },
                };

                if let Some(item) = item {
                    if let Err(e) = &item {
                        warn!(user = %filter.user, error = %e, "live query delivery failed");
                    }
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
            }

            debug!(user = %filter.user, collection = %filter.collection, "subscription ended");
        });

        Self { rx, cancel }
    }
}

impl<T> Subscription<T> {
    /// Wait for the next snapshot or failure.
    ///
    /// Returns `None` once the subscription is cancelled or the store closes.
    pub async fn next(&mut self) -> Option<Result<T, PinvaultError>> {
        self.rx.recv().await
    }

    /// Stop deliveries. Snapshots not yet received are discarded.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pinvault_core::{EntryInsert, VaultEntry};
    use pinvault_test_utils::MemoryStore;

    use super::*;

    fn entry(title: &str, folder: &str) -> EntryInsert {
        EntryInsert {
            title: title.to_string(),
            username: "alice".to_string(),
            ciphertext: "00:".to_string(),
            folder_name: folder.to_string(),
        }
    }

    fn titles_in(
        store: Arc<MemoryStore>,
        user: &UserId,
        folder: &str,
    ) -> Subscription<Vec<VaultEntry>> {
        let filter = EventFilter {
            user: user.clone(),
            collection: Collection::Passwords,
            folder: Some(folder.to_string()),
        };
        let user = user.clone();
        let folder = folder.to_string();
        let query_store = store.clone();
        Subscription::spawn(store, filter, move || {
            let store = query_store.clone();
            let user = user.clone();
            let folder = folder.clone();
            async move { store.query_entries(&user, &folder).await }
        })
    }

    fn titles(snapshot: &[VaultEntry]) -> Vec<&str> {
        snapshot.iter().map(|e| e.title.as_str()).collect()
    }

    #[tokio::test]
    async fn delivers_initial_snapshot_then_changes() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::from("u1");
        store.insert_entry(&user, entry("mail", "Work")).await.unwrap();

        let mut sub = titles_in(store.clone(), &user, "Work");
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(titles(&first), vec!["mail"]);

        store.insert_entry(&user, entry("bank", "Work")).await.unwrap();
        let second = sub.next().await.unwrap().unwrap();
        assert_eq!(titles(&second), vec!["bank", "mail"]);
    }

    #[tokio::test]
    async fn ignores_other_folders_and_users() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::from("u1");

        let mut sub = titles_in(store.clone(), &user, "Work");
        assert!(sub.next().await.unwrap().unwrap().is_empty());

        store.insert_entry(&user, entry("game", "Personal")).await.unwrap();
        store
            .insert_entry(&UserId::from("u2"), entry("other", "Work"))
            .await
            .unwrap();
        store.insert_entry(&user, entry("vpn", "Work")).await.unwrap();

        let next = sub.next().await.unwrap().unwrap();
        assert_eq!(titles(&next), vec!["vpn"]);
    }

    #[tokio::test]
    async fn store_failure_is_delivered_without_ending() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::from("u1");

        let mut sub = titles_in(store.clone(), &user, "Work");
        sub.next().await.unwrap().unwrap();

        store.emit_failure(&user, Collection::Passwords, "listener dropped");
        let err = sub.next().await.unwrap().unwrap_err();
        assert!(matches!(err, PinvaultError::ExternalIoFailure { .. }));

        store.insert_entry(&user, entry("mail", "Work")).await.unwrap();
        let next = sub.next().await.unwrap().unwrap();
        assert_eq!(titles(&next), vec!["mail"]);
    }

    #[tokio::test]
    async fn failed_requery_is_delivered_as_error() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::from("u1");

        let mut sub = titles_in(store.clone(), &user, "Work");
        sub.next().await.unwrap().unwrap();

        store.fail_operation("query_entries").await;
        store.insert_entry(&user, entry("mail", "Work")).await.unwrap();
        assert!(sub.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn cancel_stops_deliveries() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::from("u1");

        let mut sub = titles_in(store.clone(), &user, "Work");
        sub.next().await.unwrap().unwrap();
        sub.cancel();
        assert!(sub.is_cancelled());

        store.insert_entry(&user, entry("mail", "Work")).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(1), sub.next())
            .await
            .expect("cancelled subscription should end promptly");
        assert!(next.is_none());
    }
}
