// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Saving, listing, revealing, and deleting vault entries for one user.
//!
//! Every operation runs against an explicit [`VaultSession`]. Plaintext
//! passwords and the master secret never appear in log fields.

use std::fmt;
use std::sync::Arc;

use pinvault_core::{
    Collection, DocumentStore, EntryId, EntryInsert, Folder, PinvaultError, RandomSource,
    SecretPrompt, UserId, VaultEntry,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::crypto;
use crate::gate::MasterKeyGate;
use crate::ledger::FolderLedger;
use crate::subscription::{EventFilter, Subscription};

/// The store handle and authenticated user every vault operation runs as.
#[derive(Clone)]
pub struct VaultSession {
    store: Arc<dyn DocumentStore>,
    user: UserId,
}

impl VaultSession {
    pub fn new(store: Arc<dyn DocumentStore>, user: UserId) -> Self {
        Self { store, user }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

impl fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSession")
            .field("store", &self.store.name())
            .field("user", &self.user)
            .finish()
    }
}

/// A credential as entered by the user, before sealing.
pub struct NewEntry {
    pub title: String,
    pub username: String,
    pub password: SecretString,
    pub folder_name: String,
}

impl fmt::Debug for NewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEntry")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("folder_name", &self.folder_name)
            .finish()
    }
}

impl NewEntry {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push("title");
        }
        if self.username.is_empty() {
            missing.push("username");
        }
        if self.password.expose_secret().is_empty() {
            missing.push("password");
        }
        if self.folder_name.is_empty() {
            missing.push("folder");
        }
        missing
    }
}

/// Encrypted entry storage for one session.
pub struct VaultEntryStore {
    session: VaultSession,
    gate: MasterKeyGate,
    ledger: FolderLedger,
    rng: Arc<dyn RandomSource>,
}

impl VaultEntryStore {
    /// `gate` must read master-key records from the session's store.
    pub fn new(session: VaultSession, gate: MasterKeyGate, rng: Arc<dyn RandomSource>) -> Self {
        let ledger = FolderLedger::new(session.store.clone());
        Self {
            session,
            gate,
            ledger,
            rng,
        }
    }

    pub fn session(&self) -> &VaultSession {
        &self.session
    }

    pub fn gate(&self) -> &MasterKeyGate {
        &self.gate
    }

    /// Seal and store a new entry, then count it in its folder.
    ///
    /// Checks run in order: empty fields, duplicate title, master secret.
    /// If the folder update fails the entry stays stored and the error is
    /// returned.
    pub async fn save(&self, entry: NewEntry) -> Result<EntryId, PinvaultError> {
        let user = &self.session.user;

        let missing = entry.missing_fields();
        if !missing.is_empty() {
            return Err(PinvaultError::MissingFields { fields: missing });
        }

        if self
            .session
            .store
            .find_entry_by_title(user, &entry.title)
            .await?
            .is_some()
        {
            return Err(PinvaultError::DuplicateTitle { title: entry.title });
        }

        let secret = self.gate.fetch_master_secret(user).await?;
        let ciphertext = crypto::seal(
            entry.password.expose_secret(),
            secret.expose_secret(),
            self.rng.as_ref(),
        )?;

        let stored = self
            .session
            .store
            .insert_entry(
                user,
                EntryInsert {
                    title: entry.title,
                    username: entry.username,
                    ciphertext,
                    folder_name: entry.folder_name,
                },
            )
            .await?;
        info!(user = %user, entry_id = %stored.id, folder = %stored.folder_name, "entry saved");

        if let Err(e) = self.ledger.record_new_entry(user, &stored.folder_name).await {
            warn!(
                user = %user,
                entry_id = %stored.id,
                folder = %stored.folder_name,
                error = %e,
                "entry saved but folder count not updated"
            );
            return Err(e);
        }

        Ok(stored.id)
    }

    /// Live view of the entries in `folder_name`, ordered by title.
    ///
    /// Must be called within a Tokio runtime.
    pub fn list(&self, folder_name: &str) -> Subscription<Vec<VaultEntry>> {
        let filter = EventFilter {
            user: self.session.user.clone(),
            collection: Collection::Passwords,
            folder: Some(folder_name.to_string()),
        };
        let store = self.session.store.clone();
        let user = self.session.user.clone();
        let folder = folder_name.to_string();
        Subscription::spawn(self.session.store.clone(), filter, move || {
            let store = store.clone();
            let user = user.clone();
            let folder = folder.clone();
            async move { store.query_entries(&user, &folder).await }
        })
    }

    /// Live view of the session user's folders, newest first.
    pub fn folders(&self) -> Subscription<Vec<Folder>> {
        self.ledger.folders(&self.session.user)
    }

    /// Look up an entry by its exact title.
    pub async fn find_by_title(&self, title: &str) -> Result<Option<VaultEntry>, PinvaultError> {
        self.session
            .store
            .find_entry_by_title(&self.session.user, title)
            .await
    }

    /// Decrypt `entry` after checking `presented` against the master secret.
    ///
    /// Nothing is decrypted unless the presented secret matches.
    pub async fn reveal(
        &self,
        entry: &VaultEntry,
        presented: &SecretString,
    ) -> Result<SecretString, PinvaultError> {
        let user = &self.session.user;
        if &entry.user_id != user {
            warn!(user = %user, entry_id = %entry.id, "reveal of another user's entry refused");
            return Err(PinvaultError::Unauthorized);
        }

        let secret = self.gate.unlock(presented, user).await?;
        let plaintext = crypto::open(&entry.ciphertext, secret.expose_secret())?;
        debug!(user = %user, entry_id = %entry.id, "entry revealed");
        Ok(plaintext)
    }

    /// Ask `prompt` for the master secret, then [`reveal`](Self::reveal).
    pub async fn reveal_with_prompt(
        &self,
        entry: &VaultEntry,
        prompt: &dyn SecretPrompt,
    ) -> Result<SecretString, PinvaultError> {
        let message = format!("Enter master PIN to reveal `{}`", entry.title);
        let presented = prompt
            .request_secret(&message)
            .await?
            .ok_or(PinvaultError::PromptCancelled)?;
        self.reveal(entry, &presented).await
    }

    /// Remove an entry. Folder counts are left unchanged.
    pub async fn delete(&self, id: &EntryId) -> Result<(), PinvaultError> {
        self.session.store.delete_entry(&self.session.user, id).await?;
        info!(user = %self.session.user, entry_id = %id, "entry deleted");
        Ok(())
    }
}
