// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command opens the SQLite store, runs one vault operation as the
//! selected user, and checkpoints the database before returning.

use std::sync::Arc;

use miette::{IntoDiagnostic, Result, miette};
use pinvault_config::model::PinvaultConfig;
use pinvault_core::{DocumentStore, PinvaultError, UserId, VaultEntry};
use pinvault_storage::SqliteStore;
use pinvault_vault::password::generate_password_of_length;
use pinvault_vault::prompt::read_new_pin;
use pinvault_vault::{
    MasterKeyGate, NewEntry, SystemRandomSource, TtyPrompt, VaultEntryStore, VaultSession,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::Commands;

/// Dispatch one subcommand for `user`.
pub async fn run(config: &PinvaultConfig, user: &str, command: Commands) -> Result<()> {
    if let Commands::Generate { length } = command {
        print_generated(config, length);
        return Ok(());
    }

    let sqlite = Arc::new(SqliteStore::open(&config.storage).await.into_diagnostic()?);
    let store: Arc<dyn DocumentStore> = sqlite.clone();
    let user = UserId::from(user);
    let gate = MasterKeyGate::from_config(store.clone(), config);
    let vault = VaultEntryStore::new(
        VaultSession::new(store, user),
        gate,
        Arc::new(SystemRandomSource::new()),
    );

    let outcome = execute(config, &vault, command).await;
    sqlite.close().await.into_diagnostic()?;
    outcome
}

async fn execute(config: &PinvaultConfig, vault: &VaultEntryStore, command: Commands) -> Result<()> {
    match command {
        Commands::Enroll => {
            let (pin, confirm) = read_new_pin().into_diagnostic()?;
            vault
                .gate()
                .enroll(vault.session().user(), &pin, &confirm)
                .await
                .into_diagnostic()?;
            println!("Master PIN set.");
        }
        Commands::Add {
            title,
            username,
            folder,
            generate,
        } => {
            let password = if generate {
                SecretString::from(generate_password_of_length(config.security.password_length))
            } else {
                read_entry_password(&title).await?
            };
            let id = vault
                .save(NewEntry {
                    title: title.clone(),
                    username,
                    password,
                    folder_name: folder.clone(),
                })
                .await
                .into_diagnostic()?;
            debug!(entry_id = %id, "entry added from CLI");
            println!("Saved `{title}` to {folder}.");
        }
        Commands::Generate { length } => print_generated(config, length),
        Commands::List { folder } => {
            let mut listing = vault.list(&folder);
            let entries = first_snapshot(listing.next().await)?;
            listing.cancel();
            if entries.is_empty() {
                println!("No entries in {folder}.");
            }
            for entry in entries {
                println!("{:<24} {}", entry.title, entry.username);
            }
        }
        Commands::Folders => {
            let mut folders = vault.folders();
            let snapshot = first_snapshot(folders.next().await)?;
            folders.cancel();
            for folder in snapshot {
                println!("{:<24} {}", folder.name, folder.num_items);
            }
        }
        Commands::Reveal { title } => {
            let entry = require_entry(vault, &title).await?;
            let plaintext = vault
                .reveal_with_prompt(&entry, &TtyPrompt)
                .await
                .into_diagnostic()?;
            println!("{}", plaintext.expose_secret());
        }
        Commands::Delete { title } => {
            let entry = require_entry(vault, &title).await?;
            vault.delete(&entry.id).await.into_diagnostic()?;
            println!("Deleted `{title}`.");
        }
    }
    Ok(())
}

fn print_generated(config: &PinvaultConfig, length: Option<usize>) {
    let length = length.unwrap_or(config.security.password_length);
    println!("{}", generate_password_of_length(length));
}

async fn require_entry(vault: &VaultEntryStore, title: &str) -> Result<VaultEntry> {
    vault
        .find_by_title(title)
        .await
        .into_diagnostic()?
        .ok_or_else(|| miette!("no entry titled `{title}`"))
}

fn first_snapshot<T>(item: Option<std::result::Result<T, PinvaultError>>) -> Result<T> {
    match item {
        Some(snapshot) => snapshot.into_diagnostic(),
        None => Err(miette!("live query ended before delivering a snapshot")),
    }
}

async fn read_entry_password(title: &str) -> Result<SecretString> {
    let label = format!("Password for `{title}`: ");
    let answer = tokio::task::spawn_blocking(move || rpassword::prompt_password(label))
        .await
        .into_diagnostic()?
        .into_diagnostic()?;
    if answer.is_empty() {
        return Err(PinvaultError::PromptCancelled).into_diagnostic();
    }
    Ok(SecretString::from(answer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_snapshot_is_an_error() {
        assert!(first_snapshot::<Vec<VaultEntry>>(None).is_err());
    }

    #[test]
    fn failed_snapshot_propagates() {
        let err = first_snapshot::<Vec<VaultEntry>>(Some(Err(PinvaultError::external_msg(
            "listener broke",
        ))))
        .unwrap_err();
        assert!(err.to_string().contains("listener broke"));
    }

    #[tokio::test]
    async fn generate_needs_no_database() {
        let mut config = PinvaultConfig::default();
        config.storage.database_path = "/nonexistent/dir/never-opened.db".to_string();
        run(&config, "alice", Commands::Generate { length: Some(24) })
            .await
            .unwrap();
    }
}
