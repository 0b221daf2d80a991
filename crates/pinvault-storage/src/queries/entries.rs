// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault entry CRUD operations.

use pinvault_core::{EntryId, PinvaultError, UserId, VaultEntry};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, format_timestamp, map_tr_err, parse_timestamp};

const ENTRY_COLUMNS: &str =
    "id, user_id, title, username, ciphertext, folder_name, created_at, updated_at";

fn row_to_entry(row: &Row<'_>) -> Result<VaultEntry, rusqlite::Error> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(VaultEntry {
        id: EntryId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        title: row.get(2)?,
        username: row.get(3)?,
        ciphertext: row.get(4)?,
        folder_name: row.get(5)?,
        created_at: parse_timestamp(6, &created_at)?,
        updated_at: parse_timestamp(7, &updated_at)?,
    })
}

/// Insert a fully populated entry.
pub async fn insert_entry(db: &Database, entry: &VaultEntry) -> Result<(), PinvaultError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO vault_entries (id, user_id, title, username, ciphertext, folder_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.id.0,
                    entry.user_id.0,
                    entry.title,
                    entry.username,
                    entry.ciphertext,
                    entry.folder_name,
                    format_timestamp(&entry.created_at),
                    format_timestamp(&entry.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get an entry by id.
pub async fn get_entry(
    db: &Database,
    user: &UserId,
    id: &EntryId,
) -> Result<Option<VaultEntry>, PinvaultError> {
    let user = user.0.clone();
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<VaultEntry>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM vault_entries WHERE user_id = ?1 AND id = ?2"),
                params![user, id],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Find the first entry (oldest) with exactly this title.
pub async fn find_by_title(
    db: &Database,
    user: &UserId,
    title: &str,
) -> Result<Option<VaultEntry>, PinvaultError> {
    let user = user.0.clone();
    let title = title.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<VaultEntry>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM vault_entries
                     WHERE user_id = ?1 AND title = ?2
                     ORDER BY created_at ASC LIMIT 1"
                ),
                params![user, title],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Entries in one folder, ordered by title ascending.
pub async fn list_in_folder(
    db: &Database,
    user: &UserId,
    folder_name: &str,
) -> Result<Vec<VaultEntry>, PinvaultError> {
    let user = user.0.clone();
    let folder_name = folder_name.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<VaultEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM vault_entries
                 WHERE user_id = ?1 AND folder_name = ?2
                 ORDER BY title ASC, created_at ASC"
            ))?;
            let entries = stmt
                .query_map(params![user, folder_name], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an entry, returning the folder it was in if it existed.
pub async fn delete_entry(
    db: &Database,
    user: &UserId,
    id: &EntryId,
) -> Result<Option<String>, PinvaultError> {
    let user = user.0.clone();
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "DELETE FROM vault_entries WHERE user_id = ?1 AND id = ?2 RETURNING folder_name",
                params![user, id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn entry(user: &str, title: &str, folder: &str) -> VaultEntry {
        let now = Utc::now();
        VaultEntry {
            id: EntryId::generate(),
            user_id: UserId::from(user),
            title: title.to_string(),
            username: "alice".to_string(),
            ciphertext: "0011223344556677:09105a4d5c4250".to_string(),
            folder_name: folder.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_then_get() {
        let db = Database::open_in_memory().await.unwrap();
        let stored = entry("u1", "mail", "Work");
        insert_entry(&db, &stored).await.unwrap();

        let fetched = get_entry(&db, &stored.user_id, &stored.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.title, "mail");
        assert_eq!(fetched.ciphertext, stored.ciphertext);
    }

    #[tokio::test]
    async fn get_is_scoped_to_user() {
        let db = Database::open_in_memory().await.unwrap();
        let stored = entry("u1", "mail", "Work");
        insert_entry(&db, &stored).await.unwrap();

        let other = get_entry(&db, &UserId::from("u2"), &stored.id).await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn folder_listing_is_title_ordered() {
        let db = Database::open_in_memory().await.unwrap();
        for title in ["zeta", "alpha", "mu"] {
            insert_entry(&db, &entry("u1", title, "Work")).await.unwrap();
        }
        insert_entry(&db, &entry("u1", "other", "Personal")).await.unwrap();

        let titles: Vec<String> = list_in_folder(&db, &UserId::from("u1"), "Work")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["alpha", "mu", "zeta"]);
    }

    #[tokio::test]
    async fn delete_reports_folder_once() {
        let db = Database::open_in_memory().await.unwrap();
        let stored = entry("u1", "mail", "Work");
        insert_entry(&db, &stored).await.unwrap();

        let first = delete_entry(&db, &stored.user_id, &stored.id).await.unwrap();
        assert_eq!(first.as_deref(), Some("Work"));
        let second = delete_entry(&db, &stored.user_id, &stored.id).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn find_by_title_matches_exactly() {
        let db = Database::open_in_memory().await.unwrap();
        insert_entry(&db, &entry("u1", "Mail", "Work")).await.unwrap();

        let user = UserId::from("u1");
        assert!(find_by_title(&db, &user, "Mail").await.unwrap().is_some());
        assert!(find_by_title(&db, &user, "mail").await.unwrap().is_none());
    }
}
