// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folder operations.

use pinvault_core::{Folder, FolderId, PinvaultError, UserId};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, format_timestamp, map_tr_err, parse_timestamp};

fn row_to_folder(row: &Row<'_>) -> Result<Folder, rusqlite::Error> {
    let num_items: i64 = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(Folder {
        id: FolderId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        name: row.get(2)?,
        num_items: u64::try_from(num_items).unwrap_or(0),
        created_at: parse_timestamp(4, &created_at)?,
    })
}

/// Insert a new folder.
pub async fn create_folder(db: &Database, folder: &Folder) -> Result<(), PinvaultError> {
    let folder = folder.clone();
    let num_items = i64::try_from(folder.num_items).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO folders (id, user_id, name, num_items, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    folder.id.0,
                    folder.user_id.0,
                    folder.name,
                    num_items,
                    format_timestamp(&folder.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find a folder by exact name.
pub async fn find_folder(
    db: &Database,
    user: &UserId,
    name: &str,
) -> Result<Option<Folder>, PinvaultError> {
    let user = user.0.clone();
    let name = name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Folder>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, user_id, name, num_items, created_at FROM folders
                 WHERE user_id = ?1 AND name = ?2
                 ORDER BY created_at ASC LIMIT 1",
                params![user, name],
                row_to_folder,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All folders for a user, newest first.
pub async fn list_folders(db: &Database, user: &UserId) -> Result<Vec<Folder>, PinvaultError> {
    let user = user.0.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<Folder>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, num_items, created_at FROM folders
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let folders = stmt
                .query_map(params![user], row_to_folder)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(folders)
        })
        .await
        .map_err(map_tr_err)
}

/// Add `delta` to a folder's count in a single UPDATE.
///
/// Returns `false` if no such folder exists for the user.
pub async fn increment_folder(
    db: &Database,
    user: &UserId,
    id: &FolderId,
    delta: u64,
) -> Result<bool, PinvaultError> {
    let user = user.0.clone();
    let id = id.0.clone();
    let delta = i64::try_from(delta).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let updated = conn.execute(
                "UPDATE folders SET num_items = num_items + ?1 WHERE user_id = ?2 AND id = ?3",
                params![delta, user, id],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn folder(name: &str, age_secs: i64) -> Folder {
        Folder {
            id: FolderId::generate(),
            user_id: UserId::from("u1"),
            name: name.to_string(),
            num_items: 1,
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn folders_list_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        create_folder(&db, &folder("Old", 60)).await.unwrap();
        create_folder(&db, &folder("New", 0)).await.unwrap();
        create_folder(&db, &folder("Middle", 30)).await.unwrap();

        let names: Vec<String> = list_folders(&db, &UserId::from("u1"))
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["New", "Middle", "Old"]);
    }

    #[tokio::test]
    async fn increment_adds_to_count() {
        let db = Database::open_in_memory().await.unwrap();
        let work = folder("Work", 0);
        create_folder(&db, &work).await.unwrap();

        assert!(increment_folder(&db, &work.user_id, &work.id, 1).await.unwrap());
        assert!(increment_folder(&db, &work.user_id, &work.id, 2).await.unwrap());

        let stored = find_folder(&db, &work.user_id, "Work").await.unwrap().unwrap();
        assert_eq!(stored.num_items, 4);
    }

    #[tokio::test]
    async fn increment_of_unknown_folder_reports_false() {
        let db = Database::open_in_memory().await.unwrap();
        let missing = FolderId::generate();
        assert!(!increment_folder(&db, &UserId::from("u1"), &missing, 1).await.unwrap());
    }
}
