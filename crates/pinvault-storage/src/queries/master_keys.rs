// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-key record read and merge-write.

use chrono::Utc;
use pinvault_core::{FaceTemplate, MasterKeyRecord, MasterKeyUpdate, PinvaultError, UserId};
use rusqlite::{OptionalExtension, params};
use secrecy::{ExposeSecret, SecretString};

use crate::database::{Database, format_timestamp, map_tr_err, parse_timestamp};

type MasterRow = (
    Option<String>,
    bool,
    Vec<FaceTemplate>,
    bool,
    chrono::DateTime<Utc>,
);

fn json_err(idx: usize, e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Read a user's master-key record.
pub async fn get_record(
    db: &Database,
    user: &UserId,
) -> Result<Option<MasterKeyRecord>, PinvaultError> {
    let user_id = user.0.clone();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<MasterRow>, rusqlite::Error> {
            conn.query_row(
                "SELECT pin, biometric_enabled, face_templates, face_registration_completed, last_updated
                 FROM master_keys WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let pin: Option<String> = row.get(0)?;
                    let templates: String = row.get(2)?;
                    let templates: Vec<FaceTemplate> =
                        serde_json::from_str(&templates).map_err(|e| json_err(2, e))?;
                    let last_updated: String = row.get(4)?;
                    Ok((
                        pin,
                        row.get::<_, bool>(1)?,
                        templates,
                        row.get::<_, bool>(3)?,
                        parse_timestamp(4, &last_updated)?,
                    ))
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(row.map(
        |(pin, biometric_enabled, face_templates, face_registration_completed, last_updated)| {
            MasterKeyRecord {
                user_id: user.clone(),
                pin: pin.map(SecretString::from),
                biometric_enabled,
                face_templates,
                face_registration_completed,
                last_updated,
            }
        },
    ))
}

/// Merge `update` into the user's record, creating it if needed.
///
/// `None` fields keep their stored value.
pub async fn merge_record(
    db: &Database,
    user: &UserId,
    update: MasterKeyUpdate,
) -> Result<(), PinvaultError> {
    let user_id = user.0.clone();
    let pin = update.pin.map(|p| p.expose_secret().to_string());
    let biometric_enabled = update.biometric_enabled;
    let templates = update
        .face_templates
        .map(|t| serde_json::to_string(&t))
        .transpose()
        .map_err(|e| PinvaultError::Internal(format!("face templates not serializable: {e}")))?;
    let completed = update.face_registration_completed;
    let now = format_timestamp(&Utc::now());

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO master_keys
                     (user_id, pin, biometric_enabled, face_templates, face_registration_completed, last_updated)
                 VALUES (?1, ?2, COALESCE(?3, 0), COALESCE(?4, '[]'), COALESCE(?5, 0), ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                     pin = COALESCE(?2, pin),
                     biometric_enabled = COALESCE(?3, biometric_enabled),
                     face_templates = COALESCE(?4, face_templates),
                     face_registration_completed = COALESCE(?5, face_registration_completed),
                     last_updated = ?6",
                params![user_id, pin, biometric_enabled, templates, completed, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
