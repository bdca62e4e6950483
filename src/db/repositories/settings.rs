use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{
    models::{UserSettings, USER_SETTINGS_ID},
    Database,
};

impl Database {
    /// Stored settings, or the defaults when none were saved yet.
    pub async fn get_user_settings(&self) -> Result<UserSettings> {
        self.execute(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT data FROM settings WHERE id = ?1",
                    params![USER_SETTINGS_ID],
                    |row| row.get(0),
                )
                .optional()?;

            match raw {
                Some(json) => serde_json::from_str(&json).context("failed to decode settings"),
                None => Ok(UserSettings::default()),
            }
        })
        .await
    }

    pub async fn save_user_settings(&self, settings: &UserSettings) -> Result<()> {
        let data = serde_json::to_string(settings).context("failed to encode settings")?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO settings (id, data, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![USER_SETTINGS_ID, data, Utc::now().to_rfc3339()],
            )
            .context("failed to save settings")?;
            Ok(())
        })
        .await
    }
}
