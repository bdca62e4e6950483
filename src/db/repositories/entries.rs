use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    error::StoreError,
    helpers::{parse_date, parse_datetime, section_from_json, section_to_json, to_u32},
    models::{EntryPatch, JournalEntry},
    Database,
};
use crate::navigation::EntryDate;

const ENTRY_COLUMNS: &str = "id, date, morning, evening, created_at, updated_at, version";

fn row_to_entry(row: &Row) -> Result<JournalEntry> {
    let date: String = row.get("date")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(JournalEntry {
        id: row.get("id")?,
        date: parse_date(&date, "date")?,
        morning: section_from_json(row.get("morning")?, "morning")?,
        evening: section_from_json(row.get("evening")?, "evening")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
        version: to_u32(row.get("version")?, "version")?,
    })
}

fn select_one(conn: &Connection, clause: &str, key: &str) -> Result<Option<JournalEntry>> {
    let query = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE {clause} = ?1");
    let mut stmt = conn.prepare(&query)?;
    let mut rows = stmt.query(params![key])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_entry(row)?)),
        None => Ok(None),
    }
}

/// Inserts `entry`, rejecting a reused id or an already-journaled date.
/// Must run inside a single DB task so the checks and the insert are atomic.
fn insert_entry(conn: &Connection, entry: &JournalEntry) -> Result<()> {
    let id_taken = conn
        .query_row(
            "SELECT 1 FROM entries WHERE id = ?1",
            params![entry.id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if id_taken {
        return Err(StoreError::DuplicateKey {
            key: entry.id.clone(),
        }
        .into());
    }

    let date = entry.date.to_string();
    let date_taken = conn
        .query_row(
            "SELECT 1 FROM entries WHERE date = ?1",
            params![date],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if date_taken {
        return Err(StoreError::DuplicateKey { key: date }.into());
    }

    conn.execute(
        "INSERT INTO entries (id, date, morning, evening, created_at, updated_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id,
            date,
            section_to_json(entry.morning.as_ref(), "morning")?,
            section_to_json(entry.evening.as_ref(), "evening")?,
            entry.created_at.to_rfc3339(),
            entry.updated_at.to_rfc3339(),
            i64::from(entry.version),
        ],
    )?;

    Ok(())
}

impl Database {
    /// Entry journaled on `date`, if any. Absence is not an error.
    pub async fn get_entry_by_date(
        &self,
        date: EntryDate,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let date = date.to_string();
        self.execute(move |conn| select_one(conn, "date", &date))
            .await
            .map_err(StoreError::from)
    }

    pub async fn get_entry(&self, id: &str) -> Result<Option<JournalEntry>, StoreError> {
        let id = id.to_string();
        self.execute(move |conn| select_one(conn, "id", &id))
            .await
            .map_err(StoreError::from)
    }

    /// All entries, newest date first.
    pub async fn list_entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        self.execute(|conn| {
            let query = format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY date DESC");
            let mut stmt = conn.prepare(&query)?;

            let mut rows = stmt.query([])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }

            Ok(entries)
        })
        .await
        .map_err(StoreError::from)
    }

    /// Stores a new entry. Fails with `DuplicateKey` if the id or the date is
    /// already present.
    pub async fn add_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let record = entry.clone();
        self.execute(move |conn| insert_entry(conn, &record))
            .await
            .map_err(StoreError::from)
    }

    /// Returns the entry already stored for `candidate.date`, or stores and
    /// returns `candidate`. Lookup and insert run as one DB task.
    pub async fn insert_entry_if_absent(
        &self,
        candidate: JournalEntry,
    ) -> Result<JournalEntry, StoreError> {
        self.execute(move |conn| {
            if let Some(existing) = select_one(conn, "date", &candidate.date.to_string())? {
                return Ok(existing);
            }
            insert_entry(conn, &candidate)?;
            Ok(candidate)
        })
        .await
        .map_err(StoreError::from)
    }

    /// Merges the fields present in `patch` into the stored entry and returns
    /// the stored result. Fails with `NotFound` if `id` is unknown.
    pub async fn update_entry(
        &self,
        id: &str,
        patch: EntryPatch,
    ) -> Result<JournalEntry, StoreError> {
        let id = id.to_string();
        self.execute(move |conn| {
            // Build update query dynamically based on what's being updated
            let mut updates = Vec::new();
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(morning) = patch.morning.as_ref() {
                updates.push("morning = ?");
                params_vec.push(Box::new(section_to_json(Some(morning), "morning")?));
            }
            if let Some(evening) = patch.evening.as_ref() {
                updates.push("evening = ?");
                params_vec.push(Box::new(section_to_json(Some(evening), "evening")?));
            }
            if let Some(updated_at) = patch.updated_at {
                updates.push("updated_at = ?");
                params_vec.push(Box::new(updated_at.to_rfc3339()));
            }
            if let Some(version) = patch.version {
                updates.push("version = ?");
                params_vec.push(Box::new(i64::from(version)));
            }

            if !updates.is_empty() {
                let query = format!("UPDATE entries SET {} WHERE id = ?", updates.join(", "));
                params_vec.push(Box::new(id.clone()));

                let params_refs: Vec<&dyn rusqlite::ToSql> =
                    params_vec.iter().map(|b| b.as_ref()).collect();

                let rows_affected = conn.execute(&query, params_refs.as_slice())?;
                if rows_affected == 0 {
                    return Err(StoreError::NotFound { id }.into());
                }
            }

            match select_one(conn, "id", &id)? {
                Some(entry) => Ok(entry),
                None => Err(StoreError::NotFound { id }.into()),
            }
        })
        .await
        .map_err(StoreError::from)
    }
}
