use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::{
    db::{
        models::{JournalEntry, SectionPatch, UserSettings},
        Database, EntryPatch,
    },
    navigation::{Clock, EntryDate},
};

use super::{
    state::{reduce, JournalAction, JournalState},
    writer::WriteBehind,
};

/// Owner of the in-memory journal state.
///
/// Edits are applied to memory synchronously and persisted write-behind; a
/// failed durable write is logged and never rolls the edit back.
#[derive(Clone)]
pub struct JournalController {
    state: Arc<Mutex<JournalState>>,
    db: Database,
    clock: Clock,
    writer: WriteBehind,
}

impl JournalController {
    pub fn new(db: Database, clock: Clock, write_retries: u32) -> Self {
        let state = Arc::new(Mutex::new(JournalState::new()));
        let writer = WriteBehind::spawn(db.clone(), state.clone(), write_retries);

        Self {
            state,
            db,
            clock,
            writer,
        }
    }

    pub fn today(&self) -> EntryDate {
        self.clock.today()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn dispatch(&self, action: JournalAction) {
        let mut guard = self.state.lock().await;
        let current = std::mem::take(&mut *guard);
        *guard = reduce(current, action);
    }

    pub async fn snapshot(&self) -> JournalState {
        self.state.lock().await.clone()
    }

    pub async fn current_entry(&self) -> Option<JournalEntry> {
        self.state.lock().await.current_entry.clone()
    }

    /// Loads settings and today's entry, the way the journal opens.
    pub async fn start(&self) -> Result<JournalEntry> {
        match self.db.get_user_settings().await {
            Ok(settings) => self.dispatch(JournalAction::SetSettings(settings)).await,
            Err(err) => warn!("Falling back to default settings: {err:#}"),
        }

        self.load_or_create(self.today()).await
    }

    /// Makes the entry for `date` current, creating and storing a blank one on
    /// the first visit. Repeated calls for one date return the same entry.
    pub async fn load_or_create(&self, date: EntryDate) -> Result<JournalEntry> {
        self.dispatch(JournalAction::SetLoading(true)).await;

        let result = self.find_or_insert(date).await;
        match &result {
            Ok(entry) => {
                self.dispatch(JournalAction::SetCurrentEntry(Some(entry.clone())))
                    .await;
            }
            Err(err) => error!("Error loading entry for {date}: {err:#}"),
        }

        self.dispatch(JournalAction::SetLoading(false)).await;
        result
    }

    async fn find_or_insert(&self, date: EntryDate) -> Result<JournalEntry> {
        // Memory may be ahead of storage while writes are queued.
        if let Some(cached) = self.state.lock().await.cached(date) {
            return Ok(cached.clone());
        }

        let candidate = JournalEntry::new(date, self.now());
        let entry = self
            .db
            .insert_entry_if_absent(candidate)
            .await
            .with_context(|| format!("failed to load or create entry for {date}"))?;

        info!("Loaded entry {} for {}", entry.id, entry.date);
        Ok(entry)
    }

    /// Applies `patch` to the current entry and queues the durable write.
    /// Returns the updated entry, or `None` when no entry is loaded.
    pub async fn apply_section_update(&self, patch: SectionPatch) -> Option<JournalEntry> {
        let mut guard = self.state.lock().await;
        if guard.current_entry.is_none() {
            return None;
        }

        let section = patch.section();
        let at = self.now();
        let current = std::mem::take(&mut *guard);
        let next = reduce(current, JournalAction::ApplySectionUpdate { patch, at });
        *guard = reduce(next, JournalAction::SetSaving(true));

        let entry = guard.current_entry.clone()?;
        self.writer
            .enqueue(entry.id.clone(), EntryPatch::from(&entry));
        debug!("Queued {} update for {}", section.as_str(), entry.date);

        Some(entry)
    }

    /// Fills the cache with every stored entry (the history view).
    pub async fn load_history(&self) -> Result<Vec<JournalEntry>> {
        // Storage must not lag behind queued edits when it refills the cache.
        self.writer.flush().await;
        let entries = self
            .db
            .list_entries()
            .await
            .context("failed to list entries")?;
        self.dispatch(JournalAction::SetEntries(entries)).await;

        let state = self.state.lock().await;
        Ok(state.entries.values().rev().cloned().collect())
    }

    pub async fn settings(&self) -> UserSettings {
        self.state.lock().await.settings.clone()
    }

    pub async fn update_settings(&self, settings: UserSettings) -> Result<()> {
        self.db.save_user_settings(&settings).await?;
        self.dispatch(JournalAction::SetSettings(settings)).await;
        Ok(())
    }

    pub fn pending_writes(&self) -> usize {
        self.writer.pending()
    }

    /// Waits until every queued write has been attempted.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    pub async fn shutdown(&self) {
        self.writer.shutdown().await;
    }
}
