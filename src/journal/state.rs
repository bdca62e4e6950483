use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::models::{JournalEntry, SectionPatch, UserSettings},
    navigation::EntryDate,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalState {
    pub current_entry: Option<JournalEntry>,
    /// Entries seen so far, keyed by day.
    pub entries: BTreeMap<EntryDate, JournalEntry>,
    pub settings: UserSettings,
    pub is_loading: bool,
    pub is_saving: bool,
}

impl Default for JournalState {
    fn default() -> Self {
        Self {
            current_entry: None,
            entries: BTreeMap::new(),
            settings: UserSettings::default(),
            is_loading: true,
            is_saving: false,
        }
    }
}

impl JournalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, date: EntryDate) -> Option<&JournalEntry> {
        self.entries.get(&date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JournalAction {
    SetCurrentEntry(Option<JournalEntry>),
    /// Merge into the current entry's section, stamped with `at`.
    ApplySectionUpdate {
        patch: SectionPatch,
        at: DateTime<Utc>,
    },
    SetEntries(Vec<JournalEntry>),
    SetSettings(UserSettings),
    SetLoading(bool),
    SetSaving(bool),
}

fn is_fresher(cached: &JournalEntry, stored: &JournalEntry) -> bool {
    cached.id == stored.id && cached.updated_at >= stored.updated_at
}

/// The only place journal state changes.
pub fn reduce(mut state: JournalState, action: JournalAction) -> JournalState {
    match action {
        JournalAction::SetCurrentEntry(entry) => {
            if let Some(entry) = entry.as_ref() {
                state.entries.insert(entry.date, entry.clone());
            }
            state.current_entry = entry;
        }
        JournalAction::ApplySectionUpdate { patch, at } => {
            // Nothing loaded yet: drop the edit.
            let Some(mut entry) = state.current_entry.take() else {
                return state;
            };
            entry.apply_section_patch(&patch, at);
            state.entries.insert(entry.date, entry.clone());
            state.current_entry = Some(entry);
        }
        JournalAction::SetEntries(entries) => {
            let mut cached = std::mem::take(&mut state.entries);
            state.entries = entries
                .into_iter()
                .map(|stored| match cached.remove(&stored.date) {
                    // Memory stays ahead of storage while writes are queued.
                    Some(mine) if is_fresher(&mine, &stored) => (mine.date, mine),
                    _ => (stored.date, stored),
                })
                .collect();
            if let Some(current) = state.current_entry.as_ref() {
                state.entries.insert(current.date, current.clone());
            }
        }
        JournalAction::SetSettings(settings) => {
            state.settings = settings;
        }
        JournalAction::SetLoading(is_loading) => {
            state.is_loading = is_loading;
        }
        JournalAction::SetSaving(is_saving) => {
            state.is_saving = is_saving;
        }
    }
    state
}
