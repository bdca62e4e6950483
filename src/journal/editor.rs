use anyhow::{bail, Result};
use log::warn;

use crate::db::models::{
    EveningPatch, EveningSection, JournalEntry, MorningPatch, MorningSection, Section,
};

use super::JournalController;

const LIST_SLOTS: usize = 3;

/// Local draft of one section of the entry being viewed.
///
/// The draft changes immediately on every edit; the same change is then
/// forwarded to the controller, which owns the authoritative copy.
#[derive(Debug, Clone)]
pub struct RoutineEditor<S: Section> {
    entry_id: Option<String>,
    draft: S,
}

pub type MorningEditor = RoutineEditor<MorningSection>;
pub type EveningEditor = RoutineEditor<EveningSection>;

impl<S: Section> Default for RoutineEditor<S> {
    fn default() -> Self {
        Self {
            entry_id: None,
            draft: S::default(),
        }
    }
}

impl<S: Section> RoutineEditor<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the draft to `entry`'s section, or a blank one.
    pub fn load(&mut self, entry: Option<&JournalEntry>) {
        self.entry_id = entry.map(|e| e.id.clone());
        self.draft = entry.and_then(S::of).cloned().unwrap_or_default();
    }

    pub fn draft(&self) -> &S {
        &self.draft
    }

    pub fn entry_id(&self) -> Option<&str> {
        self.entry_id.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.draft.completed_at().is_some()
    }

    /// Returns `false` when nothing was applied: no entry loaded, or the
    /// controller has moved on to another entry.
    pub async fn edit(&mut self, controller: &JournalController, patch: S::Patch) -> bool {
        let Some(entry_id) = self.entry_id.clone() else {
            return false;
        };

        let current_id = controller.current_entry().await.map(|e| e.id);
        if current_id.as_deref() != Some(entry_id.as_str()) {
            warn!(
                "Dropping {} edit for entry {entry_id}: it is no longer current",
                S::KIND.as_str()
            );
            return false;
        }

        self.draft = self.draft.apply(&patch, controller.now());

        match controller.apply_section_update(S::wrap_patch(patch)).await {
            Some(entry) => {
                // Adopt the controller's copy so both agree on completed_at.
                if let Some(section) = S::of(&entry) {
                    self.draft = section.clone();
                }
                true
            }
            None => false,
        }
    }
}

fn replace_slot(slots: &[String; LIST_SLOTS], index: usize, text: String) -> Result<[String; LIST_SLOTS]> {
    if index >= LIST_SLOTS {
        bail!("slot {} is out of range (1-{})", index + 1, LIST_SLOTS);
    }
    let mut next = slots.clone();
    next[index] = text;
    Ok(next)
}

impl RoutineEditor<MorningSection> {
    /// `index` is zero-based.
    pub async fn set_gratitude(
        &mut self,
        controller: &JournalController,
        index: usize,
        text: impl Into<String>,
    ) -> Result<bool> {
        let gratitude = replace_slot(&self.draft.gratitude, index, text.into())?;
        let patch = MorningPatch {
            gratitude: Some(gratitude),
            ..Default::default()
        };
        Ok(self.edit(controller, patch).await)
    }
}

impl RoutineEditor<EveningSection> {
    /// `index` is zero-based.
    pub async fn set_amazing_thing(
        &mut self,
        controller: &JournalController,
        index: usize,
        text: impl Into<String>,
    ) -> Result<bool> {
        let amazing_things = replace_slot(&self.draft.amazing_things, index, text.into())?;
        let patch = EveningPatch {
            amazing_things: Some(amazing_things),
            ..Default::default()
        };
        Ok(self.edit(controller, patch).await)
    }
}
