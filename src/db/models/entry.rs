//! Journal entry data models.
//!
//! One `JournalEntry` per calendar day, holding an optional morning and an
//! optional evening section. Each section carries a sticky `completed_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::navigation::EntryDate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EntrySection {
    Morning,
    Evening,
}

impl EntrySection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySection::Morning => "morning",
            EntrySection::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CompletionStatus {
    Empty,
    Partial,
    Complete,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Empty => "empty",
            CompletionStatus::Partial => "partial",
            CompletionStatus::Complete => "complete",
        }
    }
}

fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Behaviour shared by the morning and evening sections.
pub trait Section: Clone + Default + PartialEq + Send + 'static {
    type Patch: Clone + Send + 'static;

    const KIND: EntrySection;

    /// Field merge only; completion is handled by [`Section::apply`].
    fn merge(&self, patch: &Self::Patch) -> Self;

    fn has_required_fields(&self) -> bool;

    fn has_content(&self) -> bool;

    fn completed_at(&self) -> Option<DateTime<Utc>>;

    fn mark_completed(&mut self, at: DateTime<Utc>);

    fn of(entry: &JournalEntry) -> Option<&Self>;

    fn wrap_patch(patch: Self::Patch) -> SectionPatch;

    /// Merges `patch` and sets `completed_at` the first time every required
    /// field is non-blank. An existing `completed_at` is never cleared.
    fn apply(&self, patch: &Self::Patch, at: DateTime<Utc>) -> Self {
        let mut merged = self.merge(patch);
        if merged.completed_at().is_none() && merged.has_required_fields() {
            merged.mark_completed(at);
        }
        merged
    }

    fn status(&self) -> CompletionStatus {
        if self.completed_at().is_some() {
            CompletionStatus::Complete
        } else if self.has_content() {
            CompletionStatus::Partial
        } else {
            CompletionStatus::Empty
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorningSection {
    pub gratitude: [String; 3],
    pub great_day: String,
    pub affirmation: String,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorningPatch {
    pub gratitude: Option<[String; 3]>,
    pub great_day: Option<String>,
    pub affirmation: Option<String>,
}

impl Section for MorningSection {
    type Patch = MorningPatch;

    const KIND: EntrySection = EntrySection::Morning;

    fn merge(&self, patch: &MorningPatch) -> Self {
        Self {
            gratitude: patch
                .gratitude
                .clone()
                .unwrap_or_else(|| self.gratitude.clone()),
            great_day: patch
                .great_day
                .clone()
                .unwrap_or_else(|| self.great_day.clone()),
            affirmation: patch
                .affirmation
                .clone()
                .unwrap_or_else(|| self.affirmation.clone()),
            completed_at: self.completed_at,
        }
    }

    fn has_required_fields(&self) -> bool {
        self.gratitude.iter().all(|g| is_filled(g))
            && is_filled(&self.great_day)
            && is_filled(&self.affirmation)
    }

    fn has_content(&self) -> bool {
        self.gratitude.iter().any(|g| is_filled(g))
            || is_filled(&self.great_day)
            || is_filled(&self.affirmation)
    }

    fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }

    fn of(entry: &JournalEntry) -> Option<&Self> {
        entry.morning.as_ref()
    }

    fn wrap_patch(patch: MorningPatch) -> SectionPatch {
        SectionPatch::Morning(patch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EveningSection {
    pub amazing_things: [String; 3],
    pub improvements: String,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EveningPatch {
    pub amazing_things: Option<[String; 3]>,
    pub improvements: Option<String>,
}

impl Section for EveningSection {
    type Patch = EveningPatch;

    const KIND: EntrySection = EntrySection::Evening;

    fn merge(&self, patch: &EveningPatch) -> Self {
        Self {
            amazing_things: patch
                .amazing_things
                .clone()
                .unwrap_or_else(|| self.amazing_things.clone()),
            improvements: patch
                .improvements
                .clone()
                .unwrap_or_else(|| self.improvements.clone()),
            completed_at: self.completed_at,
        }
    }

    fn has_required_fields(&self) -> bool {
        self.amazing_things.iter().all(|t| is_filled(t)) && is_filled(&self.improvements)
    }

    fn has_content(&self) -> bool {
        self.amazing_things.iter().any(|t| is_filled(t)) || is_filled(&self.improvements)
    }

    fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }

    fn of(entry: &JournalEntry) -> Option<&Self> {
        entry.evening.as_ref()
    }

    fn wrap_patch(patch: EveningPatch) -> SectionPatch {
        SectionPatch::Evening(patch)
    }
}

/// A partial update aimed at exactly one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "section", content = "fields")]
pub enum SectionPatch {
    Morning(MorningPatch),
    Evening(EveningPatch),
}

impl SectionPatch {
    pub fn section(&self) -> EntrySection {
        match self {
            SectionPatch::Morning(_) => EntrySection::Morning,
            SectionPatch::Evening(_) => EntrySection::Evening,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub date: EntryDate,
    pub morning: Option<MorningSection>,
    pub evening: Option<EveningSection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

impl JournalEntry {
    /// A blank entry for `date` with a fresh identifier.
    pub fn new(date: EntryDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            morning: None,
            evening: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Applies a section patch (absent sections start blank) and bumps
    /// `updated_at`.
    pub fn apply_section_patch(&mut self, patch: &SectionPatch, at: DateTime<Utc>) {
        match patch {
            SectionPatch::Morning(fields) => {
                let base = self.morning.take().unwrap_or_default();
                self.morning = Some(base.apply(fields, at));
            }
            SectionPatch::Evening(fields) => {
                let base = self.evening.take().unwrap_or_default();
                self.evening = Some(base.apply(fields, at));
            }
        }
        self.updated_at = at;
    }

    pub fn status(&self, section: EntrySection) -> CompletionStatus {
        let status = match section {
            EntrySection::Morning => self.morning.as_ref().map(Section::status),
            EntrySection::Evening => self.evening.as_ref().map(Section::status),
        };
        status.unwrap_or(CompletionStatus::Empty)
    }
}

/// Mutable columns of a stored entry; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub morning: Option<MorningSection>,
    pub evening: Option<EveningSection>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: Option<u32>,
}

impl From<&JournalEntry> for EntryPatch {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            morning: entry.morning.clone(),
            evening: entry.evening.clone(),
            updated_at: Some(entry.updated_at),
            version: Some(entry.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 7, minute, 0).unwrap()
    }

    fn gratitude(a: &str, b: &str, c: &str) -> Option<[String; 3]> {
        Some([a.to_string(), b.to_string(), c.to_string()])
    }

    #[test]
    fn morning_completes_once_all_fields_are_filled() {
        let blank = MorningSection::default();
        let partial = blank.apply(
            &MorningPatch {
                gratitude: gratitude("a", "b", "c"),
                ..Default::default()
            },
            at(1),
        );
        assert!(partial.completed_at.is_none());
        assert_eq!(partial.status(), CompletionStatus::Partial);

        let done = partial.apply(
            &MorningPatch {
                great_day: Some("x".into()),
                affirmation: Some("y".into()),
                ..Default::default()
            },
            at(2),
        );
        assert_eq!(done.completed_at, Some(at(2)));
        assert_eq!(done.status(), CompletionStatus::Complete);
    }

    #[test]
    fn completion_is_sticky_after_fields_are_blanked() {
        let done = MorningSection::default().apply(
            &MorningPatch {
                gratitude: gratitude("a", "b", "c"),
                great_day: Some("x".into()),
                affirmation: Some("y".into()),
            },
            at(1),
        );

        let blanked = done.apply(
            &MorningPatch {
                great_day: Some(String::new()),
                ..Default::default()
            },
            at(5),
        );
        assert_eq!(blanked.completed_at, Some(at(1)));

        let refilled = blanked.apply(
            &MorningPatch {
                great_day: Some("again".into()),
                ..Default::default()
            },
            at(9),
        );
        assert_eq!(refilled.completed_at, Some(at(1)));
    }

    #[test]
    fn whitespace_counts_as_blank() {
        let section = EveningSection::default().apply(
            &EveningPatch {
                amazing_things: gratitude("one", "   ", "three"),
                improvements: Some("more sleep".into()),
            },
            at(1),
        );
        assert!(section.completed_at.is_none());

        let section = section.apply(
            &EveningPatch {
                amazing_things: gratitude("one", "two", "three"),
                improvements: None,
            },
            at(2),
        );
        assert_eq!(section.completed_at, Some(at(2)));
    }

    #[test]
    fn applying_same_patch_twice_is_idempotent() {
        let patch = SectionPatch::Evening(EveningPatch {
            amazing_things: gratitude("a", "b", "c"),
            improvements: Some("z".into()),
        });
        let date = EntryDate::parse("2024-03-15").unwrap();
        let mut entry = JournalEntry::new(date, at(0));

        entry.apply_section_patch(&patch, at(1));
        let first = entry.evening.clone();
        entry.apply_section_patch(&patch, at(1) + Duration::minutes(3));

        assert_eq!(entry.evening, first);
        assert_eq!(entry.updated_at, at(4));
    }

    #[test]
    fn status_of_absent_section_is_empty() {
        let date = EntryDate::parse("2024-03-15").unwrap();
        let entry = JournalEntry::new(date, at(0));
        assert_eq!(entry.status(EntrySection::Morning), CompletionStatus::Empty);
        assert_eq!(entry.version, 1);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let section = MorningSection {
            great_day: "x".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["greatDay"], "x");
        assert!(json["completedAt"].is_null());
        assert_eq!(json["gratitude"].as_array().unwrap().len(), 3);
    }
}
