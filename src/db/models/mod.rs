pub mod entry;
pub mod user_settings;

pub use entry::{
    CompletionStatus, EntryPatch, EntrySection, EveningPatch, EveningSection, JournalEntry,
    MorningPatch, MorningSection, Section, SectionPatch,
};
pub use user_settings::{FontFamily, FontSize, Theme, UserSettings, USER_SETTINGS_ID};
