use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::{
    cli::{EveningArgs, MorningArgs, SettingsAction, SlotEdit},
    db::models::{
        EntrySection, EveningPatch, EveningSection, JournalEntry, MorningPatch, MorningSection,
    },
    navigation::{self, EntryDate, Route},
};

use super::{EveningEditor, JournalController, MorningEditor};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_slots(out: &mut String, title: &str, slots: &[String; 3]) {
    let _ = writeln!(out, "  {title}");
    for (i, slot) in slots.iter().enumerate() {
        let _ = writeln!(out, "    {}. {}", i + 1, slot);
    }
}

fn write_morning(out: &mut String, morning: Option<&MorningSection>) {
    let blank = MorningSection::default();
    let section = morning.unwrap_or(&blank);
    write_slots(out, "I am grateful for...", &section.gratitude);
    let _ = writeln!(out, "  What would make today great? {}", section.great_day);
    let _ = writeln!(out, "  Daily affirmation: {}", section.affirmation);
    if section.completed_at.is_some() {
        let _ = writeln!(out, "  Morning reflection completed");
    }
}

fn write_evening(out: &mut String, evening: Option<&EveningSection>) {
    let blank = EveningSection::default();
    let section = evening.unwrap_or(&blank);
    write_slots(out, "Amazing things that happened today...", &section.amazing_things);
    let _ = writeln!(out, "  How could I have made today better? {}", section.improvements);
    if section.completed_at.is_some() {
        let _ = writeln!(out, "  Evening reflection completed");
    }
}

pub fn render_entry(entry: &JournalEntry, today: EntryDate) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} - {}",
        navigation::heading(entry.date, today),
        navigation::long_date(entry.date)
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Morning [{}]",
        entry.status(EntrySection::Morning).as_str()
    );
    write_morning(&mut out, entry.morning.as_ref());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Evening [{}]",
        entry.status(EntrySection::Evening).as_str()
    );
    write_evening(&mut out, entry.evening.as_ref());
    out
}

pub fn render_history(entries: &[JournalEntry]) -> String {
    if entries.is_empty() {
        return "Your journal history will appear here\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  morning: {:<8}  evening: {}",
            entry.date,
            entry.status(EntrySection::Morning).as_str(),
            entry.status(EntrySection::Evening).as_str()
        );
    }
    out
}

fn print_entry(entry: &JournalEntry, today: EntryDate, json: bool) -> Result<()> {
    if json {
        print_json(entry)
    } else {
        print!("{}", render_entry(entry, today));
        Ok(())
    }
}

/// An editor refuses edits once its entry is no longer current.
fn ensure_applied(applied: bool, section: EntrySection, date: EntryDate) -> Result<()> {
    if !applied {
        bail!("{} edit for {date} was not applied", section.as_str());
    }
    Ok(())
}

/// Days after today cannot be opened.
fn reachable(date: EntryDate, today: EntryDate) -> Result<EntryDate> {
    if date > today {
        bail!("{date} is in the future; the latest day you can journal is {today}");
    }
    Ok(date)
}

/// Opens `route` and prints its entry.
pub async fn show(journal: &JournalController, route: Route, json: bool) -> Result<()> {
    let today = journal.today();
    let date = reachable(route.resolve(today), today)?;
    let entry = journal.load_or_create(date).await?;
    print_entry(&entry, today, json)
}

pub async fn previous(
    journal: &JournalController,
    from: Option<EntryDate>,
    json: bool,
) -> Result<()> {
    let from = from.unwrap_or_else(|| journal.today());
    show(journal, navigation::previous_day(from), json).await
}

pub async fn next(journal: &JournalController, from: Option<EntryDate>, json: bool) -> Result<()> {
    let today = journal.today();
    let from = from.unwrap_or(today);
    if !navigation::can_go_next(from, today) {
        if !json {
            eprintln!("{from} is the latest day you can journal");
        }
        return show(journal, Route::Entry(from), json).await;
    }
    let route = navigation::next_day(from, today).unwrap_or(Route::Entry(from));
    show(journal, route, json).await
}

pub async fn morning(journal: &JournalController, args: MorningArgs, json: bool) -> Result<()> {
    let today = journal.today();
    let date = reachable(args.date.unwrap_or(today), today)?;
    let entry = journal.load_or_create(date).await?;

    let mut editor = MorningEditor::new();
    editor.load(Some(&entry));

    for SlotEdit { index, text } in args.gratitude {
        let applied = editor.set_gratitude(journal, index, text).await?;
        ensure_applied(applied, EntrySection::Morning, date)?;
    }
    if args.great_day.is_some() || args.affirmation.is_some() {
        let patch = MorningPatch {
            gratitude: None,
            great_day: args.great_day,
            affirmation: args.affirmation,
        };
        let applied = editor.edit(journal, patch).await;
        ensure_applied(applied, EntrySection::Morning, date)?;
    }

    let entry = journal
        .current_entry()
        .await
        .context("no entry loaded after editing")?;
    print_entry(&entry, today, json)
}

pub async fn evening(journal: &JournalController, args: EveningArgs, json: bool) -> Result<()> {
    let today = journal.today();
    let date = reachable(args.date.unwrap_or(today), today)?;
    let entry = journal.load_or_create(date).await?;

    let mut editor = EveningEditor::new();
    editor.load(Some(&entry));

    for SlotEdit { index, text } in args.amazing {
        let applied = editor.set_amazing_thing(journal, index, text).await?;
        ensure_applied(applied, EntrySection::Evening, date)?;
    }
    if let Some(improvements) = args.improvements {
        let patch = EveningPatch {
            amazing_things: None,
            improvements: Some(improvements),
        };
        let applied = editor.edit(journal, patch).await;
        ensure_applied(applied, EntrySection::Evening, date)?;
    }

    let entry = journal
        .current_entry()
        .await
        .context("no entry loaded after editing")?;
    print_entry(&entry, today, json)
}

pub async fn history(journal: &JournalController, json: bool) -> Result<()> {
    let entries = journal.load_history().await?;
    if json {
        print_json(&entries)
    } else {
        print!("{}", render_history(&entries));
        Ok(())
    }
}

pub async fn settings(
    journal: &JournalController,
    action: Option<SettingsAction>,
    json: bool,
) -> Result<()> {
    if let Some(SettingsAction::Set {
        theme,
        font_size,
        font_family,
        animations,
        ruled_lines,
    }) = action
    {
        let mut settings = journal.settings().await;
        if let Some(theme) = theme {
            settings.theme = theme;
        }
        if let Some(font_size) = font_size {
            settings.font_size = font_size;
        }
        if let Some(font_family) = font_family {
            settings.font_family = font_family;
        }
        if let Some(animations) = animations {
            settings.enable_animations = animations;
        }
        if let Some(ruled_lines) = ruled_lines {
            settings.enable_ruled_lines = ruled_lines;
        }
        journal.update_settings(settings).await?;
    }

    let settings = journal.settings().await;
    if json {
        return print_json(&settings);
    }
    println!("theme:         {}", settings.theme.as_str());
    println!("font size:     {}", settings.font_size.as_str());
    println!("font family:   {}", settings.font_family.as_str());
    println!("animations:    {}", settings.enable_animations);
    println!("ruled lines:   {}", settings.enable_ruled_lines);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn date(raw: &str) -> EntryDate {
        EntryDate::parse(raw).unwrap()
    }

    #[test]
    fn renders_today_heading_and_statuses() {
        let mut entry = JournalEntry::new(date("2024-03-15"), Utc::now());
        entry.apply_section_patch(
            &crate::db::models::SectionPatch::Evening(EveningPatch {
                amazing_things: None,
                improvements: Some("earlier night".into()),
            }),
            Utc::now(),
        );

        let text = render_entry(&entry, date("2024-03-15"));
        assert!(text.starts_with("Today - March 15, 2024\n"));
        assert!(text.contains("Morning [empty]"));
        assert!(text.contains("Evening [partial]"));
        assert!(text.contains("How could I have made today better? earlier night"));
    }

    #[test]
    fn renders_weekday_for_past_days() {
        let entry = JournalEntry::new(date("2024-03-14"), Utc::now());
        let text = render_entry(&entry, date("2024-03-15"));
        assert!(text.starts_with("Thursday - March 14, 2024\n"));
    }

    #[test]
    fn future_dates_are_unreachable() {
        let today = date("2024-03-15");
        assert!(reachable(date("2024-03-16"), today).is_err());
        assert_eq!(reachable(today, today).unwrap(), today);
    }

    #[test]
    fn refused_edit_is_an_error() {
        let day = date("2024-03-15");
        assert!(ensure_applied(true, EntrySection::Morning, day).is_ok());

        let err = ensure_applied(false, EntrySection::Evening, day).unwrap_err();
        assert_eq!(err.to_string(), "evening edit for 2024-03-15 was not applied");
    }

    #[test]
    fn renders_history_rows() {
        assert_eq!(
            render_history(&[]),
            "Your journal history will appear here\n"
        );

        let entries = vec![
            JournalEntry::new(date("2024-03-15"), Utc::now()),
            JournalEntry::new(date("2024-03-14"), Utc::now()),
        ];
        let text = render_history(&entries);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2024-03-15  morning: empty"));
        assert!(lines[1].ends_with("evening: empty"));
    }
}
