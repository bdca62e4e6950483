use daybook_lib::{
    cli::{Cli, Commands},
    db::models::{MorningPatch, SectionPatch},
    execute,
    journal::{EveningEditor, JournalController, MorningEditor},
    navigation::{self, Clock, EntryDate, Route},
    AppState,
};
use clap::Parser;

fn date(raw: &str) -> EntryDate {
    EntryDate::parse(raw).unwrap()
}

#[tokio::test]
async fn navigate_edit_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::open(dir.path()).unwrap();
    let today = date("2024-03-15");
    let journal = JournalController::new(state.db.clone(), Clock::Fixed(today), 1);

    let opened = journal.start().await.unwrap();
    assert_eq!(opened.date, today);

    // Step back a day and fill in the morning.
    let route = navigation::previous_day(today);
    assert_eq!(route, Route::Entry(date("2024-03-14")));
    let yesterday = journal.load_or_create(route.resolve(today)).await.unwrap();

    let mut morning = MorningEditor::new();
    morning.load(Some(&yesterday));
    for (i, text) in ["a", "b", "c"].into_iter().enumerate() {
        morning.set_gratitude(&journal, i, text).await.unwrap();
    }
    morning
        .edit(
            &journal,
            MorningPatch {
                great_day: Some("x".into()),
                affirmation: Some("y".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(morning.is_completed());

    // Forward again lands on the canonical today route.
    assert_eq!(
        navigation::next_day(yesterday.date, today),
        Some(Route::Today)
    );
    assert_eq!(navigation::next_day(today, today), None);

    let mut evening = EveningEditor::new();
    let current = journal.load_or_create(today).await.unwrap();
    evening.load(Some(&current));
    evening
        .set_amazing_thing(&journal, 0, "long walk")
        .await
        .unwrap();

    journal.shutdown().await;
    state.shutdown().await;

    // A fresh process sees exactly what was written.
    let reopened = JournalController::new(state.db.clone(), Clock::Fixed(today), 1);
    let stored = reopened.load_or_create(date("2024-03-14")).await.unwrap();
    assert_eq!(stored.id, yesterday.id);
    let stored_morning = stored.morning.unwrap();
    assert_eq!(stored_morning.gratitude, ["a", "b", "c"]);
    assert!(stored_morning.completed_at.is_some());

    let history = reopened.load_history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, today);
    assert_eq!(history[0].evening.as_ref().unwrap().amazing_things[0], "long walk");
    reopened.shutdown().await;
}

#[tokio::test]
async fn edits_after_reblanking_keep_completion() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::open(dir.path()).unwrap();
    let journal = JournalController::new(state.db.clone(), Clock::Fixed(date("2024-03-15")), 0);
    journal.start().await.unwrap();

    let full = SectionPatch::Morning(MorningPatch {
        gratitude: Some(["a".into(), "b".into(), "c".into()]),
        great_day: Some("x".into()),
        affirmation: Some("y".into()),
    });
    let done = journal.apply_section_update(full).await.unwrap();
    let completed_at = done.morning.as_ref().unwrap().completed_at;

    let blank = SectionPatch::Morning(MorningPatch {
        affirmation: Some("   ".into()),
        ..Default::default()
    });
    journal.apply_section_update(blank).await.unwrap();
    journal.flush().await;

    let stored = state.db.get_entry(&done.id).await.unwrap().unwrap();
    let morning = stored.morning.unwrap();
    assert_eq!(morning.affirmation, "   ");
    assert_eq!(morning.completed_at, completed_at);
    journal.shutdown().await;
}

#[tokio::test]
async fn cli_commands_run_against_a_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::open(dir.path()).unwrap();

    let cli = Cli::try_parse_from([
        "daybook",
        "morning",
        "2024-03-10",
        "--gratitude",
        "1=coffee",
        "--great-day",
        "ship it",
    ])
    .unwrap();
    execute(&state, cli.command, cli.json).await.unwrap();

    let cli = Cli::try_parse_from(["daybook", "--json", "history"]).unwrap();
    assert!(matches!(cli.command, Commands::History));
    execute(&state, cli.command, cli.json).await.unwrap();
    state.shutdown().await;

    let stored = state
        .db
        .get_entry_by_date(date("2024-03-10"))
        .await
        .unwrap()
        .unwrap();
    let morning = stored.morning.unwrap();
    assert_eq!(morning.gratitude[0], "coffee");
    assert_eq!(morning.great_day, "ship it");
    assert!(morning.completed_at.is_none());
}
