use astro_journal::editing_session::ExitDecision;
use astro_journal::horoscope::{canned_text, HoroscopeProvider, SimulatedProvider};
use astro_journal::storage::{JsonFileStorage, MemoryStorage, StateStorage};
use astro_journal::{AppState, EditState, EditingSession, ExitChoice, ValidationError, ZodiacSign};
use chrono::{TimeZone, Utc};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

fn instant_provider(failure_rate: f64) -> SimulatedProvider {
    SimulatedProvider::new()
        .with_delay(Duration::ZERO, Duration::ZERO)
        .with_failure_rate(failure_rate)
}

#[test]
fn journal_survives_restart_with_identical_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut state = AppState::restore(Box::new(JsonFileStorage::new(&path)));
    let first = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 9, 1, 20, 0, 0).unwrap();
    state.save_journal_entry_at("2024-09-01", "morning pages", first);
    state.save_journal_entry_at("2024-09-01", "evening pages", second);
    state.save_journal_entry_at("2024-09-02", "another day", second);
    state.set_zodiac_sign(ZodiacSign::Cancer);

    let restored = AppState::restore(Box::new(JsonFileStorage::new(&path)));
    assert_eq!(restored.journal_entries(), state.journal_entries());
    assert_eq!(restored.selected_zodiac(), ZodiacSign::Cancer);

    let entry = restored.entry("2024-09-01").unwrap();
    assert_eq!(entry.created_at, first);
    assert_eq!(entry.updated_at, second);
    assert_eq!(entry.content, "evening pages");
}

#[test]
fn transient_flags_are_not_persisted() {
    let storage = MemoryStorage::new();
    let mut state = AppState::new(Box::new(storage.clone()));
    state.begin_fetch(ZodiacSign::Aries);
    state.save_journal_entry("2024-09-01", "text");

    let raw = storage.raw().unwrap();
    assert!(!raw.contains("loading"));
    assert!(!raw.contains("error"));
    assert!(!AppState::restore(Box::new(storage)).is_loading());
}

#[test]
fn corrupt_file_starts_empty_and_is_overwritten_on_next_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let original = r#"{"journalEntries":{"2024-09-01":{"id":"a1","date":"2024-09-01","content":"years of writing","createdAt":"2024-09-01T08:00:00Z","updatedAt":"oops"}}}"#;
    fs::write(&path, original).unwrap();

    let mut state = AppState::restore(Box::new(JsonFileStorage::new(&path)));
    assert!(state.journal_entries().is_empty());
    let warning = state.take_persistence_warning().unwrap();

    state.set_zodiac_sign(ZodiacSign::Aries);
    state.save_journal_entry("2024-09-03", "fresh start");
    let reloaded = JsonFileStorage::new(&path).load().unwrap().unwrap();
    assert_eq!(reloaded.journal_entries.len(), 1);

    let backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("state.json.corrupt-"))
        })
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(warning.contains(&backups[0].display().to_string()));
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), original);
}

#[tokio::test]
async fn failed_fetch_scenario() {
    let mut state = AppState::new(Box::new(MemoryStorage::new()));
    assert!(!state.is_loading());

    let ticket = state.begin_fetch(ZodiacSign::Aries);
    assert!(state.is_loading());
    let result = instant_provider(1.0).fetch(ZodiacSign::Aries).await;
    state.complete_fetch(ticket, result);

    assert!(!state.is_loading());
    assert!(!state.error().unwrap_or_default().is_empty());
    assert_eq!(state.current_horoscope(), "");
}

#[tokio::test]
async fn successful_fetch_scenario() {
    let mut state = AppState::new(Box::new(MemoryStorage::new()));
    state
        .fetch_horoscope(&instant_provider(0.0), ZodiacSign::Leo)
        .await;
    assert_eq!(state.current_horoscope(), canned_text(ZodiacSign::Leo));
    assert!(state.error().is_none());
}

#[test]
fn editing_session_scenario() {
    let mut state = AppState::new(Box::new(MemoryStorage::new()));
    let mut session = EditingSession::open("2024-09-04", &state);
    assert_eq!(session.draft(), "");

    session.edit("Hello world");
    assert_eq!(session.state(), EditState::Dirty);
    assert_eq!(session.word_count(), 2);

    session.save(&mut state).unwrap();
    assert_eq!(state.entry("2024-09-04").unwrap().content, "Hello world");
    assert_eq!(session.state(), EditState::Clean);
}

#[test]
fn exit_guard_scenario() {
    let mut state = AppState::new(Box::new(MemoryStorage::new()));

    let mut session = EditingSession::open("2024-09-05", &state);
    session.edit("draft one");
    assert_eq!(session.guard_exit(), ExitDecision::Prompt);
    session.leave(ExitChoice::Discard, &mut state);
    assert!(state.entry("2024-09-05").is_none());

    let mut session = EditingSession::open("2024-09-05", &state);
    session.edit("draft two");
    assert_eq!(session.guard_exit(), ExitDecision::Prompt);
    session.leave(ExitChoice::Save, &mut state);
    assert_eq!(state.entry("2024-09-05").unwrap().content, "draft two");
}

#[test]
fn whitespace_save_scenario() {
    let mut state = AppState::new(Box::new(MemoryStorage::new()));
    let mut session = EditingSession::open("2024-09-06", &state);
    session.edit("   ");
    assert_eq!(session.save(&mut state).unwrap_err(), ValidationError::EmptyEntry);
    assert!(state.journal_entries().is_empty());
}
