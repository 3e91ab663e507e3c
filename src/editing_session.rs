//! One visit to the journal editor.
//!
//! The session compares the draft against the persisted content for its
//! date key. It writes only through [`AppState`], runs an auto-save timer
//! for as long as it lives, and decides whether leaving the editor needs
//! to ask the user first.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::error::ValidationError;
use crate::journal_entry::{word_count, JournalEntry};

pub const DEFAULT_AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Clean,
    Dirty,
}

/// Answer of the exit guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Proceed,
    /// Unsaved changes: the caller must ask for an [`ExitChoice`].
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitChoice {
    Discard,
    Save,
}

/// Periodic tick delivered over a channel; the task stops when dropped.
#[derive(Debug)]
pub struct AutoSaveTimer {
    ticks: mpsc::UnboundedReceiver<()>,
    handle: JoinHandle<()>,
}

impl AutoSaveTimer {
    /// Must be called from within a tokio runtime. The first tick comes
    /// one full `period` after start.
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::unbounded_channel();
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        AutoSaveTimer { ticks, handle }
    }

    /// True if at least one tick arrived since the last call.
    pub fn take_tick(&mut self) -> bool {
        let mut fired = false;
        while self.ticks.try_recv().is_ok() {
            fired = true;
        }
        fired
    }
}

impl Drop for AutoSaveTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug)]
pub struct EditingSession {
    date_key: String,
    draft: String,
    persisted: String,
    observed: Option<(String, DateTime<Utc>)>,
    auto_save: Option<AutoSaveTimer>,
}

impl EditingSession {
    /// A session without a timer; auto-save only happens through
    /// [`EditingSession::auto_save`].
    pub fn open(date_key: impl Into<String>, state: &AppState) -> Self {
        let mut session = EditingSession {
            date_key: date_key.into(),
            draft: String::new(),
            persisted: String::new(),
            observed: None,
            auto_save: None,
        };
        session.reload(state);
        session
    }

    /// Opens the session and starts its auto-save timer.
    pub fn mount(date_key: impl Into<String>, state: &AppState, interval: Duration) -> Self {
        let mut session = EditingSession::open(date_key, state);
        session.auto_save = Some(AutoSaveTimer::start(interval));
        debug!(date = %session.date_key, ?interval, "editing session mounted");
        session
    }

    pub fn date_key(&self) -> &str {
        &self.date_key
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn state(&self) -> EditState {
        if self.draft == self.persisted {
            EditState::Clean
        } else {
            EditState::Dirty
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.state() == EditState::Dirty
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Picks up external changes to the persisted entry. A different entry
    /// (or a newer save of it) replaces the draft and resets to clean.
    pub fn observe(&mut self, state: &AppState) {
        let current = state
            .entry(&self.date_key)
            .map(|e| (e.id.clone(), e.updated_at));
        if current != self.observed {
            self.reload(state);
        }
    }

    /// Re-targets the session, e.g. after the day rolled over.
    pub fn switch_date(&mut self, date_key: impl Into<String>, state: &AppState) {
        self.date_key = date_key.into();
        self.reload(state);
    }

    fn reload(&mut self, state: &AppState) {
        let entry = state.entry(&self.date_key);
        self.persisted = entry.map(|e| e.content.clone()).unwrap_or_default();
        self.observed = entry.map(|e| (e.id.clone(), e.updated_at));
        self.draft = self.persisted.clone();
    }

    /// Explicit save of the trimmed draft. `Ok(None)` means the draft
    /// already matched the stored entry and nothing was written.
    pub fn save(&mut self, state: &mut AppState) -> Result<Option<JournalEntry>, ValidationError> {
        let content = self.draft.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyEntry);
        }
        if !self.has_unsaved_changes() {
            debug!(date = %self.date_key, "save skipped, draft unchanged");
            return Ok(None);
        }
        let entry = state.save_journal_entry(&self.date_key, content);
        self.reload(state);
        Ok(Some(entry))
    }

    /// Writes only when dirty and the trimmed draft is non-empty.
    pub fn auto_save(&mut self, state: &mut AppState) -> bool {
        if !self.has_unsaved_changes() || self.draft.trim().is_empty() {
            return false;
        }
        let content = self.draft.trim().to_string();
        state.save_journal_entry(&self.date_key, &content);
        self.reload(state);
        debug!(date = %self.date_key, "auto-saved draft");
        true
    }

    /// Runs [`EditingSession::auto_save`] if the timer fired.
    pub fn poll_auto_save(&mut self, state: &mut AppState) -> bool {
        let fired = self
            .auto_save
            .as_mut()
            .map(AutoSaveTimer::take_tick)
            .unwrap_or(false);
        fired && self.auto_save(state)
    }

    pub fn guard_exit(&self) -> ExitDecision {
        if self.has_unsaved_changes() {
            ExitDecision::Prompt
        } else {
            ExitDecision::Proceed
        }
    }

    /// Ends the session; the timer stops with it. Returns whether the draft was written.
    pub fn leave(mut self, choice: ExitChoice, state: &mut AppState) -> bool {
        let wrote = match choice {
            ExitChoice::Save => self.auto_save(state),
            ExitChoice::Discard => false,
        };
        info!(date = %self.date_key, ?choice, wrote, "leaving editor");
        wrote
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.draft)
    }

    pub fn char_count(&self) -> usize {
        self.draft.chars().count()
    }
}
