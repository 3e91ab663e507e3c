//! The application state container.
//!
//! Every mutation goes through a method on [`AppState`] and is written
//! through to the configured [`StateStorage`] before the method returns.
//! Horoscope fetches are tagged with a sequence number; only the most
//! recently issued fetch may settle the horoscope fields.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::horoscope::{Horoscope, HoroscopeProvider};
use crate::journal_entry::JournalEntry;
use crate::journal_store::JournalStore;
use crate::storage::{PersistedState, StateStorage};
use crate::zodiac::ZodiacSign;

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    pub sign: ZodiacSign,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Horoscope, ProviderError>,
}

pub struct AppState {
    selected_zodiac: ZodiacSign,
    current_horoscope: String,
    loading: bool,
    error: Option<String>,
    journal_entries: JournalStore,
    storage: Box<dyn StateStorage>,
    persistence_warning: Option<String>,
    fetch_seq: u64,
}

impl AppState {
    /// Fresh state that writes to `storage` but ignores whatever it holds.
    pub fn new(storage: Box<dyn StateStorage>) -> Self {
        AppState::from_persisted(PersistedState::default(), storage)
    }

    /// Rehydrates from `storage`. An unreadable document yields a fresh
    /// state with a pending persistence warning instead of an error.
    pub fn restore(storage: Box<dyn StateStorage>) -> Self {
        match storage.load() {
            Ok(Some(persisted)) => {
                info!(
                    entries = persisted.journal_entries.len(),
                    "restored journal state"
                );
                AppState::from_persisted(persisted, storage)
            }
            Ok(None) => AppState::new(storage),
            Err(e) => {
                warn!(error = %e, "could not read saved journal, starting empty");
                let warning = match storage.set_aside_unreadable() {
                    Ok(Some(backup)) => {
                        format!("Could not load saved journal: {e}. The old file was kept at {backup}")
                    }
                    Ok(None) => format!("Could not load saved journal: {e}"),
                    Err(backup_err) => {
                        warn!(error = %backup_err, "could not move unreadable journal aside");
                        format!(
                            "Could not load saved journal: {e}. It could not be backed up either: {backup_err}"
                        )
                    }
                };
                let mut state = AppState::new(storage);
                state.persistence_warning = Some(warning);
                state
            }
        }
    }

    fn from_persisted(persisted: PersistedState, storage: Box<dyn StateStorage>) -> Self {
        AppState {
            selected_zodiac: persisted.selected_zodiac,
            current_horoscope: persisted.current_horoscope,
            loading: false,
            error: None,
            journal_entries: persisted.journal_entries,
            storage,
            persistence_warning: None,
            fetch_seq: 0,
        }
    }

    pub fn selected_zodiac(&self) -> ZodiacSign {
        self.selected_zodiac
    }

    pub fn current_horoscope(&self) -> &str {
        &self.current_horoscope
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn journal_entries(&self) -> &JournalStore {
        &self.journal_entries
    }

    pub fn entry(&self, date: &str) -> Option<&JournalEntry> {
        self.journal_entries.get(date)
    }

    /// Does not fetch; the previous sign's horoscope stays until a fetch settles.
    pub fn set_zodiac_sign(&mut self, sign: ZodiacSign) {
        debug!(sign = sign.id(), "zodiac sign selected");
        self.selected_zodiac = sign;
        self.persist();
    }

    /// Marks a fetch as in flight and supersedes any earlier one.
    pub fn begin_fetch(&mut self, sign: ZodiacSign) -> FetchTicket {
        self.fetch_seq += 1;
        self.loading = true;
        self.error = None;
        debug!(seq = self.fetch_seq, sign = sign.id(), "horoscope fetch started");
        FetchTicket {
            seq: self.fetch_seq,
            sign,
        }
    }

    /// Applies a settled fetch. Returns `false` and changes nothing when a
    /// newer fetch has been issued since `ticket`.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Horoscope, ProviderError>,
    ) -> bool {
        if ticket.seq != self.fetch_seq {
            debug!(
                seq = ticket.seq,
                latest = self.fetch_seq,
                "dropping stale horoscope result"
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(horoscope) => {
                self.current_horoscope = horoscope.horoscope;
                self.error = None;
                self.persist();
            }
            Err(e) => {
                warn!(error = %e, sign = ticket.sign.id(), "horoscope fetch failed");
                self.error = Some(e.to_string());
            }
        }
        true
    }

    /// Runs a whole fetch inline: pending, then success or failure.
    pub async fn fetch_horoscope(
        &mut self,
        provider: &dyn HoroscopeProvider,
        sign: ZodiacSign,
    ) -> bool {
        let ticket = self.begin_fetch(sign);
        let result = provider.fetch(sign).await;
        self.complete_fetch(ticket, result)
    }

    pub fn save_journal_entry(&mut self, date: &str, content: &str) -> JournalEntry {
        self.save_journal_entry_at(date, content, Utc::now())
    }

    pub fn save_journal_entry_at(
        &mut self,
        date: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> JournalEntry {
        let entry = self.journal_entries.upsert(date, content, now).clone();
        info!(date, words = entry.word_count(), "journal entry saved");
        self.persist();
        entry
    }

    /// Returns whether an entry was removed.
    pub fn delete_journal_entry(&mut self, date: &str) -> bool {
        if self.journal_entries.delete(date).is_none() {
            return false;
        }
        info!(date, "journal entry deleted");
        self.persist();
        true
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The last storage failure, if it has not been shown yet.
    pub fn take_persistence_warning(&mut self) -> Option<String> {
        self.persistence_warning.take()
    }

    fn snapshot(&self) -> PersistedState {
        PersistedState {
            selected_zodiac: self.selected_zodiac,
            current_horoscope: self.current_horoscope.clone(),
            journal_entries: self.journal_entries.clone(),
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.snapshot()) {
            warn!(error = %e, "failed to persist journal state");
            self.persistence_warning = Some(format!("Changes are kept for now but could not be saved: {e}"));
        }
    }
}

/// Runs the provider call on the runtime and reports back over `tx`.
pub fn spawn_fetch(
    provider: Arc<dyn HoroscopeProvider>,
    ticket: FetchTicket,
    tx: mpsc::UnboundedSender<FetchOutcome>,
) {
    tokio::spawn(async move {
        let result = provider.fetch(ticket.sign).await;
        let _ = tx.send(FetchOutcome { ticket, result });
    });
}
