/*!
# Astro Journal

A terminal journal with a daily horoscope. Pick a zodiac sign, read today's
horoscope and keep one journal entry per day; everything is saved locally
and restored on the next start.

## Architecture

- `date_key`: calendar-day keys and display dates
- `journal_entry` / `journal_store`: one entry per day, keyed by date
- `storage`: durable JSON persistence of the application state
- `horoscope`: simulated and HTTP horoscope providers
- `app_state`: the state container every change goes through
- `editing_session`: draft tracking, auto-save and the exit guard
- `app` / `ui`: screen flow and the ratatui front end
*/

pub mod app;
pub mod app_state;
pub mod config;
pub mod date_key;
pub mod editing_session;
pub mod error;
pub mod horoscope;
pub mod journal_entry;
pub mod journal_store;
pub mod logging;
pub mod storage;
pub mod ui;
pub mod zodiac;

pub use app_state::AppState;
pub use config::Config;
pub use editing_session::{EditState, EditingSession, ExitChoice, ExitDecision};
pub use error::{AppError, AppResult, PersistenceError, ProviderError, ValidationError};
pub use journal_entry::JournalEntry;
pub use journal_store::JournalStore;
pub use zodiac::ZodiacSign;
