//! Screen flow and key handling, independent of the terminal.
//!
//! [`App`] owns the [`AppState`] and routes every user intent to it. The
//! terminal loop in `ui` only draws an `App` and feeds it key events and
//! ticks.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app_state::{spawn_fetch, AppState, FetchOutcome};
use crate::date_key::today_key;
use crate::editing_session::{EditingSession, ExitChoice, ExitDecision};
use crate::horoscope::HoroscopeProvider;
use crate::zodiac::ZodiacSign;

pub struct JournalView {
    pub session: EditingSession,
    pub cursor: usize,
    pub show_history: bool,
}

pub enum Screen {
    Home,
    Journal(Box<JournalView>),
}

/// Where to go once the editor has been left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterExit {
    Home,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    FetchError,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Picker { selected: usize },
    Notice { kind: NoticeKind, title: String, message: String },
    ExitPrompt { then: AfterExit },
}

pub struct App {
    state: AppState,
    provider: Arc<dyn HoroscopeProvider>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    auto_save_interval: Duration,
    screen: Screen,
    overlay: Option<Overlay>,
    should_quit: bool,
}

impl App {
    pub fn new(
        state: AppState,
        provider: Arc<dyn HoroscopeProvider>,
        auto_save_interval: Duration,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        App {
            state,
            provider,
            fetch_tx,
            fetch_rx,
            auto_save_interval,
            screen: Screen::Home,
            overlay: None,
            should_quit: false,
        }
    }

    /// First display of the home screen: fetch if nothing is shown yet.
    pub fn start(&mut self) {
        if self.state.current_horoscope().is_empty() {
            self.refresh_horoscope();
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Settles finished fetches, runs due auto-saves and raises notices.
    pub fn tick(&mut self) {
        while let Ok(outcome) = self.fetch_rx.try_recv() {
            self.state.complete_fetch(outcome.ticket, outcome.result);
        }

        if let Screen::Journal(view) = &mut self.screen {
            view.session.poll_auto_save(&mut self.state);
            let today = today_key();
            if view.session.date_key() != today && !view.session.has_unsaved_changes() {
                debug!(%today, "day changed, following to the new date");
                view.session.switch_date(today, &self.state);
            } else {
                view.session.observe(&self.state);
            }
            view.cursor = clamp_cursor(view.session.draft(), view.cursor);
        }

        if self.overlay.is_none() {
            if let Some(warning) = self.state.take_persistence_warning() {
                self.overlay = Some(Overlay::Notice {
                    kind: NoticeKind::Storage,
                    title: "Storage".to_string(),
                    message: warning,
                });
            } else if let (Screen::Home, Some(error)) = (&self.screen, self.state.error()) {
                self.overlay = Some(Overlay::Notice {
                    kind: NoticeKind::FetchError,
                    title: "Error".to_string(),
                    message: error.to_string(),
                });
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(overlay) = self.overlay.take() {
            self.handle_overlay_key(overlay, key);
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if matches!(self.screen, Screen::Home) {
            self.handle_home_key(key.code, ctrl);
        } else {
            self.handle_journal_key(key.code, ctrl);
        }
    }

    fn handle_overlay_key(&mut self, overlay: Overlay, key: KeyEvent) {
        match overlay {
            Overlay::Picker { selected } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.overlay = Some(Overlay::Picker {
                        selected: selected.saturating_sub(1),
                    });
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.overlay = Some(Overlay::Picker {
                        selected: (selected + 1).min(ZodiacSign::ALL.len() - 1),
                    });
                }
                KeyCode::Enter => {
                    let sign = ZodiacSign::ALL[selected.min(ZodiacSign::ALL.len() - 1)];
                    self.select_sign(sign);
                }
                KeyCode::Esc => {}
                _ => self.overlay = Some(Overlay::Picker { selected }),
            },
            Overlay::Notice { kind, title, message } => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                    if kind == NoticeKind::FetchError {
                        self.state.clear_error();
                    }
                }
                _ => self.overlay = Some(Overlay::Notice { kind, title, message }),
            },
            Overlay::ExitPrompt { then } => match key.code {
                KeyCode::Char('s') | KeyCode::Char('S') => self.finish_exit(ExitChoice::Save, then),
                KeyCode::Char('d') | KeyCode::Char('D') => {
                    self.finish_exit(ExitChoice::Discard, then)
                }
                _ => self.overlay = Some(Overlay::ExitPrompt { then }),
            },
        }
    }

    fn handle_home_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.refresh_horoscope(),
            KeyCode::Char('s') => {
                self.overlay = Some(Overlay::Picker {
                    selected: self.state.selected_zodiac().position(),
                });
            }
            KeyCode::Char('j') | KeyCode::Enter => self.open_journal(),
            _ => {}
        }
    }

    fn handle_journal_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Esc => {
                self.request_exit(AfterExit::Home);
                return;
            }
            KeyCode::Char('c') if ctrl => {
                self.request_exit(AfterExit::Quit);
                return;
            }
            KeyCode::Char('s') if ctrl => {
                self.save_journal();
                return;
            }
            _ => {}
        }
        let Screen::Journal(view) = &mut self.screen else {
            return;
        };
        let draft = view.session.draft().to_string();
        let cursor = clamp_cursor(&draft, view.cursor);
        let edited = match code {
            KeyCode::Tab => {
                view.show_history = !view.show_history;
                None
            }
            KeyCode::Char(c) if !ctrl => Some(insert_at(&draft, cursor, c)),
            KeyCode::Enter => Some(insert_at(&draft, cursor, '\n')),
            KeyCode::Backspace => remove_before(&draft, cursor),
            KeyCode::Delete => remove_at(&draft, cursor).map(|text| (text, cursor)),
            KeyCode::Left => {
                view.cursor = prev_boundary(&draft, cursor);
                None
            }
            KeyCode::Right => {
                view.cursor = next_boundary(&draft, cursor);
                None
            }
            KeyCode::Up => {
                view.cursor = move_up(&draft, cursor);
                None
            }
            KeyCode::Down => {
                view.cursor = move_down(&draft, cursor);
                None
            }
            KeyCode::Home => {
                view.cursor = line_start(&draft, cursor);
                None
            }
            KeyCode::End => {
                view.cursor = line_end(&draft, cursor);
                None
            }
            _ => None,
        };
        if let Some((text, new_cursor)) = edited {
            view.session.edit(text);
            view.cursor = new_cursor;
        }
    }

    pub fn refresh_horoscope(&mut self) {
        let ticket = self.state.begin_fetch(self.state.selected_zodiac());
        spawn_fetch(Arc::clone(&self.provider), ticket, self.fetch_tx.clone());
    }

    /// Selection and fetch as one intent.
    pub fn select_sign(&mut self, sign: ZodiacSign) {
        self.state.set_zodiac_sign(sign);
        self.refresh_horoscope();
    }

    pub fn open_journal(&mut self) {
        let session = EditingSession::mount(today_key(), &self.state, self.auto_save_interval);
        let cursor = session.draft().len();
        info!(date = session.date_key(), "opening journal");
        self.screen = Screen::Journal(Box::new(JournalView {
            session,
            cursor,
            show_history: false,
        }));
    }

    fn save_journal(&mut self) {
        let Screen::Journal(view) = &mut self.screen else {
            return;
        };
        let (title, message) = match view.session.save(&mut self.state) {
            Ok(Some(_)) => (
                "Saved!",
                "Your journal entry has been saved successfully.".to_string(),
            ),
            Ok(None) => return,
            Err(e) => ("Empty Entry", e.to_string()),
        };
        view.cursor = clamp_cursor(view.session.draft(), view.cursor);
        self.overlay = Some(Overlay::Notice {
            kind: NoticeKind::Info,
            title: title.to_string(),
            message,
        });
    }

    /// Navigation away from the editor goes through the session's guard.
    pub fn request_exit(&mut self, then: AfterExit) {
        let Screen::Journal(view) = &self.screen else {
            return;
        };
        match view.session.guard_exit() {
            ExitDecision::Proceed => self.finish_exit(ExitChoice::Discard, then),
            ExitDecision::Prompt => self.overlay = Some(Overlay::ExitPrompt { then }),
        }
    }

    fn finish_exit(&mut self, choice: ExitChoice, then: AfterExit) {
        if let Screen::Journal(view) = std::mem::replace(&mut self.screen, Screen::Home) {
            view.session.leave(choice, &mut self.state);
        }
        if then == AfterExit::Quit {
            self.should_quit = true;
        }
    }
}

pub(crate) fn clamp_cursor(text: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

fn insert_at(text: &str, cursor: usize, c: char) -> (String, usize) {
    let mut out = text.to_string();
    out.insert(cursor, c);
    (out, cursor + c.len_utf8())
}

fn remove_before(text: &str, cursor: usize) -> Option<(String, usize)> {
    if cursor == 0 {
        return None;
    }
    let start = prev_boundary(text, cursor);
    let mut out = text.to_string();
    out.replace_range(start..cursor, "");
    Some((out, start))
}

fn remove_at(text: &str, cursor: usize) -> Option<String> {
    if cursor >= text.len() {
        return None;
    }
    let end = next_boundary(text, cursor);
    let mut out = text.to_string();
    out.replace_range(cursor..end, "");
    Some(out)
}

fn prev_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|c| cursor + c.len_utf8())
        .unwrap_or(cursor)
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|i| cursor + i)
        .unwrap_or(text.len())
}

/// Byte offset of the `column`-th character of the line starting at `start`,
/// or the line's end if it is shorter.
fn offset_at_column(text: &str, start: usize, column: usize) -> usize {
    let end = line_end(text, start);
    text[start..end]
        .char_indices()
        .nth(column)
        .map(|(i, _)| start + i)
        .unwrap_or(end)
}

fn move_up(text: &str, cursor: usize) -> usize {
    let current_start = line_start(text, cursor);
    if current_start == 0 {
        return cursor;
    }
    let column = text[current_start..cursor].chars().count();
    let prev_start = line_start(text, current_start - 1);
    offset_at_column(text, prev_start, column)
}

fn move_down(text: &str, cursor: usize) -> usize {
    let current_end = line_end(text, cursor);
    if current_end == text.len() {
        return cursor;
    }
    let column = text[line_start(text, cursor)..cursor].chars().count();
    offset_at_column(text, current_end + 1, column)
}
