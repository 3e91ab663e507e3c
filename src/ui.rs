use chrono::Local;
use color_eyre::Result;
use crossterm::{
    event::{self, Event},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::Duration,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{clamp_cursor, App, JournalView, Overlay, Screen};
use crate::date_key::{format_display, format_key_display, today_key};
use crate::zodiac::ZodiacSign;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const HISTORY_LIMIT: usize = 10;
const PREVIEW_WIDTH: usize = 72;
const PLACEHOLDER: &str = "How was your day? What insights did the stars bring you? Write about your thoughts, feelings, and experiences...";
const MOTIVATION: &str =
    "\"The stars impel, they do not compel. Your journal is where destiny meets free will.\"";

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI { terminal })
    }

    pub fn display(&mut self, app: &App) -> Result<()> {
        self.terminal.draw(|f| {
            match app.screen() {
                Screen::Home => draw_home(f, app),
                Screen::Journal(view) => draw_journal(f, app, view),
            }
            if let Some(overlay) = app.overlay() {
                draw_overlay(f, overlay);
            }
        })?;
        Ok(())
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

/// Draw, read at most one key, tick; until the app asks to quit.
pub fn run(app: &mut App) -> Result<()> {
    let mut ui = UI::new()?;
    app.start();

    loop {
        ui.display(app)?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
        app.tick();

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn title_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn instructions(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
}

fn draw_home(f: &mut Frame, app: &App) {
    let state = app.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.area());

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Astro Journal", title_style())),
        Line::from(format_display(&Local::now())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let sign = state.selected_zodiac();
    let sign_line = Paragraph::new(format!("{} {}", sign.symbol(), sign.name()))
        .block(Block::default().borders(Borders::ALL).title("Your Sign"))
        .alignment(Alignment::Center);
    f.render_widget(sign_line, chunks[1]);

    let horoscope_text = if state.is_loading() {
        Span::styled(
            "Reading the stars...",
            Style::default().fg(Color::Magenta),
        )
    } else if state.current_horoscope().is_empty() {
        Span::styled(
            "No horoscope available. Please try refreshing.",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::raw(state.current_horoscope())
    };
    let horoscope = Paragraph::new(Line::from(horoscope_text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Today's Horoscope"),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(horoscope, chunks[2]);

    let today_entry = state.entry(&today_key());
    let mut button = vec![Line::from(Span::styled(
        if today_entry.is_some() {
            "Continue Writing"
        } else {
            "Write in Journal"
        },
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(entry) = today_entry {
        button.push(Line::from(format!(
            "Last updated: {}",
            entry.updated_at.with_timezone(&Local).format("%H:%M")
        )));
    }
    let journal_button = Paragraph::new(button)
        .block(Block::default().borders(Borders::ALL).title("Journal"))
        .alignment(Alignment::Center);
    f.render_widget(journal_button, chunks[3]);

    let stats = Paragraph::new(format!(
        "Journal Entries: {}    |    Today's Entry: {}",
        state.journal_entries().len(),
        if today_entry.is_some() { 1 } else { 0 }
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(stats, chunks[4]);

    let motivation = Paragraph::new(MOTIVATION)
        .style(Style::default().fg(Color::LightYellow))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(motivation, chunks[5]);

    let controls = Line::from(vec![
        Span::raw("Press "),
        Span::styled("s", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to pick a sign, "),
        Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to refresh, "),
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to write, "),
        Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to quit"),
    ]);
    let controls_paragraph = Paragraph::new(controls)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(controls_paragraph, chunks[6]);
}

fn draw_journal(f: &mut Frame, app: &App, view: &JournalView) {
    let session = &view.session;
    let history = app
        .state()
        .journal_entries()
        .recent_excluding(session.date_key(), HISTORY_LIMIT);

    let history_height = match (history.is_empty(), view.show_history) {
        (true, _) => 0,
        (false, false) => 3,
        (false, true) => 14,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(history_height),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.area());

    let mut stats = vec![
        Span::raw(format!("{} words", session.word_count())),
        Span::raw(" • "),
        Span::raw(format!("{} chars", session.char_count())),
    ];
    if session.has_unsaved_changes() {
        stats.push(Span::styled(
            "   ● Unsaved",
            Style::default().fg(Color::Yellow),
        ));
    }
    let header = Paragraph::new(vec![
        Line::from(Span::styled(format_display(&Local::now()), title_style())),
        Line::from(stats),
    ])
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let editor = if session.draft().is_empty() {
        Paragraph::new(Line::from(vec![
            Span::raw("|"),
            Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
        ]))
    } else {
        let mut content_with_cursor = session.draft().to_string();
        content_with_cursor.insert(clamp_cursor(session.draft(), view.cursor), '|');
        Paragraph::new(content_with_cursor)
    };
    let editor = editor
        .block(Block::default().borders(Borders::ALL).title("Today's Entry"))
        .wrap(Wrap { trim: false });
    f.render_widget(editor, chunks[1]);

    if !history.is_empty() {
        let title = format!("Previous Entries ({})", history.len());
        if view.show_history {
            let items: Vec<ListItem> = history
                .iter()
                .map(|entry| {
                    ListItem::new(vec![
                        Line::from(vec![
                            Span::styled(
                                format_key_display(&entry.date),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!("  {} words", entry.word_count()),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]),
                        Line::from(preview(&entry.content, PREVIEW_WIDTH)),
                    ])
                })
                .collect();
            let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(list, chunks[2]);
        } else {
            let collapsed = Paragraph::new("Tab to expand")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(collapsed, chunks[2]);
        }
    }

    f.render_widget(
        instructions("Ctrl+S: Save, Tab: Previous Entries, Esc: Back"),
        chunks[3],
    );
}

fn draw_overlay(f: &mut Frame, overlay: &Overlay) {
    match overlay {
        Overlay::Picker { selected } => {
            let area = centered_rect(40, ZodiacSign::ALL.len() as u16 + 4, f.area());
            let items: Vec<ListItem> = ZodiacSign::ALL
                .iter()
                .map(|sign| ListItem::new(format!("{} {}", sign.symbol(), sign.name())))
                .collect();
            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Choose Your Zodiac Sign"),
                )
                .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                .highlight_symbol("> ");
            f.render_widget(Clear, area);
            f.render_stateful_widget(
                list,
                area,
                &mut ListState::default().with_selected(Some(*selected)),
            );
        }
        Overlay::Notice { title, message, .. } => {
            let area = centered_rect(50, 7, f.area());
            let notice = Paragraph::new(vec![
                Line::from(message.as_str()),
                Line::from(""),
                Line::from(Span::styled("Enter: OK", Style::default().fg(Color::Yellow))),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(title.as_str(), title_style())),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            f.render_widget(Clear, area);
            f.render_widget(notice, area);
        }
        Overlay::ExitPrompt { .. } => {
            let area = centered_rect(50, 7, f.area());
            let prompt = Paragraph::new(vec![
                Line::from("You have unsaved changes. Do you want to save them before leaving?"),
                Line::from(""),
                Line::from(vec![
                    Span::styled("d", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(": Don't save    "),
                    Span::styled("s", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(": Save"),
                ]),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled("Discard changes?", title_style())),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            f.render_widget(Clear, area);
            f.render_widget(prompt, area);
        }
    }
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

/// Single-line preview no wider than `max_width` columns.
fn preview(content: &str, max_width: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::new();
    let mut width = 0;
    for c in flat.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            out.push('…');
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_flattens_whitespace() {
        assert_eq!(preview("line one\n\nline   two", 40), "line one line two");
    }

    #[test]
    fn preview_truncates_by_display_width() {
        assert_eq!(preview("abcdefghij", 5), "abcd…");
        assert_eq!(preview("日本語のテキスト", 7), "日本語…");
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 10);
        let rect = centered_rect(50, 20, area);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 10);
        assert_eq!(rect.x, 25);
        assert_eq!(rect.y, 0);
    }
}
