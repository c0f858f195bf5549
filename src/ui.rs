pub mod calendar;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::{
    app::App,
    evaluator::{KeyboardState, Verdict},
    resolver::ResolveError,
    session::{Row, Session, Status},
    util::{format_clock, format_thousands},
};

const KEYBOARD_ROWS: [&str; 3] = ["QWERTYUIOP", "ASDFGHJKLÑ", "ZXCVBNM"];

pub fn verdict_style(verdict: Verdict) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match verdict {
        Verdict::Correct => bold.fg(Color::Black).bg(Color::Green),
        Verdict::Present => bold.fg(Color::Black).bg(Color::Yellow),
        Verdict::Absent => bold.fg(Color::White).bg(Color::DarkGray),
    }
}

fn board_row(row: &Row, is_current: bool) -> Line<'static> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let typed = Style::default().add_modifier(Modifier::BOLD);

    let spans = row
        .letters
        .iter()
        .enumerate()
        .flat_map(|(idx, letter)| {
            let cell = match (letter, &row.verdicts) {
                (Some(c), Some(verdicts)) => Span::styled(format!(" {c} "), verdict_style(verdicts[idx])),
                (Some(c), None) => Span::styled(format!("[{c}]"), typed),
                (None, _) if is_current => Span::styled("[ ]", typed),
                (None, _) => Span::styled(" · ", dim),
            };
            [cell, Span::raw(" ")]
        })
        .collect::<Vec<_>>();

    Line::from(spans)
}

fn keyboard_lines(keyboard: &KeyboardState) -> Vec<Line<'static>> {
    KEYBOARD_ROWS
        .iter()
        .map(|row| {
            let spans = row
                .chars()
                .flat_map(|c| {
                    let style = keyboard
                        .get(c)
                        .map(verdict_style)
                        .unwrap_or_else(|| Style::default().add_modifier(Modifier::BOLD));
                    [Span::styled(format!(" {c} "), style), Span::raw(" ")]
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect()
}

fn header_line(session: &Session) -> Line<'static> {
    let config = session.config();
    let state = session.state();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut spans = vec![Span::styled(config.date.to_string(), bold)];
    if config.is_archive_mode {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "ARCHIVE",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::raw("   "));
    spans.push(Span::styled(format_clock(state.elapsed_secs), Style::default().fg(Color::Cyan)));
    spans.push(Span::raw("   "));
    spans.push(Span::styled(
        format!("{} pts", format_thousands(u64::from(session.score()))),
        bold.fg(Color::Yellow),
    ));
    Line::from(spans)
}

fn outcome_line(session: &Session) -> Option<Line<'static>> {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match session.status() {
        Status::InProgress => None,
        Status::Won => Some(Line::from(Span::styled(
            format!("solved in {} · {} pts", session.attempts_used(), session.score()),
            style.fg(Color::Green),
        ))),
        Status::Lost => Some(Line::from(Span::styled(
            format!("the word was {}", session.config().target_word),
            style.fg(Color::Red),
        ))),
    }
}

fn stats_line(app: &App) -> Line<'static> {
    let stats = app.stats();
    Line::from(vec![
        Span::raw(format!("played {}", stats.games_played)),
        Span::raw("   "),
        Span::raw(format!("win {}%", stats.win_percentage())),
        Span::raw("   "),
        Span::raw(format!("streak {}", stats.current_streak)),
        Span::raw("   "),
        Span::raw(format!("points {}", format_thousands(stats.total_points))),
    ])
}

fn help_line(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center)
}

const GAME_HELP: &str = "enter submit · tab hint · F2 calendar · esc quit";

fn render_placeholder(app: &App, area: Rect, buf: &mut Buffer) {
    let message = match app.unavailable() {
        Some(err @ ResolveError::NotYetAvailable(_)) => err.to_string(),
        _ => "no puzzle today".to_string(),
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        message,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[1], buf);
    help_line("F2 calendar · esc quit").render(chunks[3], buf);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(session) = self.session() else {
            render_placeholder(self, area, buf);
            return;
        };

        let state = session.state();
        let board_height = state.rows.len() as u16;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(board_height + 1),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new(header_line(session))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let board = state
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                board_row(row, !session.is_finished() && idx == state.current_attempt)
            })
            .collect::<Vec<_>>();
        Paragraph::new(board)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let hint = match self.revealed_hint() {
            Some(hint) => Span::styled(
                format!("hint: {hint}"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
            None => Span::styled(
                "tab for a hint",
                Style::default().add_modifier(Modifier::DIM),
            ),
        };
        Paragraph::new(hint)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        let message = match (self.notice(), outcome_line(session)) {
            (Some(notice), _) => Line::from(Span::styled(
                notice.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            (None, Some(outcome)) => outcome,
            (None, None) => Line::default(),
        };
        Paragraph::new(message)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        Paragraph::new(keyboard_lines(&state.keyboard))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        Paragraph::new(stats_line(self))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
        help_line(GAME_HELP).render(chunks[7], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, PuzzleDefinition};
    use crate::checker::AcceptAll;
    use crate::runtime::GameEvent;
    use crate::stats::{KvCompletionStore, MemoryKvStore};
    use chrono::NaiveDate;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::{mpsc, Arc};
    use std::time::{Duration, SystemTime};

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal
            .draw(|f| f.render_widget(app, f.area()))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn app(words: Vec<PuzzleDefinition>) -> App {
        let (tx, _rx) = mpsc::channel();
        App::new(
            Catalog::new(words),
            Box::new(KvCompletionStore::new(MemoryKvStore::new())),
            Arc::new(AcceptAll),
            tx,
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
        .with_tick_interval(Duration::from_secs(3600))
    }

    #[test]
    fn renders_placeholder_without_puzzle() {
        let mut app = app(Vec::new());
        let _ = app.open_date(None, SystemTime::now());
        let text = render(&app);
        assert!(text.contains("no puzzle today"));
    }

    #[test]
    fn renders_board_header_and_typed_letters() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut app = app(vec![PuzzleDefinition::new(today, "crane", "bird").unwrap()]);
        let now = SystemTime::now();
        app.open_date(None, now).unwrap();
        for c in "cr".chars() {
            app.handle_event_at(
                GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)),
                now,
            );
        }
        app.handle_event_at(
            GameEvent::Key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)),
            now,
        );

        let text = render(&app);
        assert!(text.contains("2026-10-19"));
        assert!(text.contains("00:00"));
        assert!(text.contains("900 pts"));
        assert!(text.contains("[C]"));
        assert!(text.contains("[R]"));
        assert!(text.contains("hint: bird"));
        assert!(!text.contains("ARCHIVE"));
        assert!(text.contains("points 0"));
    }

    #[test]
    fn keyboard_uses_verdict_colours() {
        let mut keyboard = KeyboardState::new();
        keyboard.record('A', Verdict::Present);
        let lines = keyboard_lines(&keyboard);
        let a = lines[1]
            .spans
            .iter()
            .find(|s| s.content.contains('A'))
            .unwrap();
        assert_eq!(a.style.bg, Some(Color::Yellow));
        let q = &lines[0].spans[0];
        assert_eq!(q.style.bg, None);
    }
}
