use chrono::Datelike;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    app::App,
    resolver::{CalendarMonth, DayStatus},
};

const WEEKDAYS: &str = "Mo  Tu  We  Th  Fr  Sa  Su ";

pub fn day_style(status: DayStatus) -> Style {
    match status {
        DayStatus::Completed => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        DayStatus::Available => Style::default().add_modifier(Modifier::BOLD),
        DayStatus::Future | DayStatus::UnavailableBeforeStart => {
            Style::default().add_modifier(Modifier::DIM)
        }
    }
}

fn month_lines(month: &CalendarMonth, app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        WEEKDAYS,
        Style::default().fg(Color::Cyan),
    ))];

    for week in &month.weeks {
        let spans = week
            .iter()
            .flat_map(|cell| {
                let day = match cell {
                    Some(day) => {
                        let mut style = day_style(day.status);
                        if day.date == app.calendar_cursor() {
                            style = style.add_modifier(Modifier::REVERSED);
                        }
                        if day.date == app.today() {
                            style = style.add_modifier(Modifier::UNDERLINED);
                        }
                        Span::styled(format!("{:>2}", day.date.day()), style)
                    }
                    None => Span::raw("  "),
                };
                [day, Span::raw("  ")]
            })
            .collect::<Vec<_>>();
        lines.push(Line::from(spans));
    }
    lines
}

pub fn render_calendar(app: &App, f: &mut Frame) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let Some(month) = app.calendar() else {
        return;
    };

    let title = Paragraph::new(month.title())
        .block(Block::default().borders(Borders::ALL).title("Archive"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    f.render_widget(
        Paragraph::new(month_lines(&month, app)).alignment(Alignment::Center),
        chunks[1],
    );

    let legend = Line::from(vec![
        Span::styled("completed", day_style(DayStatus::Completed)),
        Span::raw("   "),
        Span::styled("available", day_style(DayStatus::Available)),
        Span::raw("   "),
        Span::styled("unavailable", day_style(DayStatus::Future)),
    ]);
    f.render_widget(Paragraph::new(legend).alignment(Alignment::Center), chunks[2]);

    if let Some(notice) = app.notice() {
        f.render_widget(
            Paragraph::new(Span::styled(
                notice.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            chunks[3],
        );
    }

    f.render_widget(
        Paragraph::new(Span::styled(
            "arrows move · pgup/pgdn month · enter play · t today · b back",
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))
        .alignment(Alignment::Center),
        chunks[4],
    );
}
