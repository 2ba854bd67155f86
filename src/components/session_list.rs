use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Paragraph, Widget};
use wa_timetable_api::view::{DayView, EventView, SessionView};

// ---------------------------------------------------------------------------
// Column widths
// ---------------------------------------------------------------------------

const TIME_W: usize = 9;
const SEX_W: usize = 9;
const EVENT_W: usize = 24;

/// One day's sessions as an accordion: open sessions list their events,
/// ended sessions collapse to a single header line.
pub struct SessionList<'a> {
    pub day: &'a DayView,
    pub headers: &'a [String; 4],
    pub scroll: u16,
}

impl Widget for SessionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = session_lines(self.day, self.headers);
        Paragraph::new(lines).scroll((self.scroll, 0)).render(area, buf);
    }
}

pub fn session_lines(day: &DayView, headers: &[String; 4]) -> Vec<Line<'static>> {
    if day.sessions.is_empty() {
        return vec![Line::styled(
            "No sessions on this day",
            Style::default().fg(Color::DarkGray),
        )];
    }

    let mut lines = Vec::new();
    for (idx, session) in day.sessions.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        lines.push(session_header(session));
        if session.ended {
            continue;
        }
        lines.push(column_headers(headers));
        lines.extend(session.events.iter().map(event_line));
    }
    lines
}

fn session_header(session: &SessionView) -> Line<'static> {
    let marker = if session.ended { "▸ " } else { "▾ " };
    let mut spans = vec![Span::styled(
        format!("{marker}{}", session.name.to_uppercase()),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if session.ended {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            " ENDED ",
            Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    let count = session.events.len();
    let noun = if count == 1 { "event section" } else { "event sections" };
    spans.push(Span::styled(
        format!("  {count} {noun}"),
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

fn column_headers(headers: &[String; 4]) -> Line<'static> {
    Line::styled(
        format!(
            "  {:<TIME_W$}{:<SEX_W$}{:<EVENT_W$}{}",
            headers[0], headers[1], headers[2], headers[3]
        ),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::UNDERLINED),
    )
}

fn event_line(event: &EventView) -> Line<'static> {
    let mut spans = vec![
        Span::raw(format!("  {:<TIME_W$}", event.time_text)),
        Span::raw(format!("{:<SEX_W$}", event.sex_label)),
        Span::styled(
            format!("{:<EVENT_W$}", truncate(&event.discipline, EVENT_W - 1)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];

    let phase_style = match category_color(event.color) {
        Some(bg) => Style::default().fg(Color::Black).bg(bg),
        None => Style::default(),
    };
    spans.push(Span::styled(format!(" {} ", event.phase_name), phase_style));

    if event.is_live {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "● LIVE",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    for link in event.primary_link.iter().chain(event.summary_link.iter()) {
        spans.push(Span::styled(
            format!("  {} ›", link.kind.label()),
            Style::default().fg(Color::Cyan),
        ));
    }
    Line::from(spans)
}

/// `#rrggbb` to a terminal colour; anything else (e.g. `transparent`) is no colour.
pub fn category_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
