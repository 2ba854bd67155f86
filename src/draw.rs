use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::session_list::{SessionList, session_lines};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;

const HELP_TEXT: &str = "\
←/→ or h/l   previous / next day
↑/↓ or j/k   scroll
t            jump to today
r            refresh now
f            toggle full screen
\"            toggle logs
?            this help (Esc to close)
q            quit";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState) -> std::io::Result<()>
where
    B: Backend,
    std::io::Error: From<B::Error>,
{
    let current_size = terminal.size()?;
    if current_size.width <= 10 || current_size.height <= 10 {
        return Ok(());
    }

    let mut layout = LayoutAreas::new(current_size);

    terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Timetable => draw_timetable(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    })?;
    Ok(())
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let days = app.state.timetable.view.as_ref().map(|v| v.days.as_slice()).unwrap_or_default();
    let titles: Vec<Line> = days
        .iter()
        .map(|d| {
            let day_style = if d.is_today {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(vec![
                Span::styled(d.day_text.clone(), day_style),
                Span::raw(format!(" {}", d.date_text)),
            ])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type)
                .title(" World Athletics Timetable "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .select(app.state.timetable.selected_day)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_timetable(f: &mut Frame, area: Rect, app: &mut App) {
    let title = match app.state.timetable.selected_day() {
        Some(day) => format!(" {} ", day.label),
        None => " Timetable ".to_string(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(view) = app.state.timetable.view.as_ref() else {
        let msg = match app.state.last_error.as_deref() {
            Some(err) => format!("Timetable load failed:\n{err}\n\nPress r to retry."),
            None => "Loading timetable...".to_string(),
        };
        f.render_widget(
            Paragraph::new(msg)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: false }),
            inner,
        );
        return;
    };

    let [status, content, error] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(if app.state.last_error.is_some() { 2 } else { 0 }),
    ])
    .areas(inner);

    let zone = app
        .state
        .timetable
        .timetable
        .as_ref()
        .map(|t| t.zone.name())
        .unwrap_or_default();
    let mut status_text = format!("Times in {zone}");
    if let Some(loaded) = app.state.timetable.loaded_at {
        status_text.push_str(&format!(" | updated {}", loaded.format("%H:%M")));
    }
    if view.skipped > 0 {
        status_text.push_str(&format!(" | {} records skipped", view.skipped));
    }
    f.render_widget(
        Paragraph::new(status_text).style(Style::default().fg(Color::DarkGray)),
        status,
    );

    match app.state.timetable.selected_day() {
        Some(day) => {
            let rows = line_count(session_lines(day, &view.headers).len());
            let max_scroll = rows.saturating_sub(content.height);
            let scroll = app.state.timetable.scroll_offset.min(max_scroll);
            f.render_widget(SessionList { day, headers: &view.headers, scroll }, content);
            app.state.timetable.scroll_offset = scroll;
        }
        None => f.render_widget(
            Paragraph::new("No events published yet.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            content,
        ),
    }

    if let Some(err) = app.state.last_error.as_deref() {
        f.render_widget(
            Paragraph::new(format!("Refresh failed, showing last timetable: {err}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true }),
            error,
        );
    }
}

/// Rows for scroll clamping; saturates instead of wrapping past `u16::MAX`.
fn line_count(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Gray)), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Gray));
    f.render_widget(logs, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_count_saturates() {
        assert_eq!(line_count(42), 42);
        assert_eq!(line_count(usize::from(u16::MAX)), u16::MAX);
        assert_eq!(line_count(70_000), u16::MAX);
    }
}
