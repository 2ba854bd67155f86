use crate::app::{App, MenuItem};
use crate::state::messages::Action;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn handle_key_bindings(key_event: KeyEvent, app: &mut App) -> Action {
    match (app.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => return Action::Quit,

        (_, Char('?'), _) => app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => app.exit_help(),

        // Day navigation
        (MenuItem::Timetable, Char('l') | KeyCode::Right, _) => app.next_day(),
        (MenuItem::Timetable, Char('h') | KeyCode::Left, _) => app.prev_day(),
        (MenuItem::Timetable, Char('j') | KeyCode::Down, _) => app.scroll_down(),
        (MenuItem::Timetable, Char('k') | KeyCode::Up, _) => app.scroll_up(),
        (MenuItem::Timetable, Char('t'), _) => app.jump_to_today(),

        // Global
        (_, Char('r'), _) => return Action::Refresh,
        (_, Char('f'), _) => app.toggle_full_screen(),
        (_, Char('"'), _) => app.toggle_show_logs(),

        _ => {}
    }
    Action::None
}
