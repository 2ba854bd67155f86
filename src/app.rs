use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use chrono::{DateTime, Local, Utc};
use wa_timetable_api::Timetable;
use wa_timetable_api::view::build_view;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Timetable,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self { state: AppState::new(), settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Load results — called from the main loop
    // -----------------------------------------------------------------------

    pub fn on_timetable_loaded(&mut self, timetable: Timetable, now: DateTime<Utc>) {
        let had_view = self.state.timetable.view.is_some();
        let selected = self.state.timetable.selected_date();

        self.state.last_error = None;
        self.state.timetable.timetable = Some(timetable);
        self.state.timetable.loaded_at = Some(Local::now());
        self.refresh_view(now);

        if had_view {
            self.state.timetable.restore_selection(selected);
        } else {
            self.state.timetable.restore_selection(None);
        }
    }

    /// A failed load keeps whatever was shown before.
    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    /// Rebuild the view so live badges follow the clock.
    pub fn refresh_view(&mut self, now: DateTime<Utc>) {
        let Some(timetable) = self.state.timetable.timetable.as_ref() else {
            return;
        };
        let view = build_view(timetable, &self.settings.timetable, now);
        let day_count = view.days.len();
        self.state.timetable.view = Some(view);
        if self.state.timetable.selected_day >= day_count {
            self.state.timetable.selected_day = day_count.saturating_sub(1);
        }
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Day navigation — delegated to TimetableState
    // -----------------------------------------------------------------------

    pub fn next_day(&mut self) {
        self.state.timetable.next_day();
    }

    pub fn prev_day(&mut self) {
        self.state.timetable.prev_day();
    }

    pub fn jump_to_today(&mut self) {
        self.state.timetable.jump_to_active();
    }

    pub fn scroll_down(&mut self) {
        self.state.timetable.scroll_down();
    }

    pub fn scroll_up(&mut self) {
        self.state.timetable.scroll_up();
    }
}
