use crate::app::MenuItem;
use chrono::{DateTime, Local, NaiveDate};
use wa_timetable_api::Timetable;
use wa_timetable_api::view::{DayView, TimetableView};

// ---------------------------------------------------------------------------
// Timetable state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TimetableState {
    /// Last successfully loaded timetable. Kept when a later refresh fails.
    pub timetable: Option<Timetable>,
    pub view: Option<TimetableView>,
    pub selected_day: usize,
    pub scroll_offset: u16,
    pub loaded_at: Option<DateTime<Local>>,
}

impl TimetableState {
    pub fn day_count(&self) -> usize {
        self.view.as_ref().map_or(0, |v| v.days.len())
    }

    pub fn selected_day(&self) -> Option<&DayView> {
        self.view.as_ref()?.days.get(self.selected_day)
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_day().map(|d| d.date)
    }

    pub fn next_day(&mut self) {
        if self.selected_day + 1 < self.day_count() {
            self.selected_day += 1;
            self.scroll_offset = 0;
        }
    }

    pub fn prev_day(&mut self) {
        if self.selected_day > 0 {
            self.selected_day -= 1;
            self.scroll_offset = 0;
        }
    }

    pub fn jump_to_active(&mut self) {
        if let Some(active) = self.view.as_ref().and_then(|v| v.active_day) {
            self.selected_day = active;
            self.scroll_offset = 0;
        }
    }

    /// Select the day with `date` if it still exists, otherwise the active day.
    pub fn restore_selection(&mut self, date: Option<NaiveDate>) {
        let position = date.and_then(|date| {
            self.view
                .as_ref()
                .and_then(|v| v.days.iter().position(|d| d.date == date))
        });
        match position {
            Some(idx) => self.selected_day = idx,
            None => {
                self.selected_day = 0;
                self.scroll_offset = 0;
                self.jump_to_active();
            }
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub timetable: TimetableState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
