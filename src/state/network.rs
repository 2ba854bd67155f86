use log::{debug, error, warn};
use wa_timetable_api::{ApiResult, Timetable, TimetableApi, TimetableConfig};

pub const LOADING_CHAR: char = '⟳';
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

impl LoadingState {
    pub fn started() -> Self {
        Self { is_loading: true, spinner_char: LOADING_CHAR }
    }

    pub fn finished(is_ok: bool) -> Self {
        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        Self { is_loading: false, spinner_char }
    }
}

/// Runs the whole pipeline on demand. Each load starts from scratch.
pub struct Loader {
    client: TimetableApi,
    config: TimetableConfig,
}

impl Loader {
    pub fn new(config: TimetableConfig) -> ApiResult<Self> {
        Ok(Self { client: TimetableApi::new(&config)?, config })
    }

    pub fn load(&self) -> ApiResult<Timetable> {
        debug!("loading timetable");
        let result = self.client.fetch_timetable(&self.config);
        match &result {
            Ok(timetable) => {
                debug!("loaded {} events over {} days", timetable.event_count(), timetable.days.len());
                if !timetable.skipped.is_empty() {
                    warn!("{} records skipped", timetable.skipped.len());
                }
            }
            Err(e) => error!("timetable load failed: {e}"),
        }
        result
    }
}
