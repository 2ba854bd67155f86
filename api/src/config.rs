use crate::client::{ApiError, ApiResult};
use chrono::{NaiveDate, TimeDelta};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_URL: &str =
    "https://worldathletics.org/competitions/world-athletics-championships/tokyo25/timetable";
pub const DEFAULT_RESULTS_BASE_URL: &str =
    "https://worldathletics.org/competitions/world-athletics-championships/tokyo25/results/";
pub const DEFAULT_MARKER_ID: &str = "__NEXT_DATA__";
/// Upper bound for the live window and lead, in minutes (one week).
pub const MAX_LIVE_MINS: i64 = 7 * 24 * 60;

/// When morning and evening sessions trade places after conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSwap {
    Never,
    Always,
    /// Swap when the two zones are at least half a day apart at the event's instant.
    #[default]
    Auto,
}

/// Display names for canonical sessions. `None` keeps the source name;
/// an empty string hides the session from rendered views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionNames {
    pub morning: Option<String>,
    pub afternoon: Option<String>,
    pub evening: Option<String>,
}

/// Everything a render needs, passed explicitly to each stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimetableConfig {
    pub url: String,
    /// Read HTML/JSON from disk instead of fetching `url`.
    pub source_file: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Extra attempts after a timed-out request.
    pub retries: u32,
    /// Off unless explicitly configured.
    pub accept_invalid_certs: bool,
    pub marker_id: String,
    pub headers: [String; 4],
    pub source_timezone: String,
    pub target_timezone: String,
    /// First competition day, in the target timezone.
    pub reference_date: NaiveDate,
    pub session_swap: SessionSwap,
    pub session_names: SessionNames,
    pub results_base_url: String,
    /// How long an event without an end time counts as live.
    pub live_window_mins: i64,
    /// How long before its start an event already counts as live.
    pub live_lead_mins: i64,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            source_file: None,
            timeout_secs: 30,
            retries: 1,
            accept_invalid_certs: false,
            marker_id: DEFAULT_MARKER_ID.to_string(),
            headers: ["Time", "Sex", "Event", "Round"].map(String::from),
            source_timezone: "Asia/Tokyo".to_string(),
            target_timezone: "America/Jamaica".to_string(),
            reference_date: NaiveDate::from_ymd_opt(2025, 9, 12).unwrap_or_default(),
            session_swap: SessionSwap::Auto,
            session_names: SessionNames::default(),
            results_base_url: DEFAULT_RESULTS_BASE_URL.to_string(),
            live_window_mins: 120,
            live_lead_mins: 0,
        }
    }
}

/// Resolved source and target zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zones {
    pub source: Tz,
    pub target: Tz,
}

impl TimetableConfig {
    pub fn zones(&self) -> ApiResult<Zones> {
        Ok(Zones {
            source: parse_zone(&self.source_timezone)?,
            target: parse_zone(&self.target_timezone)?,
        })
    }

    /// Reject settings no render could succeed with.
    pub fn validate(&self) -> ApiResult<()> {
        self.zones()?;
        if self.timeout_secs == 0 {
            return Err(ApiError::InvalidConfig("timeout_secs must be positive".into()));
        }
        for (name, mins) in [
            ("live_window_mins", self.live_window_mins),
            ("live_lead_mins", self.live_lead_mins),
        ] {
            if !(0..=MAX_LIVE_MINS).contains(&mins) {
                return Err(ApiError::InvalidConfig(format!(
                    "{name} must be between 0 and {MAX_LIVE_MINS}, got {mins}"
                )));
            }
        }
        if self.marker_id.trim().is_empty() {
            return Err(ApiError::InvalidConfig("marker_id must not be empty".into()));
        }
        Ok(())
    }

    /// `None` when either span does not fit in a `TimeDelta`.
    pub fn live_window(&self) -> Option<LiveWindow> {
        Some(LiveWindow {
            lead: TimeDelta::try_minutes(self.live_lead_mins)?,
            length: TimeDelta::try_minutes(self.live_window_mins)?,
        })
    }
}

/// How long before its start an event counts as live, and how long after
/// it when the end is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveWindow {
    pub lead: TimeDelta,
    pub length: TimeDelta,
}

pub fn parse_zone(name: &str) -> ApiResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| ApiError::InvalidConfig(format!("unknown timezone {name:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_tokyo_to_jamaica() {
        let config = TimetableConfig::default();
        let zones = config.zones().unwrap();
        assert_eq!(zones.source, chrono_tz::Asia::Tokyo);
        assert_eq!(zones.target, chrono_tz::America::Jamaica);
        assert!(!config.accept_invalid_certs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_zone_is_a_config_error() {
        let config = TimetableConfig {
            target_timezone: "Mars/Olympus_Mons".into(),
            ..Default::default()
        };
        assert!(matches!(config.zones(), Err(ApiError::InvalidConfig(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = TimetableConfig { timeout_secs: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ApiError::InvalidConfig(_))));
    }

    #[test]
    fn live_minutes_are_bounded() {
        for (window, lead) in [(i64::MAX, 0), (MAX_LIVE_MINS + 1, 0), (-1, 0), (120, -5), (120, i64::MAX)] {
            let config = TimetableConfig {
                live_window_mins: window,
                live_lead_mins: lead,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ApiError::InvalidConfig(_))),
                "window {window}, lead {lead} accepted"
            );
        }
        let config = TimetableConfig { live_window_mins: MAX_LIVE_MINS, live_lead_mins: 5, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unrepresentable_live_window_is_none() {
        let config = TimetableConfig { live_window_mins: i64::MAX, ..Default::default() };
        assert_eq!(config.live_window(), None);
        let window = TimetableConfig::default().live_window().unwrap();
        assert_eq!(window.length, TimeDelta::minutes(120));
        assert_eq!(window.lead, TimeDelta::zero());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TimetableConfig = serde_json::from_str(
            r#"{"target_timezone":"Europe/London","session_swap":"never",
                "session_names":{"afternoon":""},"reference_date":"2025-09-13"}"#,
        )
        .unwrap();
        assert_eq!(config.target_timezone, "Europe/London");
        assert_eq!(config.source_timezone, "Asia/Tokyo");
        assert_eq!(config.session_swap, SessionSwap::Never);
        assert_eq!(config.session_names.afternoon.as_deref(), Some(""));
        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2025, 9, 13).unwrap());
        assert_eq!(config.headers[3], "Round");
    }
}
