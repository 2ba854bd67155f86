pub mod client;
pub mod config;
pub mod expand;
pub mod extract;
pub mod group;
pub mod normalize;
pub mod view;
pub mod wire;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

pub use client::{ApiError, ApiResult, TimetableApi};
pub use config::{SessionNames, SessionSwap, TimetableConfig};

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of the page's wire format
// ---------------------------------------------------------------------------

/// Which publication flag of a phase or unit to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublicationFlag {
    Startlist,
    Result,
    Summary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub startlist: bool,
    pub result: bool,
    pub summary: bool,
}

impl Publication {
    pub fn get(&self, flag: PublicationFlag) -> bool {
        match flag {
            PublicationFlag::Startlist => self.startlist,
            PublicationFlag::Result => self.result,
            PublicationFlag::Summary => self.summary,
        }
    }
}

/// A heat or group within a phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    pub name: String,
    pub unit_type: String, // "G" marks grouped qualification units
    pub start: String,
    pub publication: Publication,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discipline {
    pub name: String,
    pub slug: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sex {
    pub code: String, // "M" | "W" | "X"
    pub name: String,
    pub slug: String,
}

/// One phase as published on the timetable page, after both payload
/// variants have been mapped into the same shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    pub id: String,
    pub phase_order: String,
    pub discipline: Discipline,
    pub sex: Sex,
    pub phase_name: String,
    pub phase_slug: String,
    pub session_name: String,
    pub start: String,
    pub end: Option<String>,
    /// Flat unit label carried by the `eventTimetable` variant ("Group", "A").
    pub unit_type_name: String,
    pub unit_name: String,
    pub publication: Publication,
    pub units: Vec<Unit>,
}

/// One record per distinct (phase, start time) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedEvent {
    pub id: String,
    pub phase_order: String,
    pub discipline: Discipline,
    pub sex: Sex,
    pub phase_name: String,
    pub phase_slug: String,
    pub session_name: String,
    pub start: String,
    pub end: Option<String>,
    pub publication: Publication,
    /// Only the units belonging to this record's start time.
    pub units: Vec<Unit>,
    /// Start-time slot within a split grouped phase; `None` when the phase
    /// was not split.
    pub slot: Option<usize>,
}

impl ExpandedEvent {
    /// True when every unit carries `flag`. Without units the phase's own
    /// flag decides.
    pub fn all_units_have(&self, flag: PublicationFlag) -> bool {
        if self.units.is_empty() {
            return self.publication.get(flag);
        }
        self.units.iter().all(|u| u.publication.get(flag))
    }
}

/// An expanded event placed in the target timezone.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub event: ExpandedEvent,
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
    /// Session label after swap policy and display overrides.
    pub session: String,
}

#[derive(Debug, Clone)]
pub struct SessionBucket {
    pub name: String,
    pub events: Vec<NormalizedEvent>,
}

#[derive(Debug, Clone)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub day_number: i64,
    pub label: String, // "Day 2 - Sep 13"
    pub sessions: Vec<SessionBucket>,
}

impl DayBucket {
    pub fn events(&self) -> impl Iterator<Item = &NormalizedEvent> {
        self.sessions.iter().flat_map(|s| s.events.iter())
    }
}

/// A record dropped from the batch. The rest of the timetable is still built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub id: String,
    pub reason: String,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {} skipped: {}", self.id, self.reason)
    }
}

/// The grouped timetable for one render.
#[derive(Debug, Clone)]
pub struct Timetable {
    pub zone: Tz,
    pub days: Vec<DayBucket>,
    pub skipped: Vec<RecordError>,
}

impl Timetable {
    pub fn event_count(&self) -> usize {
        self.days.iter().map(|d| d.events().count()).sum()
    }
}

/// Run the whole pipeline over an HTML page or raw JSON document.
pub fn build_timetable(text: &str, config: &TimetableConfig) -> ApiResult<Timetable> {
    let zones = config.zones()?;
    let extracted = extract::extract(text, &config.marker_id)?;
    let mut skipped = extracted.skipped;

    let raw = extracted.payload.into_raw_events();
    let expanded = expand::expand_events(raw);

    let normalizer = normalize::Normalizer::new(zones, config.session_swap, &config.session_names);
    let (normalized, failures) = normalizer.normalize_all(expanded);
    skipped.extend(failures);

    let days = group::group_events(normalized, config.reference_date);
    log::debug!(
        "built timetable: {} days, {} skipped records",
        days.len(),
        skipped.len()
    );

    Ok(Timetable { zone: zones.target, days, skipped })
}

/// Lowercase, ASCII-alphanumeric slug with single dashes ("Day 1 - Sep 13" -> "day-1-sep-13").
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else if ch != '\'' {
            pending_dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(result: bool) -> Unit {
        Unit {
            publication: Publication { result, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn all_units_have_is_false_when_any_unit_lacks_flag() {
        let event = ExpandedEvent { units: vec![unit(true), unit(false)], ..Default::default() };
        assert!(!event.all_units_have(PublicationFlag::Result));
    }

    #[test]
    fn all_units_have_is_true_when_every_unit_has_flag() {
        let event = ExpandedEvent { units: vec![unit(true), unit(true)], ..Default::default() };
        assert!(event.all_units_have(PublicationFlag::Result));
    }

    #[test]
    fn all_units_have_falls_back_to_own_flag() {
        let mut event = ExpandedEvent::default();
        event.publication.result = true;
        assert!(event.all_units_have(PublicationFlag::Result));
        assert!(!event.all_units_have(PublicationFlag::Summary));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Day 1 - Sep 13"), "day-1-sep-13");
        assert_eq!(slugify("  Men's 100 Metres "), "mens-100-metres");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn build_timetable_runs_whole_pipeline() {
        let json = r#"{"props":{"pageProps":{"phases":[
            {"id":1,"phaseName":"Final","phaseSessionName":"Evening Session",
             "phaseDateAndTime":"2025-09-13T19:30:00+09:00","disciplineName":"100 Metres",
             "sexName":"Men","isResultPublished":true},
            {"id":2,"phaseName":"Heats","phaseSessionName":"Morning Session",
             "phaseDateAndTime":"not a time","disciplineName":"400 Metres","sexName":"Women"}
        ]}}}"#;
        let config = TimetableConfig::default();
        let timetable = build_timetable(json, &config).unwrap();
        assert_eq!(timetable.event_count(), 1);
        assert_eq!(timetable.skipped.len(), 1);
        assert_eq!(timetable.skipped[0].id, "2");
        assert_eq!(timetable.days[0].label, "Day 2 - Sep 13");
    }
}
