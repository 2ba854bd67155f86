use crate::config::{SessionNames, SessionSwap, Zones};
use crate::{ExpandedEvent, NormalizedEvent, RecordError};
use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Session label used when the page gives none.
pub const NO_SESSION: &str = "No Session";

/// Offset-less layouts, read as wall-clock time in the source zone.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts RFC 3339 parsing rejects ("+0900").
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const HALF_DAY_SECS: i32 = 12 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Morning,
    Afternoon,
    Evening,
}

impl SessionKind {
    pub fn classify(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("morning") {
            Some(SessionKind::Morning)
        } else if lower.contains("afternoon") {
            Some(SessionKind::Afternoon)
        } else if lower.contains("evening") {
            Some(SessionKind::Evening)
        } else {
            None
        }
    }

    pub fn swapped(self) -> Self {
        match self {
            SessionKind::Morning => SessionKind::Evening,
            SessionKind::Evening => SessionKind::Morning,
            SessionKind::Afternoon => SessionKind::Afternoon,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Morning => "Morning Session",
            SessionKind::Afternoon => "Afternoon Session",
            SessionKind::Evening => "Evening Session",
        }
    }

    fn display_override(self, names: &SessionNames) -> Option<&str> {
        match self {
            SessionKind::Morning => names.morning.as_deref(),
            SessionKind::Afternoon => names.afternoon.as_deref(),
            SessionKind::Evening => names.evening.as_deref(),
        }
    }
}

/// Parse a page timestamp into an instant. Explicit offsets win; otherwise
/// the wall-clock time is placed in `zone` using the tz database.
pub fn parse_timestamp(raw: &str, zone: Tz) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("missing timestamp".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return match zone.from_local_datetime(&naive) {
                LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
                // Repeated hour at a DST fall-back: take the first occurrence.
                LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
                LocalResult::None => Err(format!("{raw} does not exist in {zone}")),
            };
        }
    }

    Err(format!("unrecognised timestamp {raw:?}"))
}

fn utc_offset_secs(zone: Tz, instant: DateTime<Utc>) -> i32 {
    zone.offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc()
}

/// Places expanded events in the target zone.
pub struct Normalizer<'a> {
    zones: Zones,
    swap: SessionSwap,
    names: &'a SessionNames,
}

impl<'a> Normalizer<'a> {
    pub fn new(zones: Zones, swap: SessionSwap, names: &'a SessionNames) -> Self {
        Self { zones, swap, names }
    }

    /// Normalize every event. Records whose start cannot be read are
    /// returned separately; the batch carries on.
    pub fn normalize_all(
        &self,
        events: Vec<ExpandedEvent>,
    ) -> (Vec<NormalizedEvent>, Vec<RecordError>) {
        let mut normalized = Vec::with_capacity(events.len());
        let mut skipped = Vec::new();
        for event in events {
            match self.normalize(event) {
                Ok(n) => normalized.push(n),
                Err(err) => {
                    log::warn!("{err}");
                    skipped.push(err);
                }
            }
        }
        (normalized, skipped)
    }

    pub fn normalize(&self, event: ExpandedEvent) -> Result<NormalizedEvent, RecordError> {
        let start_utc = parse_timestamp(&event.start, self.zones.source).map_err(|reason| {
            RecordError { id: event.id.clone(), reason }
        })?;

        let end_utc = event.end.as_deref().and_then(|raw| {
            match parse_timestamp(raw, self.zones.source) {
                Ok(end) if end >= start_utc => Some(end),
                Ok(_) => {
                    log::debug!("event {}: end {raw} precedes start, dropped", event.id);
                    None
                }
                Err(reason) => {
                    log::warn!("event {}: end time ignored: {reason}", event.id);
                    None
                }
            }
        });

        let session = self.session_label(&event.session_name, start_utc);
        Ok(NormalizedEvent {
            start: start_utc.with_timezone(&self.zones.target),
            end: end_utc.map(|e| e.with_timezone(&self.zones.target)),
            session,
            event,
        })
    }

    /// Whether morning and evening trade places for an event at `instant`.
    pub fn swaps_sessions(&self, instant: DateTime<Utc>) -> bool {
        match self.swap {
            SessionSwap::Never => false,
            SessionSwap::Always => true,
            SessionSwap::Auto => {
                let gap = utc_offset_secs(self.zones.target, instant)
                    - utc_offset_secs(self.zones.source, instant);
                gap.abs() >= HALF_DAY_SECS
            }
        }
    }

    pub fn session_label(&self, raw: &str, instant: DateTime<Utc>) -> String {
        let raw = raw.trim();
        let Some(kind) = SessionKind::classify(raw) else {
            return if raw.is_empty() { NO_SESSION.to_string() } else { raw.to_string() };
        };

        let shown = if self.swaps_sessions(instant) { kind.swapped() } else { kind };
        if let Some(name) = shown.display_override(self.names) {
            return name.to_string();
        }
        if shown == kind { raw.to_string() } else { shown.label().to_string() }
    }
}
