//! Display-ready view of a grouped timetable.
//!
//! Everything here is a pure function of the grouped data plus a fixed `now`,
//! so renderers (terminal, HTML, JSON) only lay out what they're given.

use crate::config::LiveWindow;
use crate::{
    DayBucket, ExpandedEvent, NormalizedEvent, PublicationFlag, Sex, Timetable, TimetableConfig,
    slugify,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseCategory {
    Final,
    Qualification,
    Heats,
    Other,
}

impl PhaseCategory {
    /// First match wins: finals, then qualifying/combined-event rounds, then heats.
    pub fn classify(phase_name: &str) -> Self {
        if phase_name.contains("Final") {
            PhaseCategory::Final
        } else if ["Qualification", "Preliminary", "Decathlon", "Heptathlon"]
            .iter()
            .any(|k| phase_name.contains(k))
        {
            PhaseCategory::Qualification
        } else if phase_name.contains("Heats") {
            PhaseCategory::Heats
        } else {
            PhaseCategory::Other
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PhaseCategory::Final => "#fbd1bb",
            PhaseCategory::Qualification => "#dfd0fa",
            PhaseCategory::Heats => "#c2e9ed",
            PhaseCategory::Other => "transparent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Results,
    Startlist,
    Summary,
}

impl LinkKind {
    pub fn label(&self) -> &'static str {
        match self {
            LinkKind::Results => "Results",
            LinkKind::Startlist => "Startlist",
            LinkKind::Summary => "Summary",
        }
    }

    fn path(&self) -> &'static str {
        match self {
            LinkKind::Results => "results",
            LinkKind::Startlist => "startlist",
            LinkKind::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub kind: LinkKind,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub element_id: String,
    pub sex_label: String,
    pub discipline: String,
    pub phase_name: String,
    pub category: PhaseCategory,
    pub color: &'static str,
    pub start: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
    pub time_text: String,
    pub is_live: bool,
    pub results_published: bool,
    /// Results when published, otherwise the startlist when published.
    pub primary_link: Option<Link>,
    pub summary_link: Option<Link>,
}

impl EventView {
    /// "Men's 100 Metres"
    pub fn title(&self) -> String {
        format!("{} {}", self.sex_label, self.discipline)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub name: String,
    /// Every event in the session has its results out.
    pub ended: bool,
    pub events: Vec<EventView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub tab_id: String,
    pub label: String,
    pub day_number: i64,
    pub date: NaiveDate,
    /// "Day 3", or "TODAY" for the current date.
    pub day_text: String,
    /// "Sep 14"
    pub date_text: String,
    pub is_today: bool,
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimetableView {
    pub headers: [String; 4],
    pub days: Vec<DayView>,
    pub active_day: Option<usize>,
    pub skipped: usize,
}

/// Live from `lead` before start until the end, or for `length` after start
/// when the end is unknown, and only while results are still outstanding.
/// Bounds that overflow the calendar never match.
pub fn is_live(event: &NormalizedEvent, now: DateTime<Utc>, window: LiveWindow) -> bool {
    if event.event.all_units_have(PublicationFlag::Result) {
        return false;
    }
    let start = event.start.with_timezone(&Utc);
    let Some(opens) = start.checked_sub_signed(window.lead) else {
        return false;
    };
    match event.end {
        Some(end) => opens <= now && now <= end.with_timezone(&Utc),
        None => start
            .checked_add_signed(window.length)
            .is_some_and(|closes| opens <= now && now < closes),
    }
}

/// Index of the day dated `today`, else the first day.
pub fn active_day(days: &[DayBucket], today: NaiveDate) -> Option<usize> {
    if days.is_empty() {
        return None;
    }
    Some(days.iter().position(|d| d.date == today).unwrap_or(0))
}

/// "Men's", "Women's", "Mixed", or "N/A" when the page gives nothing usable.
pub fn sex_label(sex: &Sex) -> String {
    let named = if !sex.slug.is_empty() {
        capitalize(&sex.slug)
    } else {
        sex.name.clone()
    };
    if !named.is_empty() {
        return match named.as_str() {
            "Men" | "Women" => format!("{named}'s"),
            _ => named,
        };
    }
    match sex.code.as_str() {
        "M" => "Men's".to_string(),
        "W" => "Women's".to_string(),
        "X" => "Mixed".to_string(),
        _ => "N/A".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sex_slug(sex: &Sex) -> String {
    if !sex.slug.is_empty() {
        return sex.slug.clone();
    }
    if !sex.name.is_empty() {
        return slugify(&sex.name);
    }
    match sex.code.as_str() {
        "M" => "men".into(),
        "W" => "women".into(),
        "X" => "mixed".into(),
        _ => String::new(),
    }
}

/// Results-site URL for one of an event's pages. Combined events nest the
/// discipline under the phase instead of the other way round.
pub fn event_url(base_url: &str, event: &ExpandedEvent, kind: LinkKind) -> String {
    let sex = sex_slug(&event.sex);
    let discipline = if event.discipline.slug.is_empty() {
        slugify(&event.discipline.name)
    } else {
        event.discipline.slug.clone()
    };
    let phase = if event.phase_slug.is_empty() {
        slugify(&event.phase_name)
    } else {
        event.phase_slug.clone()
    };

    let is_multi_event =
        event.phase_name.contains("Decathlon") || event.phase_name.contains("Heptathlon");
    let path = if is_multi_event {
        format!("{sex}/{phase}/{discipline}")
    } else {
        format!("{sex}/{discipline}/{phase}")
    };
    let base = base_url.trim_end_matches('/');
    format!("{base}/{path}/{}", kind.path())
}

fn event_links(base_url: &str, event: &ExpandedEvent) -> (Option<Link>, Option<Link>) {
    let link = |kind| Link { kind, url: event_url(base_url, event, kind) };
    let primary = if event.all_units_have(PublicationFlag::Result) {
        Some(link(LinkKind::Results))
    } else if event.all_units_have(PublicationFlag::Startlist) {
        Some(link(LinkKind::Startlist))
    } else {
        None
    };
    let summary = event
        .all_units_have(PublicationFlag::Summary)
        .then(|| link(LinkKind::Summary));
    (primary, summary)
}

fn element_id(event: &ExpandedEvent, idx: usize) -> String {
    let order = if event.phase_order.is_empty() {
        idx.to_string()
    } else {
        event.phase_order.clone()
    };
    let id = format!("event-{}-{}", slugify(&event.id), slugify(&order));
    match event.slot {
        // Groups split from one phase share its id and order.
        Some(slot) => format!("{id}-{}", slot + 1),
        None => id,
    }
}

fn build_event(
    event: &NormalizedEvent,
    idx: usize,
    config: &TimetableConfig,
    now: DateTime<Utc>,
) -> EventView {
    let window = config.live_window();
    let (primary_link, summary_link) = event_links(&config.results_base_url, &event.event);
    let phase_name = if event.event.phase_name.is_empty() {
        "N/A".to_string()
    } else {
        event.event.phase_name.clone()
    };
    let category = PhaseCategory::classify(&phase_name);

    EventView {
        element_id: element_id(&event.event, idx),
        sex_label: sex_label(&event.event.sex),
        discipline: if event.event.discipline.name.is_empty() {
            "N/A".to_string()
        } else {
            event.event.discipline.name.clone()
        },
        category,
        color: category.color(),
        phase_name,
        start: event.start.fixed_offset(),
        end: event.end.map(|e| e.fixed_offset()),
        time_text: event.start.format("%-I:%M %p").to_string(),
        is_live: window.is_some_and(|w| is_live(event, now, w)),
        results_published: event.event.all_units_have(PublicationFlag::Result),
        primary_link,
        summary_link,
    }
}

/// Derive the display model. Sessions whose display name is empty are hidden.
pub fn build_view(timetable: &Timetable, config: &TimetableConfig, now: DateTime<Utc>) -> TimetableView {
    let today = now.with_timezone(&timetable.zone).date_naive();
    let mut idx = 0;

    let days = timetable
        .days
        .iter()
        .map(|day| {
            let is_today = day.date == today;
            let mut seen: Vec<&str> = Vec::new();
            let sessions = day
                .sessions
                .iter()
                .filter(|s| !s.name.trim().is_empty())
                .map(|session| {
                    // A label can return later in the day; keep ids unique.
                    let repeat = seen.iter().filter(|n| **n == session.name).count();
                    seen.push(&session.name);
                    let key = match repeat {
                        0 => format!("{}-{}", day.label, session.name),
                        n => format!("{}-{}-{}", day.label, session.name, n + 1),
                    };
                    let events: Vec<EventView> = session
                        .events
                        .iter()
                        .map(|e| {
                            idx += 1;
                            build_event(e, idx, config, now)
                        })
                        .collect();
                    SessionView {
                        id: slugify(&key),
                        name: session.name.clone(),
                        ended: events.iter().all(|e| e.results_published),
                        events,
                    }
                })
                .collect();

            DayView {
                tab_id: slugify(&day.label),
                label: day.label.clone(),
                day_number: day.day_number,
                date: day.date,
                day_text: if is_today {
                    "TODAY".to_string()
                } else {
                    format!("Day {}", day.day_number)
                },
                date_text: day.date.format("%b %d").to_string(),
                is_today,
                sessions,
            }
        })
        .collect();

    TimetableView {
        headers: config.headers.clone(),
        days,
        active_day: active_day(&timetable.days, today),
        skipped: timetable.skipped.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Discipline, Publication, SessionBucket, Unit, build_timetable};
    use chrono::{TimeDelta, TimeZone};
    use chrono_tz::America::Jamaica;

    fn now(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Jamaica
            .with_ymd_and_hms(2025, 9, d, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn normalized(phase: &str, h: u32, end_h: Option<u32>) -> NormalizedEvent {
        NormalizedEvent {
            event: ExpandedEvent {
                id: "42".into(),
                phase_order: "1".into(),
                phase_name: phase.into(),
                discipline: Discipline {
                    name: "100 Metres".into(),
                    slug: "100-metres".into(),
                    code: "100".into(),
                },
                sex: Sex { code: "M".into(), name: "Men".into(), slug: "men".into() },
                ..Default::default()
            },
            start: Jamaica.with_ymd_and_hms(2025, 9, 13, h, 0, 0).unwrap(),
            end: end_h.map(|e| Jamaica.with_ymd_and_hms(2025, 9, 13, e, 0, 0).unwrap()),
            session: "Morning Session".into(),
        }
    }

    fn window(lead_mins: i64, length_mins: i64) -> LiveWindow {
        LiveWindow {
            lead: TimeDelta::minutes(lead_mins),
            length: TimeDelta::minutes(length_mins),
        }
    }

    #[test]
    fn live_within_start_and_end() {
        let e = normalized("Final", 7, Some(9));
        let window = window(0, 120);
        assert!(!is_live(&e, now(13, 6, 59), window));
        assert!(is_live(&e, now(13, 7, 0), window));
        assert!(is_live(&e, now(13, 9, 0), window));
        assert!(!is_live(&e, now(13, 9, 1), window));
    }

    #[test]
    fn live_window_applies_without_end() {
        let e = normalized("Final", 7, None);
        let window = window(0, 30);
        assert!(is_live(&e, now(13, 7, 29), window));
        assert!(!is_live(&e, now(13, 7, 30), window));
    }

    #[test]
    fn lead_opens_live_status_before_start() {
        let e = normalized("Final", 7, None);
        assert!(!is_live(&e, now(13, 6, 55), window(0, 30)));
        assert!(is_live(&e, now(13, 6, 55), window(5, 30)));
        assert!(!is_live(&e, now(13, 6, 54), window(5, 30)));
        // The window still runs from the start, not from the lead.
        assert!(!is_live(&e, now(13, 7, 30), window(5, 30)));

        let ended = normalized("Final", 7, Some(9));
        assert!(is_live(&ended, now(13, 6, 55), window(5, 30)));
    }

    #[test]
    fn overflowing_window_is_never_live() {
        let e = normalized("Final", 7, None);
        let huge = LiveWindow { lead: TimeDelta::zero(), length: TimeDelta::max_value() };
        assert!(!is_live(&e, now(13, 7, 10), huge));
    }

    #[test]
    fn unrepresentable_window_renders_without_panicking() {
        let config = TimetableConfig { live_window_mins: i64::MAX, ..Default::default() };
        let at = now(13, 20, 10);
        let view = build_view(&timetable(), &config, at);
        assert!(!view.days[1].sessions[0].events[0].is_live);

        let view = build_view(&timetable(), &TimetableConfig::default(), at);
        assert!(view.days[1].sessions[0].events[0].is_live);
    }

    #[test]
    fn published_results_end_live_status() {
        let mut e = normalized("Final", 7, None);
        e.event.units = vec![
            Unit { publication: Publication { result: true, ..Default::default() }, ..Default::default() },
            Unit { publication: Publication { result: false, ..Default::default() }, ..Default::default() },
        ];
        assert!(is_live(&e, now(13, 7, 10), window(0, 60)));
        e.event.units[1].publication.result = true;
        assert!(!is_live(&e, now(13, 7, 10), window(0, 60)));
    }

    #[test]
    fn phase_category_priority() {
        assert_eq!(PhaseCategory::classify("Final"), PhaseCategory::Final);
        assert_eq!(PhaseCategory::classify("Semi-Final"), PhaseCategory::Final);
        assert_eq!(PhaseCategory::classify("Qualification - Group A"), PhaseCategory::Qualification);
        assert_eq!(PhaseCategory::classify("Decathlon 100m"), PhaseCategory::Qualification);
        assert_eq!(PhaseCategory::classify("Preliminary Round"), PhaseCategory::Qualification);
        assert_eq!(PhaseCategory::classify("Heats"), PhaseCategory::Heats);
        assert_eq!(PhaseCategory::classify("Medal Ceremony"), PhaseCategory::Other);
        assert_eq!(PhaseCategory::Other.color(), "transparent");
    }

    #[test]
    fn sex_labels() {
        let sex = |code: &str, name: &str, slug: &str| Sex {
            code: code.into(),
            name: name.into(),
            slug: slug.into(),
        };
        assert_eq!(sex_label(&sex("", "", "women")), "Women's");
        assert_eq!(sex_label(&sex("", "Men", "")), "Men's");
        assert_eq!(sex_label(&sex("X", "", "")), "Mixed");
        assert_eq!(sex_label(&sex("", "", "mixed")), "Mixed");
        assert_eq!(sex_label(&sex("Q", "", "")), "N/A");
    }

    #[test]
    fn urls_swap_segments_for_combined_events() {
        let base = "https://example.org/results/";
        let mut e = normalized("Final", 7, None).event;
        e.phase_slug = "final".into();
        assert_eq!(
            event_url(base, &e, LinkKind::Results),
            "https://example.org/results/men/100-metres/final/results"
        );
        e.phase_name = "Decathlon 100m".into();
        e.phase_slug = "decathlon".into();
        assert_eq!(
            event_url(base, &e, LinkKind::Startlist),
            "https://example.org/results/men/decathlon/100-metres/startlist"
        );
    }

    #[test]
    fn results_link_replaces_startlist_and_summary_is_independent() {
        let mut e = normalized("Final", 7, None).event;
        e.publication = Publication { startlist: true, result: false, summary: true };
        let (primary, summary) = event_links("https://x/", &e);
        assert_eq!(primary.map(|l| l.kind), Some(LinkKind::Startlist));
        assert_eq!(summary.map(|l| l.kind), Some(LinkKind::Summary));

        e.publication.result = true;
        let (primary, _) = event_links("https://x/", &e);
        assert_eq!(primary.map(|l| l.kind), Some(LinkKind::Results));

        e.publication = Publication::default();
        assert_eq!(event_links("https://x/", &e), (None, None));
    }

    fn timetable() -> Timetable {
        let mut done = normalized("Heats", 7, None);
        done.event.publication.result = true;
        let day = |d: u32, events: Vec<NormalizedEvent>, session: &str| DayBucket {
            date: NaiveDate::from_ymd_opt(2025, 9, d).unwrap(),
            day_number: i64::from(d) - 11,
            label: crate::group::day_label(i64::from(d) - 11, NaiveDate::from_ymd_opt(2025, 9, d).unwrap()),
            sessions: vec![SessionBucket { name: session.into(), events }],
        };
        Timetable {
            zone: Jamaica,
            days: vec![
                day(13, vec![done.clone()], "Morning Session"),
                day(14, vec![normalized("Final", 20, None)], "Evening Session"),
                day(15, vec![done], ""),
            ],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn active_day_is_today_or_first() {
        let t = timetable();
        assert_eq!(active_day(&t.days, NaiveDate::from_ymd_opt(2025, 9, 14).unwrap()), Some(1));
        assert_eq!(active_day(&t.days, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()), Some(0));
        assert_eq!(active_day(&[], NaiveDate::from_ymd_opt(2025, 9, 14).unwrap()), None);
    }

    #[test]
    fn build_view_marks_today_and_ended_sessions() {
        let config = TimetableConfig::default();
        let view = build_view(&timetable(), &config, now(14, 12, 0));

        assert_eq!(view.active_day, Some(1));
        assert_eq!(view.days[0].day_text, "Day 2");
        assert_eq!(view.days[0].date_text, "Sep 13");
        assert_eq!(view.days[0].tab_id, "day-2-sep-13");
        assert!(view.days[0].sessions[0].ended);
        assert_eq!(view.days[0].sessions[0].id, "day-2-sep-13-morning-session");

        assert!(view.days[1].is_today);
        assert_eq!(view.days[1].day_text, "TODAY");
        assert!(!view.days[1].sessions[0].ended);

        let event = &view.days[1].sessions[0].events[0];
        assert_eq!(event.title(), "Men's 100 Metres");
        assert_eq!(event.time_text, "8:00 PM");
        assert_eq!(event.category, PhaseCategory::Final);
        assert_eq!(event.element_id, "event-42-1");

        // Sessions with an empty display name are hidden.
        assert!(view.days[2].sessions.is_empty());
    }

    #[test]
    fn split_groups_get_distinct_element_ids() {
        let json = r#"{"props":{"pageProps":{"phases":[
            {"id":7,"phaseOrder":1,"phaseName":"Qualification","phaseSessionName":"Morning Session",
             "phaseDateAndTime":"2025-09-13T09:00:00+09:00","disciplineName":"Long Jump","sexName":"Women",
             "units":[
                {"unitType":"G","unitName":"A","startDateTime":"2025-09-13T09:00:00+09:00"},
                {"unitType":"G","unitName":"B","startDateTime":"2025-09-13T10:40:00+09:00"}]}
        ]}}}"#;
        let config = TimetableConfig { session_swap: crate::SessionSwap::Never, ..Default::default() };
        let view = build_view(&build_timetable(json, &config).unwrap(), &config, now(13, 12, 0));

        let ids: Vec<_> = view
            .days
            .iter()
            .flat_map(|d| &d.sessions)
            .flat_map(|s| &s.events)
            .map(|e| e.element_id.as_str())
            .collect();
        assert_eq!(ids, vec!["event-7-1-1", "event-7-1-2"]);
    }

    #[test]
    fn returning_session_gets_its_own_id() {
        let mut t = timetable();
        let evening = |h| SessionBucket {
            name: "Evening Session".into(),
            events: vec![normalized("Final", h, None)],
        };
        t.days[1].sessions = vec![
            evening(1),
            SessionBucket { name: "Morning Session".into(), events: vec![normalized("Heats", 9, None)] },
            evening(20),
        ];
        let view = build_view(&t, &TimetableConfig::default(), now(14, 12, 0));
        let ids: Vec<_> = view.days[1].sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "day-3-sep-14-evening-session",
                "day-3-sep-14-morning-session",
                "day-3-sep-14-evening-session-2",
            ]
        );
    }
}
