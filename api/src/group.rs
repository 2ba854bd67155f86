use crate::{DayBucket, NormalizedEvent, SessionBucket};
use chrono::NaiveDate;

/// Competition day for `date`, counting `reference` as day 1. Dates before
/// the reference give 0, -1, ...
pub fn day_number(reference: NaiveDate, date: NaiveDate) -> i64 {
    date.signed_duration_since(reference).num_days() + 1
}

pub fn day_label(day_number: i64, date: NaiveDate) -> String {
    format!("Day {day_number} - {}", date.format("%b %d"))
}

/// Sort chronologically and bucket into day -> session -> events.
/// Sessions are consecutive runs of one label. Ties keep their input order.
pub fn group_events(mut events: Vec<NormalizedEvent>, reference: NaiveDate) -> Vec<DayBucket> {
    events.sort_by(|a, b| a.start.cmp(&b.start));

    let mut days: Vec<DayBucket> = Vec::new();
    for event in events {
        let date = event.start.date_naive();

        let needs_new_day = days.last().is_none_or(|d| d.date != date);
        if needs_new_day {
            let n = day_number(reference, date);
            days.push(DayBucket {
                date,
                day_number: n,
                label: day_label(n, date),
                sessions: Vec::new(),
            });
        }
        let Some(day) = days.last_mut() else { continue };

        // A label that comes back later in the day opens a new bucket, so
        // the day stays in start order.
        match day.sessions.last_mut() {
            Some(session) if session.name == event.session => session.events.push(event),
            _ => day.sessions.push(SessionBucket {
                name: event.session.clone(),
                events: vec![event],
            }),
        }
    }
    days
}
