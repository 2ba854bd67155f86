use crate::client::{ApiError, ApiResult};
use crate::wire::{Phase, TimetableEvent, WireUnit};
use crate::{Discipline, Publication, RawEvent, RecordError, Sex, Unit};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// The timetable array, resolved once to whichever schema the page used.
#[derive(Debug, Clone)]
pub enum Payload {
    Phases {
        phases: Vec<Phase>,
        /// disciplineCode -> slug, from the page's Apollo cache.
        discipline_slugs: HashMap<String, String>,
    },
    EventTimetable(Vec<TimetableEvent>),
}

#[derive(Debug, Clone)]
pub struct Extracted {
    pub payload: Payload,
    /// Array entries that could not be decoded.
    pub skipped: Vec<RecordError>,
}

impl Payload {
    pub fn variant(&self) -> &'static str {
        match self {
            Payload::Phases { .. } => "phases",
            Payload::EventTimetable(_) => "eventTimetable",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Phases { phases, .. } => phases.len(),
            Payload::EventTimetable(events) => events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_raw_events(self) -> Vec<RawEvent> {
        match self {
            Payload::Phases { phases, discipline_slugs } => phases
                .into_iter()
                .enumerate()
                .map(|(idx, p)| map_phase(p, idx, &discipline_slugs))
                .collect(),
            Payload::EventTimetable(events) => events
                .into_iter()
                .enumerate()
                .map(|(idx, e)| map_timetable_event(e, idx))
                .collect(),
        }
    }
}

/// Decode the timetable from an HTML page or a raw JSON document.
pub fn extract(text: &str, marker_id: &str) -> ApiResult<Extracted> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::EmptyBody);
    }

    let json = if trimmed.starts_with('{') {
        trimmed
    } else {
        find_script_block(text, marker_id).ok_or_else(|| ApiError::MarkerNotFound {
            marker: marker_id.to_string(),
        })?
    };

    let document: Value = serde_json::from_str(json).map_err(ApiError::DecodeFailed)?;
    let extracted = resolve_payload(&document)?;
    log::debug!(
        "extracted {} {} records ({} undecodable)",
        extracted.payload.len(),
        extracted.payload.variant(),
        extracted.skipped.len()
    );
    Ok(extracted)
}

// ---------------------------------------------------------------------------
// Marker scan
// ---------------------------------------------------------------------------

/// Return the body of the first `<script>` element whose `id` is `marker_id`.
/// Tag and attribute names match case-insensitively; the id may be quoted
/// with `"`, `'` or not at all, and other attributes may appear in any order.
pub fn find_script_block<'a>(html: &'a str, marker_id: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets identical to `html`.
    let lc = html.to_ascii_lowercase();
    let mut from = 0;

    while let Some(rel) = lc[from..].find("<script") {
        let tag_start = from + rel;
        let name_end = tag_start + "<script".len();
        let tag_end = name_end + html[name_end..].find('>')?;

        let is_script_tag = html[name_end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == '>' || c == '/');

        if is_script_tag && id_attribute(&html[name_end..tag_end]) == Some(marker_id) {
            let body_start = tag_end + 1;
            let body_end = body_start + lc[body_start..].find("</script")?;
            return Some(html[body_start..body_end].trim());
        }
        from = tag_end + 1;
    }
    None
}

/// Value of the `id` attribute in a tag's attribute text, if any.
fn id_attribute(attrs: &str) -> Option<&str> {
    let bytes = attrs.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        // Skip whitespace and stray slashes between attributes.
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = &attrs[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            // Bare attribute such as `async`.
            if name.is_empty() {
                i += 1;
            }
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => {
                let start = i + 1;
                let end = start + attrs[start..].find(q as char).unwrap_or(attrs.len() - start);
                i = end + 1;
                &attrs[start..end]
            }
            Some(_) => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &attrs[start..i]
            }
            None => "",
        };

        if name.eq_ignore_ascii_case("id") {
            return Some(value);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Schema resolution
// ---------------------------------------------------------------------------

fn resolve_payload(document: &Value) -> ApiResult<Extracted> {
    let page_props = document
        .pointer("/props/pageProps")
        .filter(|v| v.is_object())
        .ok_or_else(|| schema_invalid(document, "props.pageProps"))?;

    if let Some(phases) = page_props.get("phases") {
        let items = phases
            .as_array()
            .ok_or_else(|| schema_invalid(document, "props.pageProps.phases"))?;
        let (phases, skipped) = decode_records::<Phase>(items);
        let discipline_slugs = apollo_discipline_slugs(document, &phases);
        return Ok(Extracted {
            payload: Payload::Phases { phases, discipline_slugs },
            skipped,
        });
    }

    if let Some(events) = page_props.get("eventTimetable") {
        let items = events
            .as_array()
            .ok_or_else(|| schema_invalid(document, "props.pageProps.eventTimetable"))?;
        let (events, skipped) = decode_records::<TimetableEvent>(items);
        return Ok(Extracted {
            payload: Payload::EventTimetable(events),
            skipped,
        });
    }

    Err(schema_invalid(document, "props.pageProps.(phases|eventTimetable)"))
}

/// Decode each entry on its own so one malformed record doesn't sink the page.
fn decode_records<'a, T: Deserialize<'a>>(items: &'a [Value]) -> (Vec<T>, Vec<RecordError>) {
    let mut decoded = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(record) => decoded.push(record),
            Err(e) => {
                let err = RecordError { id: record_id(item, idx), reason: e.to_string() };
                log::warn!("{err}");
                skipped.push(err);
            }
        }
    }
    (decoded, skipped)
}

fn record_id(item: &Value, idx: usize) -> String {
    match item.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("#{idx}"),
    }
}

fn schema_invalid(document: &Value, path: &str) -> ApiError {
    ApiError::SchemaInvalid {
        path: path.to_string(),
        top_level_keys: describe_shape(document),
    }
}

/// Top-level keys of the document, or its JSON type when it isn't an object.
fn describe_shape(document: &Value) -> Vec<String> {
    match document {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => vec![format!("<array of {}>", items.len())],
        Value::String(_) => vec!["<string>".into()],
        Value::Number(_) => vec!["<number>".into()],
        Value::Bool(_) => vec!["<bool>".into()],
        Value::Null => vec!["<null>".into()],
    }
}

fn apollo_discipline_slugs(document: &Value, phases: &[Phase]) -> HashMap<String, String> {
    let Some(cache) = document.pointer("/props/apolloState/data") else {
        return HashMap::new();
    };
    phases
        .iter()
        .filter_map(|p| p.discipline_code.as_deref())
        .filter_map(|code| {
            let slug = cache
                .get(format!("Discipline:{code}"))?
                .get("Slug")?
                .as_str()?;
            Some((code.to_string(), slug.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Mapping: wire types -> RawEvent
// ---------------------------------------------------------------------------

fn map_units(units: Option<Vec<WireUnit>>, phase_start: &str) -> Vec<Unit> {
    units
        .unwrap_or_default()
        .into_iter()
        .map(|u| Unit {
            name: u.unit_name.unwrap_or_default(),
            unit_type: u.unit_type.unwrap_or_default(),
            // A unit without its own start runs at the phase start.
            start: u.start_date_time.unwrap_or_else(|| phase_start.to_string()),
            publication: Publication {
                startlist: u.is_startlist_published.unwrap_or(false),
                result: u.is_result_published.unwrap_or(false),
                summary: u.is_phase_summary_published.unwrap_or(false),
            },
        })
        .collect()
}

fn placeholder_id(idx: usize) -> String {
    format!("event-{idx}")
}

fn map_phase(p: Phase, idx: usize, discipline_slugs: &HashMap<String, String>) -> RawEvent {
    let start = p.phase_date_and_time.unwrap_or_default();
    let code = p.discipline_code.unwrap_or_default();
    let slug = p
        .discipline_name_url_slug
        .or_else(|| discipline_slugs.get(&code).cloned())
        .unwrap_or_default();

    RawEvent {
        id: p.id.unwrap_or_else(|| placeholder_id(idx)),
        phase_order: p.phase_order.unwrap_or_default(),
        discipline: Discipline {
            name: p.discipline_name.unwrap_or_default(),
            slug,
            code,
        },
        sex: Sex {
            code: p.sex_code.unwrap_or_default(),
            name: p.sex_name.unwrap_or_default(),
            slug: p.sex_name_url_slug.unwrap_or_default(),
        },
        phase_name: p.phase_name.unwrap_or_default(),
        phase_slug: p.phase_url_slug.or(p.phase_name_url_slug).unwrap_or_default(),
        session_name: p.phase_session_name.unwrap_or_default(),
        units: map_units(p.units, &start),
        start,
        end: p.phase_end_date_and_time.filter(|s| !s.trim().is_empty()),
        unit_type_name: String::new(),
        unit_name: String::new(),
        publication: Publication {
            startlist: p.is_startlist_published.unwrap_or(false),
            result: p.is_result_published.unwrap_or(false),
            summary: p.is_phase_summary_published.unwrap_or(false),
        },
    }
}

fn map_timetable_event(e: TimetableEvent, idx: usize) -> RawEvent {
    let start = e.phase_date_and_time.unwrap_or_default();
    let discipline = e.discipline.unwrap_or_default();

    RawEvent {
        id: e.id.unwrap_or_else(|| placeholder_id(idx)),
        phase_order: e.phase_order.unwrap_or_default(),
        discipline: Discipline {
            name: discipline.name.unwrap_or_default(),
            slug: discipline.name_url_slug.unwrap_or_default(),
            code: discipline.code.unwrap_or_default(),
        },
        sex: Sex {
            code: e.sex_code.unwrap_or_default(),
            name: e.sex_name.unwrap_or_default(),
            slug: e.sex_name_url_slug.unwrap_or_default(),
        },
        phase_name: e.phase_name.unwrap_or_default(),
        phase_slug: e.phase_name_url_slug.unwrap_or_default(),
        session_name: e.phase_session_name.unwrap_or_default(),
        units: map_units(e.units, &start),
        start,
        end: e.phase_end_date_and_time.filter(|s| !s.trim().is_empty()),
        unit_type_name: e.unit_type_name.unwrap_or_default(),
        unit_name: e.unit_name.unwrap_or_default(),
        publication: Publication {
            startlist: e.is_startlist_published.unwrap_or(false),
            result: e.is_result_published.unwrap_or(false),
            summary: e.is_phase_summary_published.unwrap_or(false),
        },
    }
}
