/// Raw wire types for the timetable page's embedded JSON document.
/// Two payload shapes have been published: `props.pageProps.eventTimetable`
/// and the newer `props.pageProps.phases`. Both map into `RawEvent`.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Ids and phase orders arrive as numbers on some pages and strings on others.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// `eventTimetable` variant
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEvent {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phase_order: Option<String>,
    pub phase_name: Option<String>,
    pub phase_name_url_slug: Option<String>,
    pub phase_session_name: Option<String>,
    pub phase_date_and_time: Option<String>,
    pub phase_end_date_and_time: Option<String>,
    pub sex_code: Option<String>,
    pub sex_name: Option<String>,
    pub sex_name_url_slug: Option<String>,
    pub discipline: Option<TimetableDiscipline>,
    pub unit_type_name: Option<String>,
    pub unit_name: Option<String>,
    pub is_startlist_published: Option<bool>,
    pub is_result_published: Option<bool>,
    pub is_phase_summary_published: Option<bool>,
    pub units: Option<Vec<WireUnit>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimetableDiscipline {
    pub name: Option<String>,
    pub name_url_slug: Option<String>,
    pub code: Option<String>,
}

// ---------------------------------------------------------------------------
// `phases` variant
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phase_order: Option<String>,
    pub phase_name: Option<String>,
    pub phase_url_slug: Option<String>,
    pub phase_name_url_slug: Option<String>,
    pub phase_session_name: Option<String>,
    pub phase_date_and_time: Option<String>,
    pub phase_end_date_and_time: Option<String>,
    pub sex_code: Option<String>,
    pub sex_name: Option<String>,
    pub sex_name_url_slug: Option<String>,
    pub discipline_name: Option<String>,
    pub discipline_code: Option<String>,
    pub discipline_name_url_slug: Option<String>,
    pub is_startlist_published: Option<bool>,
    pub is_result_published: Option<bool>,
    pub is_phase_summary_published: Option<bool>,
    pub units: Option<Vec<WireUnit>>,
}

/// A heat or group. Shared by both variants.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireUnit {
    pub unit_type: Option<String>, // "G" = group
    pub unit_name: Option<String>,
    pub start_date_time: Option<String>,
    pub is_startlist_published: Option<bool>,
    pub is_result_published: Option<bool>,
    pub is_phase_summary_published: Option<bool>,
}
