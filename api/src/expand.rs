use crate::{ExpandedEvent, RawEvent, Unit, slugify};
use std::collections::HashMap;

/// Unit type marking a grouped qualification phase (e.g. throws and jumps run in groups A/B).
pub const GROUP_UNIT_TYPE: &str = "G";

/// Flatten grouped phases into one record per distinct start time.
/// Output keeps input order; callers sort afterwards.
pub fn expand_events(events: Vec<RawEvent>) -> Vec<ExpandedEvent> {
    let mut expanded = Vec::with_capacity(events.len());
    for event in events {
        if is_grouped(&event) {
            expand_grouped(event, &mut expanded);
        } else {
            expanded.push(pass_through(event));
        }
    }
    expanded
}

fn is_grouped(event: &RawEvent) -> bool {
    event
        .units
        .first()
        .is_some_and(|u| u.unit_type == GROUP_UNIT_TYPE)
}

fn expand_grouped(mut event: RawEvent, out: &mut Vec<ExpandedEvent>) {
    let units = std::mem::take(&mut event.units);
    let phase_slug = if event.phase_slug.is_empty() {
        slugify(&event.phase_name)
    } else {
        event.phase_slug.clone()
    };

    for (slot, (start, units)) in partition_by_start(units).into_iter().enumerate() {
        // Concurrent groups share a slot and keep the plain phase name.
        let phase_name = match units.as_slice() {
            [single] => format!("{} - Group {}", event.phase_name, single.name),
            _ => event.phase_name.clone(),
        };
        out.push(ExpandedEvent {
            id: event.id.clone(),
            phase_order: event.phase_order.clone(),
            discipline: event.discipline.clone(),
            sex: event.sex.clone(),
            phase_name,
            phase_slug: phase_slug.clone(),
            session_name: event.session_name.clone(),
            start,
            end: event.end.clone(),
            publication: event.publication,
            units,
            slot: Some(slot),
        });
    }
}

/// Group units by exact start-timestamp string, in order of first appearance.
fn partition_by_start(units: Vec<Unit>) -> Vec<(String, Vec<Unit>)> {
    let mut slots: Vec<(String, Vec<Unit>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for unit in units {
        match index.get(&unit.start) {
            Some(&i) => slots[i].1.push(unit),
            None => {
                index.insert(unit.start.clone(), slots.len());
                slots.push((unit.start.clone(), vec![unit]));
            }
        }
    }
    slots
}

fn pass_through(event: RawEvent) -> ExpandedEvent {
    let phase_name = if !event.unit_type_name.is_empty() && !event.unit_name.is_empty() {
        format!("{} - {} {}", event.phase_name, event.unit_type_name, event.unit_name)
    } else {
        event.phase_name
    };
    ExpandedEvent {
        id: event.id,
        phase_order: event.phase_order,
        discipline: event.discipline,
        sex: event.sex,
        phase_name,
        phase_slug: event.phase_slug,
        session_name: event.session_name,
        start: event.start,
        end: event.end,
        publication: event.publication,
        units: event.units,
        slot: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_unit(name: &str, start: &str) -> Unit {
        Unit {
            name: name.into(),
            unit_type: GROUP_UNIT_TYPE.into(),
            start: start.into(),
            ..Default::default()
        }
    }

    fn grouped_phase(units: Vec<Unit>) -> RawEvent {
        RawEvent {
            id: "10".into(),
            phase_name: "Qualification".into(),
            start: "2025-09-13T09:00:00+09:00".into(),
            units,
            ..Default::default()
        }
    }

    #[test]
    fn concurrent_groups_collapse_into_one_event_named_after_phase() {
        let event = grouped_phase(vec![
            group_unit("A", "2025-09-13T10:00:00+09:00"),
            group_unit("B", "2025-09-13T10:00:00+09:00"),
        ]);
        let out = expand_events(vec![event]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].phase_name, "Qualification");
        assert_eq!(out[0].start, "2025-09-13T10:00:00+09:00");
        assert_eq!(out[0].units.len(), 2);
    }

    #[test]
    fn sequential_groups_each_get_a_suffixed_event() {
        let event = grouped_phase(vec![
            group_unit("A", "2025-09-13T09:00:00+09:00"),
            group_unit("B", "2025-09-13T10:40:00+09:00"),
        ]);
        let out = expand_events(vec![event]);
        let names: Vec<_> = out.iter().map(|e| e.phase_name.as_str()).collect();
        assert_eq!(names, vec!["Qualification - Group A", "Qualification - Group B"]);
        assert_eq!(out[1].start, "2025-09-13T10:40:00+09:00");
        assert_eq!(out[0].phase_slug, "qualification");
        assert_eq!((out[0].slot, out[1].slot), (Some(0), Some(1)));
    }

    #[test]
    fn start_matching_is_exact_not_instant_based() {
        // Same instant, different spelling: treated as separate slots.
        let event = grouped_phase(vec![
            group_unit("A", "2025-09-13T10:00:00+09:00"),
            group_unit("B", "2025-09-13T01:00:00Z"),
        ]);
        assert_eq!(expand_events(vec![event]).len(), 2);
    }

    #[test]
    fn mixed_partitions_lose_no_units() {
        let event = grouped_phase(vec![
            group_unit("A", "t1"),
            group_unit("B", "t2"),
            group_unit("C", "t1"),
            group_unit("D", "t3"),
        ]);
        let out = expand_events(vec![event]);
        assert_eq!(out.len(), 3);
        let unit_total: usize = out.iter().map(|e| e.units.len()).sum();
        assert_eq!(unit_total, 4);
        assert_eq!(out[0].phase_name, "Qualification");
        assert_eq!(out[1].phase_name, "Qualification - Group B");
        assert_eq!(out[2].phase_name, "Qualification - Group D");
    }

    #[test]
    fn non_group_units_pass_through_unchanged() {
        let mut event = grouped_phase(vec![group_unit("1", "t1"), group_unit("2", "t2")]);
        event.units[0].unit_type = "H".into();
        let out = expand_events(vec![event.clone()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].phase_name, "Qualification");
        assert_eq!(out[0].start, event.start);
        assert_eq!(out[0].units, event.units);
        assert_eq!(out[0].slot, None);
    }

    #[test]
    fn flat_unit_label_is_appended() {
        let event = RawEvent {
            phase_name: "Heats".into(),
            unit_type_name: "Heat".into(),
            unit_name: "3".into(),
            ..Default::default()
        };
        assert_eq!(expand_events(vec![event])[0].phase_name, "Heats - Heat 3");
    }

    #[test]
    fn unnamed_single_group_keeps_suffix() {
        let event = grouped_phase(vec![group_unit("", "t1"), group_unit("B", "t2")]);
        assert_eq!(expand_events(vec![event])[0].phase_name, "Qualification - Group ");
    }
}
