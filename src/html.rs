//! Bootstrap markup for `--html`: one tab per day, one accordion item per session.

use std::fmt::Write;
use wa_timetable_api::ApiError;
use wa_timetable_api::view::{DayView, EventView, Link, SessionView, TimetableView};

pub fn render(view: &TimetableView) -> String {
    let mut out = String::from("<div class=\"wa-timetable-container\">");

    if view.days.is_empty() {
        out.push_str("<div class=\"wa-timetable-empty\">No events published yet.</div></div>");
        return out;
    }

    out.push_str("<ul class=\"nav nav-pills nav-justified my-0\" role=\"tablist\">");
    for (idx, day) in view.days.iter().enumerate() {
        render_tab(&mut out, day, view.active_day == Some(idx));
    }
    out.push_str("</ul><div class=\"tab-content mt-3\">");
    for (idx, day) in view.days.iter().enumerate() {
        render_pane(&mut out, day, &view.headers, view.active_day == Some(idx));
    }
    out.push_str("</div>");

    if view.skipped > 0 {
        let _ = write!(out, "<!-- {} records skipped -->", view.skipped);
    }
    out.push_str("</div>");
    out
}

pub fn render_error(err: &ApiError) -> String {
    format!("<div class=\"wa-timetable-error\">Error: {}</div>", escape(&err.to_string()))
}

fn render_tab(out: &mut String, day: &DayView, active: bool) {
    let id = escape(&day.tab_id);
    let _ = write!(
        out,
        "<li class=\"nav-item day-item my-0\"><a class=\"nav-link{}\" id=\"{id}-tab\" \
         data-bs-toggle=\"tab\" data-bs-target=\"#{id}\" type=\"button\" role=\"tab\" \
         aria-controls=\"{id}\" aria-selected=\"{active}\"><div class=\"d-flex flex-column\">\
         <span class=\"{}\">{}</span><span>{}</span></div></a></li>",
        if active { " active" } else { "" },
        if day.is_today { "day-text today-text" } else { "day-text" },
        escape(&day.day_text),
        escape(&day.date_text),
    );
}

fn render_pane(out: &mut String, day: &DayView, headers: &[String; 4], active: bool) {
    let id = escape(&day.tab_id);
    let _ = write!(
        out,
        "<div class=\"tab-pane fade{}\" id=\"{id}\" role=\"tabpanel\" aria-labelledby=\"{id}-tab\">\
         <div class=\"accordion\" id=\"accordion-{id}\">",
        if active { " show active" } else { "" },
    );
    for session in &day.sessions {
        render_session(out, session, headers);
    }
    out.push_str("</div></div>");
}

fn render_session(out: &mut String, session: &SessionView, headers: &[String; 4]) {
    let id = escape(&session.id);
    let ended = session.ended;
    let _ = write!(
        out,
        "<div class=\"accordion-item border-0\"><h2 class=\"accordion-header p-0 my-0\" id=\"heading-{id}\">\
         <button class=\"accordion-button{}\" type=\"button\" data-bs-toggle=\"collapse\" \
         data-bs-target=\"#collapse-{id}\" aria-expanded=\"{}\" aria-controls=\"collapse-{id}\">\
         <span class=\"session-name\">{}{}</span><span class=\"event-count\">{} event sections</span>\
         </button></h2>",
        if ended { " collapsed" } else { "" },
        !ended,
        escape(&session.name),
        if ended { "<span class=\"badge bg-danger ms-2\">ENDED</span>" } else { "" },
        session.events.len(),
    );
    let _ = write!(
        out,
        "<div id=\"collapse-{id}\" class=\"accordion-collapse collapse{}\" aria-labelledby=\"heading-{id}\">\
         <div class=\"accordion-body p-0\"><table class=\"table table-striped table-hover table-sm mb-0\"><thead><tr>",
        if ended { "" } else { " show" },
    );
    for header in headers {
        let _ = write!(out, "<th scope=\"col\">{}</th>", escape(header));
    }
    out.push_str("<th scope=\"col\"></th></tr></thead><tbody>");
    for event in &session.events {
        render_event(out, event);
    }
    out.push_str("</tbody></table></div></div></div>");
}

fn render_event(out: &mut String, event: &EventView) {
    let _ = write!(
        out,
        "<tr class=\"event-item\" id=\"{}\"><td class=\"event-time\">{}</td><td>{}</td><td>{}</td>\
         <td><span class=\"event-phase\" style=\"background-color: {};\">{}</span></td><td class=\"event-links\">",
        escape(&event.element_id),
        escape(&event.time_text),
        escape(&event.sex_label),
        escape(&event.discipline),
        event.color,
        escape(&event.phase_name),
    );
    if event.is_live {
        out.push_str("<div class=\"live-badge\"><div class=\"pulse-circle\"></div><span>LIVE</span></div>");
    }
    for link in event.primary_link.iter().chain(event.summary_link.iter()) {
        render_link(out, link);
    }
    out.push_str("</td></tr>");
}

fn render_link(out: &mut String, link: &Link) {
    let label = link.kind.label();
    let _ = write!(
        out,
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\"><span class=\"{}-link\">{label}</span></a>",
        escape(&link.url),
        label.to_lowercase(),
    );
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
