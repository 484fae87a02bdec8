//! Plain-text rendering of store state for the terminal.

use std::fmt::Write as _;

use schedule_core::calendar::{format_time, CalendarLayout, CalendarView, Geometry};
use schedule_core::model::{Answer, CourseEvent, Profile};
use schedule_core::validation::WEEKDAYS;
use schedule_sync::{Category, StoreState};

pub fn view(state: &StoreState) -> CalendarView {
    CalendarView::from_state(
        state.user.as_ref(),
        state.schedule.as_ref(),
        state.is_busy(),
        state.error(Category::Schedule),
        &Geometry::default(),
    )
}

pub fn calendar(view: &CalendarView) -> String {
    match view {
        CalendarView::SignedOut => "Please log in to view your schedule.\n".to_string(),
        CalendarView::Loading => "Loading schedule...\n".to_string(),
        CalendarView::Error(e) => format!("Error loading schedule: {e}\n"),
        CalendarView::NoSchedule => {
            "No schedule loaded. Load or create one to start adding courses.\n".to_string()
        }
        CalendarView::Grid {
            layout, warning, ..
        } => {
            let mut out = grid(layout);
            if let Some(w) = warning {
                let _ = writeln!(out, "! {w}");
            }
            out
        }
    }
}

fn grid(layout: &CalendarLayout) -> String {
    let mut out = String::new();
    let g = &layout.geometry;
    let _ = writeln!(
        out,
        "{}  ({} - {})",
        layout.title,
        format_time(g.start_hour * 3600),
        format_time(g.end_hour * 3600)
    );
    if layout.blocks.is_empty() {
        out.push_str("  (no events)\n");
        return out;
    }
    for day in WEEKDAYS {
        let column = layout.column(day);
        if column.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", day_name(day));
        for b in column {
            let _ = write!(out, "  [{}] {:<19} {}", b.event_index, b.time_label, b.label);
            if let Some(loc) = &b.location {
                let _ = write!(out, " @ {loc}");
            }
            if b.clipped {
                out.push_str(" (partly hidden)");
            }
            out.push('\n');
        }
    }
    out
}

fn day_name(day: char) -> &'static str {
    match day {
        'M' => "Monday",
        'T' => "Tuesday",
        'W' => "Wednesday",
        'R' => "Thursday",
        'F' => "Friday",
        _ => "?",
    }
}

pub fn search_results(hits: &[CourseEvent]) -> String {
    if hits.is_empty() {
        return "No courses found matching your query.\n".to_string();
    }
    let mut out = String::new();
    for c in hits {
        let _ = write!(
            out,
            "{} {} [{}]  {}  {} {} - {}",
            c.subject,
            c.course_code,
            c.section,
            c.name,
            c.days,
            format_time(c.time.start_time),
            format_time(c.time.end_time)
        );
        if let Some(p) = &c.professor {
            let _ = write!(out, "  {}", p.name);
        }
        out.push('\n');
    }
    out
}

pub fn answer(a: &Answer) -> String {
    let mut out = format!("{}\n", a.answer);
    if !a.sources.is_empty() {
        let _ = writeln!(out, "\nSources:");
        for s in &a.sources {
            let excerpt: String = s.page_content.chars().take(80).collect();
            let _ = writeln!(out, "  - {excerpt}");
        }
    }
    out
}

pub fn profile(p: &Profile) -> String {
    let field = |v: &Option<String>| v.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| "-".into());
    format!(
        "username:       {}\nbio:            {}\nfavorite spot:  {}\npicture url:    {}\navatar:         {}\n",
        p.username,
        field(&p.bio),
        field(&p.favorite_spot),
        field(&p.profile_pic_url),
        field(&p.avatar_url),
    )
}
