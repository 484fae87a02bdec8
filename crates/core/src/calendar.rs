//! Weekly grid layout.
//!
//! Everything here is a pure function of the schedule snapshot and the busy/error
//! state; nothing talks to a service.

use crate::model::{Event, Schedule, User};
use crate::validation::{CourseRef, WEEKDAYS};

/// Visible window and pixel scale of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// First visible hour (inclusive).
    pub start_hour: u32,
    /// Last visible hour (exclusive).
    pub end_hour: u32,
    /// Pixels per hour.
    pub hour_height_px: f64,
    /// Height of the day-name header row.
    pub header_height_px: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 22,
            hour_height_px: 60.0,
            header_height_px: 30.0,
        }
    }
}

impl Geometry {
    /// Height of the grid body, header excluded.
    pub fn body_height_px(&self) -> f64 {
        f64::from(self.end_hour.saturating_sub(self.start_hour)) * self.hour_height_px
    }

    /// Pixel offset of a time of day from the top of the grid body, floored at zero.
    pub fn y_of(&self, seconds: u32) -> f64 {
        let hours = f64::from(seconds) / 3600.0 - f64::from(self.start_hour);
        (hours * self.hour_height_px).max(0.0)
    }

    fn window(&self) -> (u32, u32) {
        (self.start_hour * 3600, self.end_hour * 3600)
    }
}

/// One event drawn in one day column.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBlock {
    /// Column letter from `MTWRF`.
    pub day: char,
    /// Offset from the top of the grid body.
    pub top_px: f64,
    /// At least one pixel.
    pub height_px: f64,
    /// `"ACCT 201"` or the custom event's name.
    pub label: String,
    /// Full, unclipped meeting time.
    pub time_label: String,
    /// Room, for courses.
    pub location: Option<String>,
    /// True when part of the event lies outside the visible window.
    pub clipped: bool,
    /// Index into `Schedule::events`, for the remove action.
    pub event_index: usize,
}

/// A laid-out schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarLayout {
    /// Schedule name.
    pub title: String,
    /// Geometry the blocks were computed with.
    pub geometry: Geometry,
    /// Every visible block, in event order.
    pub blocks: Vec<EventBlock>,
}

impl CalendarLayout {
    /// Blocks in one day column, top to bottom.
    pub fn column(&self, day: char) -> Vec<&EventBlock> {
        let mut col: Vec<&EventBlock> = self.blocks.iter().filter(|b| b.day == day).collect();
        col.sort_by(|a, b| a.top_px.total_cmp(&b.top_px));
        col
    }
}

/// Lays the schedule out on the grid.
///
/// Each event yields one block per weekday letter. Blocks are clipped to the
/// visible window; events entirely outside it, and zero-length events, are left out.
pub fn layout(schedule: &Schedule, geometry: &Geometry) -> CalendarLayout {
    let (win_start, win_end) = geometry.window();
    let mut blocks = Vec::new();

    for (event_index, event) in schedule.events.iter().enumerate() {
        let time = event.time();
        if time.duration() == 0 || time.end_time <= win_start || time.start_time >= win_end {
            continue;
        }
        let start = time.start_time.max(win_start);
        let end = time.end_time.min(win_end);
        let clipped = start != time.start_time || end != time.end_time;
        let top_px = geometry.y_of(start);
        let height_px = duration_to_height(end - start, geometry);

        for day in WEEKDAYS.iter().copied().filter(|d| event.days().contains(*d)) {
            blocks.push(EventBlock {
                day,
                top_px,
                height_px,
                label: event.label(),
                time_label: format!(
                    "{} - {}",
                    format_time(time.start_time),
                    format_time(time.end_time)
                ),
                location: match event {
                    Event::Course(c) => c.location.clone(),
                    Event::Custom(_) => None,
                },
                clipped,
                event_index,
            });
        }
    }

    CalendarLayout {
        title: schedule.name.clone(),
        geometry: *geometry,
        blocks,
    }
}

/// `h:MM AM/PM`.
pub fn format_time(seconds: u32) -> String {
    let total_minutes = seconds / 60;
    let hours24 = total_minutes / 60;
    let minutes = total_minutes % 60;
    let hours12 = match hours24 % 12 {
        0 => 12,
        h => h,
    };
    let ampm = if hours24 >= 12 { "PM" } else { "AM" };
    format!("{hours12}:{minutes:02} {ampm}")
}

fn duration_to_height(seconds: u32, geometry: &Geometry) -> f64 {
    // one pixel gap between stacked blocks
    (f64::from(seconds) / 3600.0 * geometry.hour_height_px - 1.0).max(1.0)
}

/// What the calendar area shows for a given store state.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarView {
    /// Nobody is signed in.
    SignedOut,
    /// First fetch still running.
    Loading,
    /// Nothing loaded and the fetch failed.
    Error(String),
    /// Signed in but no active schedule.
    NoSchedule,
    /// A schedule to draw.
    Grid {
        /// The laid-out schedule.
        layout: CalendarLayout,
        /// An operation is in flight; the grid stays visible.
        busy: bool,
        /// Error from the last operation, shown above the grid.
        warning: Option<String>,
    },
}

impl CalendarView {
    /// Picks the view for a store state.
    pub fn from_state(
        user: Option<&User>,
        schedule: Option<&Schedule>,
        busy: bool,
        error: Option<&str>,
        geometry: &Geometry,
    ) -> Self {
        if user.is_none() {
            return Self::SignedOut;
        }
        let active = schedule.filter(|s| !s.is_placeholder());
        match (active, busy, error) {
            (None, true, _) if schedule.is_none() => Self::Loading,
            (None, _, Some(e)) => Self::Error(e.to_string()),
            (None, _, None) => Self::NoSchedule,
            (Some(s), busy, error) => Self::Grid {
                layout: layout(s, geometry),
                busy,
                warning: error.map(str::to_string),
            },
        }
    }
}

/// Course dropped onto the grid. Forwarded to `add_course` as is; the service
/// alone decides whether it conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPayload {
    /// The dropped section.
    pub course: CourseRef,
}

impl From<&crate::model::CourseEvent> for DropPayload {
    fn from(c: &crate::model::CourseEvent) -> Self {
        Self { course: c.into() }
    }
}
