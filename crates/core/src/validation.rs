//! Client-side checks run before anything is sent to a service.

use thiserror::Error;

use crate::api::{AddCourseRequest, CustomEventRequest, RemoveEventRequest};
use crate::model::{Schedule, TimeSlot};
use crate::util::{format_clock, parse_clock, SECONDS_PER_DAY};

/// Day letters the weekly grid knows about, in display order.
pub const WEEKDAYS: [char; 5] = ['M', 'T', 'W', 'R', 'F'];

/// Input rejected before any request is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Blank subject.
    #[error("course subject is required")]
    EmptySubject,
    /// Course code of zero.
    #[error("course code must be a positive number")]
    InvalidCourseCode,
    /// Section that is not a letter or digit.
    #[error("course section must be a letter or digit (found: {0:?})")]
    InvalidSection(char),
    /// Blank event name.
    #[error("event name is required")]
    EmptyEventName,
    /// No usable day letter.
    #[error("select at least one day (M, T, W, R, F)")]
    NoDays,
    /// Clock string that does not parse.
    #[error("invalid time {0:?}; expected HH:MM or HH:MM:SS")]
    InvalidClock(String),
    /// Empty or reversed time window.
    #[error("start time must be before end time")]
    StartNotBeforeEnd,
    /// Seconds value at or past midnight.
    #[error("time {0} is outside the day")]
    OutOfDay(u32),
    /// Blank schedule name.
    #[error("schedule name is required")]
    EmptyScheduleName,
    /// Blank search query.
    #[error("search query is required")]
    EmptyQuery,
    /// Blank assistant question.
    #[error("question is required")]
    EmptyQuestion,
    /// Blank username or password.
    #[error("username and password are required")]
    MissingCredentials,
}

/// Identity of a catalog section: subject + numeric code + section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRef {
    /// Subject code; any case.
    pub subject: String,
    /// Catalog number.
    pub course_code: u32,
    /// Section letter or digit; any case.
    pub section: char,
}

impl CourseRef {
    /// Normalises (trim, upper-case) and checks the identity.
    pub fn validate(&self) -> Result<AddCourseRequest, ValidationError> {
        let subject = self.subject.trim().to_uppercase();
        if subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        if self.course_code == 0 {
            return Err(ValidationError::InvalidCourseCode);
        }
        if !self.section.is_ascii_alphanumeric() {
            return Err(ValidationError::InvalidSection(self.section));
        }
        Ok(AddCourseRequest {
            subject,
            course_code: self.course_code,
            section: self.section.to_ascii_uppercase(),
        })
    }
}

impl From<&crate::model::CourseEvent> for CourseRef {
    fn from(c: &crate::model::CourseEvent) -> Self {
        Self {
            subject: c.subject.clone(),
            course_code: c.course_code,
            section: c.section,
        }
    }
}

/// Form input for a user-defined event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomEventDraft {
    /// Display name.
    pub name: String,
    /// Free-form day letters; anything outside `MTWRF` is dropped.
    pub days: String,
    /// `HH:MM` or `HH:MM:SS`.
    pub start: String,
    /// `HH:MM` or `HH:MM:SS`.
    pub end: String,
}

impl CustomEventDraft {
    /// Checks the draft and produces the wire request.
    pub fn validate(&self) -> Result<CustomEventRequest, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyEventName);
        }
        let days = normalize_days(&self.days);
        if days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        let start = parse_clock(&self.start)
            .ok_or_else(|| ValidationError::InvalidClock(self.start.clone()))?;
        let end = parse_clock(&self.end)
            .ok_or_else(|| ValidationError::InvalidClock(self.end.clone()))?;
        if start >= end {
            return Err(ValidationError::StartNotBeforeEnd);
        }
        Ok(CustomEventRequest {
            name: name.to_string(),
            days,
            start_time: format_clock(start),
            end_time: format_clock(end),
        })
    }
}

/// Full identity of an event on the active schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventKey {
    /// Event name.
    pub name: String,
    /// Day string as stored.
    pub days: String,
    /// Meeting time.
    pub time: TimeSlot,
}

impl EventKey {
    /// Key for an event already on a schedule.
    pub fn of(event: &crate::model::Event) -> Self {
        Self {
            name: event.name().to_string(),
            days: event.days().to_string(),
            time: event.time(),
        }
    }

    /// Checks the key. `days` is sent verbatim since the service matches it exactly.
    pub fn validate(&self) -> Result<RemoveEventRequest, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyEventName);
        }
        if self.days.trim().is_empty() {
            return Err(ValidationError::NoDays);
        }
        check_slot(&self.time)?;
        if self.time.start_time >= self.time.end_time {
            return Err(ValidationError::StartNotBeforeEnd);
        }
        Ok(RemoveEventRequest {
            name: name.to_string(),
            days: self.days.clone(),
            start_time_seconds: self.time.start_time,
            end_time_seconds: self.time.end_time,
        })
    }
}

/// Trimmed, non-empty schedule name.
pub fn schedule_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyScheduleName);
    }
    Ok(name.to_string())
}

/// Schema check for a schedule received from the service.
///
/// Zero-length slots are accepted: catalog sections without meeting times come
/// back as `0..0` and are simply not drawn.
pub fn validate_schedule(schedule: &Schedule) -> Result<(), ValidationError> {
    for event in &schedule.events {
        let time = event.time();
        check_slot(&time)?;
        if time.start_time > time.end_time {
            return Err(ValidationError::StartNotBeforeEnd);
        }
    }
    Ok(())
}

/// Keeps only `MTWRF`, in weekday order, without duplicates.
pub fn normalize_days(days: &str) -> String {
    let upper = days.to_uppercase();
    WEEKDAYS.iter().filter(|d| upper.contains(**d)).collect()
}

fn check_slot(time: &TimeSlot) -> Result<(), ValidationError> {
    for t in [time.start_time, time.end_time] {
        if t >= SECONDS_PER_DAY {
            return Err(ValidationError::OutOfDay(t));
        }
    }
    Ok(())
}
