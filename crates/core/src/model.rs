//! Wire data model shared with the schedule and sharing services.

use serde::{Deserialize, Serialize};

/// Name the service uses when no schedule is active.
pub const NO_SCHEDULE_LOADED: &str = "No Schedule Loaded";

/// Active schedule snapshot, exactly as the schedule service returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    /// Schedule name (unique per user).
    pub name: String,
    /// Everything placed on the weekly grid.
    ///
    /// The service omits the field for some responses; it always decodes to a sequence.
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Schedule {
    /// The "no active schedule" sentinel.
    pub fn placeholder() -> Self {
        Self {
            name: NO_SCHEDULE_LOADED.to_string(),
            events: vec![],
        }
    }

    /// True for the "no active schedule" sentinel.
    pub fn is_placeholder(&self) -> bool {
        self.name == NO_SCHEDULE_LOADED
    }

    /// Courses on the schedule, skipping custom events.
    pub fn courses(&self) -> impl Iterator<Item = &CourseEvent> {
        self.events.iter().filter_map(|e| match e {
            Event::Course(c) => Some(c),
            Event::Custom(_) => None,
        })
    }

    /// Finds a course by its numeric code.
    pub fn course_by_code(&self, course_code: u32) -> Option<&CourseEvent> {
        self.courses().find(|c| c.course_code == course_code)
    }
}

/// Time window in seconds since midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    /// Start, seconds since midnight.
    pub start_time: u32,
    /// End, seconds since midnight.
    pub end_time: u32,
}

impl TimeSlot {
    /// Length of the slot in seconds (zero for unscheduled sections).
    pub fn duration(&self) -> u32 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// An item placed on the weekly grid.
///
/// Course events are recognised by their `courseCode`/`subject` fields; anything
/// else is a custom event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Event {
    /// Catalog course section.
    Course(CourseEvent),
    /// User-defined block (work shift, club meeting, ...).
    Custom(CustomEvent),
}

impl Event {
    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Event::Course(c) => &c.name,
            Event::Custom(c) => &c.name,
        }
    }

    /// Compact day string, e.g. `"MWF"`.
    pub fn days(&self) -> &str {
        match self {
            Event::Course(c) => &c.days,
            Event::Custom(c) => &c.days,
        }
    }

    /// Meeting time.
    pub fn time(&self) -> TimeSlot {
        match self {
            Event::Course(c) => c.time,
            Event::Custom(c) => c.time,
        }
    }

    /// Short label used by the calendar: `"ACCT 201"` for courses, the name otherwise.
    pub fn label(&self) -> String {
        match self {
            Event::Course(c) => format!("{} {}", c.subject, c.course_code),
            Event::Custom(c) => c.name.clone(),
        }
    }
}

/// Course section, as stored on a schedule and as returned by catalog search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseEvent {
    /// Course title.
    pub name: String,
    /// Meeting days, e.g. `"MWF"`.
    #[serde(default)]
    pub days: String,
    /// Meeting time; `0..0` for sections without one.
    pub time: TimeSlot,
    /// Subject code, e.g. `ACCT`.
    pub subject: String,
    /// Catalog number.
    pub course_code: u32,
    /// Section letter.
    pub section: char,
    /// Instructor, when the catalog lists one.
    #[serde(default)]
    pub professor: Option<Professor>,
    /// Room.
    #[serde(default)]
    pub location: Option<String>,
    /// Term, e.g. `"Fall 2024"`.
    #[serde(default)]
    pub semester: Option<String>,
    /// Credit hours.
    #[serde(default)]
    pub credits: Option<u32>,
}

/// Instructor of record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Professor {
    /// Full name.
    #[serde(default)]
    pub name: String,
}

/// User-defined event. Carries no server-assigned key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomEvent {
    /// Display name.
    pub name: String,
    /// Day letters.
    #[serde(default)]
    pub days: String,
    /// When it happens.
    pub time: TimeSlot,
}

/// Authenticated user as returned by the schedule service (no credentials).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Login name; also the owner key for schedules and profiles.
    pub name: String,
    /// Student id.
    #[serde(default)]
    pub id_number: i64,
    /// Declared major.
    #[serde(default)]
    pub major: String,
    /// Class year.
    #[serde(default)]
    pub year: i32,
    /// Server-side file paths, `users/<name>/schedules/<schedule>.json`.
    #[serde(default)]
    pub my_schedules: Vec<String>,
}

impl User {
    /// Names of the user's saved schedules, taken from the stored file paths.
    ///
    /// Paths without a directory or an extension are skipped.
    pub fn schedule_names(&self) -> Vec<String> {
        self.my_schedules
            .iter()
            .filter_map(|path| {
                let (_, file) = path.rsplit_once('/')?;
                let (stem, _) = file.rsplit_once('.')?;
                (!stem.is_empty()).then(|| stem.to_string())
            })
            .collect()
    }
}

/// Public profile kept by the sharing service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Owner.
    pub username: String,
    /// Short self-description.
    #[serde(default)]
    pub bio: Option<String>,
    /// Externally hosted picture URL.
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    /// Favourite place on campus.
    #[serde(default)]
    pub favorite_spot: Option<String>,
    /// Uploaded avatar, served by the sharing service.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// Reply text; a fixed notice when the service sends none.
    #[serde(default = "default_answer")]
    pub answer: String,
    /// Documents the reply draws on.
    #[serde(default)]
    pub sources: Vec<AnswerSource>,
}

/// Excerpt of a document the assistant drew on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerSource {
    /// Excerpt text.
    #[serde(default)]
    pub page_content: String,
    /// Whatever the retriever attached (page, file, ...).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_answer() -> String {
    "AI did not provide an answer.".to_string()
}
