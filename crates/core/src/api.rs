//! Request and response bodies exchanged with the schedule and sharing services.

use serde::{Deserialize, Serialize};

use crate::model::{Profile, Schedule, User};

/// Add a catalog section to the active schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddCourseRequest {
    /// Upper-case subject, e.g. `ACCT`.
    pub subject: String,
    /// Catalog number, e.g. `201`.
    pub course_code: u32,
    /// Section letter or digit.
    pub section: char,
}

/// Identify an event for removal.
///
/// Custom events have no key the client can see, so the full identity is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEventRequest {
    /// Event name, trimmed.
    pub name: String,
    /// Day string exactly as stored on the event.
    pub days: String,
    /// Start, seconds since midnight.
    pub start_time_seconds: u32,
    /// End, seconds since midnight.
    pub end_time_seconds: u32,
}

/// Add a user-defined event. Times are `HH:MM` (or `HH:MM:SS`) clock strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomEventRequest {
    /// Event name, trimmed.
    pub name: String,
    /// Day letters from `MTWRF`, in week order.
    pub days: String,
    /// Start clock time.
    pub start_time: String,
    /// End clock time.
    pub end_time: String,
}

/// Create a named schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRequest {
    /// Schedule name, trimmed.
    pub name: String,
}

/// Returned by schedule creation: the new active schedule plus the user whose
/// schedule list now includes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleResponse {
    /// The new, empty schedule.
    pub schedule: Option<Schedule>,
    /// The user record after creation.
    pub user: Option<User>,
}

/// Returned by schedule deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteScheduleResponse {
    /// Confirmation text.
    #[serde(default)]
    pub message: Option<String>,
    /// The user record after deletion.
    pub user: Option<User>,
}

/// Returned by save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    /// Confirmation text.
    #[serde(default)]
    pub message: Option<String>,
}

/// Question for the course assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Free-text question, trimmed.
    pub question: String,
}

/// Mint a share link on the sharing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Owner of the schedule.
    pub username: String,
    /// Name of the saved schedule.
    pub schedule_name: String,
    /// Full schedule as just loaded from the schedule service.
    pub schedule_content: Schedule,
}

/// Share link issued by the sharing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    /// Absolute share URL; only its path is kept.
    pub share_url: Option<String>,
}

/// Profile fields the client may write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileDraft {
    /// Overwritten with the signed-in user's name before sending.
    pub username: String,
    /// Short self-description.
    #[serde(default)]
    pub bio: String,
    /// Externally hosted picture URL.
    #[serde(default)]
    pub profile_pic_url: String,
    /// Favourite place on campus.
    #[serde(default)]
    pub favorite_spot: String,
}

/// The sharing service nests writes under `user_profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEnvelope {
    /// The fields being written.
    pub user_profile: ProfileDraft,
}

impl From<&Profile> for ProfileDraft {
    fn from(p: &Profile) -> Self {
        Self {
            username: p.username.clone(),
            bio: p.bio.clone().unwrap_or_default(),
            profile_pic_url: p.profile_pic_url.clone().unwrap_or_default(),
            favorite_spot: p.favorite_spot.clone().unwrap_or_default(),
        }
    }
}

/// Error body either service may attach to a non-2xx response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error text; preferred when both fields are set.
    #[serde(default)]
    pub error: Option<String>,
    /// Longer explanation.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Most specific human-readable text in the body, if any.
    pub fn text(&self) -> Option<String> {
        let pick = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        pick(&self.error).or_else(|| pick(&self.message))
    }
}

/// Path (and query) portion of a share URL.
///
/// `"https://host/s/TOKEN"` becomes `"/s/TOKEN"`; a value that is already a path
/// is returned unchanged. The fragment is dropped.
pub fn share_path(share_url: &str) -> String {
    let url = share_url.trim();
    let url = url.split_once('#').map_or(url, |(head, _)| head);
    let path = match url.split_once("://") {
        Some((_, rest)) => match rest.find(['/', '?']) {
            Some(i) => &rest[i..],
            None => "",
        },
        None => url,
    };
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
