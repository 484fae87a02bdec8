//! Public profiles kept by the sharing service.

use std::sync::Arc;

use tracing::info;

use schedule_core::api::{ProfileDraft, ProfileEnvelope};
use schedule_core::model::Profile;
use schedule_core::validation::ValidationError;

use crate::error::SyncError;
use crate::response::{decode, failure};
use crate::transport::{ApiRequest, ApiResponse, FormPart, Method, Transport};

/// Image to attach to a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct ProfileClient<T> {
    transport: Arc<T>,
}

impl<T: Transport> ProfileClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// `None` when the user has no profile yet.
    pub async fn fetch(&self, username: &str) -> Result<Option<Profile>, SyncError> {
        let username = non_empty(username)?;
        let req = ApiRequest::sharing(Method::Get, ["user_profiles", username]);
        let resp = self.transport.send(req).await?;
        match resp.status {
            404 => Ok(None),
            _ if resp.is_success() => decode(&resp).map(Some),
            _ => Err(failure(&resp, None)),
        }
    }

    /// Creates the profile, or updates it when `exists`.
    pub async fn save(
        &self,
        username: &str,
        draft: &ProfileDraft,
        exists: bool,
    ) -> Result<Profile, SyncError> {
        let username = non_empty(username)?;
        let envelope = ProfileEnvelope {
            user_profile: ProfileDraft {
                username: username.to_string(),
                ..draft.clone()
            },
        };
        let req = if exists {
            ApiRequest::sharing(Method::Patch, ["user_profiles", username])
        } else {
            ApiRequest::sharing(Method::Post, ["user_profiles"])
        }
        .json(&envelope)?;
        let resp = self.transport.send(req).await?;
        if !resp.is_success() {
            return Err(profile_failure(&resp));
        }
        info!(user = username, created = !exists, "profile saved");
        decode(&resp)
    }

    pub async fn upload_avatar(
        &self,
        username: &str,
        avatar: AvatarUpload,
    ) -> Result<Profile, SyncError> {
        let username = non_empty(username)?;
        let req = ApiRequest::sharing(Method::Patch, ["user_profiles", username]).multipart(vec![
            FormPart::File {
                name: "user_profile[avatar]".into(),
                file_name: avatar.file_name,
                content_type: avatar.content_type,
                bytes: avatar.bytes,
            },
        ]);
        let resp = self.transport.send(req).await?;
        if !resp.is_success() {
            return Err(profile_failure(&resp));
        }
        decode(&resp)
    }
}

fn non_empty(username: &str) -> Result<&str, SyncError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::MissingCredentials.into());
    }
    Ok(username)
}

/// Validation failures come back as 422 `{field: [messages]}`.
fn profile_failure(resp: &ApiResponse) -> SyncError {
    if resp.status == 422 {
        if let Ok(fields) =
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&resp.body)
        {
            let message = fields
                .iter()
                .map(|(field, messages)| {
                    let joined = match messages {
                        serde_json::Value::Array(items) => items
                            .iter()
                            .map(|m| m.as_str().map_or_else(|| m.to_string(), str::to_string))
                            .collect::<Vec<_>>()
                            .join(", "),
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    format!("{field} {joined}")
                })
                .collect::<Vec<_>>()
                .join("; ");
            if !message.is_empty() {
                return SyncError::Http {
                    status: 422,
                    message,
                };
            }
        }
    }
    failure(resp, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprocessable_fields_are_flattened() {
        let resp = ApiResponse::new(
            422,
            r#"{"username":["has already been taken"],"bio":["is too long","is invalid"]}"#,
        );
        let msg = profile_failure(&resp).to_string();
        assert!(msg.contains("username has already been taken"));
        assert!(msg.contains("bio is too long, is invalid"));
        assert_eq!(msg.matches("; ").count(), 1);
    }

    #[test]
    fn other_statuses_use_the_generic_text() {
        let resp = ApiResponse::new(500, "oops");
        assert_eq!(profile_failure(&resp).to_string(), "HTTP error! Status: 500");
    }
}
