//! Turning raw responses into typed results at the network boundary.

use serde::de::DeserializeOwned;

use schedule_core::api::ErrorBody;
use schedule_core::model::Schedule;
use schedule_core::validation::validate_schedule;

use crate::error::SyncError;
use crate::transport::ApiResponse;

const SNIPPET_CHARS: usize = 100;

/// Parses a JSON body, citing the start of the raw text on failure.
pub fn decode<T: DeserializeOwned>(resp: &ApiResponse) -> Result<T, SyncError> {
    serde_json::from_str(&resp.body).map_err(|_| shape_error(resp))
}

/// Second-stage decode of a body already parsed as JSON.
pub(crate) fn decode_value<T: DeserializeOwned>(
    resp: &ApiResponse,
    value: serde_json::Value,
) -> Result<T, SyncError> {
    serde_json::from_value(value).map_err(|_| shape_error(resp))
}

fn shape_error(resp: &ApiResponse) -> SyncError {
    SyncError::Decode {
        status: resp.status,
        snippet: resp.body.chars().take(SNIPPET_CHARS).collect(),
    }
}

/// Error for a non-2xx response.
///
/// `conflict_default` marks operations where 409 means "conflicts with what is
/// already there"; for those a 409 becomes [`SyncError::Conflict`].
pub fn failure(resp: &ApiResponse, conflict_default: Option<&str>) -> SyncError {
    let text = serde_json::from_str::<ErrorBody>(&resp.body)
        .ok()
        .and_then(|b| b.text());
    match (resp.status, conflict_default) {
        (409, Some(default)) => SyncError::Conflict {
            message: text.unwrap_or_else(|| default.to_string()),
        },
        (status, _) => SyncError::Http {
            status,
            message: text.unwrap_or_else(|| format!("HTTP error! Status: {status}")),
        },
    }
}

/// `decode` for success statuses, `failure` otherwise.
pub fn expect<T: DeserializeOwned>(
    resp: &ApiResponse,
    conflict_default: Option<&str>,
) -> Result<T, SyncError> {
    if resp.is_success() {
        decode(resp)
    } else {
        Err(failure(resp, conflict_default))
    }
}

/// Decodes and schema-checks a schedule. A missing `events` field becomes empty.
pub fn decode_schedule(resp: &ApiResponse) -> Result<Schedule, SyncError> {
    let schedule: Schedule = decode(resp)?;
    validate_schedule(&schedule)?;
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_errors_cite_the_same_prefix() {
        let body = format!(r#"[{{"name":"{}"}}]"#, "x".repeat(200));
        let resp = ApiResponse::new(200, body.clone());
        let value: serde_json::Value = decode(&resp).unwrap();

        let err = decode_value::<Schedule>(&resp, value).unwrap_err();
        let expected: String = body.chars().take(SNIPPET_CHARS).collect();
        assert_eq!(
            err,
            SyncError::Decode {
                status: 200,
                snippet: expected
            }
        );
    }

    #[test]
    fn conflict_uses_body_then_default() {
        let resp = ApiResponse::new(409, r#"{"error":"Conflict","message":"ACCT 201 [A] conflicts"}"#);
        assert_eq!(
            failure(&resp, Some("Conflict detected. Course not added.")),
            SyncError::Conflict {
                message: "Conflict".into()
            }
        );

        let resp = ApiResponse::new(409, r#"{"message":"ACCT 201 [A] conflicts"}"#);
        assert_eq!(
            failure(&resp, Some("Conflict detected. Course not added.")),
            SyncError::Conflict {
                message: "ACCT 201 [A] conflicts".into()
            }
        );

        let resp = ApiResponse::new(409, "");
        assert_eq!(
            failure(&resp, Some("Conflict detected. Course not added.")),
            SyncError::Conflict {
                message: "Conflict detected. Course not added.".into()
            }
        );
    }

    #[test]
    fn plain_409_is_generic_without_conflict_semantics() {
        let resp = ApiResponse::new(409, "{}");
        assert_eq!(
            failure(&resp, None),
            SyncError::Http {
                status: 409,
                message: "HTTP error! Status: 409".into()
            }
        );
    }

    #[test]
    fn malformed_error_body_falls_back_to_status() {
        let resp = ApiResponse::new(502, "<html>Bad Gateway</html>");
        assert_eq!(failure(&resp, None).to_string(), "HTTP error! Status: 502");

        let resp = ApiResponse::new(400, r#"{"error":"Bad Request"}"#);
        assert_eq!(failure(&resp, None).to_string(), "Bad Request");
    }

    #[test]
    fn decode_failure_cites_body_prefix() {
        let body = "x".repeat(250);
        let resp = ApiResponse::new(200, body);
        match decode::<Schedule>(&resp) {
            Err(SyncError::Decode { status, snippet }) => {
                assert_eq!(status, 200);
                assert_eq!(snippet.len(), 100);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn schedule_schema_is_checked() {
        let resp = ApiResponse::new(
            200,
            r#"{"name":"x","events":[{"name":"e","days":"M","time":{"startTime":90000,"endTime":90001}}]}"#,
        );
        assert!(matches!(decode_schedule(&resp), Err(SyncError::Invalid(_))));

        let resp = ApiResponse::new(200, r#"{"name":"x"}"#);
        assert_eq!(decode_schedule(&resp).unwrap().events, vec![]);
    }
}
