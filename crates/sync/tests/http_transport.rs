//! Drives the reqwest transport against a local axum stub of both services.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use schedule_core::validation::CourseRef;
use schedule_sync::{
    ApiRequest, Endpoints, HttpTransport, Method, ScheduleStore, Session, SyncError, Transport,
};

async fn login(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !headers.contains_key("x-request-id") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "missing request id"})));
    }
    match (params.get("username"), params.get("password")) {
        (Some(u), Some(p)) if p == "pw" => (
            StatusCode::OK,
            Json(json!({"name": u, "idNumber": 7, "mySchedules": [format!("users/{u}/schedules/Fall 2024.json")]})),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid username or password"})),
        ),
    }
}

async fn current() -> Json<Value> {
    Json(json!({"name": "Fall 2024", "events": []}))
}

async fn load(Path(name): Path<String>) -> Json<Value> {
    Json(json!({
        "name": name,
        "events": [{"name": "Work", "days": "TR", "time": {"startTime": 50400, "endTime": 54000}}]
    }))
}

async fn add() -> (StatusCode, Json<Value>) {
    (
        StatusCode::CONFLICT,
        Json(json!({"message": "Course ACCT 201 [A] conflicts with an existing schedule event."})),
    )
}

async fn share(Json(body): Json<Value>) -> Json<Value> {
    let token = body["schedule_name"]
        .as_str()
        .unwrap_or_default()
        .replace(' ', "-");
    let events = body["schedule_content"]["events"].as_array().map_or(0, Vec::len);
    Json(json!({"share_url": format!("http://127.0.0.1/s/{token}?events={events}")}))
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/schedule/current", get(current))
        .route("/api/schedule/current/add", post(add))
        .route("/api/schedules/load/{name}", put(load))
        .route("/api/v1/schedules/share", post(share));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn transport() -> Arc<HttpTransport> {
    let base = spawn_stub().await;
    let endpoints = Endpoints {
        primary: base.clone(),
        sharing: base,
    };
    Arc::new(HttpTransport::new(&endpoints).unwrap())
}

#[tokio::test]
async fn sign_in_share_and_conflict_over_http() {
    let session = Session::new(ScheduleStore::new(transport().await));

    let user = session.sign_in("ada", "pw").await.unwrap();
    assert_eq!(user.schedule_names(), vec!["Fall 2024"]);
    let store = session.store();
    assert_eq!(store.snapshot().schedule.unwrap().name, "Fall 2024");

    let path = store.share("Fall 2024").await.unwrap();
    assert_eq!(path, "/s/Fall-2024?events=1");
    assert_eq!(store.snapshot().schedule.unwrap().events.len(), 1);

    let err = store
        .add_course(&CourseRef {
            subject: "acct".into(),
            course_code: 201,
            section: 'a',
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SyncError::Conflict {
            message: "Course ACCT 201 [A] conflicts with an existing schedule event.".into()
        }
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_route() {
    let transport = transport().await;
    let session = Session::new(ScheduleStore::new(Arc::clone(&transport)));

    let err = session.sign_in("ada", "bad").await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Http {
            status: 401,
            message: "Invalid username or password".into()
        }
    );

    let resp = transport
        .send(ApiRequest::primary(Method::Get, ["api", "nope"]))
        .await
        .unwrap();
    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let transport = HttpTransport::new(&Endpoints {
        primary: "http://127.0.0.1:9".into(),
        sharing: "http://127.0.0.1:9".into(),
    })
    .unwrap();

    let err = transport
        .send(ApiRequest::primary(Method::Get, ["api", "schedule", "current"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
}
