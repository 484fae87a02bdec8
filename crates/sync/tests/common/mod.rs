#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use schedule_core::model::User;
use schedule_sync::{ApiRequest, ApiResponse, Body, Method, ScheduleStore, SyncError, Transport};

type Handler = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// Scripted transport that counts calls and concurrently outstanding requests.
pub struct MockTransport {
    handler: Handler,
    calls: AtomicUsize,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Option<Duration>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
            max_outstanding: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            delay: None,
            gate: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// From now on every request waits for a permit on the returned semaphore.
    pub fn pause(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests().pop().expect("no request sent")
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, SyncError> {
        self.requests.lock().unwrap().push(request.clone());
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        let resp = (self.handler)(&request);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        Ok(resp)
    }
}

pub fn user(name: &str, schedules: &[&str]) -> User {
    User {
        name: name.into(),
        id_number: 1,
        major: "Undeclared".into(),
        year: 1,
        my_schedules: schedules
            .iter()
            .map(|s| format!("users/{name}/schedules/{s}.json"))
            .collect(),
    }
}

pub fn course_json(subject: &str, code: u32, section: &str) -> Value {
    json!({
        "name": format!("{subject} {code}"),
        "days": "MWF",
        "time": {"startTime": 36000, "endTime": 39000},
        "subject": subject,
        "courseCode": code,
        "section": section,
        "professor": {"name": "Graybill, Keith B."},
        "location": "SHAL 316"
    })
}

pub fn schedule_json(name: &str, events: Vec<Value>) -> String {
    json!({"name": name, "events": events}).to_string()
}

pub fn ok(body: impl Into<String>) -> ApiResponse {
    ApiResponse::new(200, body)
}

pub fn status(code: u16, body: impl Into<String>) -> ApiResponse {
    ApiResponse::new(code, body)
}

pub fn json_body(req: &ApiRequest) -> Value {
    match &req.body {
        Body::Json(v) => v.clone(),
        other => panic!("expected json body, got {other:?}"),
    }
}

pub fn is(req: &ApiRequest, method: Method, path: &str) -> bool {
    req.method == method && req.path() == path
}

/// Store over `mock`, signed in as `ada` with the fetch already answered.
pub async fn signed_in(mock: MockTransport) -> (ScheduleStore<MockTransport>, Arc<MockTransport>) {
    let mock = Arc::new(mock);
    let store = ScheduleStore::new(Arc::clone(&mock));
    store
        .set_user(Some(user("ada", &["Fall"])))
        .await
        .expect("initial fetch");
    (store, mock)
}
