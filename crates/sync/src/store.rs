//! The schedule synchronization store.
//!
//! Every mutator follows the same protocol: check preconditions and take the
//! single-flight guard, issue exactly one request (share issues two, in order),
//! then either replace the whole snapshot with the service's answer or record
//! the error in the operation's category. The guard is an RAII value, so it is
//! released on every path out of the method.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use schedule_core::api::{
    share_path, CreateScheduleResponse, DeleteScheduleResponse, NameRequest, SaveResponse,
    ShareRequest, ShareResponse,
};
use schedule_core::model::{Schedule, User};
use schedule_core::validation::{
    schedule_name, validate_schedule, CourseRef, CustomEventDraft, EventKey, ValidationError,
};

use crate::config::{ShareConfig, DEFAULT_SAVE_FLASH_MS};
use crate::error::SyncError;
use crate::response::{decode_schedule, expect, failure};
use crate::state::{Operation, StoreState, Ticket};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Called with the service's user record whenever an operation changes it.
pub type UserHook = Arc<dyn Fn(&User) + Send + Sync>;

struct Shared {
    state: Mutex<StoreState>,
    updates: watch::Sender<StoreState>,
}

/// Handle to the store. Clones share the same state.
pub struct ScheduleStore<T> {
    shared: Arc<Shared>,
    transport: Arc<T>,
    user_hook: Option<UserHook>,
    save_flash: Duration,
}

impl<T> Clone for ScheduleStore<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            user_hook: self.user_hook.clone(),
            save_flash: self.save_flash,
        }
    }
}

/// Held while an operation is in flight; dropping it releases the guard.
struct Flight<'a, T: Transport> {
    store: &'a ScheduleStore<T>,
    ticket: Ticket,
}

impl<T: Transport> Drop for Flight<'_, T> {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.store.update(|s| s.finish(ticket));
    }
}

impl<T: Transport> ScheduleStore<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let (updates, _) = watch::channel(StoreState::default());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState::default()),
                updates,
            }),
            transport,
            user_hook: None,
            save_flash: Duration::from_millis(DEFAULT_SAVE_FLASH_MS),
        }
    }

    /// How long `save_success` stays set after a save.
    pub fn with_save_flash(mut self, save_flash: Duration) -> Self {
        self.save_flash = save_flash;
        self
    }

    /// Propagates user-record changes (create, delete) to an outside identity holder.
    pub fn with_user_hook(mut self, hook: impl Fn(&User) + Send + Sync + 'static) -> Self {
        self.user_hook = Some(Arc::new(hook));
        self
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }

    /// Receives a snapshot after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.shared.updates.subscribe()
    }

    /// Full link for the last minted share path.
    pub fn share_link(&self, config: &ShareConfig) -> Option<String> {
        self.lock().share_path.as_deref().map(|p| config.link(p))
    }

    /// Dismisses the share link.
    pub fn clear_share(&self) {
        self.update(|s| s.share_path = None);
    }

    /// Identity transition. Signing in fetches the active schedule; signing out
    /// clears everything.
    pub async fn set_user(&self, user: Option<User>) -> Result<Option<Schedule>, SyncError> {
        let signed_in = user.is_some();
        match &user {
            Some(u) => info!(user = %u.name, "signed in"),
            None => info!("signed out"),
        }
        self.update(|s| s.switch_user(user));
        if signed_in {
            self.refresh().await
        } else {
            Ok(None)
        }
    }

    /// Fetches the active schedule. A 404 means there is none and yields the placeholder.
    pub async fn refresh(&self) -> Result<Option<Schedule>, SyncError> {
        let signed_in = self.lock().user.is_some();
        if !signed_in {
            self.update(|s| s.switch_user(None));
            return Ok(None);
        }
        let (flight, ()) = self.begin(Operation::Fetch, Ok(()))?;
        let req = ApiRequest::primary(Method::Get, ["api", "schedule", "current"]);
        let result = match self.transport.send(req).await {
            Ok(resp) if resp.status == 404 => {
                debug!("no active schedule on the service");
                Ok(Schedule::placeholder())
            }
            Ok(resp) if resp.is_success() => decode_schedule(&resp),
            Ok(resp) => Err(failure(&resp, None)),
            Err(e) => Err(e),
        };
        self.replace_schedule(&flight, result).map(Some)
    }

    pub async fn add_course(&self, course: &CourseRef) -> Result<Schedule, SyncError> {
        let (flight, body) = self.begin(Operation::AddCourse, course.validate())?;
        info!(subject = %body.subject, course_code = body.course_code, section = %body.section, "adding course");
        let req = ApiRequest::primary(Method::Post, ["api", "schedule", "current", "add"]).json(&body);
        let result = self.schedule_call(&flight, req).await;
        self.replace_schedule(&flight, result)
    }

    pub async fn remove_course(&self, course: &CourseRef) -> Result<Schedule, SyncError> {
        let (flight, body) = self.begin(Operation::RemoveCourse, course.validate())?;
        info!(course_code = body.course_code, "removing course");
        let code = body.course_code.to_string();
        let req = ApiRequest::primary(
            Method::Delete,
            ["api", "schedule", "current", "remove", code.as_str()],
        );
        let result = self.schedule_call(&flight, Ok(req)).await;
        self.replace_schedule(&flight, result)
    }

    pub async fn remove_event(&self, key: &EventKey) -> Result<Schedule, SyncError> {
        let (flight, body) = self.begin(Operation::RemoveEvent, key.validate())?;
        info!(name = %body.name, "removing event");
        let req = ApiRequest::primary(Method::Post, ["api", "schedule", "current", "remove-event"])
            .json(&body);
        let result = self.schedule_call(&flight, req).await;
        self.replace_schedule(&flight, result)
    }

    pub async fn add_custom_event(&self, draft: &CustomEventDraft) -> Result<Schedule, SyncError> {
        let (flight, body) = self.begin(Operation::AddCustomEvent, draft.validate())?;
        info!(name = %body.name, days = %body.days, "adding custom event");
        let req = ApiRequest::primary(Method::Post, ["api", "schedule", "current", "add-custom"])
            .json(&body);
        let result = self.schedule_call(&flight, req).await;
        self.replace_schedule(&flight, result)
    }

    /// Steps back in the service's history and resyncs.
    pub async fn undo(&self) -> Result<Schedule, SyncError> {
        self.history(Operation::Undo, "undo").await
    }

    /// Steps forward in the service's history and resyncs.
    pub async fn redo(&self) -> Result<Schedule, SyncError> {
        self.history(Operation::Redo, "redo").await
    }

    async fn history(&self, op: Operation, action: &str) -> Result<Schedule, SyncError> {
        let (flight, ()) = self.begin(op, Ok(()))?;
        let req = ApiRequest::primary(Method::Post, ["api", "schedule", "current", action]);
        let result = self.schedule_call(&flight, Ok(req)).await;
        self.replace_schedule(&flight, result)
    }

    /// Persists the active schedule on the service. Returns the service's message.
    pub async fn save(&self) -> Result<Option<String>, SyncError> {
        let (flight, ()) = self.begin(Operation::Save, Ok(()))?;
        let req = ApiRequest::primary(Method::Post, ["api", "schedules", "save"]);
        let result = match self.transport.send(req).await {
            Ok(resp) => expect::<SaveResponse>(&resp, None),
            Err(e) => Err(e),
        };
        let ticket = flight.ticket;
        let result = self.record(ticket, result, |_, _| {});
        let saved = result?;
        if let Some(generation) = self.update(|s| s.mark_saved(ticket)) {
            self.schedule_save_flash(generation);
        }
        Ok(saved.message)
    }

    fn schedule_save_flash(&self, generation: u64) {
        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(store.save_flash).await;
            let cleared = store.update(|s| s.clear_save_success(generation));
            if cleared {
                debug!(generation, "save flag cleared");
            }
        });
    }

    /// Makes a saved schedule the active one.
    pub async fn load(&self, name: &str) -> Result<Schedule, SyncError> {
        let (flight, name) = self.begin(Operation::Load, schedule_name(name))?;
        info!(schedule = %name, "loading schedule");
        let result = self.load_by_name(&flight, &name).await;
        self.replace_schedule(&flight, result)
    }

    /// Creates an empty schedule and makes it active.
    pub async fn create(&self, name: &str) -> Result<Schedule, SyncError> {
        let (flight, name) = self.begin(Operation::Create, schedule_name(name))?;
        info!(schedule = %name, "creating schedule");
        let req = ApiRequest::primary(Method::Post, ["api", "schedules", "new"])
            .json(&NameRequest { name });
        let result = match self.schedule_call_raw(req).await {
            Ok(resp) => expect::<CreateScheduleResponse>(&resp, Operation::Create.conflict_message())
                .and_then(|r| {
                    let schedule = r.schedule.ok_or(SyncError::MissingField { field: "schedule" })?;
                    validate_schedule(&schedule)?;
                    Ok((schedule, r.user))
                }),
            Err(e) => Err(e),
        };
        let ((schedule, user), current) =
            self.record_current(flight.ticket, result, |s, (schedule, user)| {
                s.schedule = Some(schedule.clone());
                if let Some(user) = user {
                    s.user = Some(user.clone());
                }
            })?;
        drop(flight);
        if current {
            self.notify_user(user.as_ref());
        }
        Ok(schedule)
    }

    /// Deletes a saved schedule. Deleting the active one leaves the placeholder.
    pub async fn delete(&self, name: &str) -> Result<Option<String>, SyncError> {
        let (flight, name) = self.begin(Operation::Delete, schedule_name(name))?;
        info!(schedule = %name, "deleting schedule");
        let req = ApiRequest::primary(Method::Delete, ["api", "schedules", name.as_str()]);
        let result = match self.schedule_call_raw(Ok(req)).await {
            Ok(resp) => expect::<DeleteScheduleResponse>(&resp, None),
            Err(e) => Err(e),
        };
        let (resp, current) = self.record_current(flight.ticket, result, |s, resp| {
            if let Some(user) = &resp.user {
                s.user = Some(user.clone());
            }
            if s.schedule.as_ref().is_some_and(|active| active.name == name) {
                s.schedule = Some(Schedule::placeholder());
            }
        })?;
        drop(flight);
        if current {
            self.notify_user(resp.user.as_ref());
        }
        Ok(resp.message)
    }

    /// Mints a share link for a saved schedule.
    ///
    /// The schedule is force-loaded first so the sharing service receives its
    /// current content; the loaded schedule also becomes the active snapshot.
    /// Only the path of the returned URL is kept.
    pub async fn share(&self, name: &str) -> Result<String, SyncError> {
        let (flight, name) = self.begin(Operation::Share, schedule_name(name))?;
        let username = self.lock().user.as_ref().map(|u| u.name.clone());
        let Some(username) = username else {
            let e = SyncError::NotAuthenticated;
            return self.record(flight.ticket, Err(e), |_, _: &String| {});
        };
        info!(schedule = %name, "sharing schedule");

        let loaded = self.load_by_name(&flight, &name).await;
        let schedule = self.replace_schedule(&flight, loaded)?;

        let result = match ApiRequest::sharing(Method::Post, ["api", "v1", "schedules", "share"]).json(
            &ShareRequest {
                username,
                schedule_name: name,
                schedule_content: schedule,
            },
        ) {
            Ok(req) => match self.transport.send(req).await {
                Ok(resp) => expect::<ShareResponse>(&resp, None).and_then(|r| {
                    r.share_url
                        .filter(|u| !u.trim().is_empty())
                        .map(|u| share_path(&u))
                        .ok_or(SyncError::MissingField { field: "share_url" })
                }),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.record(flight.ticket, result, |s, path| {
            s.share_path = Some(path.clone())
        })
    }

    async fn load_by_name(&self, _flight: &Flight<'_, T>, name: &str) -> Result<Schedule, SyncError> {
        let req = ApiRequest::primary(Method::Put, ["api", "schedules", "load", name]);
        let resp = self.transport.send(req).await?;
        if resp.is_success() {
            decode_schedule(&resp)
        } else {
            Err(failure(&resp, None))
        }
    }

    async fn schedule_call(
        &self,
        flight: &Flight<'_, T>,
        req: Result<ApiRequest, SyncError>,
    ) -> Result<Schedule, SyncError> {
        let resp = self.schedule_call_raw(req).await?;
        if resp.is_success() {
            decode_schedule(&resp)
        } else {
            Err(failure(&resp, flight.ticket.op.conflict_message()))
        }
    }

    async fn schedule_call_raw(
        &self,
        req: Result<ApiRequest, SyncError>,
    ) -> Result<ApiResponse, SyncError> {
        self.transport.send(req?).await
    }

    fn replace_schedule(
        &self,
        flight: &Flight<'_, T>,
        result: Result<Schedule, SyncError>,
    ) -> Result<Schedule, SyncError> {
        self.record(flight.ticket, result, |s, schedule| {
            s.schedule = Some(schedule.clone())
        })
    }

    /// Applies an outcome to the state and logs it.
    fn record<R>(
        &self,
        ticket: Ticket,
        result: Result<R, SyncError>,
        apply: impl FnOnce(&mut StoreState, &R),
    ) -> Result<R, SyncError> {
        self.record_current(ticket, result, apply).map(|(value, _)| value)
    }

    /// Like `record`, also reporting whether the ticket was still current. A
    /// stale success is returned but leaves the state untouched.
    fn record_current<R>(
        &self,
        ticket: Ticket,
        result: Result<R, SyncError>,
        apply: impl FnOnce(&mut StoreState, &R),
    ) -> Result<(R, bool), SyncError> {
        let current = self.update(|s| {
            let current = s.is_current(ticket);
            match &result {
                Ok(value) if current => apply(s, value),
                Ok(_) => {}
                Err(e) => s.fail(ticket, e),
            }
            current
        });
        match &result {
            Ok(_) if current => info!(op = %ticket.op, "operation succeeded"),
            Ok(_) => debug!(op = %ticket.op, "result dropped, user changed while in flight"),
            Err(e) => warn!(op = %ticket.op, error = %e, "operation failed"),
        }
        result.map(|value| (value, current))
    }

    fn begin<A>(
        &self,
        op: Operation,
        args: Result<A, ValidationError>,
    ) -> Result<(Flight<'_, T>, A), SyncError> {
        let mut state = self.lock();
        let before = state.clone();
        let result = state.begin(op, args);
        if *state != before {
            self.shared.updates.send_replace(state.clone());
        }
        drop(state);
        match result {
            Ok((ticket, args)) => Ok((
                Flight {
                    store: self,
                    ticket,
                },
                args,
            )),
            Err(SyncError::Busy(current)) => {
                debug!(op = %op, in_flight = %current, "rejected, another operation is in flight");
                Err(SyncError::Busy(current))
            }
            Err(e) => {
                warn!(op = %op, error = %e, "rejected");
                Err(e)
            }
        }
    }

    fn notify_user(&self, user: Option<&User>) {
        if let (Some(hook), Some(user)) = (&self.user_hook, user) {
            hook(user);
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.lock();
        let out = f(&mut state);
        self.shared.updates.send_replace(state.clone());
        out
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
