//! Sign-in, sign-up and sign-out against the primary service, and the identity
//! transitions that drive the store.

use std::sync::Arc;

use tracing::{info, warn};

use schedule_core::model::{Schedule, User};
use schedule_core::validation::ValidationError;

use crate::error::SyncError;
use crate::response::{decode, decode_value, failure};
use crate::store::ScheduleStore;
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Auth endpoints.
pub struct AuthClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for AuthClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> AuthClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, SyncError> {
        let username = credentials(username, password)?;
        let req = ApiRequest::primary(Method::Post, ["api", "auth", "login"])
            .query("username", username)
            .query("password", password);
        let resp = self.send_ok(req).await?;
        decode_user(&resp)
    }

    /// Creates the account, then signs in with it.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, SyncError> {
        let name = credentials(username, password)?;
        let req = ApiRequest::primary(Method::Post, ["api", "users"])
            .query("username", name)
            .query("password", password);
        self.send_ok(req).await?;
        info!(user = name, "account created");
        self.login(name, password).await
    }

    pub async fn logout(&self) -> Result<(), SyncError> {
        let req = ApiRequest::primary(Method::Post, ["api", "auth", "logout"]);
        self.send_ok(req).await.map(|_| ())
    }

    async fn send_ok(&self, req: ApiRequest) -> Result<ApiResponse, SyncError> {
        let resp = self.transport.send(req).await?;
        if resp.is_success() {
            Ok(resp)
        } else {
            Err(failure(&resp, None))
        }
    }
}

fn credentials<'a>(username: &'a str, password: &str) -> Result<&'a str, SyncError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials.into());
    }
    Ok(username)
}

/// The service answers with the user record; a record without a name is not one.
fn decode_user(resp: &ApiResponse) -> Result<User, SyncError> {
    let value: serde_json::Value = decode(resp)?;
    let named = value
        .get("name")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|n| !n.trim().is_empty());
    if !named {
        return Err(SyncError::MissingField { field: "name" });
    }
    decode_value(resp, value)
}

/// Identity plus the schedule store it drives.
pub struct Session<T> {
    auth: AuthClient<T>,
    store: ScheduleStore<T>,
}

impl<T: Transport> Session<T> {
    pub fn new(store: ScheduleStore<T>) -> Self {
        Self {
            auth: AuthClient::new(Arc::clone(store.transport())),
            store,
        }
    }

    pub fn store(&self) -> &ScheduleStore<T> {
        &self.store
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.snapshot().user
    }

    /// Signs in and loads the active schedule.
    ///
    /// A failed fetch does not fail the sign-in; it is left in the store's error slot.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<User, SyncError> {
        let user = self.auth.login(username, password).await?;
        self.enter(user.clone()).await;
        Ok(user)
    }

    pub async fn sign_up(&self, username: &str, password: &str) -> Result<User, SyncError> {
        let user = self.auth.register(username, password).await?;
        self.enter(user.clone()).await;
        Ok(user)
    }

    /// Signs out locally even when the service call fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.auth.logout().await {
            warn!(error = %e, "server logout failed, signing out locally");
        }
        // signing out never fetches, so this cannot fail
        let _ = self.store.set_user(None).await;
    }

    async fn enter(&self, user: User) -> Option<Schedule> {
        match self.store.set_user(Some(user)).await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(error = %e, "initial schedule fetch failed");
                None
            }
        }
    }
}
