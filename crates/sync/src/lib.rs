#![forbid(unsafe_code)]

//! Client-side synchronization with the schedule and sharing services.
//!
//! [`ScheduleStore`] holds the one authoritative view of the active schedule and
//! serializes every request that touches it; [`Session`], [`Catalog`] and
//! [`ProfileClient`] cover the rest of the services' surface.

pub mod catalog;
pub mod config;
pub mod error;
pub mod profile;
pub mod response;
pub mod session;
pub mod state;
pub mod store;
pub mod transport;

pub use catalog::Catalog;
pub use config::{ClientConfig, Endpoints, ShareConfig};
pub use error::SyncError;
pub use profile::{AvatarUpload, ProfileClient};
pub use session::{AuthClient, Session};
pub use state::{Category, ErrorSlots, Operation, StoreState};
pub use store::{ScheduleStore, UserHook};
pub use transport::{ApiRequest, ApiResponse, Body, FormPart, HttpTransport, Method, Service, Transport};
