#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared wire models, validation and calendar layout for the schedule client.

pub mod api;
pub mod calendar;
pub mod model;
pub mod route;
pub mod validation;

mod util;

pub use util::{format_clock, parse_clock, SECONDS_PER_DAY};
