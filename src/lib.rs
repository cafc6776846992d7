//! Client for the PagerDuty REST API.
//!
//! [`pagerduty::PagerDutyClient`] drains paged collections (users, escalation
//! policies) into id-keyed maps, and [`cache::RefreshCache`] keeps those maps
//! refreshed in the background.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod pagerduty;

#[cfg(test)]
mod testing;

pub use error::{Error, ProtocolError, Result, TransportError};
