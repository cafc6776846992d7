//! PagerDuty API access: transport, collection requests and pagination.

mod client;
mod paginator;
mod transport;
mod types;

pub use client::{
  auth_headers, endpoint_for_domain, PagerDutyClient, DEFAULT_TIMEOUT, ESCALATION_POLICIES, USERS,
};
pub use paginator::{Paginator, PAGE_SIZE};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{CollectionRequest, ParamValue, Resource, ResultMap};
