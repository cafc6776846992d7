use std::sync::Arc;
use std::time::Duration;

use crate::cache::{RefreshCache, RefreshObserver, TracingObserver};
use crate::error::Result;

use super::paginator::Paginator;
use super::transport::{ReqwestTransport, Transport};
use super::types::{CollectionRequest, ResultMap};

/// Cache name of the user collection.
pub const USERS: &str = "users";
/// Cache name of the escalation policy collection.
pub const ESCALATION_POLICIES: &str = "escalation_policies";

/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// PagerDuty API client
#[derive(Clone)]
pub struct PagerDutyClient {
  paginator: Paginator,
}

impl PagerDutyClient {
  /// Client for `https://<domain>.pagerduty.com/api/v1` over reqwest.
  pub fn new(domain: &str, token: &str) -> Result<Self> {
    let transport = ReqwestTransport::new(DEFAULT_TIMEOUT)?;
    Ok(Self::with_transport(
      endpoint_for_domain(domain),
      token,
      Arc::new(transport),
    ))
  }

  pub fn with_transport(endpoint: impl Into<String>, token: &str, transport: Arc<dyn Transport>) -> Self {
    Self {
      paginator: Paginator::new(transport, endpoint, auth_headers(token)),
    }
  }

  pub fn endpoint(&self) -> &str {
    self.paginator.endpoint()
  }

  /// Drain an arbitrary collection.
  pub async fn paginate(&self, request: &CollectionRequest) -> Result<ResultMap> {
    self.paginator.paginate(request).await
  }

  /// All users keyed by id, with notification rules and contact methods.
  pub async fn users(&self) -> Result<ResultMap> {
    self.paginate(&CollectionRequest::users()).await
  }

  /// On-call escalation policies keyed by id.
  pub async fn escalation_policies(&self) -> Result<ResultMap> {
    self.paginate(&CollectionRequest::escalation_policies()).await
  }

  /// Refresh cache over users and escalation policies, logging failures.
  pub fn refresh_cache(&self) -> RefreshCache {
    self.refresh_cache_with_observer(Arc::new(TracingObserver))
  }

  pub fn refresh_cache_with_observer(&self, observer: Arc<dyn RefreshObserver>) -> RefreshCache {
    RefreshCache::builder(self.paginator.clone())
      .collection(USERS, CollectionRequest::users())
      .collection(ESCALATION_POLICIES, CollectionRequest::escalation_policies())
      .observer(observer)
      .build()
  }
}

pub fn endpoint_for_domain(domain: &str) -> String {
  format!("https://{}.pagerduty.com/api/v1", domain)
}

/// Headers attached unchanged to every request.
pub fn auth_headers(token: &str) -> Vec<(String, String)> {
  vec![
    ("Authorization".to_string(), format!("Token token={}", token)),
    ("Content-Type".to_string(), "application/json".to_string()),
  ]
}
