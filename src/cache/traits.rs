//! Snapshot type and the observability hook for refresh cycles.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Error;
use crate::pagerduty::ResultMap;

/// A complete, immutable view of one collection.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  /// The collection keyed by id
  pub data: Arc<ResultMap>,
  /// When the refresh that produced this snapshot completed (None before the first success)
  pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
  /// Snapshot produced by a refresh that just completed.
  pub fn fresh(data: ResultMap) -> Self {
    Self {
      data: Arc::new(data),
      refreshed_at: Some(Utc::now()),
    }
  }

  /// Whether any refresh has succeeded yet.
  pub fn is_loaded(&self) -> bool {
    self.refreshed_at.is_some()
  }
}

/// Receives the outcome of every refresh cycle. Never affects scheduling.
pub trait RefreshObserver: Send + Sync {
  fn refresh_succeeded(&self, _collection: &str, _count: usize) {}

  fn refresh_failed(&self, collection: &str, error: &Error);
}

/// Reports refresh outcomes as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RefreshObserver for TracingObserver {
  fn refresh_succeeded(&self, collection: &str, count: usize) {
    debug!(collection, count, "refreshed collection");
  }

  fn refresh_failed(&self, collection: &str, error: &Error) {
    warn!(collection, error = %error, "refresh failed, keeping previous snapshot");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_default_snapshot_is_empty() {
    let snapshot = Snapshot::default();
    assert!(snapshot.data.is_empty());
    assert!(!snapshot.is_loaded());
  }

  #[test]
  fn test_fresh_snapshot() {
    let mut map = ResultMap::new();
    map.insert("P1".to_string(), json!({"id": "P1"}));

    let snapshot = Snapshot::fresh(map);
    assert!(snapshot.is_loaded());
    assert_eq!(snapshot.data.len(), 1);
  }
}
