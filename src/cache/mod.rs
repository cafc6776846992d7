//! Background refresh cache for paged collections.
//!
//! Each named collection is drained on a fixed interval and exposed as an
//! immutable snapshot:
//! - Reads never block and never trigger a fetch
//! - A failed refresh keeps the previous snapshot and is reported to a `RefreshObserver`
//! - Snapshots are swapped whole, so readers never see a partially filled map

mod refresh;
mod traits;

pub use refresh::{RefreshCache, RefreshCacheBuilder, RefreshHandle, DEFAULT_REFRESH_INTERVAL};
pub use traits::{RefreshObserver, Snapshot, TracingObserver};
