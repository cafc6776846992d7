//! Background refresh of named collections.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pagerduty::{CollectionRequest, Paginator, ResultMap};

use super::traits::{RefreshObserver, Snapshot, TracingObserver};

/// Interval used when none is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct CacheEntry {
  name: String,
  request: CollectionRequest,
  snapshot: watch::Sender<Snapshot>,
}

/// Keeps a set of named collections up to date in the background.
///
/// Each collection has its own refresh cycle: drain the collection, swap the
/// snapshot on success, wait the interval, repeat. Readers get the latest
/// complete snapshot without blocking and without triggering a fetch. A failed
/// refresh leaves the previous snapshot in place and the cycle keeps going.
pub struct RefreshCache {
  paginator: Paginator,
  entries: BTreeMap<String, Arc<CacheEntry>>,
  observer: Arc<dyn RefreshObserver>,
  started: AtomicBool,
}

impl RefreshCache {
  pub fn builder(paginator: Paginator) -> RefreshCacheBuilder {
    RefreshCacheBuilder {
      paginator,
      collections: BTreeMap::new(),
      observer: Arc::new(TracingObserver),
    }
  }

  /// Names of the configured collections, in order.
  pub fn names(&self) -> Vec<&str> {
    self.entries.keys().map(String::as_str).collect()
  }

  /// Latest successfully refreshed map for `name`.
  ///
  /// Empty until the first refresh succeeds, and for unknown names.
  pub fn get(&self, name: &str) -> Arc<ResultMap> {
    self
      .entries
      .get(name)
      .map(|entry| Arc::clone(&entry.snapshot.borrow().data))
      .unwrap_or_default()
  }

  /// Latest snapshot for `name` together with its refresh time.
  pub fn snapshot(&self, name: &str) -> Option<Snapshot> {
    self
      .entries
      .get(name)
      .map(|entry| entry.snapshot.borrow().clone())
  }

  /// Receiver that is notified every time the snapshot for `name` is replaced.
  pub fn subscribe(&self, name: &str) -> Option<watch::Receiver<Snapshot>> {
    self.entries.get(name).map(|entry| entry.snapshot.subscribe())
  }

  /// Start the refresh cycles with the default interval.
  pub fn start_default(&self) -> Result<RefreshHandle> {
    self.start(DEFAULT_REFRESH_INTERVAL)
  }

  /// Spawn one refresh cycle per collection. The first refresh runs immediately.
  ///
  /// Must be called from within a tokio runtime. A cache can only be started
  /// once, so a collection never has two cycles in flight.
  pub fn start(&self, interval: Duration) -> Result<RefreshHandle> {
    if self.started.swap(true, Ordering::SeqCst) {
      return Err(Error::AlreadyStarted);
    }

    info!(
      collections = self.entries.len(),
      interval_ms = interval.as_millis() as u64,
      "starting refresh cycles"
    );

    let (shutdown, _) = watch::channel(false);
    let tasks = self
      .entries
      .values()
      .map(|entry| {
        let cycle = RefreshCycle {
          entry: Arc::clone(entry),
          paginator: self.paginator.clone(),
          observer: Arc::clone(&self.observer),
          interval,
          shutdown: shutdown.subscribe(),
          detached: false,
        };
        tokio::spawn(cycle.run())
      })
      .collect();

    Ok(RefreshHandle { shutdown, tasks })
  }
}

pub struct RefreshCacheBuilder {
  paginator: Paginator,
  collections: BTreeMap<String, CollectionRequest>,
  observer: Arc<dyn RefreshObserver>,
}

impl RefreshCacheBuilder {
  /// Add a named collection. A repeated name replaces the earlier request.
  pub fn collection(mut self, name: impl Into<String>, request: CollectionRequest) -> Self {
    self.collections.insert(name.into(), request);
    self
  }

  pub fn observer(mut self, observer: Arc<dyn RefreshObserver>) -> Self {
    self.observer = observer;
    self
  }

  pub fn build(self) -> RefreshCache {
    let entries = self
      .collections
      .into_iter()
      .map(|(name, request)| {
        let (snapshot, _) = watch::channel(Snapshot::default());
        let entry = CacheEntry {
          name: name.clone(),
          request,
          snapshot,
        };
        (name, Arc::new(entry))
      })
      .collect();

    RefreshCache {
      paginator: self.paginator,
      entries,
      observer: self.observer,
      started: AtomicBool::new(false),
    }
  }
}

/// Owned handle to the running refresh cycles.
///
/// Dropping the handle detaches the cycles; they then run for the rest of the process.
pub struct RefreshHandle {
  shutdown: watch::Sender<bool>,
  tasks: Vec<JoinHandle<()>>,
}

impl RefreshHandle {
  /// Stop every cycle and wait for them to exit. An in-flight refresh is allowed to finish.
  pub async fn stop(self) {
    // Err only means every cycle has already exited
    let _ = self.shutdown.send(true);
    for task in self.tasks {
      let _ = task.await;
    }
  }
}

struct RefreshCycle {
  entry: Arc<CacheEntry>,
  paginator: Paginator,
  observer: Arc<dyn RefreshObserver>,
  interval: Duration,
  shutdown: watch::Receiver<bool>,
  /// Set once the handle is dropped; the cycle can no longer be stopped
  detached: bool,
}

impl RefreshCycle {
  async fn run(mut self) {
    loop {
      self.refresh().await;
      if !self.wait().await {
        break;
      }
    }
    debug!(collection = %self.entry.name, "refresh cycle stopped");
  }

  async fn refresh(&self) {
    match self.paginator.paginate(&self.entry.request).await {
      Ok(map) => {
        let count = map.len();
        self.entry.snapshot.send_replace(Snapshot::fresh(map));
        self.observer.refresh_succeeded(&self.entry.name, count);
      }
      Err(err) => self.observer.refresh_failed(&self.entry.name, &err),
    }
  }

  /// Sleep for the interval. Returns false if the cycle should stop instead.
  async fn wait(&mut self) -> bool {
    let sleep = tokio::time::sleep(self.interval);
    tokio::pin!(sleep);

    loop {
      if self.detached {
        (&mut sleep).await;
        return true;
      }

      tokio::select! {
        () = &mut sleep => return true,
        changed = self.shutdown.changed() => match changed {
          Ok(()) if *self.shutdown.borrow() => return false,
          Ok(()) => {}
          Err(_) => self.detached = true,
        },
      }
    }
  }
}
