//! Error taxonomy for collection draining and refresh.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Crate-level error returned by `paginate()` and cache setup.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error(transparent)]
  Protocol(#[from] ProtocolError),

  #[error("refresh cycles already started")]
  AlreadyStarted,
}

impl Error {
  pub fn is_transport(&self) -> bool {
    matches!(self, Error::Transport(_))
  }
}

/// The request never produced a usable response.
#[derive(Debug, Error)]
pub enum TransportError {
  /// The HTTP client itself could not be constructed
  #[error("failed to build HTTP client: {source}")]
  Client {
    #[source]
    source: BoxError,
  },

  /// Network failure, TLS failure, timeout or unreadable body
  #[error("request to {url} failed: {source}")]
  Network {
    url: String,
    #[source]
    source: BoxError,
  },

  /// Server answered with something other than 200
  #[error("request to {url} returned status {status}")]
  Status { url: String, status: u16 },
}

/// The response body does not have the expected page shape.
#[derive(Debug, Error)]
pub enum ProtocolError {
  #[error("response from {url} is not a JSON object")]
  NotAnObject { url: String },

  #[error("response from {url} has no `{key}` array")]
  MissingCollection { url: String, key: String },

  #[error("response from {url} has no numeric `{field}`")]
  MissingField { url: String, field: &'static str },

  #[error("response from {url} reports a page limit of 0")]
  ZeroLimit { url: String },

  #[error("response from {url} does not advance past offset {requested} (next offset {next})")]
  StalledOffset { url: String, requested: u64, next: u64 },

  #[error("item {index} of `{key}` has no string or numeric id")]
  MissingId { key: String, index: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
