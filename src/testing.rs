//! In-memory transport that replays scripted responses.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::pagerduty::{HttpRequest, HttpResponse, Transport};

type Scripted = Result<HttpResponse, TransportError>;

/// Replays queued responses in order and records every request.
///
/// A response queued with a route only answers requests whose URL contains
/// that route. An exhausted script answers with a network error.
#[derive(Default)]
pub struct ScriptedTransport {
  responses: Mutex<VecDeque<(Option<String>, Scripted)>>,
  requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_ok(&self, body: Value) {
    self.push(Ok(HttpResponse { status: 200, body }));
  }

  pub fn push_status(&self, status: u16) {
    self.push(Ok(HttpResponse {
      status,
      body: Value::Null,
    }));
  }

  pub fn push_network_error(&self, message: &str) {
    self.push(Err(TransportError::Network {
      url: String::new(),
      source: message.to_string().into(),
    }));
  }

  pub fn push_ok_for(&self, route: &str, body: Value) {
    self.push_routed(Some(route), Ok(HttpResponse { status: 200, body }));
  }

  pub fn push_status_for(&self, route: &str, status: u16) {
    self.push_routed(
      Some(route),
      Ok(HttpResponse {
        status,
        body: Value::Null,
      }),
    );
  }

  fn push(&self, response: Scripted) {
    self.push_routed(None, response);
  }

  fn push_routed(&self, route: Option<&str>, response: Scripted) {
    self
      .responses
      .lock()
      .unwrap()
      .push_back((route.map(String::from), response));
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn urls(&self) -> Vec<String> {
    self.requests().into_iter().map(|r| r.url).collect()
  }

  pub fn request_count(&self) -> usize {
    self.requests.lock().unwrap().len()
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let url = request.url.clone();
    self.requests.lock().unwrap().push(request);

    let next = {
      let mut responses = self.responses.lock().unwrap();
      let index = responses
        .iter()
        .position(|(route, _)| route.as_deref().map_or(true, |r| url.contains(r)));
      index
        .and_then(|index| responses.remove(index))
        .map(|(_, response)| response)
    };
    match next {
      Some(Ok(response)) => Ok(response),
      Some(Err(TransportError::Network { source, .. })) => Err(TransportError::Network { url, source }),
      Some(Err(err)) => Err(err),
      None => Err(TransportError::Network {
        url,
        source: "no scripted response left".into(),
      }),
    }
  }
}
