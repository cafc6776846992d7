//! Minimal HTTP request interface and its reqwest implementation.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use crate::error::TransportError;

/// A request as seen by the transport: method, URL, headers and optional JSON body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: String,
  pub headers: Vec<(String, String)>,
  pub body: Option<Value>,
}

/// Status code plus decoded JSON body. Non-200 responses carry `Value::Null`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Value,
}

/// Sends one request. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new(timeout: Duration) -> Result<Self, TransportError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| TransportError::Client {
        source: Box::new(e),
      })?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let network = |e: reqwest::Error| TransportError::Network {
      url: request.url.clone(),
      source: Box::new(e),
    };

    let mut builder = self.client.request(request.method.clone(), &request.url);
    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let response = builder.send().await.map_err(network)?;
    let status = response.status().as_u16();

    // Error bodies are not needed, the status alone is reported
    if status != 200 {
      return Ok(HttpResponse {
        status,
        body: Value::Null,
      });
    }

    let body = response.json::<Value>().await.map_err(network)?;
    Ok(HttpResponse { status, body })
  }
}
