//! Collection requests and the page shape returned by list endpoints.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::ProtocolError;

/// A single resource as returned by the API. Only `id` is relied upon.
pub type Resource = Value;

/// Resources of one collection keyed by id.
pub type ResultMap = BTreeMap<String, Resource>;

/// Value of an extra query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
  /// Encoded as `key=value`
  One(String),
  /// Encoded as repeated `key[]=v1&key[]=v2`
  Many(Vec<String>),
}

impl From<&str> for ParamValue {
  fn from(value: &str) -> Self {
    ParamValue::One(value.to_string())
  }
}

impl From<String> for ParamValue {
  fn from(value: String) -> Self {
    ParamValue::One(value)
  }
}

impl From<Vec<String>> for ParamValue {
  fn from(values: Vec<String>) -> Self {
    ParamValue::Many(values)
  }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
  fn from(values: [&str; N]) -> Self {
    ParamValue::Many(values.iter().map(|v| v.to_string()).collect())
  }
}

/// Describes one paged collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequest {
  /// Name of the array field in each page (e.g. "users")
  pub collection_key: String,
  /// Path appended to the API endpoint (e.g. "/users")
  pub resource_path: String,
  pub extra_params: BTreeMap<String, ParamValue>,
}

impl CollectionRequest {
  pub fn new(collection_key: impl Into<String>, resource_path: impl Into<String>) -> Self {
    Self {
      collection_key: collection_key.into(),
      resource_path: resource_path.into(),
      extra_params: BTreeMap::new(),
    }
  }

  pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
    self.extra_params.insert(key.into(), value.into());
    self
  }

  /// All users, including their notification rules and contact methods.
  pub fn users() -> Self {
    Self::new("users", "/users").with_param("include", ["notification_rules", "contact_methods"])
  }

  /// Escalation policies with their current on-call users.
  pub fn escalation_policies() -> Self {
    Self::new("escalation_policies", "/escalation_policies/on_call")
  }
}

/// One decoded page of a collection.
#[derive(Debug)]
pub(crate) struct Page {
  pub items: Vec<Resource>,
  pub offset: u64,
  pub limit: u64,
  pub total: u64,
}

impl Page {
  /// Decode a page body, requiring the collection array and the paging fields.
  pub fn from_body(body: Value, collection_key: &str, url: &str) -> Result<Self, ProtocolError> {
    let Value::Object(mut body) = body else {
      return Err(ProtocolError::NotAnObject {
        url: url.to_string(),
      });
    };

    let items = match body.remove(collection_key) {
      Some(Value::Array(items)) => items,
      _ => {
        return Err(ProtocolError::MissingCollection {
          url: url.to_string(),
          key: collection_key.to_string(),
        })
      }
    };

    let offset = number_field(&body, "offset", url)?;
    let limit = number_field(&body, "limit", url)?;
    let total = number_field(&body, "total", url)?;

    if limit == 0 {
      return Err(ProtocolError::ZeroLimit {
        url: url.to_string(),
      });
    }

    Ok(Self {
      items,
      offset,
      limit,
      total,
    })
  }
}

fn number_field(body: &Map<String, Value>, field: &'static str, url: &str) -> Result<u64, ProtocolError> {
  body
    .get(field)
    .and_then(Value::as_u64)
    .ok_or_else(|| ProtocolError::MissingField {
      url: url.to_string(),
      field,
    })
}

/// Key for a resource: string ids as-is, numeric ids as their decimal text.
pub(crate) fn resource_id(resource: &Resource) -> Option<String> {
  match resource.get("id")? {
    Value::String(id) => Some(id.clone()),
    Value::Number(id) => Some(id.to_string()),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_users_request() {
    let request = CollectionRequest::users();
    assert_eq!(request.collection_key, "users");
    assert_eq!(request.resource_path, "/users");
    assert_eq!(
      request.extra_params.get("include"),
      Some(&ParamValue::Many(vec![
        "notification_rules".to_string(),
        "contact_methods".to_string()
      ]))
    );
  }

  #[test]
  fn test_page_from_body() {
    let body = json!({
      "users": [{"id": "P1"}, {"id": "P2"}],
      "offset": 0,
      "limit": 2,
      "total": 5,
    });
    let page = Page::from_body(body, "users", "u").unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.offset, 0);
    assert_eq!(page.limit, 2);
    assert_eq!(page.total, 5);
  }

  #[test]
  fn test_page_missing_collection() {
    let body = json!({"offset": 0, "limit": 1, "total": 1});
    let err = Page::from_body(body, "users", "u").unwrap_err();
    assert!(matches!(err, ProtocolError::MissingCollection { .. }));
  }

  #[test]
  fn test_page_collection_not_array() {
    let body = json!({"users": {"id": "P1"}, "offset": 0, "limit": 1, "total": 1});
    let err = Page::from_body(body, "users", "u").unwrap_err();
    assert!(matches!(err, ProtocolError::MissingCollection { .. }));
  }

  #[test]
  fn test_page_missing_total() {
    let body = json!({"users": [], "offset": 0, "limit": 1});
    let err = Page::from_body(body, "users", "u").unwrap_err();
    assert!(matches!(err, ProtocolError::MissingField { field: "total", .. }));
  }

  #[test]
  fn test_page_zero_limit() {
    let body = json!({"users": [], "offset": 0, "limit": 0, "total": 3});
    let err = Page::from_body(body, "users", "u").unwrap_err();
    assert!(matches!(err, ProtocolError::ZeroLimit { .. }));
  }

  #[test]
  fn test_page_not_object() {
    let err = Page::from_body(json!([1, 2]), "users", "u").unwrap_err();
    assert!(matches!(err, ProtocolError::NotAnObject { .. }));
  }

  #[test]
  fn test_resource_id() {
    assert_eq!(resource_id(&json!({"id": "PABC"})), Some("PABC".to_string()));
    assert_eq!(resource_id(&json!({"id": 42})), Some("42".to_string()));
    assert_eq!(resource_id(&json!({"id": null})), None);
    assert_eq!(resource_id(&json!({"name": "x"})), None);
  }
}
