//! Drains a paged collection endpoint into an id-keyed map.

use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::form_urlencoded;

use crate::error::{ProtocolError, Result, TransportError};

use super::transport::{HttpRequest, Transport};
use super::types::{resource_id, CollectionRequest, Page, ParamValue, Resource, ResultMap};

/// Largest page the API allows.
pub const PAGE_SIZE: u64 = 100;

/// Issues sequential page requests for a collection and folds them into a map.
#[derive(Clone)]
pub struct Paginator {
  transport: Arc<dyn Transport>,
  endpoint: String,
  headers: Vec<(String, String)>,
}

impl Paginator {
  pub fn new(
    transport: Arc<dyn Transport>,
    endpoint: impl Into<String>,
    headers: Vec<(String, String)>,
  ) -> Self {
    Self {
      transport,
      endpoint: endpoint.into().trim_end_matches('/').to_string(),
      headers,
    }
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  /// Fetch every page of the collection and key the items by id.
  ///
  /// Pages are requested one at a time; the next offset is the page's
  /// reported offset plus its limit, until that reaches the reported total.
  /// Any transport or page-shape failure aborts the drain without retrying.
  /// A page that comes back empty before the total is reached still advances
  /// the offset, so the result may be short.
  #[instrument(level = "debug", skip(self, request), fields(collection = %request.collection_key))]
  pub async fn paginate(&self, request: &CollectionRequest) -> Result<ResultMap> {
    let mut items: Vec<Resource> = Vec::new();
    let mut offset = 0u64;

    loop {
      let url = self.page_url(request, offset);
      let page = self.fetch_page(&url, &request.collection_key).await?;

      debug!(
        offset,
        received = page.items.len(),
        reported_offset = page.offset,
        total = page.total,
        "fetched page"
      );

      items.extend(page.items);

      let next = page.offset.saturating_add(page.limit);
      if next >= page.total {
        break;
      }
      if next <= offset {
        return Err(
          ProtocolError::StalledOffset {
            url,
            requested: offset,
            next,
          }
          .into(),
        );
      }
      offset = next;
    }

    let mut map = ResultMap::new();
    for (index, item) in items.into_iter().enumerate() {
      let id = resource_id(&item).ok_or_else(|| ProtocolError::MissingId {
        key: request.collection_key.clone(),
        index,
      })?;
      map.insert(id, item);
    }

    Ok(map)
  }

  async fn fetch_page(&self, url: &str, collection_key: &str) -> Result<Page> {
    let response = self
      .transport
      .send(HttpRequest {
        method: Method::GET,
        url: url.to_string(),
        headers: self.headers.clone(),
        body: None,
      })
      .await?;

    if response.status != 200 {
      return Err(
        TransportError::Status {
          url: url.to_string(),
          status: response.status,
        }
        .into(),
      );
    }

    Ok(Page::from_body(response.body, collection_key, url)?)
  }

  /// `endpoint + path + "?" + query`, with extra params before `limit` and `offset`.
  pub(crate) fn page_url(&self, request: &CollectionRequest, offset: u64) -> String {
    format!(
      "{}{}?{}",
      self.endpoint,
      request.resource_path,
      encode_query(request, offset)
    )
  }
}

fn encode_query(request: &CollectionRequest, offset: u64) -> String {
  let mut query = form_urlencoded::Serializer::new(String::new());

  for (key, value) in &request.extra_params {
    match value {
      ParamValue::One(v) => {
        query.append_pair(key, v);
      }
      ParamValue::Many(values) => {
        let key = if key.ends_with("[]") {
          key.clone()
        } else {
          format!("{}[]", key)
        };
        for v in values {
          query.append_pair(&key, v);
        }
      }
    }
  }

  query.append_pair("limit", &PAGE_SIZE.to_string());
  query.append_pair("offset", &offset.to_string());
  query.finish()
}
