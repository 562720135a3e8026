//! Shared JSON-over-HTTP access to the catalog API.

use crate::error::{CatalogError, Result};
use crate::models::Provider;
use crate::normalize::list_entries;
use bridge_traits::http::{HttpClient, HttpRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Longest response body excerpt kept in an error.
const ERROR_BODY_LIMIT: usize = 512;

/// Thin client over the [`HttpClient`] bridge, rooted at the API base URL.
///
/// Every call is attributed to a provider and an operation name so that
/// failures come back as a single typed [`CatalogError`].
#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/dramabox/latest`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Fetches `path` and parses the body as JSON.
    #[instrument(skip(self, provider, path), fields(provider = %provider))]
    pub async fn get_json(
        &self,
        provider: Provider,
        operation: &'static str,
        path: &str,
    ) -> Result<Value> {
        let url = self.url_for(path);
        debug!(url = %url, "Catalog request");

        let request = HttpRequest::get(url).accept_json().timeout(self.timeout);
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| CatalogError::Fetch {
                provider,
                operation,
                message: e.to_string(),
            })?;

        if !response.is_success() {
            let mut body = String::from_utf8_lossy(&response.body).into_owned();
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(CatalogError::Http {
                provider,
                operation,
                status: response.status,
                body,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| CatalogError::Payload {
            provider,
            operation,
            message: e.to_string(),
        })
    }

    /// Fetches a list endpoint and returns its entries.
    ///
    /// Accepts a bare array or one of the usual envelopes; any other shape is
    /// a payload error.
    pub async fn get_list(
        &self,
        provider: Provider,
        operation: &'static str,
        path: &str,
    ) -> Result<Vec<Value>> {
        let payload = self.get_json(provider, operation, path).await?;
        list_entries(&payload)
            .map(<[Value]>::to_vec)
            .ok_or_else(|| CatalogError::Payload {
                provider,
                operation,
                message: format!("expected a list, got {}", shape_of(&payload)),
            })
    }
}

/// Query-string value, percent-encoded.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value.trim()).into_owned()
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
