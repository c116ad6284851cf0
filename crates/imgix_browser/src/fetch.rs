// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::debug;
use url::Url;

use crate::config::Credentials;
use crate::error::ApiError;
use crate::models::payload::RawCollectionPayload;

/// Production endpoint of the imgix management API.
pub const DEFAULT_BASE_URL: &str = "https://api.imgix.com/api/v1/";

const JSON_API: &str = "application/vnd.api+json";
const PLUGIN_ORIGIN_HEADER: &str = "X-imgix-plugin-origin";

/// Read access to collection resources (`sources`, `assets/{id}?...`).
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// Fetches `resource`, a path relative to the API base.
    async fn request(&self, resource: &str) -> Result<RawCollectionPayload, ApiError>;
}

/// reqwest-backed client for the management API.
#[derive(Debug, Clone)]
pub struct ImgixClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    plugin_origin: String,
}

impl ImgixClient {
    pub fn new(credentials: &Credentials, base_url: Url, plugin_origin: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: credentials.api_key.clone(),
            plugin_origin: plugin_origin.into(),
        }
    }

    fn auth_header(&self) -> Result<HeaderValue, ApiError> {
        Ok(HeaderValue::from_str(&format!("Bearer {}", self.api_key))?)
    }

    pub(crate) fn endpoint(&self, resource: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(resource)
            .map_err(|source| ApiError::InvalidPath {
                path: resource.to_string(),
                source,
            })
    }

    /// Sends `body` to `resource` and returns the response text.
    pub(crate) async fn post_bytes(
        &self,
        resource: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(resource)?;
        debug!("POST {} ({} bytes)", url, body.len());
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.auth_header()?)
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, content_type)
            .header(PLUGIN_ORIGIN_HEADER, &self.plugin_origin)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &text));
        }
        Ok(text)
    }
}

#[async_trait]
impl CollectionApi for ImgixClient {
    async fn request(&self, resource: &str) -> Result<RawCollectionPayload, ApiError> {
        let url = self.endpoint(resource)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth_header()?)
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, JSON_API)
            .header(PLUGIN_ORIGIN_HEADER, &self.plugin_origin)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}
