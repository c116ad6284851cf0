// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{error, info};

use crate::error::ApiError;
use crate::fetch::ImgixClient;

/// Used when the file name gives no hint about the image type.
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// A file to place into a source, optionally under a folder.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub source_id: String,
    pub folder: Option<String>,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    /// Reads `path` into memory and uses its file name as the destination name.
    pub async fn from_path(source_id: &str, folder: Option<String>, path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("'{}' has no usable file name", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        Ok(Self {
            source_id: source_id.to_string(),
            folder,
            file_name,
            bytes,
        })
    }

    /// Upload resource path, e.g. `sources/src1/upload/products/shoe.jpg`.
    pub fn resource_path(&self) -> String {
        let folder = self
            .folder
            .as_deref()
            .map(|f| f.trim_matches('/'))
            .filter(|f| !f.is_empty())
            .map(|f| format!("{f}/"))
            .unwrap_or_default();
        format!("sources/{}/upload/{}{}", self.source_id, folder, self.file_name)
    }

    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
    }
}

/// Uploads the file and returns the API's response body.
///
/// The API can answer 2xx with an `errors` document; that is reported as
/// [`ApiError::Rejected`].
pub async fn upload(client: &ImgixClient, request: &UploadRequest) -> Result<String, ApiError> {
    let body = client
        .post_bytes(
            &request.resource_path(),
            request.bytes.clone(),
            &request.content_type(),
        )
        .await?;
    if body.contains("errors") {
        return Err(ApiError::Rejected(body));
    }
    Ok(body)
}

/// Uploads, then calls `refresh` exactly once whatever the outcome.
pub async fn upload_then_refresh<F>(
    client: &ImgixClient,
    request: &UploadRequest,
    refresh: F,
) -> Result<String, ApiError>
where
    F: FnOnce(),
{
    let outcome = upload(client, request).await;
    match &outcome {
        Ok(_) => info!("Uploaded {}", request.resource_path()),
        Err(e) => error!("Upload of {} failed: {}", request.resource_path(), e),
    }
    refresh();
    outcome
}
