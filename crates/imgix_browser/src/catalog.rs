// SPDX-License-Identifier: Apache-2.0

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::fetch::CollectionApi;
use crate::models::payload::RawCollectionPayload;
use crate::models::source::{RawSourceAttributes, Source};

/// Resource listing every source of the account.
pub const SOURCES_RESOURCE: &str = "sources";

/// Fetches the catalog and keeps the enabled sources.
pub async fn fetch_enabled_sources<A: CollectionApi + ?Sized>(
    api: &A,
) -> Result<Vec<Source>, ApiError> {
    let payload = api.request(SOURCES_RESOURCE).await?;
    Ok(enabled_sources(payload))
}

/// Extracts enabled sources from a catalog payload, in order.
///
/// A source deployed on several subdomains is served from the first one.
pub fn enabled_sources(payload: RawCollectionPayload) -> Vec<Source> {
    let mut sources = Vec::new();
    for record in payload.into_records() {
        let id = record.id.unwrap_or_default();
        let attributes: RawSourceAttributes =
            match serde_json::from_value(serde_json::Value::Object(record.attributes)) {
                Ok(attributes) => attributes,
                Err(e) => {
                    warn!("Skipping source '{}' with unreadable attributes: {}", id, e);
                    continue;
                }
            };
        if !attributes.enabled {
            debug!("Skipping disabled source '{}'", id);
            continue;
        }
        let domain = attributes
            .deployment
            .and_then(|d| d.imgix_subdomains)
            .and_then(|subdomains| subdomains.into_iter().next().flatten())
            .unwrap_or_default();
        sources.push(Source {
            id,
            name: attributes.name.unwrap_or_default(),
            domain,
        });
    }
    sources
}
