// SPDX-License-Identifier: Apache-2.0

use crate::models::asset::Asset;

const SCHEME: &str = "https://";

/// Host suffix appended to a source subdomain.
pub const CDN_SUFFIX: &str = ".imgix.net";

/// Public URL of `origin_path` on the given source subdomain. The path is
/// appended as-is.
pub fn asset_url(domain: &str, origin_path: &str) -> String {
    format!("{SCHEME}{domain}{CDN_SUFFIX}{origin_path}")
}

/// Returns copies of `assets` whose `src` is the full public URL.
pub fn build_asset_urls(assets: &[Asset], domain: &str) -> Vec<Asset> {
    assets
        .iter()
        .map(|asset| Asset {
            src: asset_url(domain, &asset.src),
            attributes: asset.attributes.clone(),
        })
        .collect()
}
