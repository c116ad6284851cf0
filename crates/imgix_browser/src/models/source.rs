// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// An enabled image source that assets can be browsed from.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Management API identifier, used in `assets/{id}` requests.
    pub id: String,
    /// Human-readable source name.
    pub name: String,
    /// imgix subdomain serving the source's images.
    pub domain: String,
}

/// Attributes of a raw `sources` record that the catalog cares about.
///
/// The API sends `null` for names and subdomains it has no value for.
#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct RawSourceAttributes {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub deployment: Option<Deployment>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct Deployment {
    #[serde(default)]
    pub imgix_subdomains: Option<Vec<Option<String>>>,
}
