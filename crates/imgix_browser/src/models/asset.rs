// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One image record of a source.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Asset {
    /// Origin path as returned by the API, or the full image URL once the
    /// URL builder has run.
    pub src: String,
    /// Asset metadata. `custom_fields`, `tags` and `colors.dominant_colors`
    /// hold serialized JSON strings after normalization.
    pub attributes: Map<String, Value>,
}

impl Asset {
    /// String-valued attribute lookup.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}
