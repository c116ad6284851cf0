// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A `data` field that the management API returns either as a single object
/// or as an array of objects, depending on the resource and result size.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Flattens the payload into an ordered sequence, wrapping a lone object.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// One JSON:API resource object as returned under `data`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Free-form attributes. Asset attributes are passed through untouched
    /// apart from the JSON-bearing fields rewritten by the normalizer.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Envelope of every collection response (`sources`, `assets/{id}`).
///
/// Records stay as raw JSON until [`RawCollectionPayload::into_records`] so
/// one malformed record cannot fail the whole response.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RawCollectionPayload {
    #[serde(default)]
    pub data: OneOrMany<Value>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Meta {
    #[serde(default)]
    pub cursor: Option<Cursor>,
}

/// Pagination cursor. `totalRecords` has been observed both as a number and
/// as a numeric string.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    #[serde(default)]
    pub total_records: Option<Value>,
}

impl RawCollectionPayload {
    /// Total record count advertised by `meta.cursor.totalRecords`, if readable.
    pub fn total_records(&self) -> Option<u64> {
        let value = self.meta.as_ref()?.cursor.as_ref()?.total_records.as_ref()?;
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
    }

    /// Consumes the payload and returns its records in order. A `null`
    /// record is dropped; one that does not have the resource object shape
    /// is logged and skipped.
    pub fn into_records(self) -> Vec<RawRecord> {
        self.data
            .into_vec()
            .into_iter()
            .enumerate()
            .filter(|(_, value)| !value.is_null())
            .filter_map(|(position, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping unreadable record #{}: {}", position, e);
                    None
                }
            })
            .collect()
    }
}
