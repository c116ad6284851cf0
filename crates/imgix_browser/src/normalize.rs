// SPDX-License-Identifier: Apache-2.0

//! Turns collection payloads into [`Asset`] lists.
//!
//! This is the only place that deals with the API returning a lone object
//! instead of an array under `data`, and the only place that rewrites the
//! JSON-bearing asset attributes.

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::models::asset::Asset;
use crate::models::payload::{RawCollectionPayload, RawRecord};
use crate::notices::ErrorRecord;

/// Attributes that are exposed as serialized JSON strings.
const JSON_FIELDS: [&str; 2] = ["custom_fields", "tags"];

/// Result of normalizing one asset listing response.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPage {
    pub assets: Vec<Asset>,
    /// `meta.cursor.totalRecords`, or 0 when it could not be read.
    pub total_records: u64,
    /// The caller-supplied fallback, present when the record count was
    /// missing, unreadable or zero.
    pub missing_total: Option<ErrorRecord>,
}

/// Normalizes the outcome of an asset listing request.
///
/// Transport and decoding failures are logged and produce an empty page;
/// they never propagate past this function.
pub fn normalize_collection(
    outcome: Result<RawCollectionPayload, ApiError>,
    fallback: ErrorRecord,
) -> NormalizedPage {
    let payload = match outcome {
        Ok(payload) => payload,
        Err(e) => {
            error!("Asset request failed: {}", e);
            return NormalizedPage {
                assets: Vec::new(),
                total_records: 0,
                missing_total: Some(fallback),
            };
        }
    };

    let total_records = payload.total_records().unwrap_or(0);
    let assets = normalize_records(payload.into_records());
    debug!(
        "Normalized {} assets (total records: {})",
        assets.len(),
        total_records
    );

    NormalizedPage {
        assets,
        total_records,
        missing_total: (total_records == 0).then_some(fallback),
    }
}

/// Maps raw records to assets, in order.
pub fn normalize_records(records: Vec<RawRecord>) -> Vec<Asset> {
    records
        .into_iter()
        .map(|record| {
            let mut attributes = record.attributes;
            stringify_json_fields(&mut attributes);
            let src = attributes
                .get("origin_path")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Asset { src, attributes }
        })
        .collect()
}

/// Replaces `custom_fields`, `tags` and, when present, `colors.dominant_colors`
/// with their JSON serialization, after rewriting every `null` to `""`.
///
/// A missing or null `custom_fields`/`tags` becomes the serialization of an
/// empty string (`""` including the quotes), so both are always strings.
pub fn stringify_json_fields(attributes: &mut Map<String, Value>) {
    for field in JSON_FIELDS {
        let slot = attributes.entry(field).or_insert(Value::Null);
        let serialized = serialize_without_nulls(slot.take());
        *slot = Value::String(serialized);
    }

    if let Some(Value::Object(colors)) = attributes.get_mut("colors") {
        if let Some(dominant) = colors.get_mut("dominant_colors") {
            if !dominant.is_null() {
                let serialized = serialize_without_nulls(dominant.take());
                *dominant = Value::String(serialized);
            }
        }
    }
}

fn serialize_without_nulls(value: Value) -> String {
    replace_nulls(value).to_string()
}

fn replace_nulls(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Array(items) => Value::Array(items.into_iter().map(replace_nulls).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, replace_nulls(value)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::ErrorKind;
    use serde_json::json;

    fn payload(value: Value) -> RawCollectionPayload {
        serde_json::from_value(value).unwrap()
    }

    fn record(path: &str) -> Value {
        json!({
            "id": path,
            "type": "assets",
            "attributes": {
                "origin_path": path,
                "custom_fields": { "alt": null, "credit": "me" },
                "tags": { "cat": 0.98, "unknown": null },
                "colors": { "dominant_colors": { "vibrant": null, "muted": "#aabbcc" } },
                "media_width": 640
            }
        })
    }

    #[test]
    fn single_object_equals_one_element_array() {
        let single = normalize_collection(
            Ok(payload(json!({ "data": record("/a.jpg"), "meta": { "cursor": { "totalRecords": 1 } } }))),
            ErrorRecord::no_origin_images(),
        );
        let wrapped = normalize_collection(
            Ok(payload(json!({ "data": [record("/a.jpg")], "meta": { "cursor": { "totalRecords": 1 } } }))),
            ErrorRecord::no_origin_images(),
        );
        assert_eq!(single, wrapped);
        assert_eq!(single.assets.len(), 1);
        assert_eq!(single.assets[0].src, "/a.jpg");
    }

    #[test]
    fn json_fields_become_strings_without_nulls() {
        let page = normalize_collection(
            Ok(payload(json!({ "data": [record("/a.jpg")], "meta": { "cursor": { "totalRecords": 1 } } }))),
            ErrorRecord::no_origin_images(),
        );
        let asset = &page.assets[0];
        assert_eq!(
            asset.attribute_str("custom_fields"),
            Some(r#"{"alt":"","credit":"me"}"#)
        );
        assert_eq!(asset.attribute_str("tags"), Some(r#"{"cat":0.98,"unknown":""}"#));
        assert_eq!(
            asset.attributes["colors"]["dominant_colors"],
            Value::String(r##"{"vibrant":"","muted":"#aabbcc"}"##.into())
        );
        assert_eq!(asset.attributes["media_width"], json!(640));
    }

    #[test]
    fn nested_nulls_are_replaced_recursively() {
        let mut attributes = Map::new();
        attributes.insert(
            "custom_fields".into(),
            json!({ "a": [null, { "b": null }], "c": { "d": { "e": null } } }),
        );
        stringify_json_fields(&mut attributes);
        assert_eq!(
            attributes["custom_fields"],
            Value::String(r#"{"a":["",{"b":""}],"c":{"d":{"e":""}}}"#.into())
        );
    }

    #[test]
    fn missing_or_null_fields_are_still_strings() {
        let mut attributes = Map::new();
        attributes.insert("tags".into(), Value::Null);
        stringify_json_fields(&mut attributes);
        assert_eq!(attributes["tags"], Value::String("\"\"".into()));
        assert_eq!(attributes["custom_fields"], Value::String("\"\"".into()));
        assert!(!attributes.contains_key("colors"));
    }

    #[test]
    fn colors_without_dominant_colors_are_left_alone() {
        let mut attributes = Map::new();
        attributes.insert("colors".into(), json!({ "palette": [null] }));
        stringify_json_fields(&mut attributes);
        assert_eq!(attributes["colors"], json!({ "palette": [null] }));
    }

    #[test]
    fn missing_total_signals_the_fallback() {
        let page = normalize_collection(
            Ok(payload(json!({ "data": [record("/a.jpg")] }))),
            ErrorRecord::no_search_results(),
        );
        assert_eq!(page.total_records, 0);
        assert_eq!(page.assets.len(), 1);
        assert_eq!(
            page.missing_total.map(|e| e.kind),
            Some(ErrorKind::NoSearchResults)
        );
    }

    #[test]
    fn present_total_has_no_fallback() {
        let page = normalize_collection(
            Ok(payload(json!({ "data": [], "meta": { "cursor": { "totalRecords": 40 } } }))),
            ErrorRecord::no_origin_images(),
        );
        assert_eq!(page.total_records, 40);
        assert!(page.missing_total.is_none());
    }

    #[test]
    fn transport_failure_degrades_to_an_empty_page() {
        let err = ApiError::Status {
            status: 500,
            detail: "boom".into(),
        };
        let page = normalize_collection(Err(err), ErrorRecord::no_origin_images());
        assert!(page.assets.is_empty());
        assert_eq!(page.total_records, 0);
        assert_eq!(
            page.missing_total.map(|e| e.kind),
            Some(ErrorKind::NoOriginImages)
        );
    }

    #[test]
    fn bad_record_is_dropped_and_the_page_survives() {
        let page = normalize_collection(
            Ok(payload(json!({
                "data": [record("/a.jpg"), { "id": 7, "attributes": {} }, record("/b.jpg")],
                "meta": { "cursor": { "totalRecords": 3 } }
            }))),
            ErrorRecord::no_origin_images(),
        );
        let srcs: Vec<_> = page.assets.iter().map(|a| a.src.as_str()).collect();
        assert_eq!(srcs, vec!["/a.jpg", "/b.jpg"]);
        assert_eq!(page.total_records, 3);
        assert!(page.missing_total.is_none());
    }

    #[test]
    fn record_without_origin_path_has_empty_src() {
        let assets = normalize_records(vec![RawRecord::default()]);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].src, "");
    }
}
