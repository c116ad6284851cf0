// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures: payload builders and an in-memory `CollectionApi`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use imgix_browser::{ApiError, CollectionApi, Credentials, RawCollectionPayload, Source};
use serde_json::{Value, json};

pub fn verified() -> Credentials {
    Credentials {
        api_key: "test-key".into(),
        successfully_verified: true,
    }
}

pub fn unverified() -> Credentials {
    Credentials {
        api_key: "test-key".into(),
        successfully_verified: false,
    }
}

pub fn source(id: &str, domain: &str) -> Source {
    Source {
        id: id.into(),
        name: domain.into(),
        domain: domain.into(),
    }
}

/// `sources` payload; each entry is `(id, name, subdomain, enabled)`.
pub fn sources_payload(entries: &[(&str, &str, &str, bool)]) -> Value {
    let data: Vec<Value> = entries
        .iter()
        .map(|(id, name, domain, enabled)| {
            json!({
                "id": id,
                "type": "sources",
                "attributes": {
                    "enabled": enabled,
                    "name": name,
                    "deployment": { "imgix_subdomains": [domain] }
                }
            })
        })
        .collect();
    json!({ "data": data })
}

/// Asset listing payload with the given origin paths and advertised total.
pub fn assets_payload(paths: &[&str], total: Option<u64>) -> Value {
    let data: Vec<Value> = paths
        .iter()
        .map(|path| {
            json!({
                "id": path,
                "type": "assets",
                "attributes": {
                    "origin_path": path,
                    "custom_fields": null,
                    "tags": { "label": null }
                }
            })
        })
        .collect();
    match total {
        Some(total) => json!({ "data": data, "meta": { "cursor": { "totalRecords": total } } }),
        None => json!({ "data": data }),
    }
}

pub fn browse_path(source_id: &str, page: usize) -> String {
    format!("assets/{source_id}?page[number]={page}&page[size]=18")
}

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    reply: Result<Value, u16>,
}

/// `CollectionApi` answering from a table of resource paths.
///
/// Unknown resources answer HTTP 404. Every request is recorded.
pub struct ScriptedApi {
    replies: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, resource: &str, payload: Value) -> Self {
        self.respond_after(resource, Duration::ZERO, payload)
    }

    pub fn respond_after(self, resource: &str, delay: Duration, payload: Value) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                resource.to_string(),
                Scripted {
                    delay,
                    reply: Ok(payload),
                },
            );
        self
    }

    pub fn fail(self, resource: &str, status: u16) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                resource.to_string(),
                Scripted {
                    delay: Duration::ZERO,
                    reply: Err(status),
                },
            );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CollectionApi for ScriptedApi {
    async fn request(&self, resource: &str) -> Result<RawCollectionPayload, ApiError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resource.to_string());
        let scripted = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resource)
            .cloned();

        let Some(scripted) = scripted else {
            return Err(ApiError::Status {
                status: 404,
                detail: format!("no reply scripted for {resource}"),
            });
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        match scripted.reply {
            Ok(payload) => Ok(serde_json::from_value(payload)?),
            Err(status) => Err(ApiError::Status {
                status,
                detail: "scripted failure".into(),
            }),
        }
    }
}
