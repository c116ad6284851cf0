// SPDX-License-Identifier: Apache-2.0

//! User-facing failure conditions and the queue that holds them until they
//! are resolved or a successful fetch clears them.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which condition an [`ErrorRecord`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The stored API key has not been verified by the host configuration.
    InvalidCredential,
    /// The account has no enabled sources, or the catalog could not be read.
    NoSourcesAvailable,
    /// A browse query returned no readable record count.
    NoOriginImages,
    /// A search query returned no readable record count.
    NoSearchResults,
}

/// How a display collaborator should style the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A queued failure condition. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
}

impl ErrorRecord {
    fn new(kind: ErrorKind, severity: Severity, message: &str) -> Self {
        Self {
            kind,
            severity,
            message: message.to_string(),
        }
    }

    pub fn invalid_credential() -> Self {
        Self::new(
            ErrorKind::InvalidCredential,
            Severity::Error,
            "The imgix API key is missing or has not been verified. Update it in the app configuration.",
        )
    }

    pub fn no_sources() -> Self {
        Self::new(
            ErrorKind::NoSourcesAvailable,
            Severity::Error,
            "No enabled sources were found for this API key.",
        )
    }

    pub fn no_origin_images() -> Self {
        Self::new(
            ErrorKind::NoOriginImages,
            Severity::Warning,
            "No images were found in this source.",
        )
    }

    pub fn no_search_results() -> Self {
        Self::new(
            ErrorKind::NoSearchResults,
            Severity::Warning,
            "No images matched the search term.",
        )
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// FIFO queue of unresolved [`ErrorRecord`]s. Only the head is displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorQueue {
    records: VecDeque<ErrorRecord>,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every queued record and leaves `record` as the only entry.
    pub fn replace_with(&mut self, record: ErrorRecord) {
        self.records.clear();
        self.records.push_back(record);
    }

    /// Removes the first `n` records and returns how many were removed.
    pub fn resolve(&mut self, n: usize) -> usize {
        let count = n.min(self.records.len());
        self.records.drain(..count);
        count
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// The record a display collaborator should show.
    pub fn first(&self) -> Option<&ErrorRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.records.iter().map(|r| r.kind).collect()
    }
}

impl Extend<ErrorRecord> for ErrorQueue {
    fn extend<I: IntoIterator<Item = ErrorRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}
