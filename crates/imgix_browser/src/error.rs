// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failure talking to the management API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API responded with HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("invalid authorization header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid resource path '{path}': {source}")]
    InvalidPath {
        path: String,
        source: url::ParseError,
    },
}

impl ApiError {
    /// Builds a status error from a JSON:API error body, falling back to the
    /// raw body text.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                let first = json.get("errors")?.get(0)?;
                first
                    .get("detail")
                    .or_else(|| first.get("title"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        ApiError::Status { status, detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_detail_comes_from_the_first_error() {
        let body = r#"{"errors":[{"title":"Unauthorized","detail":"Invalid API key"}]}"#;
        let err = ApiError::from_status(401, body);
        assert_eq!(err.to_string(), "API responded with HTTP 401: Invalid API key");
    }

    #[test]
    fn status_detail_falls_back_to_title_then_body() {
        let titled = ApiError::from_status(404, r#"{"errors":[{"title":"Not Found"}]}"#);
        assert!(titled.to_string().ends_with("Not Found"));

        let plain = ApiError::from_status(502, "bad gateway");
        assert!(plain.to_string().ends_with("bad gateway"));
    }

    #[test]
    fn decode_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ApiError = json_err.into();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
