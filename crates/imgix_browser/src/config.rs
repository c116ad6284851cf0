// SPDX-License-Identifier: Apache-2.0

//! Credential and settings loading.
//!
//! Layers, lowest priority first:
//! - XDG config: `~/.config/imgix-browser/config.toml`
//! - Project-local: `.imgix-browser.toml` (searched up the directory tree)
//! - Environment: `IMGIX_API_KEY`, `IMGIX_API_VERIFIED`
//! - CLI flags (applied by the binary)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::debounce::DEFAULT_DEBOUNCE;
use crate::fetch::DEFAULT_BASE_URL;

const APP_DIR: &str = "imgix-browser";
const PROJECT_FILE: &str = ".imgix-browser.toml";
const MAX_DEBOUNCE_MS: u64 = 10_000;

pub const ENV_API_KEY: &str = "IMGIX_API_KEY";
pub const ENV_API_VERIFIED: &str = "IMGIX_API_VERIFIED";

/// What the controller needs from the host configuration. The verification
/// flag is trusted verbatim; the key is never validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub successfully_verified: bool,
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub browse: BrowseConfig,
}

/// Management API settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    /// Set by whatever verified the key against the API.
    pub successfully_verified: Option<bool>,
    /// API root, must end with `/`.
    pub base_url: Option<String>,
    /// Value of the plugin origin header sent with every request.
    pub plugin_origin: Option<String>,
}

/// Gallery behavior.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    /// Debounce window for page changes and search submissions.
    pub debounce_ms: Option<u64>,
}

impl AppConfig {
    /// Loads the layered configuration.
    ///
    /// With `explicit`, only that file is read and it must exist and parse.
    /// Otherwise missing files are skipped and broken ones logged. The
    /// environment is applied on top in both cases.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::load_layers(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_layers() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        config
    }

    /// Reads and parses a single TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        self.api.api_key = other.api.api_key.or_else(|| self.api.api_key.take());
        self.api.successfully_verified = other
            .api
            .successfully_verified
            .or(self.api.successfully_verified);
        self.api.base_url = other.api.base_url.or_else(|| self.api.base_url.take());
        self.api.plugin_origin = other
            .api
            .plugin_origin
            .or_else(|| self.api.plugin_origin.take());

        self.browse.debounce_ms = other.browse.debounce_ms.or(self.browse.debounce_ms);
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.is_empty()) {
            self.api.api_key = Some(key);
        }
        if let Some(raw) = lookup(ENV_API_VERIFIED) {
            match parse_flag(&raw) {
                Some(flag) => self.api.successfully_verified = Some(flag),
                None => warn!("Ignoring {}={:?}: expected true or false", ENV_API_VERIFIED, raw),
            }
        }
    }

    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(ms) = self.browse.debounce_ms {
            if ms > MAX_DEBOUNCE_MS {
                bail!("browse.debounce_ms must be at most {MAX_DEBOUNCE_MS}, got {ms}");
            }
        }
        if let Some(ref raw) = self.api.base_url {
            let url = Url::parse(raw).with_context(|| format!("api.base_url is not a URL: '{raw}'"))?;
            if !url.path().ends_with('/') {
                bail!("api.base_url must end with '/', got '{raw}'");
            }
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.api.api_key.clone().unwrap_or_default(),
            successfully_verified: self.api.successfully_verified.unwrap_or(false),
        }
    }

    pub fn base_url(&self) -> Result<Url> {
        let raw = self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Url::parse(raw).with_context(|| format!("Invalid API base URL '{raw}'"))
    }

    pub fn plugin_origin(&self) -> String {
        self.api
            .plugin_origin
            .clone()
            .unwrap_or_else(|| format!("imgix-browser/v{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn debounce(&self) -> Duration {
        self.browse
            .debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.imgix-browser.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|candidate| candidate.exists())
}

fn load_file(path: &Path) -> Option<AppConfig> {
    match AppConfig::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("{:#}", e);
            None
        }
    }
}
