//! Registry credential lookup
//!
//! Credentials are read from the Docker client configuration file, the same
//! file `docker login` writes:
//!
//! ```json
//! { "auths": { "registry.example.com": { "auth": "dXNlcjpwYXNz" } } }
//! ```
//!
//! The file is read once; lookups afterwards are pure map reads.

use crate::error::{Error, Result};
use crate::utils::get_home_dir;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use tracing::debug;

/// Environment variable pointing at an alternative Docker config directory
pub const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";

/// Source of per-host `Basic` authorization strings
pub trait CredentialProvider: Send + Sync {
    /// Return the pre-encoded credential for `host`
    fn get_auth(&self, host: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl AuthEntry {
    fn encoded(&self) -> Option<String> {
        if let Some(auth) = self.auth.as_deref().filter(|a| !a.is_empty()) {
            return Some(auth.to_string());
        }
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(encode_basic(user, pass)),
            _ => None,
        }
    }
}

/// Credentials loaded from a Docker `config.json`
#[derive(Debug, Clone)]
pub struct DockerConfig {
    path: Utf8PathBuf,
    auths: HashMap<String, String>,
}

impl DockerConfig {
    /// Load from `$DOCKER_CONFIG/config.json`, falling back to `~/.docker/config.json`
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::from_path(&path)
    }

    /// Load from an explicit file path
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| Error::config_unavailable(path.as_str(), e))?;
        Self::parse(path.to_owned(), &content)
    }

    /// Parse credentials from an in-memory JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        Self::parse(Utf8PathBuf::from("<inline>"), content)
    }

    fn parse(path: Utf8PathBuf, content: &str) -> Result<Self> {
        let file: DockerConfigFile = serde_json::from_str(content)
            .map_err(|e| Error::config_unavailable(path.as_str(), e))?;

        let auths: HashMap<String, String> = file
            .auths
            .iter()
            .filter_map(|(key, entry)| entry.encoded().map(|auth| (normalize_host(key), auth)))
            .collect();

        debug!("Loaded {} registry credential(s) from {}", auths.len(), path);
        Ok(Self { path, auths })
    }

    /// Standard location of the Docker credential file
    pub fn default_path() -> Result<Utf8PathBuf> {
        if let Ok(dir) = std::env::var(DOCKER_CONFIG_ENV) {
            if !dir.is_empty() {
                return Ok(Utf8PathBuf::from(dir).join("config.json"));
            }
        }

        let home = get_home_dir()?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 home directory: {:?}", p)))?;
        Ok(home.join(".docker").join("config.json"))
    }

    /// Path the credentials were read from
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Hosts with a usable credential entry
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.auths.keys().map(String::as_str)
    }
}

impl CredentialProvider for DockerConfig {
    fn get_auth(&self, host: &str) -> Result<String> {
        self.auths
            .get(host)
            .cloned()
            .ok_or_else(|| Error::credential_not_found(host))
    }
}

/// Fixed in-memory credentials
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    auths: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-encoded credential for `host`
    pub fn with_auth(mut self, host: impl Into<String>, auth: impl Into<String>) -> Self {
        self.auths.insert(host.into(), auth.into());
        self
    }

    /// Add a username/password pair for `host`
    pub fn with_basic(self, host: impl Into<String>, username: &str, password: &str) -> Self {
        self.with_auth(host, encode_basic(username, password))
    }
}

impl CredentialProvider for StaticCredentials {
    fn get_auth(&self, host: &str) -> Result<String> {
        self.auths
            .get(host)
            .cloned()
            .ok_or_else(|| Error::credential_not_found(host))
    }
}

/// Base64 encode `user:pass` for a `Basic` authorization header
pub fn encode_basic(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", username, password))
}

/// Reduce an `auths` key such as `https://index.docker.io/v1/` to its host
fn normalize_host(key: &str) -> String {
    let without_scheme = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}
