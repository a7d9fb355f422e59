//! Hierarchical runtime configuration loader
//!
//! Precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (`~/.cplice/runtime.yaml`)
//! 3. Environment variables (`CPLICE_*` prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{RetryPoliciesConfig, RuntimeConfig, REGISTRY_READ_OPERATION};
use crate::utils::get_home_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use tracing::debug;

/// File name of the user runtime configuration inside the config directory
pub const RUNTIME_CONFIG_FILE: &str = "runtime.yaml";

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Runtime configuration loader
pub struct RuntimeConfigLoader {
    config_dir: Utf8PathBuf,
}

impl RuntimeConfigLoader {
    /// Create a loader rooted at `~/.cplice`
    pub fn new() -> Result<Self> {
        let home = get_home_dir()?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 home directory: {:?}", p)))?;
        Ok(Self {
            config_dir: home.join(".cplice"),
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Directory the user configuration is read from
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded::<RuntimeConfig>("runtime-defaults.yaml")?;

        let path = self.config_dir.join(RUNTIME_CONFIG_FILE);
        if path.exists() {
            debug!("Loading runtime config from {}", path);
            let overlay = Self::load_yaml_file::<RuntimeConfig>(&path)?;
            config = Self::merge(config, overlay);
        }

        Self::apply_env_overrides(config)
    }

    fn load_embedded<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::invalid_config(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    fn load_yaml_file<T: DeserializeOwned>(path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Overlay sections replace the base, except per-operation retry policies which merge
    fn merge(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            network: overlay.network,
            retry_policies: Self::merge_retry_policies(base.retry_policies, overlay.retry_policies),
            cache: overlay.cache,
        }
    }

    fn merge_retry_policies(
        mut base: RetryPoliciesConfig,
        overlay: RetryPoliciesConfig,
    ) -> RetryPoliciesConfig {
        for (key, policy) in overlay.operations {
            base.operations.insert(key, policy);
        }
        base.default = overlay.default;
        base
    }

    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("CPLICE_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("CPLICE_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("CPLICE_USER_AGENT") {
            config.network.user_agent = val;
        }

        if let Ok(val) = env::var("CPLICE_INSECURE_REGISTRIES") {
            config.network.insecure_registries = val
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(val) = env::var("CPLICE_READ_RETRY_ATTEMPTS") {
            let attempts: u32 = val.parse().map_err(|_| {
                Error::invalid_config("CPLICE_READ_RETRY_ATTEMPTS must be a valid number")
            })?;
            let mut policy = config.retry_policy(REGISTRY_READ_OPERATION);
            policy.max_attempts = attempts;
            config
                .retry_policies
                .operations
                .insert(REGISTRY_READ_OPERATION.to_string(), policy);
        }

        if let Ok(val) = env::var("CPLICE_CACHE_MAX_ENTRIES") {
            config.cache.max_entries = val.parse().map_err(|_| {
                Error::invalid_config("CPLICE_CACHE_MAX_ENTRIES must be a valid number")
            })?;
        }

        Ok(config)
    }
}
