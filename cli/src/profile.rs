//! The on-disk CLI profile, `~/.stormdesk/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use stormdesk_client::{
    BASE_URL_ENV_VAR, CA_BUNDLE_ENV_VAR, ClientConfig, ORG_ENV_VAR, PROXY_ENV_VAR,
    TlsVerification,
};

/// Optional settings file complementing the `STORMDESK_*` environment.
///
/// Everything is optional; the environment wins over the file and the file
/// wins over built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    /// Platform base URL.
    pub base_url: Option<String>,
    /// Organization to bind sessions to.
    pub org: Option<String>,
    /// PEM bundle of additional trusted CAs.
    pub ca_bundle: Option<PathBuf>,
    /// HTTP(S) proxy for platform traffic.
    pub proxy: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Profile {
    /// Directory holding CLI state, `~/.stormdesk`.
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(home.join(".stormdesk"))
    }

    /// Load the profile, or defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_dir()?.join("config.toml"))
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid profile at {}", path.display()))
    }

    /// Client configuration from this profile with the environment applied
    /// on top.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = self.base_config();
        if let Ok(url) = std::env::var(BASE_URL_ENV_VAR) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(org) = std::env::var(ORG_ENV_VAR) {
            config.org_name = Some(org);
        }
        if let Ok(path) = std::env::var(CA_BUNDLE_ENV_VAR) {
            config.tls = TlsVerification::CaBundle(PathBuf::from(path));
        }
        if let Ok(proxy) = std::env::var(PROXY_ENV_VAR) {
            config.proxy = Some(proxy);
        }
        config
    }

    fn base_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = &self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config.org_name = self.org.clone();
        if let Some(path) = &self.ca_bundle {
            config.tls = TlsVerification::CaBundle(path.clone());
        }
        config.proxy = self.proxy.clone();
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}
