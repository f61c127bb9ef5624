//! Connection settings for the Stormdesk client.

use std::path::PathBuf;
use std::time::Duration;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://app.stormdesk.io";

/// Environment variable overriding the platform base URL.
pub const BASE_URL_ENV_VAR: &str = "STORMDESK_BASE_URL";
/// Environment variable naming the organization to bind the session to.
pub const ORG_ENV_VAR: &str = "STORMDESK_ORG";
/// Environment variable carrying the login email.
pub const EMAIL_ENV_VAR: &str = "STORMDESK_EMAIL";
/// Environment variable carrying the login password.
pub const PASSWORD_ENV_VAR: &str = "STORMDESK_PASSWORD";
/// Environment variable pointing at a PEM bundle of additional trusted CAs.
pub const CA_BUNDLE_ENV_VAR: &str = "STORMDESK_CA_BUNDLE";
/// Environment variable naming an HTTP(S) proxy for all platform traffic.
pub const PROXY_ENV_VAR: &str = "STORMDESK_PROXY";

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`Client::connect`](crate::Client::connect).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Platform base URL without a trailing slash, e.g. `https://app.stormdesk.io`.
    pub base_url: String,
    /// Organization to bind the session to. With `None` the session binds
    /// automatically when the account belongs to exactly one organization.
    pub org_name: Option<String>,
    /// Server certificate verification policy.
    pub tls: TlsVerification,
    /// Optional proxy URL for all platform traffic.
    pub proxy: Option<String>,
    /// Timeout applied to each HTTP request.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            org_name: None,
            tls: TlsVerification::default(),
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with all other settings defaulted.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            ..Self::default()
        }
    }

    /// Configuration assembled from `STORMDESK_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(BASE_URL_ENV_VAR) {
            config.base_url = normalize_base_url(url);
        }
        config.org_name = lookup(ORG_ENV_VAR);
        if let Some(path) = lookup(CA_BUNDLE_ENV_VAR) {
            config.tls = TlsVerification::CaBundle(PathBuf::from(path));
        }
        config.proxy = lookup(PROXY_ENV_VAR);
        config
    }

    /// Set the organization name to bind to.
    pub fn with_org(mut self, org_name: impl Into<String>) -> Self {
        self.org_name = Some(org_name.into());
        self
    }

    /// Set the certificate verification policy.
    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Server certificate verification policy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// Verify against the system trust store.
    #[default]
    Enabled,
    /// Additionally trust the CA certificates in the given PEM bundle.
    CaBundle(PathBuf),
    /// Accept any certificate. Only intended for disposable test servers.
    Disabled,
}

/// Login material for a platform account.
#[derive(Clone)]
pub struct Credentials {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Credentials from an email and password pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Manual impl so the password never ends up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
