//! Stored login material and the keychain it lives in.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stormdesk_client::{EMAIL_ENV_VAR, ORG_ENV_VAR, PASSWORD_ENV_VAR};

const KEYRING_SERVICE: &str = "stormdesk-cli";
const KEYRING_USER: &str = "default";

/// Login material persisted between CLI invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Organization the login bound to, recorded for later sessions.
    pub org: Option<String>,
    /// When the credentials were stored.
    pub stored_at: DateTime<Utc>,
}

/// Where credentials live between invocations.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore {
    /// Persist `credentials`, replacing anything stored before.
    fn store(&self, credentials: &StoredCredentials) -> Result<()>;
    /// Load the stored credentials, `None` when nothing is stored.
    fn load(&self) -> Result<Option<StoredCredentials>>;
    /// Remove the stored credentials. Returns whether anything was there.
    fn clear(&self) -> Result<bool>;
}

/// The OS keychain, the production [`CredentialStore`].
pub struct Keyring;

impl Keyring {
    fn entry() -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
            .context("failed to open the OS keychain")
    }
}

impl CredentialStore for Keyring {
    fn store(&self, credentials: &StoredCredentials) -> Result<()> {
        let payload = serde_json::to_string(credentials)?;
        Self::entry()?
            .set_password(&payload)
            .context("failed to write credentials to the OS keychain")
    }

    fn load(&self) -> Result<Option<StoredCredentials>> {
        match Self::entry()?.get_password() {
            Ok(payload) => Ok(Some(
                serde_json::from_str(&payload).context("stored credentials are corrupted")?,
            )),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err).context("failed to read credentials from the OS keychain"),
        }
    }

    fn clear(&self) -> Result<bool> {
        match Self::entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err).context("failed to remove credentials from the OS keychain"),
        }
    }
}

/// Credentials taken from the environment, when both variables are set.
///
/// These win over the keychain so scripts and CI can run without a login.
pub fn from_env() -> Option<StoredCredentials> {
    let email = std::env::var(EMAIL_ENV_VAR).ok()?;
    let password = std::env::var(PASSWORD_ENV_VAR).ok()?;
    Some(StoredCredentials {
        email,
        password,
        org: std::env::var(ORG_ENV_VAR).ok(),
        stored_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_credentials_round_trip_through_json() {
        let credentials = StoredCredentials {
            email: "bot@example.com".to_string(),
            password: "secret".to_string(),
            org: Some("Alpha".to_string()),
            stored_at: Utc::now(),
        };
        let payload = serde_json::to_string(&credentials).unwrap();
        let restored: StoredCredentials = serde_json::from_str(&payload).unwrap();
        assert_eq!(restored.email, credentials.email);
        assert_eq!(restored.password, credentials.password);
        assert_eq!(restored.org, credentials.org);
        assert_eq!(restored.stored_at, credentials.stored_at);
    }

    #[test]
    fn corrupted_payloads_are_reported_not_discarded() {
        let err = serde_json::from_str::<StoredCredentials>("not json").unwrap_err();
        assert!(err.is_syntax());
    }
}
