//! Show who the stored credentials authenticate as.

use anyhow::{Context, Result, bail};

use stormdesk_client::{Client, ClientConfig, Credentials};

use crate::credentials::{self, CredentialStore, Keyring, StoredCredentials};
use crate::profile::Profile;

pub async fn execute() -> Result<()> {
    let profile = Profile::load()?;
    let stored = match credentials::from_env() {
        Some(stored) => Some(stored),
        None => Keyring.load()?,
    };
    execute_with(profile.client_config(), stored).await
}

pub(crate) async fn execute_with(
    mut config: ClientConfig,
    stored: Option<StoredCredentials>,
) -> Result<()> {
    let Some(stored) = stored else {
        bail!("not logged in; run `stormdesk login` first");
    };
    if config.org_name.is_none() {
        config.org_name = stored.org.clone();
    }
    let client = Client::connect(config, Credentials::new(stored.email, stored.password))
        .await
        .context("stored credentials were rejected")?;

    let identity = match client.user_email().await {
        Some(email) => email,
        None => format!("user {}", client.user_id().await),
    };
    println!("{identity}");
    println!(
        "Organization: {} (id {})",
        client.org_name().await,
        client.org_id().await
    );
    println!("Server: {}", client.base_url());
    Ok(())
}
