//! Log in to a deployment and store the credentials in the OS keychain.

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use stormdesk_client::{Client, ClientConfig, Credentials, PASSWORD_ENV_VAR};

use crate::credentials::{CredentialStore, Keyring, StoredCredentials};
use crate::profile::Profile;

/// Arguments for `stormdesk login`.
#[derive(Debug)]
pub struct LoginArgs {
    /// Account email; prompted when omitted.
    pub email: Option<String>,
    /// Organization to bind to.
    pub org: Option<String>,
    /// Platform base URL override.
    pub url: Option<String>,
}

pub async fn execute(args: LoginArgs) -> Result<()> {
    let profile = Profile::load()?;
    let mut config = profile.client_config();
    if let Some(url) = &args.url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(org) = &args.org {
        config.org_name = Some(org.clone());
    }

    let email = match args.email {
        Some(email) => email,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Email")
            .interact_text()
            .context("failed to read email")?,
    };
    // Scripted logins can provide the password via the environment.
    let password = match std::env::var(PASSWORD_ENV_VAR) {
        Ok(password) => password,
        Err(_) => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()
            .context("failed to read password")?,
    };

    execute_with(config, email, password, &Keyring).await
}

/// Everything after credential entry, separated so tests can drive it.
pub(crate) async fn execute_with(
    config: ClientConfig,
    email: String,
    password: String,
    store: &dyn CredentialStore,
) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Logging in to {}", config.base_url));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let connected = Client::connect(config, Credentials::new(email.clone(), password.clone())).await;
    spinner.finish_and_clear();
    let client = connected.context("login failed")?;

    let bound_org = client.org_name().await;
    store.store(&StoredCredentials {
        email: email.clone(),
        password,
        org: Some(bound_org.clone()),
        stored_at: Utc::now(),
    })?;
    tracing::debug!(org = %bound_org, "credentials stored");

    println!(
        "{} Logged in as {} ({})",
        style("✓").green().bold(),
        style(&email).bold(),
        bound_org
    );
    Ok(())
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
