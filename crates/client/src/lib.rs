//! Client for the Stormdesk incident response platform.
//!
//! Authenticates against a deployment, binds the session to one organization
//! and exposes the org-scoped REST surface as JSON verbs. Writes that race
//! other writers go through [`Client::update`], which retries the whole
//! fetch/apply/put cycle whenever the platform reports a conflicting write.
//!
//! ```no_run
//! use stormdesk_client::{Client, ClientConfig, Credentials};
//!
//! # async fn demo() -> stormdesk_client::Result<()> {
//! let config = ClientConfig::new("https://sd.example.com").with_org("Response Team");
//! let client = Client::connect(config, Credentials::new("bot@example.com", "secret")).await?;
//!
//! let incident = client.get("/incidents/42").await?;
//! println!("{}", incident["name"]);
//!
//! client
//!     .update("/incidents/42/members", |doc| {
//!         if let Some(members) = doc["members"].as_array_mut() {
//!             members.push(7.into());
//!         }
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod retry;
mod session;

pub use client::{CONTEXT_HEADER, CSRF_HEADER, Client, SESSION_COOKIE, USER_AGENT};
pub use config::{
    BASE_URL_ENV_VAR, CA_BUNDLE_ENV_VAR, ClientConfig, Credentials, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT, EMAIL_ENV_VAR, ORG_ENV_VAR, PASSWORD_ENV_VAR, PROXY_ENV_VAR, TlsVerification,
};
pub use error::{Error, Result};
pub use retry::ConflictPolicy;
pub use session::{OrgMembership, SessionInfo};
