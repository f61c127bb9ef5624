//! Forget the credentials stored by `stormdesk login`.

use anyhow::Result;
use console::style;

use crate::credentials::{CredentialStore, Keyring};

pub fn execute() -> Result<()> {
    execute_with(&Keyring)
}

pub(crate) fn execute_with(store: &dyn CredentialStore) -> Result<()> {
    if store.clear()? {
        println!("{} Credentials forgotten", style("✓").green().bold());
    } else {
        println!("No stored credentials");
    }
    Ok(())
}
