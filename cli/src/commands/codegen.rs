//! Generate an action-handler package from a platform export.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use console::style;

use stormdesk_client::{Client, Credentials};
use stormdesk_codegen::{Export, Plan, scaffold, write_files};

use crate::credentials::{self, CredentialStore, Keyring};
use crate::profile::Profile;

/// Arguments for `stormdesk codegen`.
#[derive(Debug)]
pub struct CodegenArgs {
    /// Crate name of the generated package.
    pub package: String,
    /// Functions to generate handlers for.
    pub functions: Vec<String>,
    /// Generate handlers for every function in the export.
    pub all: bool,
    /// Read the export from a file instead of the server.
    pub export: Option<PathBuf>,
    /// Directory to generate into; defaults to the package name.
    pub output: Option<PathBuf>,
}

pub async fn execute(args: CodegenArgs) -> Result<()> {
    let export = load_export(args.export.as_deref()).await?;
    let plan = select(&export, &args.package, &args.functions, args.all)?;

    let target = match &args.output {
        Some(output) => output.clone(),
        None => PathBuf::from(&args.package),
    };
    if target.exists() {
        bail!("target directory {} already exists", target.display());
    }

    let files = scaffold(&plan)?;
    write_files(&target, &files)?;

    println!(
        "{} Generated {} with {} handler{}",
        style("✓").green().bold(),
        style(&plan.package).bold(),
        plan.functions.len(),
        if plan.functions.len() == 1 { "" } else { "s" }
    );
    for file in &files {
        println!("  {}", target.join(&file.path).display());
    }
    println!();
    println!("Next steps:");
    println!("  cd {}", target.display());
    println!("  cargo build");
    Ok(())
}

/// Read the export from `path`, or fetch it from the server using the
/// stored credentials when no file is given.
pub(crate) async fn load_export(path: Option<&Path>) -> Result<Export> {
    if let Some(path) = path {
        return Export::from_file(path)
            .with_context(|| format!("failed to read export {}", path.display()));
    }

    let profile = Profile::load()?;
    let stored = match credentials::from_env() {
        Some(stored) => Some(stored),
        None => Keyring.load()?,
    };
    let stored = stored.context("not logged in; pass --export FILE or run `stormdesk login`")?;
    let mut config = profile.client_config();
    if config.org_name.is_none() {
        config.org_name = stored.org.clone();
    }
    let client = Client::connect(config, Credentials::new(stored.email, stored.password)).await?;
    let org_id = client.org_id().await;
    tracing::debug!(org_id, "fetching the export");
    let document = client.get("/export").await?;
    Export::parse(&document.to_string()).context("the server returned an unusable export")
}

pub(crate) fn select(
    export: &Export,
    package: &str,
    functions: &[String],
    all: bool,
) -> Result<Plan> {
    let plan = if all {
        Plan::select_all(export, package)?
    } else {
        Plan::select(export, package, functions)?
    };
    Ok(plan)
}
