//! Render package documentation from a platform export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use stormdesk_codegen::readme;

use super::codegen::{load_export, select};

/// Arguments for `stormdesk docgen`.
#[derive(Debug)]
pub struct DocgenArgs {
    /// Package name the documentation is titled with.
    pub package: String,
    /// Functions to document.
    pub functions: Vec<String>,
    /// Document every function in the export.
    pub all: bool,
    /// Read the export from a file instead of the server.
    pub export: Option<PathBuf>,
    /// File to write; defaults to ./README.md.
    pub output: Option<PathBuf>,
}

pub async fn execute(args: DocgenArgs) -> Result<()> {
    let export = load_export(args.export.as_deref()).await?;
    let plan = select(&export, &args.package, &args.functions, args.all)?;
    let document = readme(&plan)?;

    let target = match &args.output {
        Some(output) => output.clone(),
        None => PathBuf::from("README.md"),
    };
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, document)
        .with_context(|| format!("failed to write {}", target.display()))?;

    println!("{} Wrote {}", style("✓").green().bold(), target.display());
    Ok(())
}
