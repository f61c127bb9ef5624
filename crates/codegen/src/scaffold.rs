//! Function selection and package scaffolding.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{Value, json};

use crate::error::{CodegenError, Result};
use crate::export::{DestinationDef, Export, FunctionDef};
use crate::render::{pascal_case, render};

// Generated packages pin the client version published alongside this crate.
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const GITIGNORE: &str = "/target\n";

/// The validated slice of an export that one generated package covers.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Crate name of the generated package.
    pub package: String,
    /// Selected functions, deduplicated, in request order.
    pub functions: Vec<FunctionDef>,
    /// Destinations the selected functions are wired to.
    pub destinations: Vec<DestinationDef>,
}

impl Plan {
    /// Select `requested` functions out of `export` for a package named
    /// `package`.
    ///
    /// Every requested name must exist in the export and every destination a
    /// selected function references must be defined, so a generated package
    /// never points at wiring the platform does not know about.
    pub fn select(export: &Export, package: &str, requested: &[String]) -> Result<Self> {
        validate_package_name(package)?;
        if requested.is_empty() {
            return Err(CodegenError::NothingSelected {
                available: export.function_names(),
            });
        }

        let mut functions: Vec<FunctionDef> = Vec::new();
        for name in requested {
            if functions.iter().any(|function| &function.name == name) {
                continue;
            }
            let function = export.function(name).ok_or_else(|| {
                CodegenError::UnknownFunction {
                    requested: name.clone(),
                    available: export.function_names(),
                }
            })?;
            validate_module_name(&function.name)?;
            functions.push(function.clone());
        }

        let mut destinations: Vec<DestinationDef> = Vec::new();
        for function in &functions {
            let Some(name) = &function.destination else {
                continue;
            };
            if destinations.iter().any(|dest| &dest.name == name) {
                continue;
            }
            let destination =
                export
                    .destination(name)
                    .ok_or_else(|| CodegenError::UnknownDestination {
                        function: function.name.clone(),
                        destination: name.clone(),
                    })?;
            destinations.push(destination.clone());
        }

        Ok(Self {
            package: package.to_string(),
            functions,
            destinations,
        })
    }

    /// Select every function in the export.
    pub fn select_all(export: &Export, package: &str) -> Result<Self> {
        Self::select(export, package, &export.function_names())
    }
}

/// Render the full package scaffold for `plan`, without touching the
/// filesystem.
pub fn scaffold(plan: &Plan) -> Result<Vec<RenderedFile>> {
    let data = plan_data(plan);
    let mut files = vec![
        RenderedFile::new("Cargo.toml", render("Cargo.toml", &data)?),
        RenderedFile::new(".gitignore", GITIGNORE.to_string()),
        RenderedFile::new("README.md", render("README.md", &data)?),
        RenderedFile::new("src/main.rs", render("main.rs", &data)?),
        RenderedFile::new("src/handlers/mod.rs", render("handlers_mod.rs", &data)?),
    ];
    for function in &plan.functions {
        let data = json!({
            "package": plan.package,
            "function": function_data(function),
        });
        files.push(RenderedFile::new(
            format!("src/handlers/{}.rs", function.name),
            render("handler.rs", &data)?,
        ));
    }
    tracing::debug!(package = %plan.package, files = files.len(), "scaffold rendered");
    Ok(files)
}

/// Render only the package documentation for `plan`.
pub fn readme(plan: &Plan) -> Result<String> {
    render("README.md", &plan_data(plan))
}

/// Write rendered files under `root`, creating directories as needed.
pub fn write_files(root: &Path, files: &[RenderedFile]) -> Result<()> {
    for file in files {
        let target = root.join(&file.path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &file.contents)?;
    }
    tracing::debug!(root = %root.display(), files = files.len(), "scaffold written");
    Ok(())
}

/// One generated file, with its path relative to the package root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Path relative to the package root.
    pub path: PathBuf,
    /// Full file contents.
    pub contents: String,
}

impl RenderedFile {
    fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

fn plan_data(plan: &Plan) -> Value {
    json!({
        "package": plan.package,
        "client_version": CLIENT_VERSION,
        "generated_at": Utc::now().format("%Y-%m-%d").to_string(),
        "functions": plan.functions.iter().map(function_data).collect::<Vec<_>>(),
        "destinations": plan.destinations.iter().map(|destination| json!({
            "name": destination.name,
            "display_name": destination.display_name,
            "expect_ack": destination.expect_ack,
        })).collect::<Vec<_>>(),
    })
}

fn function_data(function: &FunctionDef) -> Value {
    json!({
        "name": function.name,
        "struct_name": pascal_case(&function.name),
        "display_name": function.display_name(),
        "description": function.description,
        "destination": function.destination,
        "inputs": function.inputs.iter().map(|input| {
            let base = input.rust_type();
            json!({
                "name": input.name,
                "field_type": if input.required {
                    base.to_string()
                } else {
                    format!("Option<{base}>")
                },
                "input_type": input.input_type,
                "required": input.required,
                "description": input.description,
            })
        }).collect::<Vec<_>>(),
    })
}

fn validate_package_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|first| first.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CodegenError::InvalidPackageName(name.to_string()))
    }
}

// Function names become module names and file names, so they must be plain
// snake_case identifiers.
fn validate_module_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|first| first.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CodegenError::InvalidFunctionName(name.to_string()))
    }
}

#[cfg(test)]
#[path = "scaffold_tests.rs"]
mod tests;
