//! The platform export document and the slices of it codegen cares about.
//!
//! An export is one large JSON object describing an organization's
//! customizations. Only functions and message destinations matter here, the
//! remaining sections are skipped on parse.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{CodegenError, Result};

/// Highest export format version this build accepts.
pub const SUPPORTED_FORMAT_VERSION: u32 = 2;

/// A parsed platform export.
#[derive(Debug, Clone, Deserialize)]
pub struct Export {
    /// Format version recorded by the exporting server.
    pub format_version: u32,
    /// When the export was taken, if the server recorded it.
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    /// Custom functions defined in the organization.
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    /// Message destinations functions can be wired to.
    #[serde(default)]
    pub message_destinations: Vec<DestinationDef>,
}

impl Export {
    /// Parse an export document, rejecting versions newer than this build.
    pub fn parse(json: &str) -> Result<Self> {
        let export: Self = serde_json::from_str(json)?;
        if export.format_version > SUPPORTED_FORMAT_VERSION {
            return Err(CodegenError::UnsupportedFormat {
                found: export.format_version,
                supported: SUPPORTED_FORMAT_VERSION,
            });
        }
        Ok(export)
    }

    /// Read and parse the export at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Look up a function by its programmatic name.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Names of all functions in the export, in export order.
    pub fn function_names(&self) -> Vec<String> {
        self.functions
            .iter()
            .map(|function| function.name.clone())
            .collect()
    }

    /// Look up a message destination by name.
    pub fn destination(&self, name: &str) -> Option<&DestinationDef> {
        self.message_destinations
            .iter()
            .find(|destination| destination.name == name)
    }
}

/// A custom function: the unit codegen turns into a handler module.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDef {
    /// Programmatic name, also the generated module name.
    pub name: String,
    /// Name shown in the platform UI.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Free-form description from the export.
    #[serde(default)]
    pub description: Option<String>,
    /// Message destination events for this function are delivered through.
    #[serde(default)]
    pub destination: Option<String>,
    /// Declared inputs, in UI order.
    #[serde(default)]
    pub inputs: Vec<InputDef>,
}

impl FunctionDef {
    /// Display name, derived from the programmatic name when the export
    /// carries none.
    pub fn display_name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => self
                .name
                .split(['_', '-'])
                .filter(|word| !word.is_empty())
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// One declared input of a function.
#[derive(Debug, Clone, Deserialize)]
pub struct InputDef {
    /// Field name delivered in the event payload.
    pub name: String,
    /// Platform input type, e.g. `text`, `number` or `boolean`.
    #[serde(default = "default_input_type")]
    pub input_type: String,
    /// Whether the platform requires a value before invoking the function.
    #[serde(default)]
    pub required: bool,
    /// Free-form description from the export.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_input_type() -> String {
    "text".to_string()
}

impl InputDef {
    /// Rust type the generated handler uses for this input.
    pub fn rust_type(&self) -> &'static str {
        match self.input_type.as_str() {
            "number" => "f64",
            "boolean" => "bool",
            _ => "String",
        }
    }
}

/// A message destination referenced by one or more functions.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationDef {
    /// Programmatic destination name.
    pub name: String,
    /// Name shown in the platform UI.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Whether the platform waits for an acknowledgement from consumers.
    #[serde(default)]
    pub expect_ack: bool,
}
