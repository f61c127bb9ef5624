//! Error types for export parsing and package generation.

use thiserror::Error;

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Everything that can go wrong between reading an export and writing files.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The export was written by a newer platform than this build understands.
    #[error("unsupported export format version {found}, this build understands up to {supported}")]
    UnsupportedFormat {
        /// Version recorded in the export.
        found: u32,
        /// Highest version this build accepts.
        supported: u32,
    },

    /// The export document is not valid JSON or misses required fields.
    #[error("malformed export: {0}")]
    Parse(#[from] serde_json::Error),

    /// Generation was requested without naming any function.
    #[error("no functions selected; the export provides: {}", .available.join(", "))]
    NothingSelected {
        /// Function names present in the export.
        available: Vec<String>,
    },

    /// A requested function does not exist in the export.
    #[error("export has no function '{requested}'; available: {}", .available.join(", "))]
    UnknownFunction {
        /// Function name that was asked for.
        requested: String,
        /// Function names present in the export.
        available: Vec<String>,
    },

    /// A selected function references a destination the export does not define.
    #[error("function '{function}' references unknown message destination '{destination}'")]
    UnknownDestination {
        /// Function with the dangling reference.
        function: String,
        /// Destination name that is missing.
        destination: String,
    },

    /// The package name cannot be used as a crate name.
    #[error("invalid package name '{0}': use lowercase letters, digits, hyphens or underscores")]
    InvalidPackageName(String),

    /// The function name cannot be used as a Rust module name.
    #[error("function name '{0}' is not usable as a module name")]
    InvalidFunctionName(String),

    /// A template failed to render.
    #[error("template rendering failed")]
    Render(#[from] handlebars::RenderError),

    /// Reading the export or writing generated files failed.
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}
