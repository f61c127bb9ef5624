//! Code generation for Stormdesk action packages.
//!
//! Parses a platform export, selects the functions a package should cover and
//! renders a runnable handler scaffold plus its documentation from embedded
//! templates. Nothing here talks to the network; the CLI wires this crate to
//! live deployments.

mod error;
mod export;
mod render;
mod scaffold;

pub use error::{CodegenError, Result};
pub use export::{DestinationDef, Export, FunctionDef, InputDef, SUPPORTED_FORMAT_VERSION};
pub use scaffold::{Plan, RenderedFile, readme, scaffold, write_files};
