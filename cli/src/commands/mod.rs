//! Command implementations for the Stormdesk CLI.

pub mod codegen;
pub mod docgen;
pub mod login;
pub mod logout;
pub mod whoami;
