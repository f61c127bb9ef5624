//! Stormdesk CLI - log in to an incident response deployment, inspect the
//! session and generate action handler packages from platform exports.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod credentials;
mod profile;

#[derive(Parser)]
#[command(name = "stormdesk")]
#[command(about = "Developer tooling for the Stormdesk incident response platform")]
#[command(version)]
#[command(author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Log in to a deployment and store the credentials
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,

        /// Organization to bind to, for accounts that belong to several
        #[arg(long)]
        org: Option<String>,

        /// Platform base URL, e.g. https://app.stormdesk.io
        #[arg(long)]
        url: Option<String>,
    },

    /// Forget the stored credentials
    Logout,

    /// Show who the stored credentials authenticate as
    Whoami,

    /// Generate an action handler package from a platform export
    Codegen {
        /// Crate name of the generated package
        #[arg(short, long)]
        package: String,

        /// Function to include (repeat for several)
        #[arg(short, long = "function", value_name = "NAME")]
        functions: Vec<String>,

        /// Include every function in the export
        #[arg(long, conflicts_with = "functions")]
        all: bool,

        /// Read the export from a file instead of the deployment
        #[arg(short, long, value_name = "FILE")]
        export: Option<PathBuf>,

        /// Directory to create the package in (defaults to ./<package>)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Render package documentation from a platform export
    Docgen {
        /// Package name the documentation is titled with
        #[arg(short, long)]
        package: String,

        /// Function to include (repeat for several)
        #[arg(short, long = "function", value_name = "NAME")]
        functions: Vec<String>,

        /// Include every function in the export
        #[arg(long, conflicts_with = "functions")]
        all: bool,

        /// Read the export from a file instead of the deployment
        #[arg(short, long, value_name = "FILE")]
        export: Option<PathBuf>,

        /// File to write (defaults to ./README.md)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("error"),
        1 => EnvFilter::new("warn"),
        2 => EnvFilter::new("info"),
        3 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Login { email, org, url } => {
            commands::login::execute(commands::login::LoginArgs { email, org, url }).await
        }
        Command::Logout => commands::logout::execute(),
        Command::Whoami => commands::whoami::execute().await,
        Command::Codegen {
            package,
            functions,
            all,
            export,
            output,
        } => {
            commands::codegen::execute(commands::codegen::CodegenArgs {
                package,
                functions,
                all,
                export,
                output,
            })
            .await
        }
        Command::Docgen {
            package,
            functions,
            all,
            export,
            output,
        } => {
            commands::docgen::execute(commands::docgen::DocgenArgs {
                package,
                functions,
                all,
                export,
                output,
            })
            .await
        }
    }
}
