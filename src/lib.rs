//! Core library for the `fuseline` CLI, a client for the mobile-app fusion
//! service.
//!
//! The pipeline uploads an app binary, builds it against a fusion set,
//! optionally rebrands it, signs it with one of three signing variants, and
//! downloads the resulting artifacts. Remote side effects go through the
//! [`ports`] traits so the whole flow is testable against in-memory fakes.

pub mod adapters;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod overrides;
pub mod pipeline;
pub mod ports;

use clap::error::ErrorKind;
use clap::Parser;

pub use error::Error;

/// Runs the CLI with the provided arguments.
///
/// # Errors
///
/// Returns a validation error when argument parsing fails, or the first
/// failure of the selected subcommand. Help and version requests print and
/// succeed.
pub fn run<I, T>(args: I) -> Result<(), Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return Ok(());
        }
        Err(err) => return Err(Error::Validation(err.to_string())),
    };
    commands::execute(cli)
}
