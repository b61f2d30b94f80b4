//! Binary entrypoint for the `fuseline` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // Local .env files supply credentials during development.
    dotenvy::dotenv().ok();
    match fuseline::run(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
