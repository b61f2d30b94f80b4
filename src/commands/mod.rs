//! Subcommand execution.
//!
//! The dispatcher owns the process-level wiring: logging, credential
//! resolution, the async runtime, and the live adapters. Handlers receive a
//! ready client and poller and only sequence API calls.

mod build;
mod certificate;
mod context;
mod download;
mod run;
mod sign;
mod status;
mod upload;
mod validate;

use crate::adapters::live::{LiveHttpClient, TokioSleeper};
use crate::api::ApiClient;
use crate::cli::{Cli, Command, CommonArgs};
use crate::config::{self, Credentials};
use crate::error::Error;
use crate::logging;
use crate::pipeline::params::SigningSelection;
use crate::pipeline::poller::{PollConfig, Poller};

/// Executes one parsed invocation.
///
/// # Errors
///
/// Propagates the first failure of the selected subcommand.
pub fn execute(cli: Cli) -> Result<(), Error> {
    let common = common_args(&cli.command);
    logging::init(common.verbose);
    let credentials = Credentials::resolve(common.api_key.clone(), common.team_id.clone())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::io("starting async runtime", e))?;

    let http = LiveHttpClient::new();
    let sleeper = TokioSleeper;
    let client = ApiClient::new(&http, config::server_base_url(), credentials);
    let poller = Poller::new(&sleeper, PollConfig::default());

    runtime.block_on(async {
        match cli.command {
            Command::Run(args) => run::execute(&client, &poller, &args).await,
            Command::Upload(args) => upload::execute(&client, &args).await,
            Command::Build(args) => build::execute(&client, &poller, &args).await,
            Command::Context(args) => context::execute(&client, &poller, &args).await,
            Command::Sign(args) => {
                sign::execute(&client, &poller, &args, SigningSelection::OnService).await
            }
            Command::PrivateSign(args) => {
                sign::execute(&client, &poller, &args, SigningSelection::PrivateLocal).await
            }
            Command::AutoDevSign(args) => {
                sign::execute(&client, &poller, &args, SigningSelection::AutoDevScript).await
            }
            Command::Status(args) => status::execute(&client, &args).await,
            Command::Download(args) => download::execute(&client, &args).await,
            Command::Certificate(args) => certificate::execute(&client, &args).await,
            Command::Validate(args) => validate::execute(&client, &poller, &args).await,
        }
    })
}

fn common_args(command: &Command) -> &CommonArgs {
    match command {
        Command::Run(args) => &args.common,
        Command::Upload(args) => &args.common,
        Command::Build(args) => &args.common,
        Command::Context(args) => &args.common,
        Command::Sign(args) | Command::PrivateSign(args) | Command::AutoDevSign(args) => {
            &args.common
        }
        Command::Status(args) => &args.common,
        Command::Download(args) => &args.common,
        Command::Certificate(args) => &args.common,
        Command::Validate(args) => &args.common,
    }
}
