//! The validate subcommand.

use log::info;

use crate::api::ApiClient;
use crate::cli::ValidateArgs;
use crate::error::Error;
use crate::pipeline::poller::{PollSpec, Poller};

pub async fn execute(
    client: &ApiClient<'_>,
    poller: &Poller<'_>,
    args: &ValidateArgs,
) -> Result<(), Error> {
    let validation_id = client.validation_upload(&args.app).await?;
    info!("Validation id: {validation_id}");
    let body = poller
        .wait(PollSpec::validation(), || client.query_validation_status(&validation_id))
        .await?
        .into_result()?;
    println!("{body}");
    Ok(())
}
