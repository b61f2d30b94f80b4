//! The full pipeline subcommand.

use log::info;

use crate::api::ApiClient;
use crate::cli::RunArgs;
use crate::error::Error;
use crate::pipeline::params::RunParams;
use crate::pipeline::poller::Poller;
use crate::pipeline::Pipeline;

pub async fn execute(
    client: &ApiClient<'_>,
    poller: &Poller<'_>,
    args: &RunArgs,
) -> Result<(), Error> {
    let params = RunParams::from_args(args)?;
    let task_id = Pipeline::new(client, poller).run(&params).await?;
    info!("Pipeline completed. Final task id: {task_id}");
    println!("{task_id}");
    Ok(())
}
