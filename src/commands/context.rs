//! The standalone context (rebranding) subcommand.

use log::info;

use crate::api::ApiClient;
use crate::cli::ContextArgs;
use crate::error::Error;
use crate::pipeline::artifacts::write_artifact;
use crate::pipeline::params::prepare_output_path;
use crate::pipeline::poller::{PollSpec, Poller};

pub async fn execute(
    client: &ApiClient<'_>,
    poller: &Poller<'_>,
    args: &ContextArgs,
) -> Result<(), Error> {
    let options = args.flags.to_options();
    if !options.is_requested() {
        return Err(Error::Validation(
            "at least one rebranding option must be given for a context task".into(),
        ));
    }
    if let Some(path) = &args.output {
        prepare_output_path(path)?;
    }

    let task_id = client.submit(options.build_request(&args.task_id)?).await?;
    info!("Context task id: {task_id}");
    poller
        .wait(PollSpec::task(), || client.query_status(&task_id))
        .await?
        .into_result()?;

    if let Some(path) = &args.output {
        let bytes = client.fetch_output(&task_id, None).await?;
        write_artifact(path, &bytes, "rebranded app")?;
    }
    println!("{task_id}");
    Ok(())
}
