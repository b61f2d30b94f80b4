//! The download subcommand.

use crate::api::ApiClient;
use crate::cli::DownloadArgs;
use crate::error::Error;
use crate::pipeline::artifacts::write_artifact;
use crate::pipeline::params::prepare_output_path;

pub async fn execute(client: &ApiClient<'_>, args: &DownloadArgs) -> Result<(), Error> {
    prepare_output_path(&args.output)?;
    let bytes = client.fetch_output(&args.task_id, None).await?;
    write_artifact(&args.output, &bytes, "app")
}
