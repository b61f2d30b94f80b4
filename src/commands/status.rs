//! The status subcommand.

use crate::api::{ensure_success, ApiClient};
use crate::cli::TaskArgs;
use crate::error::Error;

pub async fn execute(client: &ApiClient<'_>, args: &TaskArgs) -> Result<(), Error> {
    let response = client
        .query_status(&args.task_id)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    let response = ensure_success(response)?;
    println!("{}", response.text());
    Ok(())
}
