//! The upload subcommand.

use crate::api::ApiClient;
use crate::cli::UploadArgs;
use crate::error::Error;

pub async fn execute(client: &ApiClient<'_>, args: &UploadArgs) -> Result<(), Error> {
    let app_id = if args.direct {
        client.direct_upload(&args.app).await?
    } else {
        client.upload(&args.app).await?
    };
    println!("{app_id}");
    Ok(())
}
