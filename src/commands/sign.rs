//! The three signing subcommands, which differ only in the selected variant.

use log::info;

use crate::api::ApiClient;
use crate::cli::SignCommandArgs;
use crate::error::Error;
use crate::overrides::Overrides;
use crate::pipeline::artifacts::download_artifacts;
use crate::pipeline::params::{detect_platform, signing_method, OutputOptions, SigningSelection};
use crate::pipeline::poller::{PollSpec, Poller};

pub async fn execute(
    client: &ApiClient<'_>,
    poller: &Poller<'_>,
    args: &SignCommandArgs,
    selection: SigningSelection,
) -> Result<(), Error> {
    // Standalone signing has no app file, so the platform comes from the
    // shape of the credentials.
    let platform = detect_platform(None, &args.signing)?;
    let method = signing_method(selection, platform, &args.signing)?;
    let sign_overrides = Overrides::from_file(args.sign_overrides.as_deref())?;
    let outputs = OutputOptions::from_args(&args.outputs)?;

    let task_id = client.submit(method.build_request(&args.task_id, &sign_overrides)?).await?;
    info!("Signing task id: {task_id}");
    poller
        .wait(PollSpec::task(), || client.query_status(&task_id))
        .await?
        .into_result()?;

    download_artifacts(client, &task_id, &outputs).await?;
    println!("{task_id}");
    Ok(())
}
