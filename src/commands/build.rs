//! The standalone build subcommand.

use log::info;
use serde_json::json;

use crate::api::{ActionRequest, ApiClient};
use crate::cli::{BuildArgs, SigningArgs};
use crate::config;
use crate::error::Error;
use crate::overrides::Overrides;
use crate::pipeline::artifacts::write_artifact;
use crate::pipeline::params::{detect_platform, prepare_output_path};
use crate::pipeline::poller::{PollSpec, Poller};

pub async fn execute(
    client: &ApiClient<'_>,
    poller: &Poller<'_>,
    args: &BuildArgs,
) -> Result<(), Error> {
    let fusion_set_id = match (&args.fusion_set_id, &args.app) {
        (Some(id), _) => id.clone(),
        (None, Some(path)) => {
            // Without signing flags the platform can only come from the
            // app extension.
            let platform = detect_platform(Some(path), &SigningArgs::default())?;
            config::default_fusion_set_id(platform).ok_or_else(|| {
                Error::Validation(
                    "fusion_set_id must be specified or set through the platform environment variable"
                        .into(),
                )
            })?
        }
        (None, None) => {
            return Err(Error::Validation(
                "fusion_set_id must be specified when building from an app id".into(),
            ))
        }
    };
    if let Some(path) = &args.output {
        prepare_output_path(path)?;
    }

    let app_id = match (&args.app, &args.app_id) {
        (Some(_), Some(_)) => {
            return Err(Error::Validation(
                "exactly one of --app and --app-id may be given".into(),
            ))
        }
        (Some(path), None) => client.upload(path).await?,
        (None, Some(id)) => id.clone(),
        (None, None) => {
            return Err(Error::Validation("either --app or --app-id must be given".into()))
        }
    };

    let mut overrides = Overrides::from_file(args.build_overrides.as_deref())?;
    if args.diagnostic_logs {
        overrides.insert("extended_logs", json!(true));
    }

    let task_id = client.submit(ActionRequest::fuse(&app_id, &fusion_set_id, overrides)).await?;
    info!("Build task id: {task_id}");
    poller
        .wait(PollSpec::task(), || client.query_status(&task_id))
        .await?
        .into_result()?;

    if let Some(path) = &args.output {
        let bytes = client.fetch_output(&task_id, None).await?;
        write_artifact(path, &bytes, "app")?;
    }
    println!("{task_id}");
    Ok(())
}
