//! The certificate subcommand.

use crate::api::ApiClient;
use crate::cli::CertificateArgs;
use crate::error::Error;
use crate::pipeline::artifacts::{format_json, write_artifact};
use crate::pipeline::params::prepare_output_path;

pub async fn execute(client: &ApiClient<'_>, args: &CertificateArgs) -> Result<(), Error> {
    if args.certificate_output.is_none() && args.certificate_json.is_none() {
        return Err(Error::Validation(
            "at least one of --certificate-output and --certificate-json must be given".into(),
        ));
    }
    for path in [args.certificate_output.as_deref(), args.certificate_json.as_deref()]
        .into_iter()
        .flatten()
    {
        prepare_output_path(path)?;
    }

    if let Some(path) = &args.certificate_output {
        let bytes = client.fetch_certificate(&args.task_id).await?;
        write_artifact(path, &bytes, "Certified Secure certificate")?;
    }
    if let Some(path) = &args.certificate_json {
        let bytes = client.fetch_certificate_json(&args.task_id).await?;
        write_artifact(path, format_json(&bytes).as_ref(), "Certified Secure JSON")?;
    }
    Ok(())
}
