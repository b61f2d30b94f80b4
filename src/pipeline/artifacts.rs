//! Artifact downloads for a completed pipeline.

use std::borrow::Cow;
use std::path::Path;

use log::{info, warn};

use crate::api::ApiClient;
use crate::error::Error;
use crate::pipeline::params::OutputOptions;

/// Downloads every configured artifact of a terminal task. Unconfigured
/// outputs are skipped; a configured output that fails to download or write
/// aborts with that error.
///
/// # Errors
///
/// Fatal on any transport failure, non-2xx response, or write failure for a
/// configured output.
pub async fn download_artifacts(
    client: &ApiClient<'_>,
    task_id: &str,
    outputs: &OutputOptions,
) -> Result<(), Error> {
    if let Some(path) = &outputs.output {
        let bytes = client.fetch_output(task_id, None).await?;
        write_artifact(path, &bytes, "app")?;
    }
    if let Some(path) = &outputs.deobfuscation_script_output {
        let bytes = client.fetch_output(task_id, Some("deobfuscation_script")).await?;
        write_artifact(path, &bytes, "deobfuscation scripts")?;
    }
    if let Some(path) = &outputs.sign_second_output {
        let bytes = client.fetch_output(task_id, Some("sign_second_output")).await?;
        write_artifact(path, &bytes, "secondary app format")?;
    }
    if let Some(path) = &outputs.certificate_output {
        let bytes = client.fetch_certificate(task_id).await?;
        write_artifact(path, &bytes, "Certified Secure certificate")?;
    }
    if let Some(path) = &outputs.certificate_json {
        let bytes = client.fetch_certificate_json(task_id).await?;
        write_artifact(path, format_json(&bytes).as_ref(), "Certified Secure JSON")?;
    }
    Ok(())
}

/// Writes one downloaded artifact to disk.
///
/// # Errors
///
/// Returns an I/O error naming the artifact and path on write failure.
pub fn write_artifact(path: &Path, bytes: &[u8], label: &str) -> Result<(), Error> {
    std::fs::write(path, bytes)
        .map_err(|e| Error::io(format!("writing {label} to {}", path.display()), e))?;
    info!("Downloaded {label} to [{}]", path.display());
    Ok(())
}

/// Pretty-prints a JSON payload for on-disk readability. The payload is kept
/// verbatim when it does not parse; a download is never failed over
/// formatting.
#[must_use]
pub fn format_json(bytes: &[u8]) -> Cow<'_, [u8]> {
    match serde_json::from_slice::<serde_json::Value>(bytes)
        .and_then(|value| serde_json::to_vec_pretty(&value))
    {
        Ok(pretty) => Cow::Owned(pretty),
        Err(e) => {
            warn!("Keeping certificate JSON unformatted: {e}");
            Cow::Borrowed(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_payload_is_pretty_printed() {
        let formatted = format_json(br#"{"grade":"A","checks":[1,2]}"#);
        let text = String::from_utf8(formatted.into_owned()).unwrap();
        assert!(text.contains("\n"));
        assert!(text.contains("\"grade\": \"A\""));
    }

    #[test]
    fn unparseable_payload_is_kept_verbatim() {
        let raw = b"not json at all";
        assert_eq!(format_json(raw).as_ref(), raw);
    }

    #[test]
    fn write_failure_names_the_artifact() {
        let missing = Path::new("/nonexistent-fuseline-dir/out.apk");
        let err = write_artifact(missing, b"bytes", "app").unwrap_err();
        assert!(err.to_string().contains("writing app"));
    }
}
