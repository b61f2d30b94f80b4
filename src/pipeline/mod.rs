//! Pipeline orchestration: upload, build, optional rebrand, sign, download.
//!
//! Stages run strictly in order and each one polls its task to a terminal
//! status before the next is submitted. Every stage submission returns a new
//! task id which supersedes its parent for all subsequent requests. The first
//! non-completed outcome aborts the run; nothing is downloaded after an
//! abort.

pub mod artifacts;
pub mod context;
pub mod params;
pub mod poller;
pub mod sign;

use log::info;

use crate::api::request::ActionRequest;
use crate::api::ApiClient;
use crate::error::Error;
use params::{AppSource, RunParams};
use poller::{PollSpec, Poller};

/// Drives one full fusion run over a client and poller.
pub struct Pipeline<'a> {
    client: &'a ApiClient<'a>,
    poller: &'a Poller<'a>,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over the given client and poller.
    pub fn new(client: &'a ApiClient<'a>, poller: &'a Poller<'a>) -> Self {
        Self { client, poller }
    }

    /// Runs the pipeline to completion and returns the final task id.
    ///
    /// # Errors
    ///
    /// Aborts on the first stage that fails: upload or submission errors,
    /// a task reaching a failure status, the poll ceiling, or exhausted
    /// transport retries. Artifact downloads only run after the final stage
    /// completes.
    pub async fn run(&self, params: &RunParams) -> Result<String, Error> {
        let app_id = match &params.app {
            AppSource::File(path) => self.client.upload(path).await?,
            AppSource::Existing(id) => id.clone(),
        };

        info!("Starting build for app id {app_id} with fusion set {}", params.fusion_set_id);
        let mut task_id = self
            .client
            .submit(ActionRequest::fuse(&app_id, &params.fusion_set_id, params.build_overrides.clone()))
            .await?;
        info!("Build task id: {task_id}");
        self.wait_for(&task_id).await?;

        if let Some(context) = &params.context {
            task_id = self.client.submit(context.build_request(&task_id)?).await?;
            info!("Context task id: {task_id}");
            self.wait_for(&task_id).await?;
        }

        let sign_request = params.signing.build_request(&task_id, &params.sign_overrides)?;
        task_id = self.client.submit(sign_request).await?;
        info!("Signing task id: {task_id}");
        self.wait_for(&task_id).await?;

        artifacts::download_artifacts(self.client, &task_id, &params.outputs).await?;
        Ok(task_id)
    }

    async fn wait_for(&self, task_id: &str) -> Result<String, Error> {
        self.poller
            .wait(PollSpec::task(), || self.client.query_status(task_id))
            .await?
            .into_result()
    }
}
