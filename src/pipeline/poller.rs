//! Status poller: the task lifecycle state machine.
//!
//! A task moves from in-progress to exactly one terminal status, observed —
//! never set — by this client. The poller queries until a terminal status
//! appears, the timeout ceiling is exceeded, or consecutive transport
//! failures exhaust the retry bound. Each invocation produces exactly one
//! [`PollOutcome`]; the orchestrator never re-polls a terminal task.

use std::future::Future;
use std::io::Write as _;
use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::api::truncate_for_log;
use crate::error::Error;
use crate::ports::http::{HttpError, HttpResponse};
use crate::ports::sleep::Sleeper;

/// Status-field sentinels for one kind of pollable resource.
#[derive(Debug, Clone, Copy)]
pub struct PollSpec<'a> {
    /// JSON field holding the status string.
    pub status_field: &'a str,
    /// Values meaning "still running".
    pub in_progress: &'a [&'a str],
    /// The success sentinel. `None` means any terminal value counts as
    /// completion (the validation flow reports its verdict in the body).
    pub completed: Option<&'a str>,
}

impl PollSpec<'static> {
    /// Sentinels for task polling: `status` is `progress` until it becomes
    /// `completed` or a failure value.
    #[must_use]
    pub fn task() -> Self {
        Self { status_field: "status", in_progress: &["progress"], completed: Some("completed") }
    }

    /// Sentinels for app-validation polling over `validation_state`.
    #[must_use]
    pub fn validation() -> Self {
        Self { status_field: "validation_state", in_progress: &["pending", "active"], completed: None }
    }
}

/// Timing and retry bounds for one poller.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Sleep between queries while in progress, and between transport
    /// retries.
    pub interval: Duration,
    /// Ceiling on accumulated in-progress sleep. A hard stop, not a retry.
    pub timeout: Duration,
    /// Attempts per query before transport failures become fatal.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(10), timeout: Duration::from_secs(3600), max_attempts: 3 }
    }
}

/// The single terminal outcome of one poller invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The resource reached the success sentinel.
    Completed {
        /// The final status payload.
        body: String,
    },
    /// The resource reached a terminal status other than the success
    /// sentinel.
    Failed {
        /// The last status payload, verbatim.
        body: String,
    },
    /// Still in progress when the ceiling was exceeded.
    TimedOut {
        /// The configured ceiling in seconds.
        timeout_secs: u64,
    },
    /// Consecutive transport failures exhausted the retry bound.
    RetriesExhausted {
        /// Attempts issued before giving up.
        attempts: u32,
        /// The last transport error observed.
        last_error: String,
    },
}

impl PollOutcome {
    /// Converts the outcome into a result, turning every non-completed
    /// outcome into its matching error. The orchestrator aborts the pipeline
    /// on any `Err`.
    ///
    /// # Errors
    ///
    /// [`Error::TaskFailed`], [`Error::TimedOut`], or
    /// [`Error::RetriesExhausted`] for the corresponding outcome.
    pub fn into_result(self) -> Result<String, Error> {
        match self {
            Self::Completed { body } => Ok(body),
            Self::Failed { body } => Err(Error::TaskFailed { body }),
            Self::TimedOut { timeout_secs } => Err(Error::TimedOut { timeout_secs }),
            Self::RetriesExhausted { attempts, last_error } => {
                Err(Error::RetriesExhausted { attempts, last_error })
            }
        }
    }
}

/// Polls a status endpoint until a terminal outcome.
pub struct Poller<'a> {
    sleeper: &'a dyn Sleeper,
    config: PollConfig,
}

impl<'a> Poller<'a> {
    /// Creates a poller over the given sleeper and bounds.
    pub fn new(sleeper: &'a dyn Sleeper, config: PollConfig) -> Self {
        Self { sleeper, config }
    }

    /// Runs the state machine until terminal.
    ///
    /// `query` issues one status request per call; it is re-invoked for
    /// transport retries and for each in-progress cycle. One progress marker
    /// is written to stdout per sleep cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when a status query answers with a non-2xx
    /// status or an unreadable body — an application failure, surfaced
    /// immediately and never retried. Everything else is a [`PollOutcome`].
    pub async fn wait<F, Fut>(&self, spec: PollSpec<'_>, mut query: F) -> Result<PollOutcome, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse, HttpError>>,
    {
        let mut elapsed = Duration::ZERO;
        let mut progress = ProgressDots::new();

        loop {
            if elapsed > self.config.timeout {
                progress.finish();
                return Ok(PollOutcome::TimedOut {
                    timeout_secs: self.config.timeout.as_secs(),
                });
            }

            let response = match self.query_with_retry(&mut query).await {
                Ok(response) => response,
                Err((attempts, last_error)) => {
                    progress.finish();
                    return Ok(PollOutcome::RetriesExhausted { attempts, last_error });
                }
            };

            if !response.is_success() {
                progress.finish();
                let body = truncate_for_log(&response.text()).into_owned();
                return Err(Error::Api { url: response.url, status: response.status, body });
            }

            let payload: Value = match response.json() {
                Ok(payload) => payload,
                Err(e) => {
                    progress.finish();
                    let body = format!(
                        "unreadable status body ({e}): {}",
                        truncate_for_log(&response.text())
                    );
                    return Err(Error::Api { url: response.url, status: response.status, body });
                }
            };
            let status = payload.get(spec.status_field).and_then(Value::as_str).unwrap_or_default();

            if spec.in_progress.contains(&status) {
                debug!(
                    "Not complete yet. Response: {}. Sleeping for {} seconds",
                    truncate_for_log(&response.text()),
                    self.config.interval.as_secs()
                );
                progress.tick();
                self.sleeper.sleep(self.config.interval).await;
                elapsed += self.config.interval;
                continue;
            }

            progress.finish();
            let body = response.text().into_owned();
            return Ok(match spec.completed {
                Some(sentinel) if status != sentinel => PollOutcome::Failed { body },
                _ => PollOutcome::Completed { body },
            });
        }
    }

    /// Issues one query, retrying transport failures up to the bound with the
    /// poll interval between attempts. A received response — whatever its
    /// status — ends the retry loop immediately.
    async fn query_with_retry<F, Fut>(
        &self,
        query: &mut F,
    ) -> Result<HttpResponse, (u32, String)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse, HttpError>>,
    {
        let mut last_error = String::new();
        for attempt in 1..=self.config.max_attempts {
            match query().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = e.to_string();
                    debug!(
                        "Status query attempt {attempt}/{} failed: {last_error}",
                        self.config.max_attempts
                    );
                    if attempt < self.config.max_attempts {
                        self.sleeper.sleep(self.config.interval).await;
                    }
                }
            }
        }
        Err((self.config.max_attempts, last_error))
    }
}

/// One marker per sleep cycle, terminated by a newline once polling ends.
struct ProgressDots {
    dotted: bool,
}

impl ProgressDots {
    fn new() -> Self {
        Self { dotted: false }
    }

    fn tick(&mut self) {
        print!(".");
        let _ = std::io::stdout().flush();
        self.dotted = true;
    }

    fn finish(&mut self) {
        if self.dotted {
            println!();
            self.dotted = false;
        }
    }
}
