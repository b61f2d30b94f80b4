//! Environment-backed configuration.
//!
//! Credentials and server selection come from flags first, then from the
//! environment. A `.env` file in the working directory is loaded at startup.

use std::env;

use crate::error::Error;
use crate::pipeline::params::Platform;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "FUSELINE_API_KEY";
/// Environment variable holding the team id.
pub const TEAM_ID_ENV: &str = "FUSELINE_TEAM_ID";
/// Environment variable overriding the server base URL.
pub const SERVER_BASE_URL_ENV: &str = "FUSELINE_SERVER_BASE_URL";
/// Environment variable holding the default Android fusion set id.
pub const ANDROID_FS_ID_ENV: &str = "FUSELINE_ANDROID_FS_ID";
/// Environment variable holding the default iOS fusion set id.
pub const IOS_FS_ID_ENV: &str = "FUSELINE_IOS_FS_ID";

/// The production service endpoint.
pub const DEFAULT_SERVER_BASE_URL: &str = "https://fusion.fuseline.io";

/// Resolved credentials for one invocation.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The API key sent with every request.
    pub api_key: String,
    /// Team id for team-scoped requests, when the account has teams.
    pub team_id: Option<String>,
}

impl Credentials {
    /// Resolves credentials from explicit values with environment fallback.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no API key is available from either
    /// source. A missing team id is not an error.
    pub fn resolve(api_key: Option<String>, team_id: Option<String>) -> Result<Self, Error> {
        let api_key = api_key.or_else(|| env_var(API_KEY_ENV)).ok_or_else(|| {
            Error::Validation(format!(
                "api_key must be specified or set through the {API_KEY_ENV} environment variable"
            ))
        })?;
        let team_id = team_id.or_else(|| env_var(TEAM_ID_ENV));
        Ok(Self { api_key, team_id })
    }
}

/// The server base URL, from the environment or the production default.
#[must_use]
pub fn server_base_url() -> String {
    env_var(SERVER_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_SERVER_BASE_URL.to_string())
}

/// The platform's default fusion set id from the environment, if set.
#[must_use]
pub fn default_fusion_set_id(platform: Platform) -> Option<String> {
    match platform {
        Platform::Android => env_var(ANDROID_FS_ID_ENV),
        Platform::Ios => env_var(IOS_FS_ID_ENV),
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
