//! Command-line interface definition.
//!
//! Parsing is structural only; cross-argument rules (app source exclusivity,
//! platform inference, credential requirements) are validated in
//! [`crate::pipeline::params`] so they produce uniform validation errors.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::pipeline::context::ContextOptions;

/// Client for the mobile app fusion service.
#[derive(Debug, Parser)]
#[command(name = "fuseline", version, about)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: upload, build, optional rebrand, sign,
    /// download.
    Run(RunArgs),
    /// Upload an app binary and print its app id.
    Upload(UploadArgs),
    /// Submit a build task and wait for it to finish.
    Build(BuildArgs),
    /// Submit a context (rebranding) task and wait for it to finish.
    Context(ContextArgs),
    /// Sign a fused app on the service.
    Sign(SignCommandArgs),
    /// Prepare a fused app for fully local signing.
    PrivateSign(SignCommandArgs),
    /// Produce a pre-generated signing script for automated local signing.
    AutoDevSign(SignCommandArgs),
    /// Print the current status of a task.
    Status(TaskArgs),
    /// Download the output of a completed task.
    Download(DownloadArgs),
    /// Download the Certified Secure report of a completed task.
    Certificate(CertificateArgs),
    /// Upload a locally signed app for validation and wait for the verdict.
    Validate(ValidateArgs),
}

/// Arguments shared by every subcommand.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// API key. Defaults to the FUSELINE_API_KEY environment variable.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Team id for team-scoped requests. Defaults to FUSELINE_TEAM_ID.
    #[arg(long, short = 't')]
    pub team_id: Option<String>,

    /// Enable debug logging.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Signing credentials; which subset is required depends on the platform and
/// the selected signing variant.
#[derive(Debug, Clone, Default, Args)]
pub struct SigningArgs {
    /// Android keystore, or iOS P12, for on-service signing.
    #[arg(long, short = 'k')]
    pub keystore: Option<PathBuf>,

    /// Keystore or P12 password.
    #[arg(long)]
    pub keystore_pass: Option<String>,

    /// Android signing key alias.
    #[arg(long)]
    pub keystore_alias: Option<String>,

    /// Android signing key password.
    #[arg(long)]
    pub key_pass: Option<String>,

    /// SHA-1 fingerprint of the final Android signing certificate, for the
    /// local signing variants and Google Play App Signing.
    #[arg(long)]
    pub signing_fingerprint: Option<String>,

    /// The app is distributed through Google Play App Signing.
    #[arg(long, short = 'g')]
    pub google_play_signing: bool,

    /// iOS provisioning profiles, at least one for any iOS signing.
    #[arg(long, short = 'p', num_args = 1..)]
    pub provisioning_profiles: Vec<PathBuf>,

    /// iOS entitlements files for manual entitlements matching.
    #[arg(long, num_args = 1..)]
    pub entitlements: Vec<PathBuf>,
}

/// Rebranding flags; the context stage runs only when at least one is set.
#[derive(Debug, Clone, Default, Args)]
pub struct ContextFlags {
    /// Replacement app identifier.
    #[arg(long)]
    pub new_bundle_id: Option<String>,

    /// Replacement app version.
    #[arg(long)]
    pub new_version: Option<String>,

    /// Replacement build number.
    #[arg(long)]
    pub new_build_num: Option<String>,

    /// Replacement display name.
    #[arg(long)]
    pub new_display_name: Option<String>,

    /// Replacement app icon file.
    #[arg(long)]
    pub app_icon: Option<PathBuf>,

    /// Overlay image composited onto the existing icon.
    #[arg(long)]
    pub icon_overlay: Option<PathBuf>,
}

impl ContextFlags {
    /// Converts the raw flags into rebranding options.
    #[must_use]
    pub fn to_options(&self) -> ContextOptions {
        ContextOptions {
            new_bundle_id: self.new_bundle_id.clone(),
            new_version: self.new_version.clone(),
            new_build_num: self.new_build_num.clone(),
            new_display_name: self.new_display_name.clone(),
            app_icon: self.app_icon.clone(),
            icon_overlay: self.icon_overlay.clone(),
        }
    }
}

/// Download targets. Absent paths skip that download.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Where to write the fused, signed app.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Where to write the deobfuscation scripts.
    #[arg(long)]
    pub deobfuscation_script_output: Option<PathBuf>,

    /// Where to write the secondary binary format (universal APK for
    /// .aab builds).
    #[arg(long)]
    pub sign_second_output: Option<PathBuf>,

    /// Where to write the Certified Secure certificate PDF.
    #[arg(long)]
    pub certificate_output: Option<PathBuf>,

    /// Where to write the Certified Secure report as JSON.
    #[arg(long)]
    pub certificate_json: Option<PathBuf>,
}

/// Arguments for the full pipeline.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// App binary to upload (.ipa, .apk or .aab).
    #[arg(long, short = 'a')]
    pub app: Option<PathBuf>,

    /// Id of an app already uploaded to the service; skips the upload stage.
    #[arg(long)]
    pub app_id: Option<String>,

    /// Fusion set to build against. Defaults to the platform's
    /// FUSELINE_ANDROID_FS_ID / FUSELINE_IOS_FS_ID environment variable.
    #[arg(long, short = 'f')]
    pub fusion_set_id: Option<String>,

    /// JSON document of build overrides.
    #[arg(long, short = 'b')]
    pub build_overrides: Option<PathBuf>,

    /// Build with extended diagnostic logging.
    #[arg(long)]
    pub diagnostic_logs: bool,

    /// JSON document of sign overrides.
    #[arg(long)]
    pub sign_overrides: Option<PathBuf>,

    /// Sign on the service with uploaded credentials.
    #[arg(long, short = 's')]
    pub sign_on_service: bool,

    /// Prepare the app for fully local signing.
    #[arg(long)]
    pub private_signing: bool,

    /// Produce a pre-generated signing script for automated local signing.
    #[arg(long)]
    pub auto_dev_signing: bool,

    /// Signing credentials.
    #[command(flatten)]
    pub signing: SigningArgs,

    /// Rebranding flags for the optional context stage.
    #[command(flatten)]
    pub context: ContextFlags,

    /// Download targets.
    #[command(flatten)]
    pub outputs: OutputArgs,
}

/// Arguments for the upload subcommand.
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// App binary to upload.
    #[arg(long, short = 'a')]
    pub app: PathBuf,

    /// Upload in a single request instead of the link-issuance flow.
    /// Suitable for small binaries only.
    #[arg(long)]
    pub direct: bool,
}

/// Arguments for the build subcommand.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// App binary to upload (.ipa, .apk or .aab).
    #[arg(long, short = 'a')]
    pub app: Option<PathBuf>,

    /// Id of an app already uploaded to the service.
    #[arg(long)]
    pub app_id: Option<String>,

    /// Fusion set to build against. With --app, defaults to the platform's
    /// environment variable.
    #[arg(long, short = 'f')]
    pub fusion_set_id: Option<String>,

    /// JSON document of build overrides.
    #[arg(long, short = 'b')]
    pub build_overrides: Option<PathBuf>,

    /// Build with extended diagnostic logging.
    #[arg(long)]
    pub diagnostic_logs: bool,

    /// Where to write the fused app once the build completes.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the context subcommand.
#[derive(Debug, Args)]
pub struct ContextArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Task the context stage continues from.
    #[arg(long)]
    pub task_id: String,

    /// Rebranding flags.
    #[command(flatten)]
    pub flags: ContextFlags,

    /// Where to write the rebranded app once the task completes.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments shared by the three signing subcommands.
#[derive(Debug, Args)]
pub struct SignCommandArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Task the signing stage continues from.
    #[arg(long)]
    pub task_id: String,

    /// Signing credentials.
    #[command(flatten)]
    pub signing: SigningArgs,

    /// JSON document of sign overrides.
    #[arg(long)]
    pub sign_overrides: Option<PathBuf>,

    /// Download targets.
    #[command(flatten)]
    pub outputs: OutputArgs,
}

/// Arguments for the status subcommand.
#[derive(Debug, Args)]
pub struct TaskArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Task to query.
    #[arg(long)]
    pub task_id: String,
}

/// Arguments for the download subcommand.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Completed task whose output to download.
    #[arg(long)]
    pub task_id: String,

    /// Where to write the output.
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

/// Arguments for the certificate subcommand.
#[derive(Debug, Args)]
pub struct CertificateArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Completed task whose Certified Secure report to download.
    #[arg(long)]
    pub task_id: String,

    /// Where to write the certificate PDF.
    #[arg(long)]
    pub certificate_output: Option<PathBuf>,

    /// Where to write the report as JSON.
    #[arg(long)]
    pub certificate_json: Option<PathBuf>,
}

/// Arguments for the validate subcommand.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Locally signed app binary to validate.
    #[arg(long, short = 'a')]
    pub app: PathBuf,
}
