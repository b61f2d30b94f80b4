//! Validated run parameters.
//!
//! Everything here is checked before any remote call: app source, platform,
//! fusion set resolution, signing credentials, and output paths. The
//! orchestrator receives only already-validated parameters.

use std::path::{Path, PathBuf};

use log::info;
use serde_json::json;

use crate::cli::{OutputArgs, RunArgs, SigningArgs};
use crate::config;
use crate::error::Error;
use crate::overrides::Overrides;
use crate::pipeline::context::ContextOptions;
use crate::pipeline::sign::{LocalSigning, ServiceSigning, SigningMethod};

/// Target mobile platform, inferred rather than flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Android (`.apk` / `.aab`).
    Android,
    /// iOS (`.ipa`).
    Ios,
}

/// What initiates the pipeline: a local binary to upload, or an app already
/// on the service. Exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSource {
    /// Local file uploaded as the first stage.
    File(PathBuf),
    /// Existing app id; upload is skipped.
    Existing(String),
}

/// Which signing variant the caller selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningSelection {
    /// Sign on the service.
    OnService,
    /// Fully local signing.
    PrivateLocal,
    /// Pre-generated signing script.
    AutoDevScript,
}

/// Output paths for the download stage. Absent paths skip that download.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// The fused, signed app.
    pub output: Option<PathBuf>,
    /// Deobfuscation scripts (obfuscating fusion sets only).
    pub deobfuscation_script_output: Option<PathBuf>,
    /// Secondary binary format (universal APK for `.aab` builds).
    pub sign_second_output: Option<PathBuf>,
    /// Certified Secure report, PDF form.
    pub certificate_output: Option<PathBuf>,
    /// Certified Secure report, structured JSON form.
    pub certificate_json: Option<PathBuf>,
}

impl OutputOptions {
    /// Validates output arguments: every configured path is prepared before
    /// any remote call.
    ///
    /// # Errors
    ///
    /// Returns the first path preparation failure.
    pub fn from_args(args: &OutputArgs) -> Result<Self, Error> {
        let outputs = Self {
            output: args.output.clone(),
            deobfuscation_script_output: args.deobfuscation_script_output.clone(),
            sign_second_output: args.sign_second_output.clone(),
            certificate_output: args.certificate_output.clone(),
            certificate_json: args.certificate_json.clone(),
        };
        for path in [
            outputs.output.as_deref(),
            outputs.deobfuscation_script_output.as_deref(),
            outputs.sign_second_output.as_deref(),
            outputs.certificate_output.as_deref(),
            outputs.certificate_json.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            prepare_output_path(path)?;
        }
        Ok(outputs)
    }
}

/// Fully validated parameters for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// App source (local file or existing id).
    pub app: AppSource,
    /// Fusion set the build stage runs against.
    pub fusion_set_id: String,
    /// Build overrides, caller document plus explicit flags.
    pub build_overrides: Overrides,
    /// Caller sign-override document, merged during sign assembly.
    pub sign_overrides: Overrides,
    /// The selected signing variant with its credentials.
    pub signing: SigningMethod,
    /// Rebranding stage, present only when requested.
    pub context: Option<ContextOptions>,
    /// Download targets.
    pub outputs: OutputOptions,
}

impl RunParams {
    /// Validates raw CLI arguments into run parameters.
    ///
    /// # Errors
    ///
    /// Returns a validation error for any invalid argument combination:
    /// ambiguous app source or platform, unresolvable fusion set, missing
    /// credentials for the selected signing variant, or an output path that
    /// is a directory. No remote call has been made when this fails.
    pub fn from_args(args: &RunArgs) -> Result<Self, Error> {
        let app = match (&args.app, &args.app_id) {
            (Some(_), Some(_)) => {
                return Err(Error::Validation(
                    "exactly one of --app and --app-id may be given".into(),
                ))
            }
            (Some(path), None) => AppSource::File(path.clone()),
            (None, Some(id)) => AppSource::Existing(id.clone()),
            (None, None) => {
                return Err(Error::Validation("either --app or --app-id must be given".into()))
            }
        };

        let platform = detect_platform(
            match &app {
                AppSource::File(path) => Some(path.as_path()),
                AppSource::Existing(_) => None,
            },
            &args.signing,
        )?;

        let fusion_set_id = match &args.fusion_set_id {
            Some(id) => id.clone(),
            None => config::default_fusion_set_id(platform).ok_or_else(|| {
                Error::Validation(
                    "fusion_set_id must be specified or set through the platform environment variable"
                        .into(),
                )
            })?,
        };

        let selection = signing_selection(args)?;
        let signing = signing_method(selection, platform, &args.signing)?;

        let mut build_overrides = Overrides::from_file(args.build_overrides.as_deref())?;
        if args.diagnostic_logs {
            build_overrides.insert("extended_logs", json!(true));
        }
        let sign_overrides = Overrides::from_file(args.sign_overrides.as_deref())?;

        let context = args.context.to_options();
        let context = context.is_requested().then_some(context);

        let outputs = OutputOptions::from_args(&args.outputs)?;

        Ok(Self { app, fusion_set_id, build_overrides, sign_overrides, signing, context, outputs })
    }
}

/// Determines the signing selection from the three mutually exclusive flags.
///
/// # Errors
///
/// Returns a validation error unless exactly one flag is set.
pub fn signing_selection(args: &RunArgs) -> Result<SigningSelection, Error> {
    let selected = [args.sign_on_service, args.private_signing, args.auto_dev_signing]
        .iter()
        .filter(|flag| **flag)
        .count();
    if selected != 1 {
        return Err(Error::Validation(
            "exactly one of --sign-on-service, --private-signing and --auto-dev-signing must be selected"
                .into(),
        ));
    }
    Ok(if args.sign_on_service {
        SigningSelection::OnService
    } else if args.private_signing {
        SigningSelection::PrivateLocal
    } else {
        SigningSelection::AutoDevScript
    })
}

/// Infers the platform from the app extension, falling back to the shape of
/// the signing credentials when only an app id was supplied.
///
/// # Errors
///
/// Returns a validation error for an unknown extension or ambiguous
/// credentials.
pub fn detect_platform(app: Option<&Path>, signing: &SigningArgs) -> Result<Platform, Error> {
    if let Some(path) = app {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        return match extension.as_str() {
            "ipa" => Ok(Platform::Ios),
            "apk" | "aab" => Ok(Platform::Android),
            other => Err(Error::Validation(format!(
                "App extension [.{other}] must be .ipa, .apk or .aab"
            ))),
        };
    }

    let has_profiles = !signing.provisioning_profiles.is_empty();
    let has_android_creds =
        signing.signing_fingerprint.is_some() || signing.keystore_alias.is_some();
    match (has_profiles, has_android_creds) {
        (true, false) => Ok(Platform::Ios),
        (false, true) => Ok(Platform::Android),
        _ => Err(Error::Validation(
            "please specify the correct platform signing credentials".into(),
        )),
    }
}

/// Builds the signing method for a selection and platform, validating that
/// the required credentials are present.
///
/// # Errors
///
/// Returns a validation error when a credential required by the selected
/// variant is missing.
pub fn signing_method(
    selection: SigningSelection,
    platform: Platform,
    args: &SigningArgs,
) -> Result<SigningMethod, Error> {
    if platform == Platform::Ios && args.provisioning_profiles.is_empty() {
        return Err(Error::Validation(
            "provisioning_profiles must be specified when using any iOS signing".into(),
        ));
    }

    match selection {
        SigningSelection::OnService => {
            let (Some(keystore), Some(keystore_pass)) = (&args.keystore, &args.keystore_pass)
            else {
                return Err(Error::Validation(
                    "keystore and keystore_pass must be specified when signing on the service"
                        .into(),
                ));
            };
            let signing = match platform {
                Platform::Android => {
                    let (Some(key_alias), Some(key_pass)) = (&args.keystore_alias, &args.key_pass)
                    else {
                        return Err(Error::Validation(
                            "keystore_alias and key_pass must be specified for on-service Android signing"
                                .into(),
                        ));
                    };
                    ServiceSigning::Android {
                        keystore: keystore.clone(),
                        keystore_pass: keystore_pass.clone(),
                        key_alias: key_alias.clone(),
                        key_pass: key_pass.clone(),
                        google_play_fingerprint: args
                            .google_play_signing
                            .then(|| args.signing_fingerprint.clone())
                            .flatten(),
                    }
                }
                Platform::Ios => ServiceSigning::Ios {
                    keystore: keystore.clone(),
                    keystore_pass: keystore_pass.clone(),
                    provisioning_profiles: args.provisioning_profiles.clone(),
                    entitlements: args.entitlements.clone(),
                },
            };
            Ok(SigningMethod::OnService(signing))
        }
        SigningSelection::PrivateLocal | SigningSelection::AutoDevScript => {
            let local = match platform {
                Platform::Android => {
                    let Some(signing_fingerprint) = args.signing_fingerprint.clone() else {
                        return Err(Error::Validation(
                            "signing_fingerprint must be specified when using any Android local signing"
                                .into(),
                        ));
                    };
                    LocalSigning::Android {
                        signing_fingerprint,
                        google_play_signing: args.google_play_signing,
                    }
                }
                Platform::Ios => LocalSigning::Ios {
                    provisioning_profiles: args.provisioning_profiles.clone(),
                    entitlements: args.entitlements.clone(),
                },
            };
            Ok(match selection {
                SigningSelection::PrivateLocal => SigningMethod::PrivateLocal(local),
                _ => SigningMethod::AutoDevScript(local),
            })
        }
    }
}

/// Prepares an output path: rejects directories and creates missing parent
/// directories.
///
/// # Errors
///
/// Returns a validation error for a directory path, or an I/O error when the
/// parent directory cannot be created.
pub fn prepare_output_path(path: &Path) -> Result<(), Error> {
    if path.is_dir() {
        return Err(Error::Validation(format!(
            "Output parameter [{}] should be a path to a file, not a directory",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating non-existent output directory [{}]", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::io(format!("creating output directory {}", parent.display()), e)
            })?;
        }
    }
    Ok(())
}
