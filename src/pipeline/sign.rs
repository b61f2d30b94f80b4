//! Signing request assembly.
//!
//! Exactly one signing variant runs per pipeline: on-service signing with
//! uploaded credentials, private (fully local) signing, or a pre-generated
//! signing script for automated local signing. Each variant knows its
//! mandatory override keys and file attachments; caller-supplied sign
//! overrides are layered on afterwards with the credential keys protected.

use std::path::PathBuf;

use serde_json::json;

use crate::api::request::{Action, ActionRequest};
use crate::error::Error;
use crate::overrides::{Overrides, PROTECTED_KEYS};
use crate::ports::http::Attachment;

/// Override key carrying the final Android signing certificate fingerprint.
pub const ANDROID_SIGNING_FINGERPRINT_KEY: &str = "signing_sha1_fingerprint";

/// How and where the fused app gets signed. Closed set; the caller selects
/// exactly one.
#[derive(Debug, Clone)]
pub enum SigningMethod {
    /// Sign on the service with uploaded credentials.
    OnService(ServiceSigning),
    /// Prepare the app for fully local signing.
    PrivateLocal(LocalSigning),
    /// Produce a pre-generated script for automated local signing.
    AutoDevScript(LocalSigning),
}

/// Credentials for on-service signing.
#[derive(Debug, Clone)]
pub enum ServiceSigning {
    /// Android keystore-based signing.
    Android {
        /// Path to the keystore uploaded with the request.
        keystore: PathBuf,
        /// Keystore password.
        keystore_pass: String,
        /// Alias of the signing key.
        key_alias: String,
        /// Password of the signing key.
        key_pass: String,
        /// Google Play App Signing certificate fingerprint, when the app is
        /// distributed through that program.
        google_play_fingerprint: Option<String>,
    },
    /// iOS P12-based signing.
    Ios {
        /// Path to the P12 keystore uploaded with the request.
        keystore: PathBuf,
        /// P12 password.
        keystore_pass: String,
        /// Provisioning profiles, at least one.
        provisioning_profiles: Vec<PathBuf>,
        /// Entitlements plists for manual entitlements matching.
        entitlements: Vec<PathBuf>,
    },
}

/// Parameters for the local signing variants, which never receive secrets.
#[derive(Debug, Clone)]
pub enum LocalSigning {
    /// Android: the service only needs the final certificate fingerprint.
    Android {
        /// SHA-1 or SHA-256 fingerprint of the final signing certificate.
        signing_fingerprint: String,
        /// Whether the app is distributed via Google Play App Signing.
        google_play_signing: bool,
    },
    /// iOS: the service needs the provisioning profiles.
    Ios {
        /// Provisioning profiles, at least one.
        provisioning_profiles: Vec<PathBuf>,
        /// Entitlements plists; only used by the signing-script variant.
        entitlements: Vec<PathBuf>,
    },
}

impl SigningMethod {
    /// The remote action this variant submits.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::OnService(_) => Action::Sign,
            Self::PrivateLocal(_) => Action::Seal,
            Self::AutoDevScript(_) => Action::SignScript,
        }
    }

    /// Assembles the signing submission for the given parent task.
    ///
    /// Mandatory overrides and attachments are computed from the variant;
    /// `caller_overrides` is applied on top with the credential keys
    /// protected.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when a credential file cannot be read.
    pub fn build_request(
        &self,
        parent_task_id: &str,
        caller_overrides: &Overrides,
    ) -> Result<ActionRequest, Error> {
        let mut overrides = Overrides::new();
        let mut attachments = Vec::new();

        match self {
            Self::OnService(ServiceSigning::Android {
                keystore,
                keystore_pass,
                key_alias,
                key_pass,
                google_play_fingerprint,
            }) => {
                overrides.insert("signing_keystore_password", json!(keystore_pass));
                overrides.insert("signing_keystore_alias", json!(key_alias));
                overrides.insert("signing_keystore_key_password", json!(key_pass));
                add_google_play_fingerprint(google_play_fingerprint.as_deref(), &mut overrides);
                attachments.push(Attachment::read("signing_keystore", keystore)?);
            }
            Self::OnService(ServiceSigning::Ios {
                keystore,
                keystore_pass,
                provisioning_profiles,
                entitlements,
            }) => {
                overrides.insert("signing_p12_password", json!(keystore_pass));
                attachments.push(Attachment::read("signing_p12_content", keystore)?);
                add_profiles_and_entitlements(
                    provisioning_profiles,
                    entitlements,
                    &mut overrides,
                    &mut attachments,
                )?;
            }
            Self::PrivateLocal(local) | Self::AutoDevScript(local) => match local {
                LocalSigning::Android { signing_fingerprint, google_play_signing } => {
                    if *google_play_signing {
                        add_google_play_fingerprint(Some(signing_fingerprint), &mut overrides);
                    } else {
                        overrides
                            .insert(ANDROID_SIGNING_FINGERPRINT_KEY, json!(signing_fingerprint));
                    }
                }
                LocalSigning::Ios { provisioning_profiles, entitlements } => {
                    // The seal action takes profiles only; entitlements are
                    // consumed by the signing-script variant.
                    let entitlements: &[PathBuf] = if matches!(self, Self::PrivateLocal(_)) {
                        &[]
                    } else {
                        entitlements
                    };
                    add_profiles_and_entitlements(
                        provisioning_profiles,
                        entitlements,
                        &mut overrides,
                        &mut attachments,
                    )?;
                }
            },
        }

        let overrides = overrides.merged_with(caller_overrides, PROTECTED_KEYS);
        let mut request = ActionRequest::new(self.action(), parent_task_id, overrides);
        for attachment in attachments {
            request.attach(attachment);
        }
        Ok(request)
    }
}

/// Marks the app as Google Play-signed and records the program's certificate
/// fingerprint. No-op without a fingerprint.
fn add_google_play_fingerprint(fingerprint: Option<&str>, overrides: &mut Overrides) {
    if let Some(fingerprint) = fingerprint {
        overrides.insert("signing_keystore_use_google_signing", json!(true));
        overrides.insert("signing_keystore_google_signing_sha1_key", json!(fingerprint));
    }
}

/// Attaches provisioning profiles and, when present, entitlements files with
/// the manual-matching flag.
fn add_profiles_and_entitlements(
    provisioning_profiles: &[PathBuf],
    entitlements: &[PathBuf],
    overrides: &mut Overrides,
    attachments: &mut Vec<Attachment>,
) -> Result<(), Error> {
    for profile in provisioning_profiles {
        attachments.push(Attachment::read("provisioning_profile", profile)?);
    }
    if !entitlements.is_empty() {
        overrides.insert("manual_entitlements_matching", json!(true));
        for entitlements_path in entitlements {
            attachments.push(Attachment::read("entitlements_files", entitlements_path)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn write_temp(dir: &Path, name: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    #[test]
    fn on_service_android_carries_credentials_and_keystore() {
        let dir = std::env::temp_dir().join("fuseline_sign_android");
        let keystore = write_temp(&dir, "release.keystore");

        let method = SigningMethod::OnService(ServiceSigning::Android {
            keystore,
            keystore_pass: "store-pass".into(),
            key_alias: "release".into(),
            key_pass: "key-pass".into(),
            google_play_fingerprint: None,
        });
        let request = method.build_request("T1", &Overrides::new()).unwrap();

        assert_eq!(request.action, Action::Sign);
        assert_eq!(request.parent_task_id.as_deref(), Some("T1"));
        assert_eq!(request.overrides.get("signing_keystore_password"), Some(&json!("store-pass")));
        assert_eq!(request.overrides.get("signing_keystore_alias"), Some(&json!("release")));
        assert_eq!(
            request.overrides.get("signing_keystore_key_password"),
            Some(&json!("key-pass"))
        );
        assert_eq!(request.attachments.len(), 1);
        assert_eq!(request.attachments[0].field, "signing_keystore");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn google_play_fingerprint_sets_program_keys() {
        let dir = std::env::temp_dir().join("fuseline_sign_gp");
        let keystore = write_temp(&dir, "upload.keystore");

        let method = SigningMethod::OnService(ServiceSigning::Android {
            keystore,
            keystore_pass: "p".into(),
            key_alias: "a".into(),
            key_pass: "kp".into(),
            google_play_fingerprint: Some("AB:CD".into()),
        });
        let request = method.build_request("T1", &Overrides::new()).unwrap();
        assert_eq!(
            request.overrides.get("signing_keystore_use_google_signing"),
            Some(&json!(true))
        );
        assert_eq!(
            request.overrides.get("signing_keystore_google_signing_sha1_key"),
            Some(&json!("AB:CD"))
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn on_service_ios_attaches_profiles_and_entitlements() {
        let dir = std::env::temp_dir().join("fuseline_sign_ios");
        let p12 = write_temp(&dir, "dist.p12");
        let profile_a = write_temp(&dir, "a.mobileprovision");
        let profile_b = write_temp(&dir, "b.mobileprovision");
        let entitlements = write_temp(&dir, "app.entitlements");

        let method = SigningMethod::OnService(ServiceSigning::Ios {
            keystore: p12,
            keystore_pass: "p12-pass".into(),
            provisioning_profiles: vec![profile_a, profile_b],
            entitlements: vec![entitlements],
        });
        let request = method.build_request("T1", &Overrides::new()).unwrap();

        assert_eq!(request.overrides.get("signing_p12_password"), Some(&json!("p12-pass")));
        assert_eq!(request.overrides.get("manual_entitlements_matching"), Some(&json!(true)));
        let fields: Vec<&str> = request.attachments.iter().map(|a| a.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "signing_p12_content",
                "provisioning_profile",
                "provisioning_profile",
                "entitlements_files"
            ]
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn private_android_uses_plain_fingerprint_key() {
        let method = SigningMethod::PrivateLocal(LocalSigning::Android {
            signing_fingerprint: "AA:BB".into(),
            google_play_signing: false,
        });
        let request = method.build_request("T1", &Overrides::new()).unwrap();
        assert_eq!(request.action, Action::Seal);
        assert_eq!(
            request.overrides.get(ANDROID_SIGNING_FINGERPRINT_KEY),
            Some(&json!("AA:BB"))
        );
        assert!(request.attachments.is_empty());
    }

    #[test]
    fn seal_ignores_entitlements_but_sign_script_uses_them() {
        let dir = std::env::temp_dir().join("fuseline_sign_seal_vs_script");
        let profile = write_temp(&dir, "a.mobileprovision");
        let entitlements = write_temp(&dir, "app.entitlements");
        let local = LocalSigning::Ios {
            provisioning_profiles: vec![profile],
            entitlements: vec![entitlements],
        };

        let seal = SigningMethod::PrivateLocal(local.clone())
            .build_request("T1", &Overrides::new())
            .unwrap();
        assert_eq!(seal.overrides.get("manual_entitlements_matching"), None);
        assert_eq!(seal.attachments.len(), 1);

        let script = SigningMethod::AutoDevScript(local)
            .build_request("T1", &Overrides::new())
            .unwrap();
        assert_eq!(script.action, Action::SignScript);
        assert_eq!(script.overrides.get("manual_entitlements_matching"), Some(&json!(true)));
        assert_eq!(script.attachments.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn caller_overrides_cannot_replace_credentials() {
        let dir = std::env::temp_dir().join("fuseline_sign_protected");
        let keystore = write_temp(&dir, "release.keystore");

        let method = SigningMethod::OnService(ServiceSigning::Android {
            keystore,
            keystore_pass: "real-pass".into(),
            key_alias: "real-alias".into(),
            key_pass: "real-key-pass".into(),
            google_play_fingerprint: None,
        });
        let mut caller = Overrides::new();
        caller.insert("signing_keystore_password", json!("evil"));
        caller.insert("extended_logs", json!(true));

        let request = method.build_request("T1", &caller).unwrap();
        assert_eq!(request.overrides.get("signing_keystore_password"), Some(&json!("real-pass")));
        assert_eq!(request.overrides.get("extended_logs"), Some(&json!(true)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
