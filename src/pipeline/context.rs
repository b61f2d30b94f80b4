//! Context (rebranding) request assembly.

use std::path::PathBuf;

use serde_json::json;

use crate::api::request::{Action, ActionRequest};
use crate::error::Error;
use crate::overrides::Overrides;
use crate::ports::http::Attachment;

/// Rebranding options for the optional context stage.
///
/// The stage runs only when at least one option is set.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Replacement app identifier.
    pub new_bundle_id: Option<String>,
    /// Replacement app version.
    pub new_version: Option<String>,
    /// Replacement build number.
    pub new_build_num: Option<String>,
    /// Replacement display name.
    pub new_display_name: Option<String>,
    /// Replacement app icon file.
    pub app_icon: Option<PathBuf>,
    /// Overlay image composited onto the existing icon.
    pub icon_overlay: Option<PathBuf>,
}

impl ContextOptions {
    /// True when any rebranding option was requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.new_bundle_id.is_some()
            || self.new_version.is_some()
            || self.new_build_num.is_some()
            || self.new_display_name.is_some()
            || self.app_icon.is_some()
            || self.icon_overlay.is_some()
    }

    /// Assembles the context submission for the given parent task.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when an icon file cannot be read.
    pub fn build_request(&self, parent_task_id: &str) -> Result<ActionRequest, Error> {
        let mut overrides = Overrides::new();
        if let Some(bundle_id) = &self.new_bundle_id {
            overrides.insert("app_customization_pack_bundle_identifier", json!(bundle_id));
        }
        if let Some(version) = &self.new_version {
            overrides.insert("app_customization_pack_bundle_version", json!(version));
        }
        if let Some(build_num) = &self.new_build_num {
            overrides.insert("app_customization_pack_bundle_build_number", json!(build_num));
        }
        if let Some(display_name) = &self.new_display_name {
            overrides.insert("app_customization_pack_bundle_display_name", json!(display_name));
        }

        let mut request = ActionRequest::new(Action::Context, parent_task_id, Overrides::new());
        if let Some(icon) = &self.app_icon {
            request.attach(Attachment::read("app_customization_application_icon", icon)?);
        }
        if let Some(overlay) = &self.icon_overlay {
            overrides.insert("icon_overlay", json!(true));
            request.attach(Attachment::read("icon_overlay_s3", overlay)?);
        }
        request.overrides = overrides;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_options_request_nothing() {
        assert!(!ContextOptions::default().is_requested());
    }

    #[test]
    fn any_single_option_requests_the_stage() {
        let options = ContextOptions { new_version: Some("2.0".into()), ..Default::default() };
        assert!(options.is_requested());
    }

    #[test]
    fn rebranding_fields_map_to_customization_keys() {
        let options = ContextOptions {
            new_bundle_id: Some("com.example.white".into()),
            new_display_name: Some("White Label".into()),
            ..Default::default()
        };
        let request = options.build_request("T1").unwrap();
        assert_eq!(request.action, Action::Context);
        assert_eq!(request.parent_task_id.as_deref(), Some("T1"));
        assert_eq!(
            request.overrides.get("app_customization_pack_bundle_identifier"),
            Some(&json!("com.example.white"))
        );
        assert_eq!(
            request.overrides.get("app_customization_pack_bundle_display_name"),
            Some(&json!("White Label"))
        );
        assert!(request.attachments.is_empty());
    }

    #[test]
    fn icon_overlay_attaches_file_and_sets_flag() {
        let dir = std::env::temp_dir().join("fuseline_context_overlay");
        std::fs::create_dir_all(&dir).unwrap();
        let overlay = dir.join("overlay.png");
        std::fs::write(&overlay, b"png").unwrap();

        let options = ContextOptions { icon_overlay: Some(overlay), ..Default::default() };
        let request = options.build_request("T1").unwrap();
        assert_eq!(request.overrides.get("icon_overlay"), Some(&json!(true)));
        assert_eq!(request.attachments.len(), 1);
        assert_eq!(request.attachments[0].field, "icon_overlay_s3");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
