//! Action Request Builder: assembles one task-action submission.

use std::fmt;

use crate::overrides::Overrides;
use crate::ports::http::{Attachment, HttpRequest, Method, RequestBody};

/// The closed set of remote actions a task can be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Build the app against a fusion set.
    Fuse,
    /// Rebrand / customize the built app.
    Context,
    /// Sign on the service with uploaded credentials.
    Sign,
    /// Prepare for fully local (private) signing.
    Seal,
    /// Produce a pre-generated signing script for automated local signing.
    SignScript,
}

impl Action {
    /// The wire name of the action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fuse => "fuse",
            Self::Context => "context",
            Self::Sign => "sign",
            Self::Seal => "seal",
            Self::SignScript => "sign_script",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task-action invocation, built per stage and consumed by the client.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// The action to run.
    pub action: Action,
    /// Parent task id; absent only for the first task in a chain.
    pub parent_task_id: Option<String>,
    /// Extra plain form fields (the `fuse` action carries `app_id` and
    /// `fusion_set_id` here).
    pub extra_fields: Vec<(String, String)>,
    /// Merged override set for the action.
    pub overrides: Overrides,
    /// File payloads, in submission order.
    pub attachments: Vec<Attachment>,
}

impl ActionRequest {
    /// Creates a request for an action chained onto a parent task.
    #[must_use]
    pub fn new(action: Action, parent_task_id: impl Into<String>, overrides: Overrides) -> Self {
        Self {
            action,
            parent_task_id: Some(parent_task_id.into()),
            extra_fields: Vec::new(),
            overrides,
            attachments: Vec::new(),
        }
    }

    /// Creates the chain-starting `fuse` request for an uploaded app.
    #[must_use]
    pub fn fuse(app_id: &str, fusion_set_id: &str, overrides: Overrides) -> Self {
        Self {
            action: Action::Fuse,
            parent_task_id: None,
            extra_fields: vec![
                ("app_id".to_string(), app_id.to_string()),
                ("fusion_set_id".to_string(), fusion_set_id.to_string()),
            ],
            overrides,
            attachments: Vec::new(),
        }
    }

    /// Adds a file attachment.
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Converts the request into a wire-ready multipart POST.
    ///
    /// The overrides travel as a single JSON-encoded form field. When no real
    /// attachment is present, the placeholder part is added — the service
    /// requires a multipart body even when no file is sent. The `fuse` action
    /// omits the `overrides` field entirely when the set is empty; chained
    /// actions always include it.
    #[must_use]
    pub fn into_http(self, url: String, headers: Vec<(String, String)>) -> HttpRequest {
        let mut fields = vec![("action".to_string(), self.action.as_str().to_string())];
        if let Some(parent) = self.parent_task_id {
            fields.push(("parent_task_id".to_string(), parent));
        }
        fields.extend(self.extra_fields);
        let include_overrides = self.action != Action::Fuse || !self.overrides.is_empty();
        if include_overrides {
            fields.push(("overrides".to_string(), self.overrides.to_json_string()));
        }

        let attachments = if self.attachments.is_empty() {
            vec![Attachment::placeholder()]
        } else {
            self.attachments
        };

        HttpRequest {
            method: Method::Post,
            url,
            headers,
            body: RequestBody::Multipart { fields, attachments },
        }
    }
}
