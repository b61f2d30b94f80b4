//! Remote-service plumbing: URLs, headers, request construction, and the
//! typed client.

pub mod client;
pub mod request;

use std::borrow::Cow;

use log::{debug, error, log_enabled, Level};

use crate::error::Error;
use crate::ports::http::{HttpRequest, HttpResponse, RequestBody};

pub use client::ApiClient;
pub use request::{Action, ActionRequest};

/// Content type for JSON requests.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Longest value printed for any single logged field.
pub const MAX_LOGGED_VALUE: usize = 500;

/// Truncates a value for logging so binary payloads cannot flood the logs.
#[must_use]
pub fn truncate_for_log(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_LOGGED_VALUE) {
        Some((idx, _)) => Cow::Owned(format!("{} ...", &value[..idx])),
        None => Cow::Borrowed(value),
    }
}

/// Builds the standard service headers.
///
/// The API key travels in `Authorization`; caching is disabled and the
/// connection kept alive across the pipeline's sequential calls.
#[must_use]
pub fn request_headers(api_key: &str, content_type: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![
        ("Authorization".to_string(), api_key.to_string()),
        ("Cache-Control".to_string(), "no-cache".to_string()),
        ("Accept-Encoding".to_string(), "gzip, deflate, br".to_string()),
        ("Connection".to_string(), "keep-alive".to_string()),
    ];
    if let Some(content_type) = content_type {
        headers.push(("Content-Type".to_string(), content_type.to_string()));
    }
    headers
}

/// Appends query parameters to a URL, skipping absent values.
#[must_use]
pub fn with_query(url: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut result = url.to_string();
    let mut separator = '?';
    for (name, value) in params {
        if let Some(value) = value {
            result.push(separator);
            result.push_str(name);
            result.push('=');
            result.push_str(value);
            separator = '&';
        }
    }
    result
}

/// Logs an outbound request at debug level with every field truncated.
pub fn debug_log_request(request: &HttpRequest) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    let headers: Vec<String> = request
        .headers
        .iter()
        .map(|(name, value)| format!("{name}: {}", truncate_for_log(value)))
        .collect();
    let body = match &request.body {
        RequestBody::Empty => String::new(),
        RequestBody::Raw(bytes) => format!(" with body: <{} bytes>.", bytes.len()),
        RequestBody::Multipart { fields, attachments } => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{name}={}", truncate_for_log(value)))
                .collect();
            let files: Vec<String> = attachments
                .iter()
                .map(|a| format!("{}={} ({} bytes)", a.field, a.file_name, a.contents.len()))
                .collect();
            format!(" with data: {{{}}}. with files: [{}].", fields.join(", "), files.join(", "))
        }
    };
    debug!(
        "About to {} {} with headers: {{{}}}.{}",
        request.method,
        request.url,
        headers.join(", "),
        body
    );
}

/// Classifies a response: 2xx passes through, anything else becomes a fatal
/// application error after logging the exchange.
///
/// # Errors
///
/// Returns [`Error::Api`] for non-2xx statuses. Never retried.
pub fn ensure_success(response: HttpResponse) -> Result<HttpResponse, Error> {
    if response.is_success() {
        return Ok(response);
    }
    let body = truncate_for_log(&response.text()).into_owned();
    error!(
        "Request to {} failed. Status Code: {}. Response: {body}",
        response.url, response.status
    );
    Err(Error::Api { url: response.url, status: response.status, body })
}

/// Parses a JSON response body into a typed value.
///
/// # Errors
///
/// Returns [`Error::Api`] when the body does not match the expected shape,
/// carrying the truncated body for diagnosis.
pub fn parse_json<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, Error> {
    response.json().map_err(|e| Error::Api {
        url: response.url.clone(),
        status: response.status,
        body: format!("unexpected response body ({e}): {}", truncate_for_log(&response.text())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::http::Method;

    #[test]
    fn short_values_pass_through_untruncated() {
        assert_eq!(truncate_for_log("short"), "short");
    }

    #[test]
    fn long_values_are_cut_at_the_limit() {
        let long = "x".repeat(MAX_LOGGED_VALUE + 100);
        let truncated = truncate_for_log(&long);
        assert_eq!(truncated.len(), MAX_LOGGED_VALUE + " ...".len());
        assert!(truncated.ends_with(" ..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_LOGGED_VALUE + 1);
        let truncated = truncate_for_log(&long);
        assert!(truncated.ends_with(" ..."));
        assert_eq!(truncated.chars().filter(|c| *c == 'é').count(), MAX_LOGGED_VALUE);
    }

    #[test]
    fn query_params_skip_absent_values() {
        assert_eq!(with_query("https://x/tasks", &[("team_id", None)]), "https://x/tasks");
        assert_eq!(
            with_query("https://x/tasks", &[("team_id", Some("t1"))]),
            "https://x/tasks?team_id=t1"
        );
        assert_eq!(
            with_query("https://x/output", &[("team_id", Some("t1")), ("action", Some("a"))]),
            "https://x/output?team_id=t1&action=a"
        );
        assert_eq!(
            with_query("https://x/output", &[("team_id", None), ("action", Some("a"))]),
            "https://x/output?action=a"
        );
    }

    #[test]
    fn headers_include_auth_and_keep_alive() {
        let headers = request_headers("key-1", Some(JSON_CONTENT_TYPE));
        assert!(headers.contains(&("Authorization".into(), "key-1".into())));
        assert!(headers.contains(&("Connection".into(), "keep-alive".into())));
        assert!(headers.contains(&("Content-Type".into(), JSON_CONTENT_TYPE.into())));
        let without = request_headers("key-1", None);
        assert!(!without.iter().any(|(name, _)| name == "Content-Type"));
    }

    #[test]
    fn ensure_success_rejects_bad_status() {
        let response = HttpResponse {
            url: "https://x/tasks".into(),
            status: 403,
            body: b"denied".to_vec(),
        };
        let err = ensure_success(response).unwrap_err();
        match err {
            crate::error::Error::Api { url, status, body } => {
                assert_eq!(url, "https://x/tasks");
                assert_eq!(status, 403);
                assert_eq!(body, "denied");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn debug_log_request_handles_all_bodies() {
        // Smoke test: must not panic on any body shape.
        for body in [
            RequestBody::Empty,
            RequestBody::Raw(vec![0u8; 16]),
            RequestBody::Multipart {
                fields: vec![("action".into(), "fuse".into())],
                attachments: vec![crate::ports::http::Attachment::placeholder()],
            },
        ] {
            debug_log_request(&HttpRequest {
                method: Method::Post,
                url: "https://x/tasks".into(),
                headers: request_headers("k", None),
                body,
            });
        }
    }
}
