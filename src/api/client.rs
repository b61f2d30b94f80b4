//! Typed client for the fusion service's HTTP API.
//!
//! Each method performs one step of the remote protocol: upload-link
//! issuance, binary upload, task creation, status query, output retrieval.
//! Transport failures outside the status poller are fatal immediately —
//! submissions are not idempotent-safe and a blind retry could create
//! duplicate remote tasks.

use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use super::request::ActionRequest;
use super::{
    debug_log_request, ensure_success, parse_json, request_headers, with_query, JSON_CONTENT_TYPE,
};
use crate::config::Credentials;
use crate::error::Error;
use crate::ports::http::{
    Attachment, HttpClient, HttpError, HttpRequest, HttpResponse, Method, RequestBody,
};

/// Response to an upload-link request.
#[derive(Debug, Deserialize)]
struct UploadLink {
    /// Pre-signed storage URL the binary is `PUT` to.
    url: String,
    /// File id to register once the binary is in place.
    file_id: String,
}

/// Response to an upload registration or direct upload.
#[derive(Debug, Deserialize)]
struct UploadedApp {
    id: String,
}

/// Response to a task creation.
#[derive(Debug, Deserialize)]
struct TaskCreated {
    task_id: String,
}

/// Response to a validation upload.
#[derive(Debug, Deserialize)]
struct ValidationCreated {
    id: String,
}

/// Typed API client bound to one server and one set of credentials.
pub struct ApiClient<'a> {
    http: &'a dyn HttpClient,
    base_url: String,
    credentials: Credentials,
}

impl<'a> ApiClient<'a> {
    /// Creates a client for the given server and credentials.
    pub fn new(http: &'a dyn HttpClient, base_url: impl Into<String>, credentials: Credentials) -> Self {
        let base_url = base_url.into();
        Self { http, base_url: base_url.trim_end_matches('/').to_string(), credentials }
    }

    fn api_url(&self, segments: &[&str]) -> String {
        format!("{}/api/v1/{}", self.base_url, segments.join("/"))
    }

    fn team_id(&self) -> Option<&str> {
        self.credentials.team_id.as_deref()
    }

    fn headers(&self, content_type: Option<&str>) -> Vec<(String, String)> {
        request_headers(&self.credentials.api_key, content_type)
    }

    /// Sends one request whose failure is fatal: transport errors propagate
    /// immediately and non-2xx responses become application errors.
    async fn execute_fatal(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        debug_log_request(&request);
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        ensure_success(response)
    }

    /// Uploads an app binary via the link-issuance flow and returns the new
    /// app id.
    ///
    /// Three exchanges: fetch a pre-signed storage link, `PUT` the binary to
    /// it, then register the upload. None of them is polled.
    ///
    /// # Errors
    ///
    /// Fatal on any transport failure, non-2xx response, or unreadable file.
    pub async fn upload(&self, path: &Path) -> Result<String, Error> {
        info!("Preparing to upload [{}]", path.display());
        let link_url = with_query(&self.api_url(&["upload-link"]), &[("team_id", self.team_id())]);
        let response = self
            .execute_fatal(HttpRequest {
                method: Method::Get,
                url: link_url,
                headers: self.headers(None),
                body: RequestBody::Empty,
            })
            .await?;
        let link: UploadLink = parse_json(&response)?;

        info!("Uploading file id {} to url: {}", link.file_id, link.url);
        let contents = std::fs::read(path)
            .map_err(|e| Error::io(format!("reading app file {}", path.display()), e))?;
        self.execute_fatal(HttpRequest {
            method: Method::Put,
            url: link.url,
            headers: Vec::new(),
            body: RequestBody::Raw(contents),
        })
        .await?;

        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let register_url =
            with_query(&self.api_url(&["upload-using-link"]), &[("team_id", self.team_id())]);
        let response = self
            .execute_fatal(HttpRequest {
                method: Method::Post,
                url: register_url,
                headers: self.headers(None),
                body: RequestBody::Multipart {
                    fields: vec![
                        ("file_app_id".to_string(), link.file_id),
                        ("file_name".to_string(), file_name),
                    ],
                    attachments: vec![Attachment::placeholder()],
                },
            })
            .await?;
        let app: UploadedApp = parse_json(&response)?;
        info!("Upload done. App id: {}", app.id);
        Ok(app.id)
    }

    /// Uploads an app binary in a single multipart request and returns the
    /// new app id. Suitable for small binaries only.
    ///
    /// # Errors
    ///
    /// Fatal on any transport failure, non-2xx response, or unreadable file.
    pub async fn direct_upload(&self, path: &Path) -> Result<String, Error> {
        let url = with_query(&self.api_url(&["upload"]), &[("team_id", self.team_id())]);
        let attachment = Attachment::read("file", path)?;
        let response = self
            .execute_fatal(HttpRequest {
                method: Method::Post,
                url,
                headers: self.headers(None),
                body: RequestBody::Multipart { fields: Vec::new(), attachments: vec![attachment] },
            })
            .await?;
        let app: UploadedApp = parse_json(&response)?;
        Ok(app.id)
    }

    /// Submits a task action and returns the created task id.
    ///
    /// # Errors
    ///
    /// Fatal on transport failure or non-2xx response; never retried.
    pub async fn submit(&self, action: ActionRequest) -> Result<String, Error> {
        let url = with_query(&self.api_url(&["tasks"]), &[("team_id", self.team_id())]);
        let request = action.into_http(url, self.headers(None));
        let response = self.execute_fatal(request).await?;
        debug!("Task submission response: {}", super::truncate_for_log(&response.text()));
        let created: TaskCreated = parse_json(&response)?;
        Ok(created.task_id)
    }

    /// Queries a task's status. Raw transport result: the poller owns
    /// retry and classification.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged; a non-2xx response arrives as
    /// `Ok`.
    pub async fn query_status(&self, task_id: &str) -> Result<HttpResponse, HttpError> {
        let url = with_query(
            &self.api_url(&["tasks", task_id, "status"]),
            &[("team_id", self.team_id())],
        );
        let request = HttpRequest {
            method: Method::Get,
            url,
            headers: self.headers(Some(JSON_CONTENT_TYPE)),
            body: RequestBody::Empty,
        };
        debug_log_request(&request);
        self.http.execute(request).await
    }

    async fn fetch(&self, task_id: &str, command: &str, action: Option<&str>) -> Result<Vec<u8>, Error> {
        let url = with_query(
            &self.api_url(&["tasks", task_id, command]),
            &[("team_id", self.team_id()), ("action", action)],
        );
        let response = self
            .execute_fatal(HttpRequest {
                method: Method::Get,
                url,
                headers: self.headers(None),
                body: RequestBody::Empty,
            })
            .await?;
        Ok(response.body)
    }

    /// Downloads a task output. `action` selects a secondary output such as
    /// `deobfuscation_script` or `sign_second_output`.
    ///
    /// # Errors
    ///
    /// Fatal on transport failure or non-2xx response.
    pub async fn fetch_output(&self, task_id: &str, action: Option<&str>) -> Result<Vec<u8>, Error> {
        self.fetch(task_id, "output", action).await
    }

    /// Downloads the Certified Secure report as a PDF document.
    ///
    /// # Errors
    ///
    /// Fatal on transport failure or non-2xx response.
    pub async fn fetch_certificate(&self, task_id: &str) -> Result<Vec<u8>, Error> {
        self.fetch(task_id, "certificate", None).await
    }

    /// Downloads the Certified Secure report as structured JSON.
    ///
    /// # Errors
    ///
    /// Fatal on transport failure or non-2xx response.
    pub async fn fetch_certificate_json(&self, task_id: &str) -> Result<Vec<u8>, Error> {
        self.fetch(task_id, "certificate-json", None).await
    }

    /// Uploads a locally signed app for validation and returns the
    /// validation id. Not team-scoped.
    ///
    /// # Errors
    ///
    /// Fatal on any transport failure, non-2xx response, or unreadable file.
    pub async fn validation_upload(&self, path: &Path) -> Result<String, Error> {
        let attachment = Attachment::read("file", path)?;
        let response = self
            .execute_fatal(HttpRequest {
                method: Method::Post,
                url: self.api_url(&["validation", "upload"]),
                headers: self.headers(None),
                body: RequestBody::Multipart { fields: Vec::new(), attachments: vec![attachment] },
            })
            .await?;
        let created: ValidationCreated = parse_json(&response)?;
        Ok(created.id)
    }

    /// Queries a validation's status. Raw transport result, as
    /// [`Self::query_status`].
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn query_validation_status(
        &self,
        validation_id: &str,
    ) -> Result<HttpResponse, HttpError> {
        let request = HttpRequest {
            method: Method::Get,
            url: self.api_url(&["validation", validation_id, "status"]),
            headers: self.headers(Some(JSON_CONTENT_TYPE)),
            body: RequestBody::Empty,
        };
        debug_log_request(&request);
        self.http.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::http::HttpFuture;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport: pops canned results and records every request.
    struct ScriptedHttp {
        responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttp {
        fn new(responses: Vec<Result<HttpResponse, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn ok(status: u16, body: &str) -> Result<HttpResponse, String> {
            Ok(HttpResponse { url: "https://x".into(), status, body: body.as_bytes().to_vec() })
        }
    }

    impl HttpClient for ScriptedHttp {
        fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
            self.requests.lock().unwrap().push(request);
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted response available");
            Box::pin(async move { next.map_err(Into::into) })
        }
    }

    fn client_with<'a>(http: &'a ScriptedHttp, team: Option<&str>) -> ApiClient<'a> {
        ApiClient::new(
            http,
            "https://fusion.test/",
            Credentials { api_key: "key-1".into(), team_id: team.map(String::from) },
        )
    }

    #[tokio::test]
    async fn submit_posts_to_team_scoped_tasks_url() {
        let http = ScriptedHttp::new(vec![ScriptedHttp::ok(200, r#"{"task_id":"T9"}"#)]);
        let client = client_with(&http, Some("team-7"));
        let task_id = client
            .submit(ActionRequest::fuse("A1", "FS1", crate::overrides::Overrides::new()))
            .await
            .unwrap();
        assert_eq!(task_id, "T9");

        let requests = http.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://fusion.test/api/v1/tasks?team_id=team-7");
        assert_eq!(requests[0].method, Method::Post);
    }

    #[tokio::test]
    async fn submit_surfaces_application_error() {
        let http = ScriptedHttp::new(vec![ScriptedHttp::ok(422, "bad fusion set")]);
        let client = client_with(&http, None);
        let err = client
            .submit(ActionRequest::fuse("A1", "FS1", crate::overrides::Overrides::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 422, .. }));
    }

    #[tokio::test]
    async fn submit_transport_failure_is_fatal() {
        let http = ScriptedHttp::new(vec![Err("connection refused".into())]);
        let client = client_with(&http, None);
        let err = client
            .submit(ActionRequest::fuse("A1", "FS1", crate::overrides::Overrides::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        // Exactly one attempt: submissions are never retried.
        assert_eq!(http.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_runs_three_exchanges_and_returns_app_id() {
        let dir = std::env::temp_dir().join("fuseline_client_upload");
        std::fs::create_dir_all(&dir).unwrap();
        let app = dir.join("demo.apk");
        std::fs::write(&app, b"binary").unwrap();

        let http = ScriptedHttp::new(vec![
            ScriptedHttp::ok(200, r#"{"url":"https://storage.test/b1","file_id":"F1"}"#),
            ScriptedHttp::ok(200, ""),
            ScriptedHttp::ok(200, r#"{"id":"A1"}"#),
        ]);
        let client = client_with(&http, None);
        let app_id = client.upload(&app).await.unwrap();
        assert_eq!(app_id, "A1");

        let requests = http.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "https://fusion.test/api/v1/upload-link");
        // The storage PUT goes to the pre-signed URL without service headers.
        assert_eq!(requests[1].method, Method::Put);
        assert_eq!(requests[1].url, "https://storage.test/b1");
        assert!(requests[1].headers.is_empty());
        assert_eq!(requests[1].body, RequestBody::Raw(b"binary".to_vec()));
        assert_eq!(requests[2].url, "https://fusion.test/api/v1/upload-using-link");
        match &requests[2].body {
            RequestBody::Multipart { fields, attachments } => {
                assert!(fields.contains(&("file_app_id".into(), "F1".into())));
                assert!(fields.contains(&("file_name".into(), "demo.apk".into())));
                assert_eq!(attachments, &[Attachment::placeholder()]);
            }
            other => panic!("expected multipart body, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn upload_link_with_missing_fields_is_an_api_error() {
        let dir = std::env::temp_dir().join("fuseline_client_badlink");
        std::fs::create_dir_all(&dir).unwrap();
        let app = dir.join("demo.apk");
        std::fs::write(&app, b"binary").unwrap();

        let http = ScriptedHttp::new(vec![ScriptedHttp::ok(200, r#"{"unexpected":true}"#)]);
        let client = client_with(&http, None);
        let err = client.upload(&app).await.unwrap_err();
        assert!(matches!(err, Error::Api { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn status_query_is_json_typed_and_team_scoped() {
        let http = ScriptedHttp::new(vec![ScriptedHttp::ok(200, r#"{"status":"progress"}"#)]);
        let client = client_with(&http, Some("team-7"));
        let response = client.query_status("T1").await.unwrap();
        assert_eq!(response.status, 200);

        let requests = http.requests.lock().unwrap();
        assert_eq!(requests[0].url, "https://fusion.test/api/v1/tasks/T1/status?team_id=team-7");
        assert!(requests[0]
            .headers
            .contains(&("Content-Type".into(), JSON_CONTENT_TYPE.into())));
    }

    #[tokio::test]
    async fn output_url_carries_action_parameter() {
        let http = ScriptedHttp::new(vec![ScriptedHttp::ok(200, "bytes")]);
        let client = client_with(&http, None);
        let bytes = client.fetch_output("T1", Some("deobfuscation_script")).await.unwrap();
        assert_eq!(bytes, b"bytes");

        let requests = http.requests.lock().unwrap();
        assert_eq!(
            requests[0].url,
            "https://fusion.test/api/v1/tasks/T1/output?action=deobfuscation_script"
        );
    }
}
