//! HTTP transport port for talking to the fusion service.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::de::DeserializeOwned;

/// Boxed future type alias used by [`HttpClient`] to keep the trait
/// dyn-compatible.
pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Transport-level error: the exchange itself failed (connection refused,
/// reset, timeout). A response that arrived with a bad status is *not* one of
/// these — that classification belongs to the caller.
pub type HttpError = Box<dyn Error + Send + Sync>;

/// HTTP method for a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        };
        f.write_str(name)
    }
}

/// A named file payload sent as one multipart entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The multipart field name.
    pub field: String,
    /// The file name reported to the service.
    pub file_name: String,
    /// The raw file contents.
    pub contents: Vec<u8>,
}

impl Attachment {
    /// Reads a local file into an attachment for the given field.
    ///
    /// The file handle is opened, drained, and closed inside this call; no
    /// handle outlives request construction.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn read(field: impl Into<String>, path: &Path) -> Result<Self, crate::error::Error> {
        let contents = std::fs::read(path)
            .map_err(|e| crate::error::Error::io(format!("reading {}", path.display()), e))?;
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { field: field.into(), file_name, contents })
    }

    /// The placeholder part sent when an action carries no real attachment.
    ///
    /// The service rejects task submissions without a multipart body, so an
    /// empty marker part named `None` is sent in place of real files.
    #[must_use]
    pub fn placeholder() -> Self {
        Self { field: "None".to_string(), file_name: String::new(), contents: Vec::new() }
    }
}

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// Multipart form: plain text fields plus file parts.
    Multipart {
        /// Ordered `(name, value)` text fields.
        fields: Vec<(String, String)>,
        /// Ordered file parts.
        attachments: Vec<Attachment>,
    },
    /// Raw bytes (used for the storage upload `PUT`).
    Raw(Vec<u8>),
}

/// One fully-assembled outbound request. Ephemeral: constructed per stage and
/// consumed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// The absolute request URL, query string included.
    pub url: String,
    /// Header `(name, value)` pairs.
    pub headers: Vec<(String, String)>,
    /// The request body.
    pub body: RequestBody,
}

/// A raw response: status plus body bytes, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The URL the request was sent to, kept for diagnostics.
    pub url: String,
    /// The HTTP status code.
    pub status: u16,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as text, lossily decoded.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the body is not valid JSON of
    /// the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Sends a single HTTP exchange to the fusion service.
///
/// Implementations perform exactly one request per call and never retry;
/// retry policy lives in the status poller.
pub trait HttpClient: Send + Sync {
    /// Executes the request and returns the raw response.
    ///
    /// # Errors
    ///
    /// The boxed error covers transport failures only; an application-level
    /// bad status arrives as an `Ok` response.
    fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_the_empty_marker() {
        let marker = Attachment::placeholder();
        assert_eq!(marker.field, "None");
        assert!(marker.file_name.is_empty());
        assert!(marker.contents.is_empty());
    }

    #[test]
    fn success_covers_2xx_only() {
        let mut response =
            HttpResponse { url: "https://x".into(), status: 200, body: Vec::new() };
        assert!(response.is_success());
        response.status = 204;
        assert!(response.is_success());
        response.status = 302;
        assert!(!response.is_success());
        response.status = 500;
        assert!(!response.is_success());
    }

    #[test]
    fn json_decodes_body() {
        #[derive(serde::Deserialize)]
        struct Created {
            task_id: String,
        }
        let response = HttpResponse {
            url: "https://x".into(),
            status: 200,
            body: br#"{"task_id":"T1"}"#.to_vec(),
        };
        let created: Created = response.json().unwrap();
        assert_eq!(created.task_id, "T1");
    }
}
