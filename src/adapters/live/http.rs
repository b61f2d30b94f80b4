//! Live adapter for the `HttpClient` port using reqwest.

use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::ports::http::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, Method, RequestBody};

/// Live HTTP client for the fusion service.
pub struct LiveHttpClient {
    client: Client,
}

impl LiveHttpClient {
    /// Creates a new live client with a shared connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for LiveHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for LiveHttpClient {
    fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
        Box::pin(async move {
            let url = request.url.clone();

            let mut builder = match request.method {
                Method::Get => self.client.get(&request.url),
                Method::Post => self.client.post(&request.url),
                Method::Put => self.client.put(&request.url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            builder = match request.body {
                RequestBody::Empty => builder,
                RequestBody::Raw(bytes) => builder.body(bytes),
                RequestBody::Multipart { fields, attachments } => {
                    let mut form = Form::new();
                    for (name, value) in fields {
                        form = form.text(name, value);
                    }
                    for attachment in attachments {
                        let part =
                            Part::bytes(attachment.contents).file_name(attachment.file_name);
                        form = form.part(attachment.field, part);
                    }
                    builder.multipart(form)
                }
            };

            let response = builder.send().await.map_err(|e| -> HttpError {
                format!("request to {url} failed: {e}").into()
            })?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| -> HttpError {
                    format!("failed to read response from {url}: {e}").into()
                })?
                .to_vec();

            Ok(HttpResponse { url, status, body })
        })
    }
}
