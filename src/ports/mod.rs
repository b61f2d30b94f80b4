//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system (the remote service's HTTP transport, time).
//! Implementations live in `src/adapters/`.

pub mod http;
pub mod sleep;

pub use http::{Attachment, HttpClient, HttpRequest, HttpResponse, Method, RequestBody};
pub use sleep::Sleeper;
