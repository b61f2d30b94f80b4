//! Live adapters backed by real I/O.

pub mod http;
pub mod sleep;

pub use http::LiveHttpClient;
pub use sleep::TokioSleeper;
