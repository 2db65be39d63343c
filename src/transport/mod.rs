//! Outbound HTTP transport to the model service.

mod http;

pub use http::{Credentials, HttpTransport};
