//! Signed HTTP access to the remote conferencing-management API.
//!
//! Requests are checksum-signed URLs against the configured server base;
//! responses are XML documents with a `returncode` root field. Transport
//! and parse failures never surface as errors from this module - meeting
//! servers are routinely slow or briefly unreachable, so absent data is
//! the normal degraded outcome and is only logged.

pub mod client;
pub mod request;
pub mod transport;

// Re-export public API
pub use client::{BbbClient, RecordingQuery};
pub use request::action_url;
pub use transport::{HttpXmlFetcher, Method, XmlFetcher};

use crate::xml::XmlElement;

/// Return code the server uses for a completed action.
pub const RETURN_CODE_SUCCESS: &str = "SUCCESS";

/// Whether a response document reports a successful action.
pub fn is_success(response: &XmlElement) -> bool {
    response.child_text("returncode") == Some(RETURN_CODE_SUCCESS)
}
