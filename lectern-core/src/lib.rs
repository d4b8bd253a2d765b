//! Lectern Core - Conferencing-server recording retrieval and aggregation
//!
//! This crate provides the building blocks for surfacing meeting recordings
//! inside a course activity: signed request construction for the remote
//! conferencing API, XML response fetching, recording normalization and
//! aggregation, and the session/feature model the web layer projects from.

pub mod api;
pub mod config;
pub mod profiles;
pub mod recording;
pub mod session;
pub mod xml;

// Re-export main types for convenient access
pub use api::{BbbClient, HttpXmlFetcher, XmlFetcher};
pub use config::{ConfigError, LecternConfig};
pub use recording::{Recording, RecordingAggregator};
pub use session::{SessionContext, SessionError, SessionResolver};

/// Core errors that can bubble up from any Lectern subsystem.
///
/// Transport and parse failures against the conferencing server are not
/// errors at all - they degrade to absent data at the fetch layer. This
/// enum covers the faults a caller can actually act on.
#[derive(Debug, thiserror::Error)]
pub enum LecternError {
    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl LecternError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            LecternError::Session(e) => match e {
                session::SessionError::UnknownActivity { id } => {
                    format!("Activity {id} does not exist or is no longer available")
                }
                session::SessionError::AccessDenied { .. } => {
                    "You are not allowed to view this activity".to_string()
                }
            },
            // The config errors already read as user guidance.
            LecternError::Configuration(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LecternError>;
