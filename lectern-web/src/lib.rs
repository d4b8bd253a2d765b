//! Lectern Web - JSON API server for the recording table
//!
//! Serves the single remote operation the client-side table widget
//! invokes, plus the HTML row components it renders. All recording data
//! is read through `lectern-core`; this crate never mutates anything.

pub mod components;
pub mod handlers;
pub mod server;

// Re-export main types
pub use server::{AppState, router, run_server};
