//! HTTP request handlers.

pub mod recordings;

// Re-export handler functions
pub use recordings::{Column, RecordingTableResponse, TableData, recording_list_table};
