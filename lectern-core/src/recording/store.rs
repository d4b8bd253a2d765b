//! Host-storage access used by the aggregation pipeline.
//!
//! The host application owns the relational store; this crate only reads
//! two shapes out of it: the meeting ids a course has announced to the
//! conferencing server, and imported recording references kept as event
//! rows. Both come through one injected trait so tests can substitute an
//! in-memory double.

use async_trait::async_trait;

use super::Recording;

/// One imported-recording reference row from the host event log.
///
/// The row's own id becomes the recording's `imported` marker; the
/// optional protection column overrides the serialized recording's flag.
#[derive(Debug, Clone)]
pub struct ImportedRecording {
    pub id: i64,
    pub recording: Recording,
    pub protected: Option<bool>,
}

/// Read-only view of the host application's storage.
#[async_trait]
pub trait HostStore: Send + Sync {
    /// Meeting ids announced for a course, optionally restricted to one
    /// activity. `include_deleted` also returns meetings of activity
    /// instances that have since been removed but still have recordings
    /// on the server.
    async fn course_meeting_ids(
        &self,
        course_id: i64,
        activity_id: Option<i64>,
        include_deleted: bool,
    ) -> Vec<String>;

    /// Imported recording references for a course. With `subset` the
    /// result is restricted to the given activity; without it the rows of
    /// the whole course except that activity are returned.
    async fn imported_recordings(
        &self,
        course_id: i64,
        activity_id: Option<i64>,
        subset: bool,
    ) -> Vec<ImportedRecording>;
}
