//! In-memory host store double.
//!
//! Imported references are kept the way the host event log keeps them: a
//! JSON blob with a `recording` sub-object, deserialized on every read.
//! That keeps the serialization round trip of imported recordings inside
//! the test surface.

use async_trait::async_trait;
use lectern_core::recording::{HostStore, ImportedRecording, Recording};

struct MeetingFixture {
    course_id: i64,
    activity_id: i64,
    meeting_id: String,
    deleted: bool,
}

struct ImportFixture {
    id: i64,
    course_id: i64,
    activity_id: i64,
    meta: serde_json::Value,
    protected: Option<bool>,
}

/// Host store backed by plain vectors.
#[derive(Default)]
pub struct InMemoryHostStore {
    meetings: Vec<MeetingFixture>,
    imports: Vec<ImportFixture>,
}

impl InMemoryHostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a meeting announced by an activity.
    pub fn add_meeting(&mut self, course_id: i64, activity_id: i64, meeting_id: &str) {
        self.meetings.push(MeetingFixture {
            course_id,
            activity_id,
            meeting_id: meeting_id.to_string(),
            deleted: false,
        });
    }

    /// Registers a meeting whose activity instance has been deleted.
    pub fn add_deleted_meeting(&mut self, course_id: i64, activity_id: i64, meeting_id: &str) {
        self.meetings.push(MeetingFixture {
            course_id,
            activity_id,
            meeting_id: meeting_id.to_string(),
            deleted: true,
        });
    }

    /// Stores an imported-recording reference and returns its row id.
    pub fn add_imported(
        &mut self,
        course_id: i64,
        activity_id: i64,
        recording: &Recording,
        protected: Option<bool>,
    ) -> i64 {
        let id = self.imports.len() as i64 + 1;
        self.imports.push(ImportFixture {
            id,
            course_id,
            activity_id,
            meta: serde_json::json!({ "recording": recording }),
            protected,
        });
        id
    }
}

#[async_trait]
impl HostStore for InMemoryHostStore {
    async fn course_meeting_ids(
        &self,
        course_id: i64,
        activity_id: Option<i64>,
        include_deleted: bool,
    ) -> Vec<String> {
        let mut ids = Vec::new();
        for meeting in &self.meetings {
            if meeting.course_id != course_id {
                continue;
            }
            if let Some(activity_id) = activity_id {
                if meeting.activity_id != activity_id {
                    continue;
                }
            }
            if meeting.deleted && !include_deleted {
                continue;
            }
            if !ids.contains(&meeting.meeting_id) {
                ids.push(meeting.meeting_id.clone());
            }
        }
        ids
    }

    async fn imported_recordings(
        &self,
        course_id: i64,
        activity_id: Option<i64>,
        subset: bool,
    ) -> Vec<ImportedRecording> {
        self.imports
            .iter()
            .filter(|row| row.course_id == course_id)
            .filter(|row| match (activity_id, subset) {
                (Some(id), true) => row.activity_id == id,
                (Some(id), false) => row.activity_id != id,
                (None, _) => true,
            })
            .filter_map(|row| {
                match serde_json::from_value::<Recording>(row.meta["recording"].clone()) {
                    Ok(recording) => Some(ImportedRecording {
                        id: row.id,
                        recording,
                        protected: row.protected,
                    }),
                    Err(e) => {
                        tracing::warn!("skipping undecodable imported row {}: {e}", row.id);
                        None
                    }
                }
            })
            .collect()
    }
}
