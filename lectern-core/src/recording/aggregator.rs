//! Paginated retrieval and merging of recordings.
//!
//! One aggregation pass is N meeting-id pages plus M breakout-room
//! follow-up fetches, merged into a single result set keyed by record id.
//! A failed page contributes nothing and the pass continues; the caller
//! cannot tell a missing page from a page with no recordings.

use std::collections::HashSet;
use std::sync::Arc;

use super::normalize;
use super::store::HostStore;
use super::Recording;
use crate::api::{self, BbbClient, RecordingQuery};
use crate::config::RecordingsConfig;
use crate::profiles::EnabledFeatures;
use crate::session::SessionContext;
use crate::xml::XmlElement;

/// Maximum number of meeting ids per `getRecordings` request.
pub const RECORDINGS_PAGE_SIZE: usize = 25;

/// Aggregates live and imported recordings for presentation.
pub struct RecordingAggregator {
    client: Arc<BbbClient>,
    store: Arc<dyn HostStore>,
    sort_ascending: bool,
}

impl RecordingAggregator {
    /// Creates an aggregator over an injected server client and host
    /// store.
    pub fn new(
        client: Arc<BbbClient>,
        store: Arc<dyn HostStore>,
        config: &RecordingsConfig,
    ) -> Self {
        Self {
            client,
            store,
            sort_ascending: config.sort_ascending,
        }
    }

    /// Live recordings for a batch of meeting ids, sorted by start time.
    ///
    /// Meeting ids are fetched in pages of at most
    /// [`RECORDINGS_PAGE_SIZE`]; recordings that declare breakout rooms
    /// trigger one follow-up fetch per room, flattened into the same
    /// result set. On record-id collision the first-seen entry wins. A
    /// non-empty `record_ids` allow-list drops every other entry after
    /// sorting; an empty one means no filtering.
    pub async fn fetch_recordings(
        &self,
        meeting_ids: &[String],
        record_ids: &[String],
    ) -> Vec<Recording> {
        let mut recordings = Vec::new();
        if meeting_ids.is_empty() {
            return recordings;
        }

        let mut seen = HashSet::new();
        for page in meeting_ids.chunks(RECORDINGS_PAGE_SIZE) {
            let (fetched, followups) = self.fetch_page(RecordingQuery::Meetings(page)).await;
            merge(&mut recordings, fetched, &mut seen);
            for room_ids in followups {
                let (fetched, _) = self
                    .fetch_page(RecordingQuery::Recordings(&room_ids))
                    .await;
                merge(&mut recordings, fetched, &mut seen);
            }
        }

        self.sort(&mut recordings);
        if !record_ids.is_empty() {
            recordings.retain(|r| record_ids.iter().any(|id| *id == r.record_id));
        }
        recordings
    }

    /// Imported recording references for a course, reconstructed from the
    /// host event log.
    pub async fn imported_recordings(
        &self,
        course_id: i64,
        activity_id: Option<i64>,
        subset: bool,
    ) -> Vec<Recording> {
        self.store
            .imported_recordings(course_id, activity_id, subset)
            .await
            .into_iter()
            .map(|row| {
                let mut recording = row.recording;
                recording.imported = Some(row.id);
                if row.protected.is_some() {
                    recording.protected = row.protected;
                }
                recording
            })
            .collect()
    }

    /// Combined view for the recording table of one activity.
    ///
    /// Live recordings are scoped to the activity's own meeting when the
    /// room feature is enabled, to the whole course otherwise. Imported
    /// references are merged in under the collision rule - a live
    /// recording suppresses an imported reference with the same record id
    /// - unless the activity is configured to show imported references
    /// only.
    pub async fn recordings_for_table(
        &self,
        session: &SessionContext,
        features: &EnabledFeatures,
    ) -> Vec<Recording> {
        let activity = &session.activity;
        let scope = features.showroom.then_some(activity.id);
        let meeting_ids = self
            .store
            .course_meeting_ids(session.course_id, scope, activity.recordings_deleted)
            .await;

        let mut recordings = self.fetch_recordings(&meeting_ids, &[]).await;
        if features.importrecordings {
            let imported = self
                .imported_recordings(session.course_id, Some(activity.id), true)
                .await;
            if activity.recordings_imported {
                recordings = imported;
            } else {
                let live: HashSet<String> =
                    recordings.iter().map(|r| r.record_id.clone()).collect();
                recordings.extend(
                    imported
                        .into_iter()
                        .filter(|r| !live.contains(&r.record_id)),
                );
            }
            self.sort(&mut recordings);
        }
        recordings
    }

    async fn fetch_page(
        &self,
        query: RecordingQuery<'_>,
    ) -> (Vec<Recording>, Vec<Vec<String>>) {
        let mut recordings = Vec::new();
        let mut followups = Vec::new();

        let Some(response) = self.client.get_recordings(query).await else {
            return (recordings, followups);
        };
        if !api::is_success(&response) {
            tracing::warn!("getRecordings page reported failure, skipping page");
            return (recordings, followups);
        }
        let Some(container) = response.child("recordings") else {
            return (recordings, followups);
        };

        for node in container.children_named("recording") {
            followups.extend(breakout_followups(node, query));
            recordings.push(normalize::recording_from_node(node));
        }
        (recordings, followups)
    }

    fn sort(&self, recordings: &mut [Recording]) {
        // Stable sort keeps encounter order on equal start times.
        if self.sort_ascending {
            recordings.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        } else {
            recordings.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        }
    }
}

fn merge(out: &mut Vec<Recording>, fetched: Vec<Recording>, seen: &mut HashSet<String>) {
    for recording in fetched {
        if seen.insert(recording.record_id.clone()) {
            out.push(recording);
        }
    }
}

fn breakout_followups(node: &XmlElement, query: RecordingQuery<'_>) -> Vec<Vec<String>> {
    // Follow-up pages are already recording-id fetches; their breakout
    // declarations are not chased further.
    match query {
        RecordingQuery::Meetings(_) => normalize::breakout_room_ids(node),
        RecordingQuery::Recordings(_) => Vec::new(),
    }
}
