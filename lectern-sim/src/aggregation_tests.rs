//! End-to-end aggregation tests over the simulated server.
//!
//! These exercise the full pipeline: signed URL construction, checksum
//! verification, XML generation and parsing, normalization, pagination,
//! breakout follow-ups and the imported-recording merge.

use std::collections::BTreeMap;
use std::sync::Arc;

use lectern_core::api::{BbbClient, RecordingQuery};
use lectern_core::config::{FeaturesConfig, RecordingsConfig, ServerConfig};
use lectern_core::profiles::{EnabledFeatures, InstanceType};
use lectern_core::recording::{Recording, RecordingAggregator, recording_from_node};
use lectern_core::session::{Activity, GroupMode, SessionContext};
use parking_lot::Mutex;

use crate::fetcher::SimulatedXmlFetcher;
use crate::server::SimulatedConferenceServer;
use crate::store::InMemoryHostStore;

const SECRET: &str = "sim-secret";

struct Harness {
    server: Arc<Mutex<SimulatedConferenceServer>>,
    store: InMemoryHostStore,
}

impl Harness {
    fn new() -> Self {
        Self {
            server: Arc::new(Mutex::new(SimulatedConferenceServer::new(SECRET))),
            store: InMemoryHostStore::new(),
        }
    }

    fn client(&self, secret: &str) -> Arc<BbbClient> {
        let config = ServerConfig {
            base_url: "https://bbb.example.com".to_string(),
            shared_secret: secret.to_string(),
            ..ServerConfig::default()
        };
        Arc::new(BbbClient::new(
            config,
            Arc::new(SimulatedXmlFetcher::new(self.server.clone())),
        ))
    }

    fn aggregator(self) -> (RecordingAggregator, Arc<Mutex<SimulatedConferenceServer>>) {
        let server = self.server.clone();
        let client = self.client(SECRET);
        let aggregator =
            RecordingAggregator::new(client, Arc::new(self.store), &RecordingsConfig::default());
        (aggregator, server)
    }
}

fn recording(record_id: &str, meeting_id: &str, start_time: i64) -> Recording {
    Recording {
        record_id: record_id.to_string(),
        meeting_id: meeting_id.to_string(),
        meeting_name: format!("Meeting {meeting_id}"),
        published: true,
        start_time,
        end_time: start_time + 60_000,
        playbacks: Vec::new(),
        protected: None,
        imported: None,
        metadata: BTreeMap::new(),
    }
}

fn session(activity_id: i64, meeting_id: &str, kind: InstanceType) -> SessionContext {
    SessionContext {
        activity: Activity {
            id: activity_id,
            meeting_id: meeting_id.to_string(),
            name: "Seminar".to_string(),
            kind,
            opening_time: None,
            closing_time: None,
            recordings_html: false,
            recordings_preview: true,
            recordings_imported: false,
            recordings_deleted: false,
            group_mode: GroupMode::None,
            group: None,
        },
        course_id: 5,
        administrator: false,
        moderator: true,
        can_manage_recordings: true,
        server_version: Some("2.4".to_string()),
        trusted_server: false,
        user_groups: Vec::new(),
    }
}

fn all_features() -> EnabledFeatures {
    EnabledFeatures::for_type(InstanceType::RoomWithRecordings, &FeaturesConfig::default())
}

#[tokio::test]
async fn test_pagination_splits_at_twenty_five_ids() {
    let mut harness = Harness::new();
    {
        let mut server = harness.server.lock();
        server.add_recording(recording("r-first", "m0", 1000));
        server.add_recording(recording("r-last", "m27", 2000));
    }
    harness.store.add_meeting(5, 9, "m0");
    let (aggregator, server) = harness.aggregator();

    let meeting_ids: Vec<String> = (0..30).map(|i| format!("m{i}")).collect();
    let recordings = aggregator.fetch_recordings(&meeting_ids, &[]).await;

    assert_eq!(server.lock().request_count("getRecordings"), 2);
    // The page union covers recordings from both pages.
    let ids: Vec<&str> = recordings.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["r-last", "r-first"]);
}

#[tokio::test]
async fn test_page_union_equals_unpaginated_fetch() {
    let harness = Harness::new();
    {
        let mut server = harness.server.lock();
        server.add_recording(recording("r-a", "m3", 4000));
        server.add_recording(recording("r-b", "m17", 1000));
        server.add_recording(recording("r-c", "m26", 3000));
        server.add_recording(recording("r-d", "m29", 2000));
    }
    let client = harness.client(SECRET);
    let (aggregator, _) = harness.aggregator();

    let meeting_ids: Vec<String> = (0..30).map(|i| format!("m{i}")).collect();
    let mut paged: Vec<String> = aggregator
        .fetch_recordings(&meeting_ids, &[])
        .await
        .into_iter()
        .map(|r| r.record_id)
        .collect();
    paged.sort();

    // The simulated server has no page limit, so one oversized request
    // stands in for the hypothetical unpaginated fetch.
    let response = client
        .get_recordings(RecordingQuery::Meetings(&meeting_ids))
        .await
        .unwrap();
    let mut single: Vec<String> = response
        .child("recordings")
        .unwrap()
        .children_named("recording")
        .map(|node| recording_from_node(node).record_id)
        .collect();
    single.sort();

    assert_eq!(paged, single);
}

#[tokio::test]
async fn test_wrong_secret_degrades_to_empty_result() {
    let harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("r1", "m1", 1000));
    let client = harness.client("not-the-secret");
    let aggregator = RecordingAggregator::new(
        client,
        Arc::new(harness.store),
        &RecordingsConfig::default(),
    );

    let recordings = aggregator
        .fetch_recordings(&["m1".to_string()], &[])
        .await;

    assert!(recordings.is_empty());
}

#[tokio::test]
async fn test_breakout_recordings_flatten_into_result() {
    let harness = Harness::new();
    {
        let mut server = harness.server.lock();
        server.add_recording_with_breakouts(
            recording("parent", "m1", 1000),
            vec!["child".to_string()],
        );
        server.add_recording(recording("child", "m1-breakout-1", 3000));
    }
    let (aggregator, server) = harness.aggregator();

    let recordings = aggregator
        .fetch_recordings(&["m1".to_string()], &[])
        .await;

    // One page plus one follow-up fetch.
    assert_eq!(server.lock().request_count("getRecordings"), 2);
    let ids: Vec<&str> = recordings.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["child", "parent"]);
}

#[tokio::test]
async fn test_allow_list_drops_other_recordings() {
    let harness = Harness::new();
    {
        let mut server = harness.server.lock();
        server.add_recording(recording("keep", "m1", 1000));
        server.add_recording(recording("drop", "m1", 2000));
    }
    let (aggregator, _) = harness.aggregator();

    let recordings = aggregator
        .fetch_recordings(&["m1".to_string()], &["keep".to_string()])
        .await;

    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].record_id, "keep");
}

#[tokio::test]
async fn test_live_recording_suppresses_imported_reference() {
    let mut harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("shared", "mtg-5-9", 1000));
    harness.store.add_meeting(5, 9, "mtg-5-9");
    let mut imported = recording("shared", "mtg-old", 1000);
    imported.meeting_name = "Imported copy".to_string();
    harness.store.add_imported(5, 9, &imported, None);
    let (aggregator, _) = harness.aggregator();

    let session = session(9, "mtg-5-9", InstanceType::RoomWithRecordings);
    let recordings = aggregator
        .recordings_for_table(&session, &all_features())
        .await;

    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].meeting_id, "mtg-5-9");
    assert!(!recordings[0].is_imported());
}

#[tokio::test]
async fn test_imported_only_mode_ignores_live_recordings() {
    let mut harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("shared", "mtg-5-9", 1000));
    harness.store.add_meeting(5, 9, "mtg-5-9");
    harness
        .store
        .add_imported(5, 9, &recording("shared", "mtg-old", 1000), None);
    let (aggregator, _) = harness.aggregator();

    let mut session = session(9, "mtg-5-9", InstanceType::RoomWithRecordings);
    session.activity.recordings_imported = true;
    let recordings = aggregator
        .recordings_for_table(&session, &all_features())
        .await;

    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].meeting_id, "mtg-old");
    assert!(recordings[0].is_imported());
}

#[tokio::test]
async fn test_imported_row_carries_marker_and_protection_override() {
    let mut harness = Harness::new();
    let mut stored = recording("r-import", "mtg-old", 1000);
    stored.protected = Some(false);
    let row_id = harness.store.add_imported(5, 9, &stored, Some(true));
    let (aggregator, _) = harness.aggregator();

    let imported = aggregator.imported_recordings(5, Some(9), true).await;

    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].imported, Some(row_id));
    // The row's protection column overrides the serialized flag.
    assert_eq!(imported[0].protected, Some(true));
}

#[tokio::test]
async fn test_room_scope_limits_live_fetch_to_own_activity() {
    let mut harness = Harness::new();
    {
        let mut server = harness.server.lock();
        server.add_recording(recording("mine", "mtg-5-9", 1000));
        server.add_recording(recording("other", "mtg-5-10", 2000));
    }
    harness.store.add_meeting(5, 9, "mtg-5-9");
    harness.store.add_meeting(5, 10, "mtg-5-10");
    let (aggregator, _) = harness.aggregator();

    // A room activity only lists its own meeting.
    let room = session(9, "mtg-5-9", InstanceType::RoomWithRecordings);
    let recordings = aggregator
        .recordings_for_table(&room, &all_features())
        .await;
    let ids: Vec<&str> = recordings.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["mine"]);

    // A recording-only activity lists the whole course.
    let list_only = session(11, "mtg-5-11", InstanceType::RecordingOnly);
    let list_features =
        EnabledFeatures::for_type(InstanceType::RecordingOnly, &FeaturesConfig::default());
    let recordings = aggregator
        .recordings_for_table(&list_only, &list_features)
        .await;
    let ids: Vec<&str> = recordings.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["other", "mine"]);
}

#[tokio::test]
async fn test_deleted_instance_meetings_need_opt_in() {
    let mut harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("ghost", "mtg-5-del", 1000));
    harness.store.add_meeting(5, 9, "mtg-5-9");
    harness.store.add_deleted_meeting(5, 9, "mtg-5-del");
    let (aggregator, _) = harness.aggregator();

    let mut session = session(9, "mtg-5-9", InstanceType::RoomWithRecordings);
    let recordings = aggregator
        .recordings_for_table(&session, &all_features())
        .await;
    assert!(recordings.is_empty());

    session.activity.recordings_deleted = true;
    let recordings = aggregator
        .recordings_for_table(&session, &all_features())
        .await;
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].record_id, "ghost");
}

#[tokio::test]
async fn test_server_version_and_failure_probe() {
    let harness = Harness::new();
    let client = harness.client(SECRET);

    assert_eq!(client.server_version().await.as_deref(), Some("2.4"));
    assert_eq!(client.probe().await, Some(200));

    harness.server.lock().set_failing(true);
    assert_eq!(client.server_version().await, None);
    assert_eq!(client.probe().await, None);

    {
        let mut server = harness.server.lock();
        server.set_failing(false);
        server.set_version("0.81");
    }
    assert_eq!(client.server_version().await.as_deref(), Some("0.81"));
}

#[tokio::test]
async fn test_publish_round_trip() {
    let harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("r1", "m1", 1000));
    let client = harness.client(SECRET);

    assert!(client.publish_recordings(&["r1".to_string()], false).await);

    let aggregator = RecordingAggregator::new(
        client,
        Arc::new(InMemoryHostStore::new()),
        &RecordingsConfig::default(),
    );
    let recordings = aggregator
        .fetch_recordings(&["m1".to_string()], &[])
        .await;
    assert_eq!(recordings.len(), 1);
    assert!(!recordings[0].published);
}

#[tokio::test]
async fn test_mutation_batch_fails_on_unknown_id_but_keeps_applied_ones() {
    let harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("known", "m1", 1000));
    let client = harness.client(SECRET);

    let ok = client
        .publish_recordings(&["known".to_string(), "missing".to_string()], false)
        .await;

    // The batch reports failure, yet the id processed before the failing
    // one stays applied - the remote API has no transactions.
    assert!(!ok);
    let aggregator = RecordingAggregator::new(
        client,
        Arc::new(InMemoryHostStore::new()),
        &RecordingsConfig::default(),
    );
    let recordings = aggregator
        .fetch_recordings(&["m1".to_string()], &[])
        .await;
    assert!(!recordings[0].published);
}

#[tokio::test]
async fn test_update_recordings_rewrites_vendor_metadata() {
    let harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("r1", "m1", 1000));
    let client = harness.client(SECRET);

    assert!(
        client
            .update_recordings(
                &["r1".to_string()],
                &[("bbb-recording-name", "Renamed lecture")],
            )
            .await
    );

    let aggregator = RecordingAggregator::new(
        client,
        Arc::new(InMemoryHostStore::new()),
        &RecordingsConfig::default(),
    );
    let recordings = aggregator
        .fetch_recordings(&["m1".to_string()], &[])
        .await;
    assert_eq!(
        recordings[0].meta("meta_bbb-recording-name"),
        Some("Renamed lecture")
    );
}

#[tokio::test]
async fn test_delete_recordings_removes_them() {
    let harness = Harness::new();
    harness
        .server
        .lock()
        .add_recording(recording("r1", "m1", 1000));
    let client = harness.client(SECRET);

    assert!(client.delete_recordings(&["r1".to_string()]).await);

    let aggregator = RecordingAggregator::new(
        client,
        Arc::new(InMemoryHostStore::new()),
        &RecordingsConfig::default(),
    );
    assert!(
        aggregator
            .fetch_recordings(&["m1".to_string()], &[])
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_merged_view_sorts_newest_first_by_default() {
    let mut harness = Harness::new();
    {
        let mut server = harness.server.lock();
        server.add_recording(recording("old", "mtg-5-9", 1000));
        server.add_recording(recording("new", "mtg-5-9", 9000));
    }
    harness.store.add_meeting(5, 9, "mtg-5-9");
    harness
        .store
        .add_imported(5, 9, &recording("middle", "mtg-old", 5000), None);
    let (aggregator, _) = harness.aggregator();

    let session = session(9, "mtg-5-9", InstanceType::RoomWithRecordings);
    let recordings = aggregator
        .recordings_for_table(&session, &all_features())
        .await;

    let ids: Vec<&str> = recordings.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["new", "middle", "old"]);
}
