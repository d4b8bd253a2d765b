//! CLI command implementations

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Subcommand;
use lectern_core::LecternError;
use lectern_core::api::{BbbClient, HttpXmlFetcher};
use lectern_core::config::LecternConfig;
use lectern_core::profiles::InstanceType;
use lectern_core::recording::{Playback, Recording, RecordingAggregator};
use lectern_core::session::{Activity, GroupMode, SessionContext};
use lectern_sim::{
    InMemoryHostStore, SimulatedConferenceServer, SimulatedXmlFetcher, StaticSessionResolver,
};
use lectern_web::AppState;
use parking_lot::Mutex;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the recording-table API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Serve demo fixtures against a simulated conferencing server
        #[arg(long)]
        demo: bool,
    },
    /// Probe the configured conferencing server
    Check,
}

pub async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve { host, port, demo } => serve(&host, port, demo).await,
        Commands::Check => check().await,
    }
}

async fn serve(host: &str, port: u16, demo: bool) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let state = if demo {
        demo_state()
    } else {
        standalone_state()?
    };
    lectern_web::run_server(state, addr).await
}

async fn check() -> Result<(), Box<dyn std::error::Error>> {
    let config = LecternConfig::from_env();
    config
        .server
        .validate()
        .map_err(|e| LecternError::from(e).user_message())?;

    let fetcher = Arc::new(HttpXmlFetcher::new(&config.server));
    let client = BbbClient::new(config.server.clone(), fetcher);

    match client.probe().await {
        Some(status) => println!("{} answered probe with HTTP {status}", client.server_root()),
        None => println!(
            "{} did not answer the probe within the timeout",
            client.server_root()
        ),
    }
    match client.server_version().await {
        Some(version) => {
            println!("API reachable, server version {version}");
            Ok(())
        }
        None => Err("API did not answer a signed version request".into()),
    }
}

/// State for a standalone deployment: real conferencing server, one
/// activity described through environment variables.
fn standalone_state() -> Result<AppState, Box<dyn std::error::Error>> {
    let config = LecternConfig::from_env();
    config
        .server
        .validate()
        .map_err(|e| LecternError::from(e).user_message())?;

    let meeting_id =
        std::env::var("LECTERN_MEETING_ID").map_err(|_| "LECTERN_MEETING_ID is not set")?;
    let course_id = env_id("LECTERN_COURSE_ID", 1);
    let activity_id = env_id("LECTERN_ACTIVITY_ID", 1);

    let mut store = InMemoryHostStore::new();
    store.add_meeting(course_id, activity_id, &meeting_id);

    let mut sessions = StaticSessionResolver::new();
    sessions.add_session(manager_session(course_id, activity_id, &meeting_id));

    let fetcher = Arc::new(HttpXmlFetcher::new(&config.server));
    let client = Arc::new(BbbClient::new(config.server.clone(), fetcher));
    let aggregator = Arc::new(RecordingAggregator::new(
        client.clone(),
        Arc::new(store),
        &config.recordings,
    ));

    Ok(AppState {
        aggregator,
        client,
        sessions: Arc::new(sessions),
        config,
    })
}

/// State for `--demo`: everything simulated, no network.
fn demo_state() -> AppState {
    let mut config = LecternConfig::from_env();
    if config.server.base_url.is_empty() {
        config.server.base_url = "https://bbb.example.com".to_string();
    }
    if config.server.shared_secret.is_empty() {
        config.server.shared_secret = "demo-secret".to_string();
    }

    let mut server = SimulatedConferenceServer::new(&config.server.shared_secret);
    server.add_recording(demo_recording("demo-rec-1", "demo-1-1", 1_700_000_000_000));
    server.add_recording(demo_recording("demo-rec-2", "demo-1-1", 1_700_086_400_000));

    let mut store = InMemoryHostStore::new();
    store.add_meeting(1, 1, "demo-1-1");
    let mut imported = demo_recording("demo-import", "demo-0-0", 1_699_000_000_000);
    imported.meeting_name = "Imported seminar".to_string();
    store.add_imported(1, 1, &imported, Some(false));

    let mut sessions = StaticSessionResolver::new();
    sessions.add_session(manager_session(1, 1, "demo-1-1"));

    let fetcher = Arc::new(SimulatedXmlFetcher::new(Arc::new(Mutex::new(server))));
    let client = Arc::new(BbbClient::new(config.server.clone(), fetcher));
    let aggregator = Arc::new(RecordingAggregator::new(
        client.clone(),
        Arc::new(store),
        &config.recordings,
    ));

    AppState {
        aggregator,
        client,
        sessions: Arc::new(sessions),
        config,
    }
}

fn demo_recording(record_id: &str, meeting_id: &str, start_time: i64) -> Recording {
    Recording {
        record_id: record_id.to_string(),
        meeting_id: meeting_id.to_string(),
        meeting_name: "Demo seminar".to_string(),
        published: true,
        start_time,
        end_time: start_time + 3_600_000,
        playbacks: vec![Playback {
            kind: "presentation".to_string(),
            url: format!("https://bbb.example.com/playback/presentation/{record_id}"),
            length: Some(60),
            preview: None,
            restricted: None,
        }],
        protected: Some(false),
        imported: None,
        metadata: BTreeMap::from([(
            "meta_bbb-recording-name".to_string(),
            format!("Demo recording {record_id}"),
        )]),
    }
}

fn manager_session(course_id: i64, activity_id: i64, meeting_id: &str) -> SessionContext {
    SessionContext {
        activity: Activity {
            id: activity_id,
            meeting_id: meeting_id.to_string(),
            name: "Demo activity".to_string(),
            kind: InstanceType::RoomWithRecordings,
            opening_time: None,
            closing_time: None,
            recordings_html: false,
            recordings_preview: true,
            recordings_imported: false,
            recordings_deleted: false,
            group_mode: GroupMode::None,
            group: None,
        },
        course_id,
        administrator: false,
        moderator: true,
        can_manage_recordings: true,
        server_version: None,
        trusted_server: false,
        user_groups: Vec::new(),
    }
}

fn env_id(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
