//! The remote operation consumed by the client-side table widget.
//!
//! One read-only endpoint: resolve the caller's session for an activity,
//! aggregate its recordings and hand back column descriptors plus the
//! JSON-encoded row array. Mutations never pass through here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use lectern_core::profiles::EnabledFeatures;
use lectern_core::session::SessionError;
use serde::Serialize;

use crate::components::{RowTool, group_visible, recording_row};
use crate::server::AppState;

const TABLE_TOOLS: [RowTool; 3] = [RowTool::Protect, RowTool::Publish, RowTool::Delete];

/// One column descriptor for the client-side table widget.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub data: &'static str,
    pub title: &'static str,
    pub width: &'static str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
}

/// Payload of the table operation.
#[derive(Debug, Clone, Serialize)]
pub struct TableData {
    pub activity: &'static str,
    pub ping_interval: u64,
    pub locale: String,
    pub profile_features: Vec<&'static str>,
    pub recordings_html: bool,
    pub columns: Vec<Column>,
    /// Row array, JSON-encoded for the widget
    pub data: String,
}

/// Envelope of the table operation.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingTableResponse {
    pub status: bool,
    pub tabledata: TableData,
    pub warnings: Vec<String>,
}

/// Returns the recording table for one activity instance.
pub async fn recording_list_table(
    State(state): State<AppState>,
    Path(activity_id): Path<i64>,
) -> Result<Json<RecordingTableResponse>, (StatusCode, String)> {
    let mut session = state
        .sessions
        .resolve(activity_id)
        .await
        .map_err(|e| match e {
            SessionError::UnknownActivity { .. } => (StatusCode::NOT_FOUND, e.to_string()),
            SessionError::AccessDenied { .. } => (StatusCode::FORBIDDEN, e.to_string()),
        })?;

    // An unreachable conferencing server is a caller-facing failure, not
    // an empty table.
    let Some(version) = state.client.server_version().await else {
        return Err((
            StatusCode::BAD_GATEWAY,
            "conferencing server is not reachable".to_string(),
        ));
    };
    session.server_version = Some(version);

    let features = EnabledFeatures::for_type(session.activity.kind, &state.config.features);
    let recordings = state
        .aggregator
        .recordings_for_table(&session, &features)
        .await;

    let rows: Vec<_> = recordings
        .iter()
        .filter(|recording| group_visible(&session, recording))
        .filter_map(|recording| recording_row(&session, recording, &TABLE_TOOLS))
        .collect();
    tracing::debug!(
        "activity {activity_id}: projecting {} of {} aggregated recordings",
        rows.len(),
        recordings.len()
    );

    let data = serde_json::to_string(&rows).unwrap_or_else(|e| {
        tracing::error!("failed to encode recording rows: {e}");
        "[]".to_string()
    });

    Ok(Json(RecordingTableResponse {
        status: true,
        tabledata: TableData {
            activity: session.activity_status(Utc::now()).as_str(),
            ping_interval: state.config.recordings.ping_interval.as_millis() as u64,
            locale: state.config.recordings.locale.clone(),
            profile_features: session.activity.kind.features().to_vec(),
            recordings_html: session.activity.recordings_html,
            columns: columns(&session),
            data,
        },
        warnings: Vec::new(),
    }))
}

fn columns(session: &lectern_core::SessionContext) -> Vec<Column> {
    let mut columns = vec![
        Column {
            data: "playback",
            title: "Playback",
            width: "125px",
            kind: Some("html"),
            sortable: None,
        },
        Column {
            data: "recording",
            title: "Name",
            width: "125px",
            kind: Some("html"),
            sortable: None,
        },
        Column {
            data: "description",
            title: "Description",
            width: "250px",
            kind: Some("html"),
            sortable: Some(true),
        },
    ];
    if session.preview_enabled() {
        columns.push(Column {
            data: "preview",
            title: "Preview",
            width: "250px",
            kind: Some("html"),
            sortable: None,
        });
    }
    columns.push(Column {
        data: "date",
        title: "Date",
        width: "225px",
        kind: Some("html"),
        sortable: Some(true),
    });
    columns.push(Column {
        data: "duration",
        title: "Duration",
        width: "50px",
        kind: None,
        sortable: None,
    });
    if session.can_manage_recordings {
        columns.push(Column {
            data: "actionbar",
            title: "Toolbar",
            width: "120px",
            kind: Some("html"),
            sortable: None,
        });
    }
    columns
}
