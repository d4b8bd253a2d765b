//! Projection of recordings into display rows.
//!
//! Inclusion is decided per (session, recording) pair and is a pure
//! function of its inputs; the group refinement only applies on the
//! table-rendering path. Row cells are HTML fragments consumed verbatim
//! by the client-side table widget.

use chrono::TimeZone;
use chrono::Utc;
use lectern_core::recording::{
    META_LEGACY_DESCRIPTION, META_LEGACY_NAME, META_RECORDING_DESCRIPTION, META_RECORDING_NAME,
    Playback, Recording,
};
use lectern_core::session::{GroupMode, SessionContext};
use serde::Serialize;

use super::escape_html;

/// Row-action tool shown in the action bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTool {
    Protect,
    Publish,
    Delete,
}

/// One projected table row. Cell fields carry HTML fragments; `date`
/// stays numeric so the widget can sort on it.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingRow {
    pub playback: String,
    pub recording: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub date: i64,
    pub date_formatted: String,
    pub duration: u32,
    pub duration_formatted: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actionbar: Option<String>,
}

/// Decides whether a recording is visible to this caller at all.
///
/// Evaluated in order, first match decides.
pub fn include_recording_row(session: &SessionContext, recording: &Recording) -> bool {
    // Unpublished recordings are hidden from callers without manage
    // rights.
    if !recording.published && !session.can_manage_recordings {
        return false;
    }
    // Imported references are always shown once published.
    if recording.is_imported() {
        return true;
    }
    if session.privileged() {
        return true;
    }
    // A caller viewing through a group context only sees that context's
    // meeting.
    if session.activity.group.is_some() && recording.meeting_id != session.activity.meeting_id {
        return false;
    }
    true
}

/// Group refinement for the table path: outside visible-groups mode an
/// unprivileged caller only sees group recordings of groups they belong
/// to. The group id is encoded as a `[groupid]` suffix on the meeting id.
pub fn group_visible(session: &SessionContext, recording: &Recording) -> bool {
    if session.activity.group_mode == GroupMode::Visible || session.privileged() {
        return true;
    }
    let Some((_, suffix)) = recording.meeting_id.split_once('[') else {
        // Not a group recording.
        return true;
    };
    let group_id = suffix.split(']').next().unwrap_or(suffix);
    group_id
        .parse::<i64>()
        .map(|id| session.user_groups.contains(&id))
        .unwrap_or(false)
}

/// Projects one recording into a table row, or `None` when the inclusion
/// rule excludes it for this caller.
pub fn recording_row(
    session: &SessionContext,
    recording: &Recording,
    tools: &[RowTool],
) -> Option<RecordingRow> {
    if !include_recording_row(session, recording) {
        return None;
    }
    let duration = recording.duration_minutes();
    Some(RecordingRow {
        playback: playback_cell(session, recording),
        recording: name_cell(session, recording),
        description: description_cell(session, recording),
        preview: session
            .preview_enabled()
            .then(|| preview_cell(recording)),
        date: recording.start_time,
        date_formatted: format_start_time(recording.start_time),
        duration,
        duration_formatted: duration,
        actionbar: session
            .can_manage_recordings
            .then(|| actionbar_cell(recording, tools)),
    })
}

/// Locale-formatted start time; the millisecond remainder is dropped
/// before conversion.
pub fn format_start_time(start_ms: i64) -> String {
    let seconds = (start_ms - start_ms.rem_euclid(1000)) / 1000;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(|date| date.format("%A, %d %B %Y, %I:%M %p %Z").to_string())
        .unwrap_or_default()
}

fn playback_cell(session: &SessionContext, recording: &Recording) -> String {
    let links: String = recording
        .playbacks
        .iter()
        .filter(|playback| include_playback(session, recording, playback))
        .map(|playback| playback_link(session, recording, playback))
        .collect();

    let title = if recording.is_imported() {
        r#" title="This is a recording link, the recording itself may no longer exist""#
    } else {
        ""
    };
    let hidden = if recording.published { "" } else { " hidden" };
    format!(
        r#"<div id="playbacks-{id}" data-imported="{imported}" data-meetingid="{meeting}" data-recordingid="{id}"{title}{hidden}>{links}</div>"#,
        id = escape_html(&recording.record_id),
        imported = recording.is_imported(),
        meeting = escape_html(&recording.meeting_id),
    )
}

fn include_playback(
    session: &SessionContext,
    recording: &Recording,
    playback: &Playback,
) -> bool {
    // Formats explicitly marked unrestricted are always shown.
    if playback.restricted == Some(false) {
        return true;
    }
    // Everything except statistics is shown.
    if playback.kind != "statistics" {
        return true;
    }
    // Statistics never make sense on an imported reference.
    if recording.is_imported() {
        return false;
    }
    session.privileged()
}

fn playback_link(
    session: &SessionContext,
    recording: &Recording,
    playback: &Playback,
) -> String {
    let mut href = format!(
        "/view/play?bn={}&mid={}&rid={}&rtype={}",
        session.activity.id,
        urlencoding::encode(&recording.meeting_id),
        urlencoding::encode(&recording.record_id),
        urlencoding::encode(&playback.kind),
    );
    // A protected imported reference must not leak the raw playback URL.
    let protected_import = recording.is_imported() && recording.protected == Some(true);
    if !protected_import {
        href.push_str("&href=");
        href.push_str(&urlencoding::encode(playback.url.trim()));
    }
    format!(
        r##"<a id="recording-play-{kind}-{id}" class="btn btn-sm btn-default" href="#" data-action="play" data-target="{kind}" data-href="{href}">{label}</a>"##,
        kind = escape_html(&playback.kind),
        id = escape_html(&recording.record_id),
        href = escape_html(&href),
        label = playback_label(&playback.kind),
    )
}

fn playback_label(kind: &str) -> String {
    match kind {
        "presentation" => "Presentation".to_string(),
        "video" => "Video".to_string(),
        "podcast" => "Podcast".to_string(),
        "statistics" => "Statistics".to_string(),
        "capture" => "Capture".to_string(),
        "notes" => "Notes".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

fn name_cell(session: &SessionContext, recording: &Recording) -> String {
    let (text, source) = match recording.meta(META_RECORDING_NAME) {
        Some(name) => (name, META_RECORDING_NAME),
        None => match recording.meta(META_LEGACY_NAME) {
            Some(name) => (name, META_LEGACY_NAME),
            None => (recording.meeting_name.trim(), META_RECORDING_NAME),
        },
    };
    text_cell(session, recording, text, source, "name")
}

fn description_cell(session: &SessionContext, recording: &Recording) -> String {
    let (text, source) = match recording.meta(META_RECORDING_DESCRIPTION) {
        Some(description) => (description, META_RECORDING_DESCRIPTION),
        None => match recording.meta(META_LEGACY_DESCRIPTION) {
            Some(description) => (description, META_LEGACY_DESCRIPTION),
            None => ("", META_RECORDING_DESCRIPTION),
        },
    };
    text_cell(session, recording, text, source, "description")
}

fn text_cell(
    session: &SessionContext,
    recording: &Recording,
    text: &str,
    source: &str,
    target: &str,
) -> String {
    let span = format!("<span>{}</span>", escape_html(text));
    if !session.rows_editable() {
        return span;
    }
    let edit = format!(
        r##"<a id="recording-edit-{target}-{id}" class="action-icon" href="#" data-action="edit" data-target="{target}"><i class="icon fa fa-edit"></i></a>"##,
        id = escape_html(&recording.record_id),
    );
    format!(
        r#"<div id="recording-{target}-{id}" class="quickeditlink" data-recordingid="{id}" data-meetingid="{meeting}" data-target="{target}" data-source="{source}">{span}{edit}</div>"#,
        id = escape_html(&recording.record_id),
        meeting = escape_html(&recording.meeting_id),
    )
}

fn preview_cell(recording: &Recording) -> String {
    let hidden = if recording.published { "" } else { " hidden" };
    let mut cell = format!(
        r#"<div id="preview-{}"{hidden}>"#,
        escape_html(&recording.record_id)
    );
    if let Some(playback) = recording.preview_playback() {
        if let Some(images) = playback.preview.as_deref() {
            for image in images {
                let mut attributes = String::new();
                for (key, value) in &image.attributes {
                    attributes.push_str(&format!(
                        r#" {}="{}""#,
                        escape_html(key),
                        escape_html(value)
                    ));
                }
                cell.push_str(&format!(
                    r#"<img src="{}" class="recording-thumbnail"{attributes}>"#,
                    escape_html(image.url.trim()),
                ));
            }
        }
    }
    cell.push_str("</div>");
    cell
}

struct ButtonPayload {
    action: &'static str,
    tag: &'static str,
    disabled: Option<&'static str>,
}

fn actionbar_cell(recording: &Recording, tools: &[RowTool]) -> String {
    let buttons: String = tools
        .iter()
        .map(|tool| {
            let mut payload = tool_payload(*tool, recording);
            if *tool == RowTool::Protect {
                if recording.is_imported() {
                    payload.disabled = Some("disabled");
                }
                // No protection field at all means the server does not
                // offer the toggle; hide the button entirely.
                if recording.protected.is_none() {
                    payload.disabled = Some("invisible");
                }
            }
            action_button(recording, &payload)
        })
        .collect();
    format!(
        r#"<div id="recording-actionbar-{id}" data-recordingid="{id}" data-meetingid="{meeting}">{buttons}</div>"#,
        id = escape_html(&recording.record_id),
        meeting = escape_html(&recording.meeting_id),
    )
}

fn tool_payload(tool: RowTool, recording: &Recording) -> ButtonPayload {
    match tool {
        RowTool::Protect => {
            if recording.protected == Some(true) {
                ButtonPayload {
                    action: "unprotect",
                    tag: "lock",
                    disabled: None,
                }
            } else {
                ButtonPayload {
                    action: "protect",
                    tag: "unlock",
                    disabled: None,
                }
            }
        }
        RowTool::Publish => {
            if recording.published {
                ButtonPayload {
                    action: "unpublish",
                    tag: "hide",
                    disabled: None,
                }
            } else {
                ButtonPayload {
                    action: "publish",
                    tag: "show",
                    disabled: None,
                }
            }
        }
        RowTool::Delete => ButtonPayload {
            action: "delete",
            tag: "delete",
            disabled: None,
        },
    }
}

fn action_button(recording: &Recording, payload: &ButtonPayload) -> String {
    let id = format!(
        "recording-{}-{}",
        payload.action,
        escape_html(&recording.record_id)
    );
    match payload.disabled {
        Some(state) => format!(
            r#"<a id="{id}" class="action-icon disabled"><i class="icon fa fa-{tag} fa-{state}"></i></a>"#,
            tag = payload.tag,
        ),
        None => format!(
            r##"<a id="{id}" class="action-icon" href="#" data-action="{action}"><i class="icon fa fa-{tag}"></i></a>"##,
            action = payload.action,
            tag = payload.tag,
        ),
    }
}
