//! Conversion of raw `<recording>` XML nodes into [`Recording`] values.
//!
//! Normalization is best-effort by contract: a malformed entry yields a
//! record with empty or zero fields, never a failure, since one bad entry
//! must not abort a whole batch.

use std::collections::BTreeMap;

use super::{Playback, PreviewImage, Recording};
use crate::xml::XmlElement;

/// Builds a [`Recording`] from one `<recording>` node.
///
/// Breakout-room declarations on the node are NOT inlined here - they
/// name other meetings' recordings, which the aggregator fetches
/// separately (see [`breakout_room_ids`]).
pub fn recording_from_node(node: &XmlElement) -> Recording {
    Recording {
        record_id: text_field(node, "recordID"),
        meeting_id: text_field(node, "meetingID"),
        meeting_name: text_field(node, "name"),
        published: node.child_text("published") == Some("true"),
        start_time: millis_field(node, "startTime"),
        end_time: millis_field(node, "endTime"),
        playbacks: playbacks_from_node(node),
        protected: node
            .child_text("protected")
            .map(|value| value == "true"),
        imported: None,
        metadata: metadata_entries(node),
    }
}

/// Recording ids declared under `<breakoutRooms>`, one list per
/// `<breakoutRoom>` child.
///
/// Breakout rooms are distinct meetings with their own recordings; each
/// returned list is the filter for one follow-up fetch.
pub fn breakout_room_ids(node: &XmlElement) -> Vec<Vec<String>> {
    let Some(rooms) = node.child("breakoutRooms") else {
        return Vec::new();
    };
    rooms
        .children_named("breakoutRoom")
        .map(|room| {
            if room.has_children() {
                room.children
                    .iter()
                    .map(|child| child.trimmed_text().to_string())
                    .filter(|id| !id.is_empty())
                    .collect()
            } else {
                let id = room.trimmed_text();
                if id.is_empty() {
                    Vec::new()
                } else {
                    vec![id.to_string()]
                }
            }
        })
        .filter(|ids: &Vec<String>| !ids.is_empty())
        .collect()
}

fn playbacks_from_node(node: &XmlElement) -> Vec<Playback> {
    let Some(playback) = node.child("playback") else {
        return Vec::new();
    };
    playback
        .children_named("format")
        .map(|format| Playback {
            kind: text_field(format, "type"),
            url: text_field(format, "url"),
            length: format
                .child_text("length")
                .and_then(|length| length.parse().ok()),
            preview: format.child("preview").map(preview_images),
            restricted: format
                .child_text("restricted")
                .map(|value| value == "true"),
        })
        .collect()
}

fn preview_images(preview: &XmlElement) -> Vec<PreviewImage> {
    let Some(images) = preview.child("images") else {
        return Vec::new();
    };
    images
        .children_named("image")
        .map(|image| PreviewImage {
            url: image.trimmed_text().to_string(),
            attributes: image.attributes.clone(),
        })
        .collect()
}

fn metadata_entries(node: &XmlElement) -> BTreeMap<String, String> {
    let Some(metadata) = node.child("metadata") else {
        return BTreeMap::new();
    };
    metadata
        .children
        .iter()
        .map(|entry| {
            // Nested metadata structures are unsupported vendor content;
            // they degrade to an empty string instead of recursing.
            let value = if entry.has_children() {
                String::new()
            } else {
                entry.trimmed_text().to_string()
            };
            (format!("meta_{}", entry.name), value)
        })
        .collect()
}

fn text_field(node: &XmlElement, name: &str) -> String {
    node.child_text(name).unwrap_or_default().to_string()
}

fn millis_field(node: &XmlElement, name: &str) -> i64 {
    node.child_text(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}
