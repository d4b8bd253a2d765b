//! Recording data model, normalization and aggregation.
//!
//! Recordings are read-only from this crate's perspective: they are
//! fetched live from the conferencing server or reconstructed from
//! imported references in the host event log, merged, sorted and handed
//! to the presentation layer. Field presence is meaningful - `protected`
//! absent is not the same as `protected: false`, and `imported` absent
//! means the record came from a live fetch this call.

pub mod aggregator;
pub mod normalize;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// Re-export public API
pub use aggregator::{RECORDINGS_PAGE_SIZE, RecordingAggregator};
pub use normalize::{breakout_room_ids, recording_from_node};
pub use store::{HostStore, ImportedRecording};

/// Metadata key carrying the instructor-assigned recording name.
pub const META_RECORDING_NAME: &str = "meta_bbb-recording-name";
/// Metadata key carrying the instructor-assigned recording description.
pub const META_RECORDING_DESCRIPTION: &str = "meta_bbb-recording-description";
/// Legacy metadata key for the recording name.
pub const META_LEGACY_NAME: &str = "meta_contextactivity";
/// Legacy metadata key for the recording description.
pub const META_LEGACY_DESCRIPTION: &str = "meta_contextactivitydescription";

/// One processed recording artifact, independent of the owning meeting's
/// lifecycle.
///
/// The serialized form is what imported references persist in the host
/// event log, so field names follow the server's wire vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Natural key, unique within one aggregated result set
    #[serde(rename = "recordID")]
    pub record_id: String,
    /// Composite id of the meeting this recording was produced from
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    /// Name of the owning meeting
    #[serde(rename = "meetingName")]
    pub meeting_name: String,
    pub published: bool,
    /// Meeting start, milliseconds since the epoch
    #[serde(rename = "startTime")]
    pub start_time: i64,
    /// Meeting end, milliseconds since the epoch
    #[serde(rename = "endTime")]
    pub end_time: i64,
    pub playbacks: Vec<Playback>,
    /// Access protection; absent when the server does not expose the
    /// toggle for this recording
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    /// Event-log row id when this is an imported reference rather than a
    /// live fetch result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<i64>,
    /// Vendor metadata, flattened to `meta_<key>` entries
    #[serde(flatten)]
    pub metadata: BTreeMap<String, String>,
}

impl Recording {
    /// Whether this record is an imported reference.
    pub fn is_imported(&self) -> bool {
        self.imported.is_some()
    }

    /// Metadata value for a flattened `meta_` key, trimmed.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|value| value.trim())
    }

    /// First playback format carrying preview images.
    pub fn preview_playback(&self) -> Option<&Playback> {
        self.playbacks.iter().find(|p| p.preview.is_some())
    }

    /// Duration in minutes: the length of the first non-restricted
    /// playback format with a usable value, 0 when none has one.
    pub fn duration_minutes(&self) -> u32 {
        self.playbacks
            .iter()
            .filter(|p| !p.is_restricted())
            .find_map(|p| p.length.filter(|length| *length > 0))
            .unwrap_or(0)
    }
}

/// One renderable representation of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playback {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    /// Length in minutes as reported by the server; absent when the
    /// format carries no usable value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<PreviewImage>>,
    /// Absent when the server does not restrict formats at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted: Option<bool>,
}

impl Playback {
    /// Whether this format is explicitly restricted.
    pub fn is_restricted(&self) -> bool {
        self.restricted == Some(true)
    }
}

/// One preview thumbnail of a playback format, with whatever attributes
/// the vendor put on the image element (dimensions, alt text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewImage {
    pub url: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback(kind: &str, length: Option<u32>, restricted: Option<bool>) -> Playback {
        Playback {
            kind: kind.to_string(),
            url: format!("https://bbb.example.com/playback/{kind}"),
            length,
            preview: None,
            restricted,
        }
    }

    fn recording() -> Recording {
        Recording {
            record_id: "r1".to_string(),
            meeting_id: "m1-5-9".to_string(),
            meeting_name: "Weekly seminar".to_string(),
            published: true,
            start_time: 1_613_999_000_000,
            end_time: 1_614_002_600_000,
            playbacks: vec![
                playback("statistics", Some(0), Some(true)),
                playback("presentation", None, None),
                playback("video", Some(42), None),
            ],
            protected: None,
            imported: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_duration_skips_restricted_and_empty_lengths() {
        assert_eq!(recording().duration_minutes(), 42);

        let mut no_usable_length = recording();
        no_usable_length.playbacks.truncate(2);
        assert_eq!(no_usable_length.duration_minutes(), 0);
    }

    #[test]
    fn test_serialized_form_uses_wire_vocabulary() {
        let mut rec = recording();
        rec.metadata
            .insert(META_RECORDING_NAME.to_string(), "Lecture 1".to_string());
        rec.protected = Some(false);

        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["recordID"], "r1");
        assert_eq!(value["meetingID"], "m1-5-9");
        assert_eq!(value["meetingName"], "Weekly seminar");
        assert_eq!(value["startTime"], 1_613_999_000_000_i64);
        assert_eq!(value["protected"], false);
        assert_eq!(value["meta_bbb-recording-name"], "Lecture 1");
        assert_eq!(value["playbacks"][0]["type"], "statistics");
        // A live recording never serializes an imported marker.
        assert!(value.get("imported").is_none());
    }

    #[test]
    fn test_round_trip_preserves_presence_semantics() {
        let mut rec = recording();
        rec.metadata
            .insert("meta_analytics".to_string(), "enabled".to_string());

        let back: Recording =
            serde_json::from_str(&serde_json::to_string(&rec).unwrap()).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.protected, None);
        assert_eq!(back.meta("meta_analytics"), Some("enabled"));
    }
}
