//! Simulated conferencing server answering from fixture recordings.
//!
//! Behaves like the remote management API as seen through its XML
//! responses: verifies request checksums, serves `getRecordings` filtered
//! by meeting or recording ids, and reports a version. Failure injection
//! makes a request vanish entirely, which is how an unreachable server
//! looks to the fetch layer.

use std::collections::BTreeMap;

use lectern_core::recording::{Playback, PreviewImage, Recording};
use sha1::{Digest, Sha1};

/// One request the simulated server has seen, with decoded parameters.
#[derive(Debug, Clone)]
pub struct RequestLogEntry {
    pub action: String,
    pub params: BTreeMap<String, String>,
}

struct FixtureRecording {
    recording: Recording,
    breakout_ids: Vec<String>,
}

/// In-memory stand-in for one conferencing server.
pub struct SimulatedConferenceServer {
    version: String,
    shared_secret: String,
    recordings: Vec<FixtureRecording>,
    fail_requests: bool,
    requests: Vec<RequestLogEntry>,
}

impl SimulatedConferenceServer {
    /// Creates a server with the given shared secret and a modern
    /// version string.
    pub fn new(shared_secret: &str) -> Self {
        Self {
            version: "2.4".to_string(),
            shared_secret: shared_secret.to_string(),
            recordings: Vec::new(),
            fail_requests: false,
            requests: Vec::new(),
        }
    }

    /// Overrides the reported server version.
    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    /// Adds a fixture recording.
    pub fn add_recording(&mut self, recording: Recording) {
        self.recordings.push(FixtureRecording {
            recording,
            breakout_ids: Vec::new(),
        });
    }

    /// Adds a fixture recording that declares breakout-room recordings.
    /// The declared ids must be added as their own fixtures to be
    /// fetchable.
    pub fn add_recording_with_breakouts(&mut self, recording: Recording, breakout_ids: Vec<String>) {
        self.recordings.push(FixtureRecording {
            recording,
            breakout_ids,
        });
    }

    /// Makes every subsequent request fail like an unreachable server.
    pub fn set_failing(&mut self, failing: bool) {
        self.fail_requests = failing;
    }

    /// Requests seen so far.
    pub fn requests(&self) -> &[RequestLogEntry] {
        &self.requests
    }

    /// Number of requests for one action.
    pub fn request_count(&self, action: &str) -> usize {
        self.requests.iter().filter(|r| r.action == action).count()
    }

    /// Whether the server is currently failing requests.
    pub(crate) fn is_failing(&self) -> bool {
        self.fail_requests
    }

    /// Answers one decoded API request with a response body.
    ///
    /// `query` is the raw query string without the checksum parameter,
    /// exactly as signed by the caller.
    pub fn respond(
        &mut self,
        action: &str,
        query: &str,
        checksum: &str,
        params: BTreeMap<String, String>,
    ) -> Option<String> {
        self.requests.push(RequestLogEntry {
            action: action.to_string(),
            params: params.clone(),
        });
        if self.fail_requests {
            return None;
        }
        if !self.checksum_matches(action, query, checksum) {
            return Some(error_response("checksumError"));
        }
        match action {
            "" => Some(format!(
                "<response><returncode>SUCCESS</returncode><version>{}</version></response>",
                escape_xml(&self.version)
            )),
            "getRecordings" => Some(self.recordings_response(&params)),
            "publishRecordings" => Some(self.publish_response(&params)),
            "deleteRecordings" => Some(self.delete_response(&params)),
            "updateRecordings" => Some(self.update_response(&params)),
            _ => Some(error_response("unsupportedRequest")),
        }
    }

    fn checksum_matches(&self, action: &str, query: &str, checksum: &str) -> bool {
        let mut hasher = Sha1::new();
        hasher.update(action.as_bytes());
        hasher.update(query.as_bytes());
        hasher.update(self.shared_secret.as_bytes());
        hex::encode(hasher.finalize()) == checksum
    }

    fn recordings_response(&self, params: &BTreeMap<String, String>) -> String {
        let matches: Vec<&FixtureRecording> = if let Some(meeting_ids) = params.get("meetingID") {
            let ids: Vec<&str> = meeting_ids.split(',').collect();
            self.recordings
                .iter()
                .filter(|f| ids.contains(&f.recording.meeting_id.as_str()))
                .collect()
        } else if let Some(record_ids) = params.get("recordID") {
            let ids: Vec<&str> = record_ids.split(',').collect();
            self.recordings
                .iter()
                .filter(|f| ids.contains(&f.recording.record_id.as_str()))
                .collect()
        } else {
            self.recordings.iter().collect()
        };

        let body: String = matches.iter().map(|f| recording_xml(f)).collect();
        format!(
            "<response><returncode>SUCCESS</returncode><recordings>{body}</recordings></response>"
        )
    }
}

impl SimulatedConferenceServer {
    fn publish_response(&mut self, params: &BTreeMap<String, String>) -> String {
        let publish = params.get("publish").map(String::as_str) == Some("true");
        self.mutate_each(params, |fixture| {
            fixture.recording.published = publish;
        })
    }

    fn delete_response(&mut self, params: &BTreeMap<String, String>) -> String {
        let ids = requested_ids(params);
        if !ids
            .iter()
            .all(|id| self.recordings.iter().any(|f| f.recording.record_id == *id))
        {
            return error_response("notFound");
        }
        self.recordings
            .retain(|f| !ids.contains(&f.recording.record_id.as_str()));
        success_response()
    }

    fn update_response(&mut self, params: &BTreeMap<String, String>) -> String {
        let metadata: Vec<(String, String)> = params
            .iter()
            .filter(|(key, _)| key.starts_with("meta_"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.mutate_each(params, |fixture| {
            for (key, value) in &metadata {
                fixture
                    .recording
                    .metadata
                    .insert(key.clone(), value.clone());
            }
        })
    }

    fn mutate_each(
        &mut self,
        params: &BTreeMap<String, String>,
        mut apply: impl FnMut(&mut FixtureRecording),
    ) -> String {
        for id in requested_ids(params) {
            let Some(fixture) = self
                .recordings
                .iter_mut()
                .find(|f| f.recording.record_id == id)
            else {
                return error_response("notFound");
            };
            apply(fixture);
        }
        success_response()
    }
}

fn requested_ids(params: &BTreeMap<String, String>) -> Vec<&str> {
    params
        .get("recordID")
        .map(|ids| ids.split(',').collect())
        .unwrap_or_default()
}

fn success_response() -> String {
    "<response><returncode>SUCCESS</returncode></response>".to_string()
}

fn error_response(message_key: &str) -> String {
    format!(
        "<response><returncode>FAILED</returncode><messageKey>{message_key}</messageKey></response>"
    )
}

fn recording_xml(fixture: &FixtureRecording) -> String {
    let recording = &fixture.recording;
    let mut xml = String::from("<recording>");
    xml.push_str(&format!(
        "<recordID>{}</recordID><meetingID>{}</meetingID><name>{}</name>\
         <published>{}</published><startTime>{}</startTime><endTime>{}</endTime>",
        escape_xml(&recording.record_id),
        escape_xml(&recording.meeting_id),
        escape_xml(&recording.meeting_name),
        recording.published,
        recording.start_time,
        recording.end_time,
    ));
    if let Some(protected) = recording.protected {
        xml.push_str(&format!("<protected>{protected}</protected>"));
    }

    xml.push_str("<playback>");
    for playback in &recording.playbacks {
        xml.push_str(&playback_xml(playback));
    }
    xml.push_str("</playback>");

    if !recording.metadata.is_empty() {
        xml.push_str("<metadata>");
        for (key, value) in &recording.metadata {
            let name = key.strip_prefix("meta_").unwrap_or(key);
            xml.push_str(&format!(
                "<{name}>{}</{name}>",
                escape_xml(value)
            ));
        }
        xml.push_str("</metadata>");
    }

    if !fixture.breakout_ids.is_empty() {
        xml.push_str("<breakoutRooms>");
        for id in &fixture.breakout_ids {
            xml.push_str(&format!(
                "<breakoutRoom>{}</breakoutRoom>",
                escape_xml(id)
            ));
        }
        xml.push_str("</breakoutRooms>");
    }

    xml.push_str("</recording>");
    xml
}

fn playback_xml(playback: &Playback) -> String {
    let mut xml = format!(
        "<format><type>{}</type><url>{}</url>",
        escape_xml(&playback.kind),
        escape_xml(&playback.url),
    );
    match playback.length {
        Some(length) => xml.push_str(&format!("<length>{length}</length>")),
        None => xml.push_str("<length></length>"),
    }
    if let Some(restricted) = playback.restricted {
        xml.push_str(&format!("<restricted>{restricted}</restricted>"));
    }
    if let Some(images) = playback.preview.as_deref() {
        xml.push_str("<preview><images>");
        for image in images {
            xml.push_str(&preview_image_xml(image));
        }
        xml.push_str("</images></preview>");
    }
    xml.push_str("</format>");
    xml
}

fn preview_image_xml(image: &PreviewImage) -> String {
    let attributes: String = image
        .attributes
        .iter()
        .map(|(key, value)| format!(r#" {key}="{}""#, escape_xml(value)))
        .collect();
    format!("<image{attributes}>{}</image>", escape_xml(&image.url))
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn recording(record_id: &str, meeting_id: &str) -> Recording {
        Recording {
            record_id: record_id.to_string(),
            meeting_id: meeting_id.to_string(),
            meeting_name: "Seminar <1>".to_string(),
            published: true,
            start_time: 1000,
            end_time: 2000,
            playbacks: Vec::new(),
            protected: None,
            imported: None,
            metadata: BTreeMap::new(),
        }
    }

    fn signed_query(action: &str, query: &str, secret: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(action.as_bytes());
        hasher.update(query.as_bytes());
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut server = SimulatedConferenceServer::new("secret");
        let response = server
            .respond("getRecordings", "meetingID=m1", "bogus", BTreeMap::new())
            .unwrap();
        assert!(response.contains("checksumError"));
    }

    #[test]
    fn test_serves_recordings_filtered_by_meeting() {
        let mut server = SimulatedConferenceServer::new("secret");
        server.add_recording(recording("r1", "m1"));
        server.add_recording(recording("r2", "m2"));

        let query = "meetingID=m1";
        let checksum = signed_query("getRecordings", query, "secret");
        let params = BTreeMap::from([("meetingID".to_string(), "m1".to_string())]);
        let response = server
            .respond("getRecordings", query, &checksum, params)
            .unwrap();

        assert!(response.contains("<recordID>r1</recordID>"));
        assert!(!response.contains("<recordID>r2</recordID>"));
        // The fixture name is escaped on the wire.
        assert!(response.contains("Seminar &lt;1&gt;"));
        assert_eq!(server.request_count("getRecordings"), 1);
    }

    #[test]
    fn test_failing_server_answers_nothing() {
        let mut server = SimulatedConferenceServer::new("secret");
        server.set_failing(true);
        let checksum = signed_query("", "", "secret");
        assert!(server.respond("", "", &checksum, BTreeMap::new()).is_none());
        // The request is still logged for assertions.
        assert_eq!(server.requests().len(), 1);
    }
}
