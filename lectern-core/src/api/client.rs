//! Conferencing-server client for the actions this plugin consumes.
//!
//! Thin action wrappers over the signed request builder and the XML
//! fetcher. Queries degrade to absent data on failure; mutations are
//! pass-through calls whose only outcome is a success flag - the server
//! owns the state transition.

use std::sync::Arc;

use super::request;
use super::transport::{Method, XmlFetcher};
use crate::config::ServerConfig;
use crate::xml::XmlElement;

/// Filter for a `getRecordings` call: by owning meetings or by explicit
/// recording ids (the breakout-room follow-up path).
#[derive(Debug, Clone, Copy)]
pub enum RecordingQuery<'a> {
    Meetings(&'a [String]),
    Recordings(&'a [String]),
}

impl RecordingQuery<'_> {
    fn as_param(&self) -> (&'static str, String) {
        match self {
            RecordingQuery::Meetings(ids) => ("meetingID", ids.join(",")),
            RecordingQuery::Recordings(ids) => ("recordID", ids.join(",")),
        }
    }
}

/// Client for a single configured conferencing server.
pub struct BbbClient {
    config: ServerConfig,
    fetcher: Arc<dyn XmlFetcher>,
}

impl BbbClient {
    /// Creates a client over an injected fetcher.
    pub fn new(config: ServerConfig, fetcher: Arc<dyn XmlFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Version string reported by the server, or `None` when the server
    /// is unreachable or answers with a failure.
    pub async fn server_version(&self) -> Option<String> {
        let url = request::action_url(&self.config, "", &[], &[]);
        let response = self.fetcher.fetch_xml(&url, Method::Get, None).await?;
        if !super::is_success(&response) {
            return None;
        }
        response.child_text("version").map(str::to_string)
    }

    /// Raw `getRecordings` response for one page of ids.
    pub async fn get_recordings(&self, query: RecordingQuery<'_>) -> Option<XmlElement> {
        let (key, ids) = query.as_param();
        let url = request::action_url(&self.config, "getRecordings", &[(key, &ids)], &[]);
        self.fetcher.fetch_xml(&url, Method::Get, None).await
    }

    /// Publishes or unpublishes recordings, one server call per id.
    ///
    /// Returns `false` as soon as the server explicitly reports a failure;
    /// ids already processed stay applied remotely (the API has no
    /// transaction concept). An unreachable server yields no report and
    /// the batch moves on.
    pub async fn publish_recordings(&self, record_ids: &[String], publish: bool) -> bool {
        let publish = if publish { "true" } else { "false" };
        for id in record_ids {
            let url = request::action_url(
                &self.config,
                "publishRecordings",
                &[("recordID", id), ("publish", publish)],
                &[],
            );
            if self.mutation_failed(&url).await {
                return false;
            }
        }
        true
    }

    /// Deletes recordings, one server call per id.
    pub async fn delete_recordings(&self, record_ids: &[String]) -> bool {
        for id in record_ids {
            let url = request::action_url(
                &self.config,
                "deleteRecordings",
                &[("recordID", id)],
                &[],
            );
            if self.mutation_failed(&url).await {
                return false;
            }
        }
        true
    }

    /// Updates recording metadata, one server call per id. `params` are
    /// passed as `meta_`-prefixed query parameters.
    pub async fn update_recordings(
        &self,
        record_ids: &[String],
        metadata: &[(&str, &str)],
    ) -> bool {
        for id in record_ids {
            let url = request::action_url(
                &self.config,
                "updateRecordings",
                &[("recordID", id)],
                metadata,
            );
            if self.mutation_failed(&url).await {
                return false;
            }
        }
        true
    }

    /// Short-timeout reachability probe of the API base.
    pub async fn probe(&self) -> Option<u16> {
        self.fetcher.head(&request::api_base(&self.config)).await
    }

    /// Root URL of the configured server.
    pub fn server_root(&self) -> String {
        request::server_root(&self.config)
    }

    async fn mutation_failed(&self, url: &str) -> bool {
        match self.fetcher.fetch_xml(url, Method::Get, None).await {
            Some(response) => !super::is_success(&response),
            // No response at all is indistinguishable from a slow server;
            // the batch continues and the caller sees overall success.
            None => false,
        }
    }
}
