//! [`XmlFetcher`] implementation backed by the simulated server.
//!
//! Decodes the signed URL the same way the real server would - action
//! from the path, checksum split off the query - so the request builder
//! is exercised end to end without sockets.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lectern_core::api::{Method, XmlFetcher};
use lectern_core::xml::{self, XmlElement};
use parking_lot::Mutex;

use crate::server::SimulatedConferenceServer;

/// Fetcher routing every request to a shared simulated server.
#[derive(Clone)]
pub struct SimulatedXmlFetcher {
    server: Arc<Mutex<SimulatedConferenceServer>>,
}

impl SimulatedXmlFetcher {
    pub fn new(server: Arc<Mutex<SimulatedConferenceServer>>) -> Self {
        Self { server }
    }

    /// The shared server, for fixture setup and request assertions.
    pub fn server(&self) -> Arc<Mutex<SimulatedConferenceServer>> {
        self.server.clone()
    }
}

#[async_trait]
impl XmlFetcher for SimulatedXmlFetcher {
    async fn fetch_xml(
        &self,
        url: &str,
        _method: Method,
        _body: Option<String>,
    ) -> Option<XmlElement> {
        let (action, query, checksum) = split_signed_url(url)?;
        let params: BTreeMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let body = self
            .server
            .lock()
            .respond(&action, &query, &checksum, params)?;
        match xml::parse(&body) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!("simulated server produced unparseable xml: {e}");
                None
            }
        }
    }

    async fn head(&self, _url: &str) -> Option<u16> {
        if self.server.lock().is_failing() {
            None
        } else {
            Some(200)
        }
    }
}

/// Splits a signed action URL into (action, query-without-checksum,
/// checksum).
fn split_signed_url(url: &str) -> Option<(String, String, String)> {
    let (path, full_query) = url.split_once('?')?;
    let action = path.rsplit_once("/api/").map(|(_, action)| action)?;
    let (query, checksum) = match full_query.split_once("&checksum=") {
        Some((query, checksum)) => (query, checksum),
        None => (full_query, ""),
    };
    Some((action.to_string(), query.to_string(), checksum.to_string()))
}
