//! HTTP transport returning parsed XML documents.
//!
//! The fetcher is the substitution seam for tests and simulation: the
//! aggregation pipeline only ever sees `Option<XmlElement>`, never a
//! transport error. Any failure - connect, status, body read, parse -
//! resolves to `None` after a logged warning.

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

use crate::config::ServerConfig;
use crate::xml::{self, XmlElement};

/// HTTP method for an XML fetch. HEAD is separate ([`XmlFetcher::head`])
/// since it never yields a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Abstract XML-over-HTTP access to the conferencing server.
#[async_trait]
pub trait XmlFetcher: Send + Sync {
    /// Performs the call and parses the body into an element tree.
    ///
    /// Returns `None` on any transport or parse failure; callers treat
    /// absent data as "server unreachable or errored" without knowing the
    /// cause. A POST body is sent with explicit `Content-Type` and
    /// `Content-Length` headers.
    async fn fetch_xml(&self, url: &str, method: Method, body: Option<String>)
    -> Option<XmlElement>;

    /// Reachability probe: performs a HEAD request with a short timeout
    /// and returns the response status code, or `None` when unreachable.
    async fn head(&self, url: &str) -> Option<u16>;
}

/// Production fetcher over reqwest.
pub struct HttpXmlFetcher {
    client: reqwest::Client,
    probe_client: reqwest::Client,
}

impl HttpXmlFetcher {
    /// Creates the fetcher with timeouts and user agent from the server
    /// configuration. Probes get their own short-timeout client.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(config.request_timeout)
                .user_agent(config.user_agent)
                .redirect(reqwest::redirect::Policy::limited(3))
                .build()
                .expect("HTTP client creation should not fail"),
            probe_client: reqwest::Client::builder()
                .timeout(config.probe_timeout)
                .user_agent(config.user_agent)
                .redirect(reqwest::redirect::Policy::limited(3))
                .build()
                .expect("HTTP client creation should not fail"),
        }
    }
}

#[async_trait]
impl XmlFetcher for HttpXmlFetcher {
    async fn fetch_xml(
        &self,
        url: &str,
        method: Method,
        body: Option<String>,
    ) -> Option<XmlElement> {
        let request = match (method, body) {
            (Method::Get, _) => self.client.get(url),
            (Method::Post, None) => self.client.post(url),
            (Method::Post, Some(body)) => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "text/xml")
                .header(CONTENT_LENGTH, body.len())
                .body(body),
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("request to {url} failed: {e}");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("server returned error status {status} for {url}");
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("failed to read response body from {url}: {e}");
                return None;
            }
        };

        match xml::parse(&body) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!("unparseable response from {url}: {e}");
                None
            }
        }
    }

    async fn head(&self, url: &str) -> Option<u16> {
        match self.probe_client.head(url).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                tracing::debug!("probe of {url} failed: {e}");
                None
            }
        }
    }
}
