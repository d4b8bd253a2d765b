//! Signed request URL construction for the conferencing-management API.
//!
//! Every action URL carries a checksum of `action + query + secret` so the
//! server can verify the caller knows the shared secret. The server side
//! verifies with SHA-1, which fixes the digest here as well.

use sha1::{Digest, Sha1};

use crate::config::ServerConfig;

/// Builds the fully qualified, checksum-signed URL for an API action.
///
/// Metadata keys are prefixed `meta_` and appended after the plain query
/// parameters; the checksum always comes last. Pure function of its inputs
/// and the server configuration.
pub fn action_url(
    config: &ServerConfig,
    action: &str,
    params: &[(&str, &str)],
    metadata: &[(&str, &str)],
) -> String {
    let mut query_parts: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect();
    query_parts.extend(
        metadata
            .iter()
            .map(|(key, value)| format!("meta_{key}={}", urlencoding::encode(value))),
    );
    let query = query_parts.join("&");

    let checksum = checksum(action, &query, config.shared_secret.trim());
    format!("{}{action}?{query}&checksum={checksum}", api_base(config))
}

/// Normalized API base of the configured server, ending in `/api/`.
///
/// A trailing slash or an already-present `/api` segment on the configured
/// URL is stripped before the segment is appended.
pub fn api_base(config: &ServerConfig) -> String {
    let mut base = config.base_url.trim();
    base = base.strip_suffix('/').unwrap_or(base);
    base = base.strip_suffix("/api").unwrap_or(base);
    format!("{base}/api/")
}

/// Root URL (scheme, host and optional port) of the configured server.
pub fn server_root(config: &ServerConfig) -> String {
    match url::Url::parse(config.base_url.trim()) {
        Ok(parsed) => {
            let port = parsed
                .port()
                .map(|p| format!(":{p}"))
                .unwrap_or_default();
            format!(
                "{}://{}{port}/",
                parsed.scheme(),
                parsed.host_str().unwrap_or_default()
            )
        }
        Err(_) => config.base_url.trim().to_string(),
    }
}

fn checksum(action: &str, query: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(action.as_bytes());
    hasher.update(query.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> ServerConfig {
        ServerConfig {
            base_url: base_url.to_string(),
            shared_secret: "secret".to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_api_base_normalizes_trailing_segments() {
        for base in [
            "https://bbb.example.com",
            "https://bbb.example.com/",
            "https://bbb.example.com/api",
            "https://bbb.example.com/api/",
        ] {
            assert_eq!(
                api_base(&test_config(base)),
                "https://bbb.example.com/api/",
                "base {base}"
            );
        }
    }

    #[test]
    fn test_action_url_signs_action_query_and_secret() {
        let config = test_config("https://bbb.example.com");
        let url = action_url(&config, "getRecordings", &[("meetingID", "m1,m2")], &[]);

        // sha1("getRecordings" + "meetingID=m1%2Cm2" + "secret")
        let mut hasher = Sha1::new();
        hasher.update(b"getRecordingsmeetingID=m1%2Cm2secret");
        let expected = hex::encode(hasher.finalize());

        assert_eq!(
            url,
            format!(
                "https://bbb.example.com/api/getRecordings?meetingID=m1%2Cm2&checksum={expected}"
            )
        );
    }

    #[test]
    fn test_action_url_prefixes_metadata_keys() {
        let config = test_config("https://bbb.example.com");
        let url = action_url(
            &config,
            "updateRecordings",
            &[("recordID", "r1")],
            &[("bbb-recording-name", "Lecture 1")],
        );

        assert!(url.contains("recordID=r1&meta_bbb-recording-name=Lecture%201&checksum="));
    }

    #[test]
    fn test_action_url_without_parameters_keeps_checksum() {
        let config = test_config("https://bbb.example.com");
        let url = action_url(&config, "", &[], &[]);

        // The version probe uses an empty action with an empty query.
        assert!(url.starts_with("https://bbb.example.com/api/?&checksum="));
    }

    #[test]
    fn test_checksum_trims_shared_secret() {
        let mut config = test_config("https://bbb.example.com");
        let reference = action_url(&config, "getRecordings", &[("meetingID", "m1")], &[]);

        config.shared_secret = " secret \n".to_string();
        assert_eq!(
            action_url(&config, "getRecordings", &[("meetingID", "m1")], &[]),
            reference
        );
    }

    #[test]
    fn test_server_root_keeps_port() {
        assert_eq!(
            server_root(&test_config("https://bbb.example.com:8443/api/")),
            "https://bbb.example.com:8443/"
        );
        assert_eq!(
            server_root(&test_config("http://bbb.example.com/bigbluebutton")),
            "http://bbb.example.com/"
        );
    }
}
