//! Fake OpenTok backend for integration tests
//!
//! Wraps a wiremock `MockServer` and an `OpenTok` client pointed at it.

use crate::fixtures::{ARCHIVE_API_KEY, ARCHIVE_API_SECRET};
use opentok::{OpenTok, OpenTokConfig};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Partner auth header checked on every mounted route.
pub const PARTNER_AUTH_HEADER: &str = "X-TB-PARTNER-AUTH";

/// Fake backend plus a client configured against it.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_stop() -> Result<(), anyhow::Error> {
///     let backend = TestBackend::start().await;
///     backend
///         .mock_stop_archive(STOPPED_ARCHIVE_ID, 200, STOPPED_ARCHIVE_JSON)
///         .await;
///
///     let archive = backend.opentok().stop_archive(STOPPED_ARCHIVE_ID).await?;
///     assert_eq!(archive.status, "stopped");
///     Ok(())
/// }
/// ```
pub struct TestBackend {
    server: MockServer,
    opentok: OpenTok,
    api_key: String,
    api_secret: String,
}

impl TestBackend {
    /// Start a backend for the archive test credentials.
    pub async fn start() -> Self {
        Self::start_with_credentials(ARCHIVE_API_KEY, ARCHIVE_API_SECRET).await
    }

    /// Start a backend for the given credentials.
    pub async fn start_with_credentials(api_key: &str, api_secret: &str) -> Self {
        Self::start_with_timeout(api_key, api_secret, Duration::from_secs(5)).await
    }

    /// Start a backend whose client gives up after `timeout`.
    pub async fn start_with_timeout(api_key: &str, api_secret: &str, timeout: Duration) -> Self {
        let server = MockServer::start().await;
        let config = OpenTokConfig::new(api_key, api_secret)
            .with_api_url(server.uri())
            .with_http_timeout(timeout);
        let opentok = OpenTok::with_config(config).expect("failed to build OpenTok client");

        Self {
            server,
            opentok,
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }
    }

    pub fn opentok(&self) -> &OpenTok {
        &self.opentok
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// `key:secret` as the backend expects it.
    pub fn partner_auth(&self) -> String {
        format!("{}:{}", self.api_key, self.api_secret)
    }

    /// Path of the archive collection, or of one archive.
    pub fn archive_path(&self, archive_id: Option<&str>) -> String {
        match archive_id {
            Some(id) => format!("/v2/partner/{}/archive/{id}", self.api_key),
            None => format!("/v2/partner/{}/archive", self.api_key),
        }
    }

    /// Expect exactly one start request for `session_id` (with `name`, if given).
    pub async fn mock_start_archive(
        &self,
        session_id: &str,
        name: Option<&str>,
        status: u16,
        body: &str,
    ) {
        let mut expected = serde_json::json!({ "action": "start", "sessionId": session_id });
        if let Some(name) = name {
            expected["name"] = serde_json::json!(name);
        }

        Mock::given(method("POST"))
            .and(path(self.archive_path(None)))
            .and(header(PARTNER_AUTH_HEADER, self.partner_auth().as_str()))
            .and(body_json(expected))
            .respond_with(json_response(status, body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Expect exactly one get request for `archive_id`.
    pub async fn mock_get_archive(&self, archive_id: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(self.archive_path(Some(archive_id))))
            .and(header(PARTNER_AUTH_HEADER, self.partner_auth().as_str()))
            .respond_with(json_response(status, body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Expect exactly one list request with the given `count` parameter.
    pub async fn mock_list_archives(&self, count: u32, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(self.archive_path(None)))
            .and(query_param("count", count.to_string()))
            .and(header(PARTNER_AUTH_HEADER, self.partner_auth().as_str()))
            .respond_with(json_response(status, body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Expect exactly one stop request for `archive_id`.
    pub async fn mock_stop_archive(&self, archive_id: &str, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(self.archive_path(Some(archive_id))))
            .and(header(PARTNER_AUTH_HEADER, self.partner_auth().as_str()))
            .and(body_json(serde_json::json!({ "action": "stop" })))
            .respond_with(json_response(status, body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Expect exactly one delete request for `archive_id`.
    pub async fn mock_delete_archive(&self, archive_id: &str, status: u16, body: &str) {
        Mock::given(method("DELETE"))
            .and(path(self.archive_path(Some(archive_id))))
            .and(header(PARTNER_AUTH_HEADER, self.partner_auth().as_str()))
            .respond_with(json_response(status, body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Expect exactly one session creation request; replies with `body`.
    pub async fn mock_create_session(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/hl/session/create"))
            .and(header(PARTNER_AUTH_HEADER, self.partner_auth().as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Number of requests the backend has received.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }
}

fn json_response(status: u16, body: &str) -> ResponseTemplate {
    let template = ResponseTemplate::new(status);
    if body.is_empty() {
        template
    } else {
        template.set_body_raw(body.to_string(), "application/json")
    }
}
