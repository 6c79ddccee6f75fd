//! Session creation client.
//!
//! POSTs a form to `<api_url>/hl/session/create` with the partner
//! credentials and extracts the `session_id` field from the reply. The reply
//! format is owned by the backend (XML today, form-encoded on some
//! deployments); only that one field is read.

use crate::config::OpenTokConfig;
use crate::errors::{OpenTokError, TransportError};
use crate::services::partner_request;
use crate::transport::{HttpTransport, Method};
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};
use url::{form_urlencoded, Url};

/// Media routing hint sent with `p2p.preference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum P2pPreference {
    Enabled,
    Disabled,
}

impl P2pPreference {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            P2pPreference::Enabled => "enabled",
            P2pPreference::Disabled => "disabled",
        }
    }
}

/// Options for [`SessionClient::create_session`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// IP address hint used by the backend to pick a media server.
    pub location: Option<String>,
    pub p2p: Option<P2pPreference>,
}

impl SessionOptions {
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_p2p(mut self, preference: P2pPreference) -> Self {
        self.p2p = Some(preference);
        self
    }

    fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(location) = &self.location {
            pairs.push(("location".to_string(), location.clone()));
        }
        if let Some(p2p) = self.p2p {
            pairs.push(("p2p.preference".to_string(), p2p.as_str().to_string()));
        }
        pairs
    }
}

/// Client for the session-creation endpoint.
#[derive(Clone)]
pub struct SessionClient {
    config: Arc<OpenTokConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    #[must_use]
    pub fn new(config: Arc<OpenTokConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Create a session and return its id.
    ///
    /// # Errors
    ///
    /// `SessionCreation` wrapping the cause: transport failure, non-2xx
    /// status, or a reply without a `session_id` field.
    #[instrument(skip_all, fields(p2p = ?options.p2p))]
    pub async fn create_session(&self, options: &SessionOptions) -> Result<String, OpenTokError> {
        let url = self.endpoint()?;
        let request =
            partner_request(&self.config, Method::POST, url.as_str()).form(options.form_pairs());

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(target: "opentok.session", error = %e, "Session creation request failed");
            OpenTokError::SessionCreation { source: e }
        })?;

        if !response.is_success() {
            warn!(
                target: "opentok.session",
                status = response.status,
                "OpenTok rejected session creation"
            );
            trace!(target: "opentok.session", body = %response.body, "Session error response body");
            return Err(OpenTokError::SessionCreation {
                source: TransportError::Status(response.status),
            });
        }

        let session_id = extract_session_id(&response.body).ok_or_else(|| {
            warn!(target: "opentok.session", "Session response has no session_id");
            OpenTokError::SessionCreation {
                source: TransportError::Decode("response has no session_id field".to_string()),
            }
        })?;

        debug!(target: "opentok.session", "Session created");
        Ok(session_id)
    }

    fn endpoint(&self) -> Result<Url, OpenTokError> {
        let invalid = |reason: String| OpenTokError::SessionCreation {
            source: TransportError::Request(reason),
        };
        let mut url =
            Url::parse(&self.config.api_url).map_err(|e| invalid(format!("Invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| invalid("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["hl", "session", "create"]);
        Ok(url)
    }
}

/// Pull `session_id` out of an XML or form-encoded reply, decoded.
fn extract_session_id(body: &str) -> Option<String> {
    const OPEN: &str = "<session_id>";
    const CLOSE: &str = "</session_id>";

    let value = if let Some(start) = body.find(OPEN) {
        let rest = body.get(start + OPEN.len()..)?;
        let end = rest.find(CLOSE)?;
        unescape_xml(rest.get(..end)?.trim())
    } else {
        form_urlencoded::parse(body.trim().as_bytes())
            .find(|(k, _)| k == "session_id")
            .map(|(_, v)| v.into_owned())?
    };

    (!value.is_empty()).then_some(value)
}

/// Decode the predefined XML entities in element text.
fn unescape_xml(text: &str) -> String {
    // `&amp;` last so `&amp;lt;` decodes to `&lt;`, not `<`.
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::{HttpResponse, RequestBody};

    const XML_REPLY: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "<sessions><Session>",
        "<session_id>2_MX4xNDk3MTI5Mn4xMjcuMC4wLjF-</session_id>",
        "<partner_id>14971292</partner_id>",
        "<create_dt>Thu Feb 06 10:00:00 PST 2014</create_dt>",
        "</Session></sessions>"
    );

    fn client(mock: &Arc<MockTransport>) -> SessionClient {
        let config = OpenTokConfig::new("14971292", "secret").with_api_url("http://localhost:9999");
        SessionClient::new(Arc::new(config), mock.clone())
    }

    #[test]
    fn test_extract_from_xml() {
        assert_eq!(
            extract_session_id(XML_REPLY).as_deref(),
            Some("2_MX4xNDk3MTI5Mn4xMjcuMC4wLjF-")
        );
    }

    #[test]
    fn test_extract_from_form() {
        assert_eq!(
            extract_session_id("partner_id=1&session_id=1_abc&create_dt=x").as_deref(),
            Some("1_abc")
        );
    }

    #[test]
    fn test_extract_from_form_is_percent_decoded() {
        assert_eq!(
            extract_session_id("partner_id=100&session_id=1_MX4xMDB-fn5-eH4%3D").as_deref(),
            Some("1_MX4xMDB-fn5-eH4=")
        );
        assert_eq!(
            extract_session_id("session_id=a+b%26c").as_deref(),
            Some("a b&c")
        );
    }

    #[test]
    fn test_extract_from_xml_decodes_entities() {
        assert_eq!(
            extract_session_id("<session_id>a&amp;b&lt;c&gt;&quot;&apos;&amp;lt;</session_id>")
                .as_deref(),
            Some("a&b<c>\"'&lt;")
        );
    }

    #[test]
    fn test_extract_missing() {
        assert_eq!(extract_session_id("<sessions></sessions>"), None);
        assert_eq!(extract_session_id("<session_id></session_id>"), None);
        assert_eq!(extract_session_id(""), None);
    }

    #[tokio::test]
    async fn test_create_session_request_shape() {
        let mock = Arc::new(MockTransport::responding(200, XML_REPLY));

        let session_id = client(&mock)
            .create_session(
                &SessionOptions::default()
                    .with_location("127.0.0.1")
                    .with_p2p(P2pPreference::Enabled),
            )
            .await
            .unwrap();
        assert_eq!(session_id, "2_MX4xNDk3MTI5Mn4xMjcuMC4wLjF-");

        let request = mock.requests().pop().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "http://localhost:9999/hl/session/create");
        assert_eq!(request.header_value("X-TB-PARTNER-AUTH"), Some("14971292:secret"));
        assert_eq!(
            request.body,
            RequestBody::Form(vec![
                ("location".to_string(), "127.0.0.1".to_string()),
                ("p2p.preference".to_string(), "enabled".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_create_session_without_options_sends_empty_form() {
        let mock = Arc::new(MockTransport::responding(200, XML_REPLY));
        client(&mock)
            .create_session(&SessionOptions::default())
            .await
            .unwrap();

        assert_eq!(mock.requests().pop().unwrap().body, RequestBody::Form(vec![]));
    }

    #[tokio::test]
    async fn test_create_session_failures() {
        let mock = Arc::new(MockTransport::new());
        mock.push_error(TransportError::Timeout);
        mock.push_response(HttpResponse::new(403, "<error/>"));
        mock.push_response(HttpResponse::new(200, "<sessions/>"));
        let client = client(&mock);

        let expected_sources = [
            TransportError::Timeout,
            TransportError::Status(403),
            TransportError::Decode("response has no session_id field".to_string()),
        ];
        for expected in expected_sources {
            let err = client
                .create_session(&SessionOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Failed to create session");
            assert!(
                matches!(err, OpenTokError::SessionCreation { ref source } if *source == expected),
                "expected source {expected:?}, got {err:?}"
            );
        }
    }
}
