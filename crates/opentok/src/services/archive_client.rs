//! Archive REST client.
//!
//! Every call is a single round trip against
//! `<api_url>/v2/partner/<api_key>/archive[/<archive_id>]`. Identifiers are
//! checked before a request is built, so a missing id never reaches the
//! network. Non-2xx responses go through [`map_error_response`].

use crate::config::OpenTokConfig;
use crate::errors::{map_error_response, ArchiveOperation, OpenTokError, TransportError};
use crate::models::{Archive, ArchiveList, ArchiveListResponse};
use crate::services::partner_request;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};
use url::Url;

/// Options for [`ArchiveClient::start_archive`].
#[derive(Debug, Clone, Default)]
pub struct StartArchiveOptions {
    /// Name stored with the archive.
    pub name: Option<String>,
}

impl StartArchiveOptions {
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Paging for [`ArchiveClient::list_archives`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListArchivesOptions {
    /// Page size.
    pub count: Option<u32>,
    /// Index of the first archive to return.
    pub offset: Option<u32>,
}

impl ListArchivesOptions {
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Stateless client for the archive resource.
///
/// Cheap to clone; clones share the configuration and transport.
#[derive(Clone)]
pub struct ArchiveClient {
    config: Arc<OpenTokConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for ArchiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ArchiveClient {
    #[must_use]
    pub fn new(config: Arc<OpenTokConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Start recording a session.
    ///
    /// # Errors
    ///
    /// - `NoSessionId` if `session_id` is empty (no request is sent)
    /// - `SessionNotFound` on 404
    /// - `UnexpectedResponse` on any other failure
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn start_archive(
        &self,
        session_id: &str,
        options: &StartArchiveOptions,
    ) -> Result<Archive, OpenTokError> {
        let session_id = require_id(session_id).ok_or(OpenTokError::NoSessionId)?;

        let body = match &options.name {
            Some(name) => json!({ "action": "start", "sessionId": session_id, "name": name }),
            None => json!({ "action": "start", "sessionId": session_id }),
        };

        let request = self.request(Method::POST, &[])?.json(body);
        let response = self.execute(ArchiveOperation::Start, request).await?;
        parse(ArchiveOperation::Start, &response)
    }

    /// Fetch one archive.
    ///
    /// # Errors
    ///
    /// - `NoArchiveId` if `archive_id` is empty (no request is sent)
    /// - `ArchiveNotFound` on 404
    /// - `UnexpectedResponse` on any other failure
    #[instrument(skip_all, fields(archive_id = %archive_id))]
    pub async fn get_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        let archive_id = require_id(archive_id).ok_or(OpenTokError::NoArchiveId)?;

        let request = self.request(Method::GET, &[archive_id])?;
        let response = self.execute(ArchiveOperation::Get, request).await?;
        parse(ArchiveOperation::Get, &response)
    }

    /// List archives, newest first.
    ///
    /// `total_count` in the result is the partner-wide total, not the page size.
    ///
    /// # Errors
    ///
    /// `UnexpectedResponse` on any failure.
    #[instrument(skip_all, fields(count = ?options.count, offset = ?options.offset))]
    pub async fn list_archives(
        &self,
        options: &ListArchivesOptions,
    ) -> Result<ArchiveList, OpenTokError> {
        let mut url = self.resource_url(&[])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(count) = options.count {
                query.append_pair("count", &count.to_string());
            }
            if let Some(offset) = options.offset {
                query.append_pair("offset", &offset.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let request = partner_request(&self.config, Method::GET, url.as_str());
        let response = self.execute(ArchiveOperation::List, request).await?;
        let list: ArchiveListResponse = parse(ArchiveOperation::List, &response)?;
        Ok(list.into())
    }

    /// Stop a recording archive.
    ///
    /// # Errors
    ///
    /// - `NoArchiveId` if `archive_id` is empty (no request is sent)
    /// - `ArchiveNotFound` on 404
    /// - `Conflict` with the backend's message on 409 (archive not recording)
    /// - `UnexpectedResponse` on any other failure
    #[instrument(skip_all, fields(archive_id = %archive_id))]
    pub async fn stop_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        let archive_id = require_id(archive_id).ok_or(OpenTokError::NoArchiveId)?;

        let request = self
            .request(Method::POST, &[archive_id])?
            .json(json!({ "action": "stop" }));
        let response = self.execute(ArchiveOperation::Stop, request).await?;
        parse(ArchiveOperation::Stop, &response)
    }

    /// Delete an archive.
    ///
    /// # Errors
    ///
    /// - `NoArchiveId` if `archive_id` is empty (no request is sent)
    /// - `ArchiveNotFound` on 404
    /// - `UnexpectedResponse` on any other failure
    #[instrument(skip_all, fields(archive_id = %archive_id))]
    pub async fn delete_archive(&self, archive_id: &str) -> Result<(), OpenTokError> {
        let archive_id = require_id(archive_id).ok_or(OpenTokError::NoArchiveId)?;

        let request = self.request(Method::DELETE, &[archive_id])?;
        self.execute(ArchiveOperation::Delete, request).await?;
        Ok(())
    }

    fn resource_url(&self, segments: &[&str]) -> Result<Url, OpenTokError> {
        let mut url = Url::parse(&self.config.api_url).map_err(|e| {
            OpenTokError::unexpected(TransportError::Request(format!("Invalid API URL: {e}")))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                OpenTokError::unexpected(TransportError::Request(
                    "API URL cannot be a base".to_string(),
                ))
            })?
            .pop_if_empty()
            .extend(["v2", "partner", self.config.api_key.as_str(), "archive"])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<HttpRequest, OpenTokError> {
        let url = self.resource_url(segments)?;
        Ok(partner_request(&self.config, method, url.as_str()))
    }

    async fn execute(
        &self,
        operation: ArchiveOperation,
        request: HttpRequest,
    ) -> Result<HttpResponse, OpenTokError> {
        debug!(
            target: "opentok.archive",
            operation = operation.as_str(),
            method = %request.method,
            "Sending archive request"
        );

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(
                target: "opentok.archive",
                operation = operation.as_str(),
                error = %e,
                "Archive request failed"
            );
            OpenTokError::unexpected(e)
        })?;

        if response.is_success() {
            return Ok(response);
        }

        if response.status >= 500 {
            warn!(
                target: "opentok.archive",
                operation = operation.as_str(),
                status = response.status,
                "OpenTok returned server error"
            );
        } else {
            debug!(
                target: "opentok.archive",
                operation = operation.as_str(),
                status = response.status,
                "OpenTok rejected archive request"
            );
        }
        trace!(target: "opentok.archive", body = %response.body, "Archive error response body");

        Err(map_error_response(
            operation,
            response.status,
            &response.body,
        ))
    }
}

/// Stop an archive by id. Free-function form of [`ArchiveClient::stop_archive`].
///
/// # Errors
///
/// See [`ArchiveClient::stop_archive`].
pub async fn stop_archive(client: &ArchiveClient, archive_id: &str) -> Result<Archive, OpenTokError> {
    client.stop_archive(archive_id).await
}

/// Delete an archive by id. Free-function form of [`ArchiveClient::delete_archive`].
///
/// # Errors
///
/// See [`ArchiveClient::delete_archive`].
pub async fn delete_archive(client: &ArchiveClient, archive_id: &str) -> Result<(), OpenTokError> {
    client.delete_archive(archive_id).await
}

/// The identifier as given, or `None` when it is empty or all whitespace.
fn require_id(id: &str) -> Option<&str> {
    (!id.trim().is_empty()).then_some(id)
}

fn parse<T: DeserializeOwned>(
    operation: ArchiveOperation,
    response: &HttpResponse,
) -> Result<T, OpenTokError> {
    serde_json::from_str(&response.body).map_err(|e| {
        warn!(
            target: "opentok.archive",
            operation = operation.as_str(),
            error = %e,
            "Failed to parse archive response"
        );
        OpenTokError::unexpected(TransportError::Decode(e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::ArchiveStatus;
    use crate::transport::mock::MockTransport;
    use crate::transport::RequestBody;

    const ARCHIVE_JSON: &str = r#"{
      "createdAt" : 1391471703000,
      "duration" : 0,
      "id" : "ca138a6c-380f-4de9-b2b2-bc78b3a117e2",
      "name" : "PHP Archiving Sample App",
      "partnerId" : "APIKEY",
      "reason" : "",
      "sessionId" : "SESSION_ID",
      "size" : 0,
      "status" : "stopped",
      "url" : null
    }"#;

    fn client(mock: &Arc<MockTransport>) -> ArchiveClient {
        let config = OpenTokConfig::new("APIKEY", "APISECRET").with_api_url("http://localhost:9999");
        ArchiveClient::new(Arc::new(config), mock.clone())
    }

    #[tokio::test]
    async fn test_missing_ids_never_reach_transport() {
        let mock = Arc::new(MockTransport::new());
        let client = client(&mock);

        let err = client
            .start_archive("", &StartArchiveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No session ID given");

        for result in [
            client.get_archive("").await.map(|_| ()),
            client.stop_archive("  ").await.map(|_| ()),
            client.delete_archive("").await,
        ] {
            assert_eq!(result.unwrap_err().to_string(), "No archive ID given");
        }

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_start_request_shape() {
        let mock = Arc::new(MockTransport::responding(200, ARCHIVE_JSON));
        let client = client(&mock);

        client
            .start_archive("SESSION_ID", &StartArchiveOptions::with_name("Bob"))
            .await
            .unwrap();

        let request = mock.requests().pop().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "http://localhost:9999/v2/partner/APIKEY/archive");
        assert_eq!(request.header_value("X-TB-PARTNER-AUTH"), Some("APIKEY:APISECRET"));
        assert_eq!(
            request.body,
            RequestBody::Json(json!({"action": "start", "sessionId": "SESSION_ID", "name": "Bob"}))
        );
    }

    #[tokio::test]
    async fn test_start_without_name_omits_field() {
        let mock = Arc::new(MockTransport::responding(200, ARCHIVE_JSON));
        client(&mock)
            .start_archive("SESSION_ID", &StartArchiveOptions::default())
            .await
            .unwrap();

        let request = mock.requests().pop().unwrap();
        assert_eq!(
            request.body,
            RequestBody::Json(json!({"action": "start", "sessionId": "SESSION_ID"}))
        );
    }

    #[tokio::test]
    async fn test_ids_are_sent_as_given() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(HttpResponse::new(200, ARCHIVE_JSON));
        mock.push_response(HttpResponse::new(200, ARCHIVE_JSON));
        let client = client(&mock);

        client
            .start_archive(" SESSION_ID ", &StartArchiveOptions::default())
            .await
            .unwrap();
        client.get_archive(" abc ").await.unwrap();

        let requests = mock.requests();
        assert_eq!(
            requests.first().unwrap().body,
            RequestBody::Json(json!({"action": "start", "sessionId": " SESSION_ID "}))
        );
        assert_eq!(
            requests.get(1).unwrap().url,
            "http://localhost:9999/v2/partner/APIKEY/archive/%20abc%20"
        );
    }

    #[tokio::test]
    async fn test_archive_id_is_path_encoded() {
        let mock = Arc::new(MockTransport::responding(200, ARCHIVE_JSON));
        client(&mock).get_archive("a/b c").await.unwrap();

        let request = mock.requests().pop().unwrap();
        assert_eq!(
            request.url,
            "http://localhost:9999/v2/partner/APIKEY/archive/a%2Fb%20c"
        );
    }

    #[tokio::test]
    async fn test_list_query_parameters() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(HttpResponse::new(200, r#"{"count": 0, "items": []}"#));
        mock.push_response(HttpResponse::new(200, r#"{"count": 0, "items": []}"#));
        let client = client(&mock);

        client
            .list_archives(&ListArchivesOptions::default().with_count(5).with_offset(10))
            .await
            .unwrap();
        client
            .list_archives(&ListArchivesOptions::default())
            .await
            .unwrap();

        let requests = mock.requests();
        let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:9999/v2/partner/APIKEY/archive?count=5&offset=10",
                "http://localhost:9999/v2/partner/APIKEY/archive",
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_unexpected_with_source() {
        let mock = Arc::new(MockTransport::new());
        mock.push_error(TransportError::Request("connection refused".into()));

        let err = client(&mock).get_archive("abc").await.unwrap_err();

        assert_eq!(err.to_string(), "Unexpected response from OpenTok");
        assert!(matches!(
            err,
            OpenTokError::UnexpectedResponse {
                source: Some(TransportError::Request(ref m))
            } if m == "connection refused"
        ));
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_unexpected() {
        let mock = Arc::new(MockTransport::responding(200, "<html>not json</html>"));
        let err = client(&mock).stop_archive("abc").await.unwrap_err();

        assert!(matches!(
            err,
            OpenTokError::UnexpectedResponse {
                source: Some(TransportError::Decode(_))
            }
        ));
    }

    #[tokio::test]
    async fn test_bound_operations_use_record_id() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(HttpResponse::new(200, ARCHIVE_JSON));
        mock.push_response(HttpResponse::new(204, ""));
        let client = client(&mock);

        let archive: Archive = serde_json::from_str(ARCHIVE_JSON).unwrap();
        let stopped = archive.stop(&client).await.unwrap();
        assert_eq!(stopped.status, ArchiveStatus::Stopped);
        archive.delete(&client).await.unwrap();

        let requests = mock.requests();
        assert!(requests
            .iter()
            .all(|r| r.url.ends_with("/archive/ca138a6c-380f-4de9-b2b2-bc78b3a117e2")));
        let methods: Vec<Method> = requests.into_iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::POST, Method::DELETE]);
    }

    #[tokio::test]
    async fn test_free_functions() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(HttpResponse::new(200, ARCHIVE_JSON));
        mock.push_response(HttpResponse::new(404, r#"{"message":"gone"}"#));
        let client = client(&mock);

        assert!(stop_archive(&client, "ca138a6c").await.is_ok());
        let err = delete_archive(&client, "ca138a6c").await.unwrap_err();
        assert!(matches!(err, OpenTokError::ArchiveNotFound));
    }
}
