//! `OpenTok` facade.
//!
//! One handle per partner credential pair. Token generation, session creation
//! and the archive client share a single configuration and HTTP transport.

use crate::config::OpenTokConfig;
use crate::errors::OpenTokError;
use crate::models::{Archive, ArchiveList};
use crate::services::archive_client::{ArchiveClient, ListArchivesOptions, StartArchiveOptions};
use crate::services::session_client::{SessionClient, SessionOptions};
use crate::token::{TokenGenerator, TokenOptions};
use crate::transport::{HttpTransport, ReqwestTransport};
use std::sync::Arc;
use tracing::info;

/// Entry point bundling tokens, sessions and archives.
#[derive(Debug, Clone)]
pub struct OpenTok {
    config: Arc<OpenTokConfig>,
    tokens: Arc<TokenGenerator>,
    sessions: SessionClient,
    archives: ArchiveClient,
}

impl OpenTok {
    /// Build a client against the default API URL.
    ///
    /// # Errors
    ///
    /// `UnexpectedResponse` if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self, OpenTokError> {
        Self::with_config(OpenTokConfig::new(api_key, api_secret))
    }

    /// Build a client from a full configuration.
    ///
    /// # Errors
    ///
    /// `UnexpectedResponse` if the HTTP client cannot be built.
    pub fn with_config(config: OpenTokConfig) -> Result<Self, OpenTokError> {
        let transport =
            ReqwestTransport::new(config.http_timeout).map_err(OpenTokError::unexpected)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over a caller-supplied transport.
    #[must_use]
    pub fn with_transport(config: OpenTokConfig, transport: Arc<dyn HttpTransport>) -> Self {
        info!(
            target: "opentok.client",
            api_key = %config.api_key,
            api_url = %config.api_url,
            "OpenTok client initialized"
        );

        let tokens = Arc::new(TokenGenerator::new(&config));
        let config = Arc::new(config);
        Self {
            sessions: SessionClient::new(Arc::clone(&config), Arc::clone(&transport)),
            archives: ArchiveClient::new(Arc::clone(&config), transport),
            tokens,
            config,
        }
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    #[must_use]
    pub fn config(&self) -> &OpenTokConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenGenerator {
        &self.tokens
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionClient {
        &self.sessions
    }

    /// Archive client, also used by [`Archive::stop`] and [`Archive::delete`].
    #[must_use]
    pub fn archives(&self) -> &ArchiveClient {
        &self.archives
    }

    /// # Errors
    ///
    /// See [`TokenGenerator::generate_token`].
    pub fn generate_token(&self, options: &TokenOptions) -> Result<String, OpenTokError> {
        self.tokens.generate_token(options)
    }

    /// # Errors
    ///
    /// See [`SessionClient::create_session`].
    pub async fn create_session(&self, options: &SessionOptions) -> Result<String, OpenTokError> {
        self.sessions.create_session(options).await
    }

    /// # Errors
    ///
    /// See [`ArchiveClient::start_archive`].
    pub async fn start_archive(
        &self,
        session_id: &str,
        options: &StartArchiveOptions,
    ) -> Result<Archive, OpenTokError> {
        self.archives.start_archive(session_id, options).await
    }

    /// # Errors
    ///
    /// See [`ArchiveClient::get_archive`].
    pub async fn get_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        self.archives.get_archive(archive_id).await
    }

    /// # Errors
    ///
    /// See [`ArchiveClient::list_archives`].
    pub async fn list_archives(
        &self,
        options: &ListArchivesOptions,
    ) -> Result<ArchiveList, OpenTokError> {
        self.archives.list_archives(options).await
    }

    /// # Errors
    ///
    /// See [`ArchiveClient::stop_archive`].
    pub async fn stop_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        self.archives.stop_archive(archive_id).await
    }

    /// # Errors
    ///
    /// See [`ArchiveClient::delete_archive`].
    pub async fn delete_archive(&self, archive_id: &str) -> Result<(), OpenTokError> {
        self.archives.delete_archive(archive_id).await
    }
}
