//! OpenTok client error types.
//!
//! Local validation failures (bad session id, missing archive id, invalid
//! claims) are detected before any request is built. Backend failures are
//! mapped from HTTP status codes by [`map_error_response`], a pure function
//! with no knowledge of the transport.
//!
//! Display strings are part of the public contract: callers match on them.

use serde::Deserialize;
use thiserror::Error;

/// OpenTok client error type.
#[derive(Debug, Error)]
pub enum OpenTokError {
    #[error("Null or empty session ID is not valid")]
    EmptySessionId,

    #[error("An invalid session ID was passed")]
    InvalidSessionId,

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Expire time must be in the future and within 30 days: {0}")]
    InvalidExpireTime(i64),

    #[error("Connection data must be at most 1000 bytes, got {0}")]
    ConnectionDataTooLong(usize),

    #[error("No session ID given")]
    NoSessionId,

    #[error("No archive ID given")]
    NoArchiveId,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Archive not found")]
    ArchiveNotFound,

    /// Backend rejected the call with 409. The backend's message is the
    /// error text, unmodified.
    #[error("{0}")]
    Conflict(String),

    #[error("Failed to create session")]
    SessionCreation {
        #[source]
        source: TransportError,
    },

    #[error("Unexpected response from OpenTok")]
    UnexpectedResponse {
        #[source]
        source: Option<TransportError>,
    },
}

impl OpenTokError {
    /// `UnexpectedResponse` wrapping a transport-level cause.
    #[must_use]
    pub fn unexpected(source: TransportError) -> Self {
        OpenTokError::UnexpectedResponse {
            source: Some(source),
        }
    }

    /// True when the error was raised before any request left the process.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            OpenTokError::EmptySessionId
                | OpenTokError::InvalidSessionId
                | OpenTokError::InvalidRole(_)
                | OpenTokError::InvalidExpireTime(_)
                | OpenTokError::ConnectionDataTooLong(_)
                | OpenTokError::NoSessionId
                | OpenTokError::NoArchiveId
        )
    }
}

/// Failures below the domain layer: the request never completed, the
/// response could not be read or decoded, or the status was not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("HTTP request timed out")]
    Timeout,

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),
}

/// Archive operation whose response is being mapped.
///
/// The same status code means different things depending on the call: a 404
/// from `start` refers to the session, from the others to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOperation {
    Start,
    Get,
    List,
    Stop,
    Delete,
}

impl ArchiveOperation {
    /// Name used in tracing fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveOperation::Start => "start",
            ArchiveOperation::Get => "get",
            ArchiveOperation::List => "list",
            ArchiveOperation::Stop => "stop",
            ArchiveOperation::Delete => "delete",
        }
    }
}

/// JSON error body returned by the archive endpoints.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Map a non-success archive response to a domain error.
///
/// | status | start | get / delete | stop | list |
/// |---|---|---|---|---|
/// | 404 | `SessionNotFound` | `ArchiveNotFound` | `ArchiveNotFound` | `UnexpectedResponse` |
/// | 409 | `UnexpectedResponse` | `UnexpectedResponse` | `Conflict(message)` | `UnexpectedResponse` |
/// | other | `UnexpectedResponse` | `UnexpectedResponse` | `UnexpectedResponse` | `UnexpectedResponse` |
///
/// A 409 on stop without a readable `message` field falls back to
/// `UnexpectedResponse`.
#[must_use]
pub fn map_error_response(operation: ArchiveOperation, status: u16, body: &str) -> OpenTokError {
    match (operation, status) {
        (ArchiveOperation::Start, 404) => OpenTokError::SessionNotFound,
        (ArchiveOperation::Get | ArchiveOperation::Stop | ArchiveOperation::Delete, 404) => {
            OpenTokError::ArchiveNotFound
        }
        (ArchiveOperation::Stop, 409) => match conflict_message(body) {
            Some(message) => OpenTokError::Conflict(message),
            None => OpenTokError::unexpected(TransportError::Status(status)),
        },
        _ => OpenTokError::unexpected(TransportError::Status(status)),
    }
}

fn conflict_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}
