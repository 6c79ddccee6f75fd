//! Archive records returned by the OpenTok backend.
//!
//! Records are plain values rebuilt from every response. Nothing is cached;
//! to observe a state change, fetch the archive again.

use crate::errors::OpenTokError;
use crate::services::archive_client::ArchiveClient;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Archive lifecycle status.
///
/// Open enumeration: statuses this library does not know about are kept in
/// `Other` instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArchiveStatus {
    /// Recording in progress.
    Started,

    /// Recording stopped, upload pending.
    Stopped,

    /// Recording uploaded and downloadable from `url`.
    Available,

    /// Recording could not be completed.
    Failed,

    /// Any other backend-defined status, verbatim.
    Other(String),
}

impl ArchiveStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ArchiveStatus::Started => "started",
            ArchiveStatus::Stopped => "stopped",
            ArchiveStatus::Available => "available",
            ArchiveStatus::Failed => "failed",
            ArchiveStatus::Other(status) => status,
        }
    }

    /// `available` and `failed` are final.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ArchiveStatus::Available | ArchiveStatus::Failed)
    }
}

impl From<&str> for ArchiveStatus {
    fn from(s: &str) -> Self {
        match s {
            "started" => ArchiveStatus::Started,
            "stopped" => ArchiveStatus::Stopped,
            "available" => ArchiveStatus::Available,
            "failed" => ArchiveStatus::Failed,
            other => ArchiveStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<&str> for ArchiveStatus {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Serialize for ArchiveStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArchiveStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ArchiveStatus::from(raw.as_str()))
    }
}

/// One server-side recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archive {
    /// Archive id (UUID, assigned by the backend).
    pub id: String,

    /// Session being recorded.
    pub session_id: String,

    /// Partner that owns the archive.
    #[serde(default)]
    pub partner_id: String,

    /// Caller-supplied name; empty when none was given.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    pub status: ArchiveStatus,

    /// Backend explanation for the current status; usually empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,

    /// Creation time, Unix epoch milliseconds.
    pub created_at: i64,

    /// Length in seconds; 0 while recording.
    #[serde(default)]
    pub duration: u64,

    /// Size in bytes; 0 while recording.
    #[serde(default)]
    pub size: u64,

    /// Download URL, present once the archive is available.
    #[serde(default)]
    pub url: Option<String>,
}

impl Archive {
    /// Stop this archive. Same as `client.stop_archive(&self.id)`.
    ///
    /// # Errors
    ///
    /// See [`ArchiveClient::stop_archive`].
    pub async fn stop(&self, client: &ArchiveClient) -> Result<Archive, OpenTokError> {
        client.stop_archive(&self.id).await
    }

    /// Delete this archive. Same as `client.delete_archive(&self.id)`.
    ///
    /// # Errors
    ///
    /// See [`ArchiveClient::delete_archive`].
    pub async fn delete(&self, client: &ArchiveClient) -> Result<(), OpenTokError> {
        client.delete_archive(&self.id).await
    }
}

/// One page of archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveList {
    pub archives: Vec<Archive>,

    /// Total archives for the partner, independent of the page size.
    pub total_count: u64,
}

/// Wire shape of the list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveListResponse {
    pub count: u64,
    #[serde(default)]
    pub items: Vec<Archive>,
}

impl From<ArchiveListResponse> for ArchiveList {
    fn from(response: ArchiveListResponse) -> Self {
        Self {
            archives: response.items,
            total_count: response.count,
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
