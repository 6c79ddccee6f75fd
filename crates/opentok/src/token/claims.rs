//! Token claims and their wire encoding.
//!
//! The backend's verifier reads claims as `key=value` pairs joined by `&`
//! in a fixed order:
//!
//! ```text
//! session_id=<id>&create_time=<secs>&nonce=<n>&role=<role>&expire_time=<secs>[&connection_data=<data>]
//! ```
//!
//! Values are written raw. `connection_data` is always last so that any
//! `&` or `=` it contains cannot shift the position of another claim.

use crate::errors::OpenTokError;
use std::fmt;
use std::str::FromStr;

/// Role granted to the connecting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Can publish and subscribe to streams.
    #[default]
    Publisher,
    /// Can only subscribe.
    Subscriber,
    /// Publisher that can also force other clients to disconnect or unpublish.
    Moderator,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Publisher => "publisher",
            Role::Subscriber => "subscriber",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OpenTokError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publisher" => Ok(Role::Publisher),
            "subscriber" => Ok(Role::Subscriber),
            "moderator" => Ok(Role::Moderator),
            other => Err(OpenTokError::InvalidRole(other.to_string())),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Validated inputs of a single token.
///
/// Built by `TokenGenerator` after all checks pass; lives only for the
/// duration of one `generate_token` call.
#[derive(Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub session_id: String,
    pub create_time: i64,
    pub nonce: u32,
    pub role: Role,
    pub expire_time: i64,
    pub connection_data: Option<String>,
}

impl fmt::Debug for ClaimSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSet")
            .field("session_id", &self.session_id)
            .field("create_time", &self.create_time)
            .field("nonce", &self.nonce)
            .field("role", &self.role)
            .field("expire_time", &self.expire_time)
            .field(
                "connection_data",
                &self.connection_data.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ClaimSet {
    /// Encode the claims in backend order.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut encoded = format!(
            "session_id={}&create_time={}&nonce={}&role={}&expire_time={}",
            self.session_id, self.create_time, self.nonce, self.role, self.expire_time
        );

        if let Some(data) = self.connection_data.as_deref().filter(|d| !d.is_empty()) {
            encoded.push_str("&connection_data=");
            encoded.push_str(data);
        }

        encoded
    }
}
