//! Session and archive id builders.
//!
//! Session ids carry their partner id, so tests that need a token for an
//! arbitrary api key build a matching id here instead of hard-coding one.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use uuid::Uuid;

/// Build a well-formed session id owned by `partner_id`.
///
/// Each call returns a different id.
#[must_use]
pub fn session_id_for(partner_id: &str) -> String {
    let payload = format!(
        "1~{partner_id}~~{}~{}~",
        Utc::now().timestamp(),
        Uuid::new_v4().simple()
    );
    format!("1_{}", URL_SAFE_NO_PAD.encode(payload))
}

/// Random archive id in the backend's format.
#[must_use]
pub fn random_archive_id() -> String {
    Uuid::new_v4().to_string()
}
