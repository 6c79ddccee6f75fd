//! OpenTok REST clients.
//!
//! - `session_client` - Session creation
//! - `archive_client` - Archive lifecycle (start, get, list, stop, delete)

pub mod archive_client;
pub mod session_client;

use crate::config::OpenTokConfig;
use crate::transport::{HttpRequest, Method};

/// Header carrying the partner credentials on every backend call.
pub const PARTNER_AUTH_HEADER: &str = "X-TB-PARTNER-AUTH";

/// `User-Agent` sent with every backend call.
pub const USER_AGENT: &str = concat!("opentok-rust/", env!("CARGO_PKG_VERSION"));

/// Request with the partner authentication headers applied.
pub(crate) fn partner_request(config: &OpenTokConfig, method: Method, url: &str) -> HttpRequest {
    HttpRequest::new(method, url)
        .header(PARTNER_AUTH_HEADER, config.partner_auth())
        .header("User-Agent", USER_AGENT)
}
