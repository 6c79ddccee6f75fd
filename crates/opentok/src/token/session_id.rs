//! Session identifier parsing.
//!
//! A session id is `<version>_<payload>` where the payload is URL-safe base64
//! (padding usually stripped) over a
//! `~`-delimited record:
//!
//! ```text
//! 1_MX4xNDk3MTI5Mn5-MjAxMi0wNS0x...
//!   -> "1~14971292~~2012-05-16 23:22:34.874487+00:00~0.502852690534~"
//!         ^ partner id
//! ```

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Lenient decoder: session ids are produced by the backend with stripped
/// padding and do not always zero their trailing bits.
const SESSION_ID_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Position of the partner id in the decoded `~`-separated record.
const PARTNER_ID_FIELD: usize = 1;

/// Extract the partner (API key) id embedded in a session id.
///
/// Returns `None` when the id does not have the self-describing shape.
#[must_use]
pub fn partner_id(session_id: &str) -> Option<String> {
    let (version, payload) = session_id.split_once('_')?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) || payload.is_empty() {
        return None;
    }

    let decoded = SESSION_ID_ENGINE.decode(payload).ok()?;
    let record = String::from_utf8(decoded).ok()?;

    let partner = record.split('~').nth(PARTNER_ID_FIELD)?;
    if partner.is_empty() {
        return None;
    }
    Some(partner.to_string())
}
