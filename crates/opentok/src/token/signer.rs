//! Token signing and decoding.
//!
//! ```text
//! token   = "T1==" || base64( claims || ":" || hex(HMAC-SHA1(secret, claims)) || ":" || api_key )
//! ```
//!
//! The signature and api key never contain `:`, so decoding splits from the
//! right and the claims (which may carry arbitrary connection data) stay
//! intact.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::hmac;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Version/type prefix of every token.
pub const TOKEN_PREFIX: &str = "T1==";

const FIELD_DELIMITER: char = ':';

/// Errors from [`decode_token`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenDecodeError {
    #[error("Token does not start with the T1== prefix")]
    MissingPrefix,

    #[error("Token body is not valid base64")]
    InvalidBase64,

    #[error("Token body is not valid UTF-8")]
    InvalidUtf8,

    #[error("Token body is missing the signature or partner id")]
    MissingFields,
}

/// A token split back into its signed parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// Encoded claim string exactly as it was signed.
    pub claims: String,
    /// Hex HMAC over `claims`.
    pub signature: String,
    /// Partner id the token was issued for.
    pub api_key: String,
}

impl DecodedToken {
    /// Look up a single claim value by key.
    ///
    /// `connection_data` is returned in full even if it contains `&`.
    #[must_use]
    pub fn claim(&self, key: &str) -> Option<&str> {
        let mut rest = self.claims.as_str();
        loop {
            let (pair, tail) = if rest.starts_with("connection_data=") {
                (rest, "")
            } else {
                rest.split_once('&').unwrap_or((rest, ""))
            };
            if let Some((k, v)) = pair.split_once('=') {
                if k == key {
                    return Some(v);
                }
            }
            if tail.is_empty() {
                return None;
            }
            rest = tail;
        }
    }
}

/// Signs encoded claim strings with the partner secret.
pub struct TokenSigner {
    key: hmac::Key,
    api_key: String,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"[REDACTED]")
            .field("api_key", &self.api_key)
            .finish()
    }
}

impl TokenSigner {
    /// HMAC-SHA1 is what the backend's token verifier expects.
    #[must_use]
    pub fn new(api_key: &str, api_secret: &SecretString) -> Self {
        Self {
            key: hmac::Key::new(
                hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
                api_secret.expose_secret().as_bytes(),
            ),
            api_key: api_key.to_string(),
        }
    }

    /// Hex-encoded HMAC over the encoded claims.
    #[must_use]
    pub fn signature(&self, encoded_claims: &str) -> String {
        hex::encode(hmac::sign(&self.key, encoded_claims.as_bytes()).as_ref())
    }

    /// Assemble the final token string.
    #[must_use]
    pub fn sign(&self, encoded_claims: &str) -> String {
        let signature = self.signature(encoded_claims);
        let payload = format!(
            "{encoded_claims}{FIELD_DELIMITER}{signature}{FIELD_DELIMITER}{}",
            self.api_key
        );
        format!("{TOKEN_PREFIX}{}", STANDARD.encode(payload))
    }

    /// Check a decoded token's signature in constant time.
    #[must_use]
    pub fn verify(&self, token: &DecodedToken) -> bool {
        if token.api_key != self.api_key {
            return false;
        }
        let Ok(provided) = hex::decode(&token.signature) else {
            return false;
        };
        hmac::verify(&self.key, token.claims.as_bytes(), &provided).is_ok()
    }
}

/// Reverse the prefix and base64 steps of a token.
///
/// Does not check the signature; see [`TokenSigner::verify`].
///
/// # Errors
///
/// Returns a [`TokenDecodeError`] describing which layer is malformed.
pub fn decode_token(token: &str) -> Result<DecodedToken, TokenDecodeError> {
    let body = token
        .strip_prefix(TOKEN_PREFIX)
        .ok_or(TokenDecodeError::MissingPrefix)?;
    let bytes = STANDARD
        .decode(body)
        .map_err(|_| TokenDecodeError::InvalidBase64)?;
    let payload = String::from_utf8(bytes).map_err(|_| TokenDecodeError::InvalidUtf8)?;

    let mut fields = payload.rsplitn(3, FIELD_DELIMITER);
    let api_key = fields.next().ok_or(TokenDecodeError::MissingFields)?;
    let signature = fields.next().ok_or(TokenDecodeError::MissingFields)?;
    let claims = fields.next().ok_or(TokenDecodeError::MissingFields)?;

    Ok(DecodedToken {
        claims: claims.to_string(),
        signature: signature.to_string(),
        api_key: api_key.to_string(),
    })
}
