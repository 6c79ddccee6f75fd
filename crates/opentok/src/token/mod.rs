//! Session token generation.
//!
//! Tokens are minted locally: validate the caller's options, build a
//! [`ClaimSet`] with a fresh nonce and creation time, encode it, sign it.
//! No I/O happens here and nothing is stored.
//!
//! Validation order (first failure wins):
//!
//! 1. empty session id -> `EmptySessionId`
//! 2. session id without the self-describing shape -> `InvalidSessionId`
//! 3. embedded partner id differs from the configured api key -> `InvalidSessionId`
//! 4. unknown role -> `InvalidRole`
//! 5. expire time not in `(now, now + 30 days]` -> `InvalidExpireTime`
//! 6. connection data over 1000 bytes -> `ConnectionDataTooLong`

pub mod claims;
pub mod session_id;
pub mod signer;

pub use claims::{ClaimSet, Role};
pub use signer::{decode_token, DecodedToken, TokenDecodeError, TokenSigner, TOKEN_PREFIX};

use crate::config::OpenTokConfig;
use crate::errors::OpenTokError;
use std::time::Duration;
use tracing::{debug, instrument};

/// Maximum size of the opaque connection data, in bytes.
pub const MAX_CONNECTION_DATA_BYTES: usize = 1000;

/// Furthest a token may expire from its creation time.
pub const MAX_EXPIRE_HORIZON: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Lifetime of a token when no expire time is given.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Caller-supplied token options.
///
/// Everything except the session id is optional.
#[derive(Clone, Default)]
pub struct TokenOptions {
    pub session_id: String,
    pub role: Option<String>,
    /// Absolute expiry, Unix epoch seconds.
    pub expire_time: Option<i64>,
    pub connection_data: Option<String>,
}

impl std::fmt::Debug for TokenOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenOptions")
            .field("session_id", &self.session_id)
            .field("role", &self.role)
            .field("expire_time", &self.expire_time)
            .field(
                "connection_data",
                &self.connection_data.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl TokenOptions {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Accepts a [`Role`] or a raw role name (validated at generation time).
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn with_expire_time(mut self, expire_time: i64) -> Self {
        self.expire_time = Some(expire_time);
        self
    }

    #[must_use]
    pub fn with_connection_data(mut self, data: impl Into<String>) -> Self {
        self.connection_data = Some(data.into());
        self
    }
}

/// Validates options and produces signed tokens for one partner.
#[derive(Debug)]
pub struct TokenGenerator {
    api_key: String,
    signer: TokenSigner,
}

impl TokenGenerator {
    #[must_use]
    pub fn new(config: &OpenTokConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            signer: TokenSigner::new(&config.api_key, &config.api_secret),
        }
    }

    /// Generate a token for the given options.
    ///
    /// Two calls with identical options return different tokens: the nonce
    /// and creation time are fresh each time.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, see the module docs for the order.
    #[instrument(skip_all, fields(session_id = %options.session_id))]
    pub fn generate_token(&self, options: &TokenOptions) -> Result<String, OpenTokError> {
        let claims = self.build_claims(options, chrono::Utc::now().timestamp(), rand::random())?;
        let token = self.signer.sign(&claims.encode());

        debug!(
            target: "opentok.token",
            role = %claims.role,
            expire_time = claims.expire_time,
            "Token generated"
        );

        Ok(token)
    }

    /// Check that a token was signed with this generator's secret.
    #[must_use]
    pub fn verify_token(&self, token: &str) -> bool {
        decode_token(token).is_ok_and(|decoded| self.signer.verify(&decoded))
    }

    /// Validate options and assemble the claim set for a given clock and nonce.
    pub(crate) fn build_claims(
        &self,
        options: &TokenOptions,
        now: i64,
        nonce: u32,
    ) -> Result<ClaimSet, OpenTokError> {
        let session_id = options.session_id.trim();
        if session_id.is_empty() {
            return Err(OpenTokError::EmptySessionId);
        }

        let partner_id = session_id::partner_id(session_id).ok_or(OpenTokError::InvalidSessionId)?;
        if partner_id != self.api_key {
            return Err(OpenTokError::InvalidSessionId);
        }

        let role = match options.role.as_deref() {
            Some(role) => role.parse::<Role>()?,
            None => Role::default(),
        };

        #[allow(clippy::cast_possible_wrap)]
        let expire_time = match options.expire_time {
            Some(expire_time) => {
                let horizon = now + MAX_EXPIRE_HORIZON.as_secs() as i64;
                if expire_time <= now || expire_time > horizon {
                    return Err(OpenTokError::InvalidExpireTime(expire_time));
                }
                expire_time
            }
            None => now + DEFAULT_TOKEN_TTL.as_secs() as i64,
        };

        if let Some(data) = options.connection_data.as_deref() {
            if data.len() > MAX_CONNECTION_DATA_BYTES {
                return Err(OpenTokError::ConnectionDataTooLong(data.len()));
            }
        }

        Ok(ClaimSet {
            session_id: session_id.to_string(),
            create_time: now,
            nonce,
            role,
            expire_time,
            connection_data: options.connection_data.clone(),
        })
    }
}
