//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for generated tokens.

use opentok::token::{decode_token, DecodedToken, TokenGenerator, TOKEN_PREFIX};

/// Custom assertions for generated tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_token()
///     .assert_claim("role", "moderator")
///     .assert_signed_by(opentok.tokens());
/// ```
pub trait TokenAssertions {
    /// Assert that the token has the prefix and decodes into its three parts
    fn assert_valid_token(&self) -> &Self;

    /// Assert that the claim `key` has exactly `value`
    fn assert_claim(&self, key: &str, value: &str) -> &Self;

    /// Assert that the claim `key` is absent
    fn assert_no_claim(&self, key: &str) -> &Self;

    /// Assert that the decoded claim string contains `fragment`
    fn assert_claims_contain(&self, fragment: &str) -> &Self;

    /// Assert that the token was issued for `api_key`
    fn assert_for_api_key(&self, api_key: &str) -> &Self;

    /// Assert that the generator's secret produced the signature
    fn assert_signed_by(&self, generator: &TokenGenerator) -> &Self;
}

fn decoded(token: &str) -> DecodedToken {
    match decode_token(token) {
        Ok(decoded) => decoded,
        Err(e) => panic!("Failed to decode token {token:?}: {e}"),
    }
}

impl TokenAssertions for String {
    fn assert_valid_token(&self) -> &Self {
        assert!(
            self.starts_with(TOKEN_PREFIX),
            "Token must start with {TOKEN_PREFIX}, got {self:?}"
        );
        let token = decoded(self);
        assert!(!token.claims.is_empty(), "Token claims must not be empty");
        assert_eq!(
            token.signature.len(),
            40,
            "HMAC-SHA1 signature must be 40 hex chars, got {:?}",
            token.signature
        );
        assert!(
            token.signature.bytes().all(|b| b.is_ascii_hexdigit()),
            "Signature must be hex, got {:?}",
            token.signature
        );
        self
    }

    fn assert_claim(&self, key: &str, value: &str) -> &Self {
        let token = decoded(self);
        assert_eq!(
            token.claim(key),
            Some(value),
            "Claim {key} mismatch in {:?}",
            token.claims
        );
        self
    }

    fn assert_no_claim(&self, key: &str) -> &Self {
        let token = decoded(self);
        assert_eq!(
            token.claim(key),
            None,
            "Claim {key} should be absent in {:?}",
            token.claims
        );
        self
    }

    fn assert_claims_contain(&self, fragment: &str) -> &Self {
        let token = decoded(self);
        assert!(
            token.claims.contains(fragment),
            "Claims {:?} should contain {fragment:?}",
            token.claims
        );
        self
    }

    fn assert_for_api_key(&self, api_key: &str) -> &Self {
        assert_eq!(decoded(self).api_key, api_key, "Token issued for wrong api key");
        self
    }

    fn assert_signed_by(&self, generator: &TokenGenerator) -> &Self {
        assert!(
            generator.verify_token(self),
            "Token signature does not verify against the generator's secret"
        );
        self
    }
}
