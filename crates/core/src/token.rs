//! Capability token identifiers, per-token secrets, and entitlements.

use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum random bytes backing a token id (128 bits).
pub const MIN_TOKEN_ID_BYTES: usize = 16;

/// Maximum random bytes backing a token id.
pub const MAX_TOKEN_ID_BYTES: usize = 64;

/// Maximum accepted length of a per-token secret in bytes.
pub const MAX_SECRET_LEN: usize = 64;

/// Opaque capability token identifier (lowercase hex of random bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenId(String);

impl TokenId {
    /// Generate a new token id from `len` random bytes.
    ///
    /// `len` is clamped to `MIN_TOKEN_ID_BYTES..=MAX_TOKEN_ID_BYTES`.
    pub fn generate(len: usize) -> Self {
        let len = len.clamp(MIN_TOKEN_ID_BYTES, MAX_TOKEN_ID_BYTES);
        let mut bytes = vec![0u8; len];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(&bytes))
    }

    /// Parse an untrusted token id.
    ///
    /// Rejects anything that could not have been produced by `generate`.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let len_ok = s.len() >= MIN_TOKEN_ID_BYTES * 2
            && s.len() <= MAX_TOKEN_ID_BYTES * 2
            && s.len() % 2 == 0;
        if !len_ok {
            return Err(crate::Error::InvalidToken("bad token length".to_string()));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(crate::Error::InvalidToken(
                "token must be lowercase hex".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the token id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs.
    pub fn log_prefix(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({}..)", self.log_prefix())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-token symmetric key used by the obfuscation codec.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(Vec<u8>);

impl TokenSecret {
    /// Generate a fresh random secret of `len` bytes.
    pub fn generate(len: usize) -> Self {
        let len = len.clamp(1, MAX_SECRET_LEN);
        let mut bytes = vec![0u8; len];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> crate::Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() || bytes.len() > MAX_SECRET_LEN {
            return Err(crate::Error::InvalidSecret(format!(
                "secret must be 1..={MAX_SECRET_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Standard base64 encoding for embedding in rendered pages.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.0)
    }

    /// Parse from standard base64.
    pub fn from_base64(s: &str) -> crate::Result<Self> {
        // Anything longer cannot decode to a valid secret.
        if s.len() > MAX_SECRET_LEN * 2 {
            return Err(crate::Error::InvalidSecret("secret too long".to_string()));
        }
        let bytes = general_purpose::STANDARD
            .decode(s.trim())
            .map_err(|e| crate::Error::InvalidSecret(format!("invalid base64: {e}")))?;
        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
    }
}

/// What a redeemed token entitles its holder to receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entitlement {
    /// The complete document.
    Full,
    /// Only the first page.
    Preview,
}

impl Entitlement {
    /// Map the boolean entitlement flag.
    pub fn from_flag(entitled: bool) -> Self {
        if entitled { Self::Full } else { Self::Preview }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for Entitlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_id_generate_and_parse() {
        let id = TokenId::generate(32);
        assert_eq!(id.as_str().len(), 64);
        assert_eq!(TokenId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_token_id_generate_clamps_short_lengths() {
        let id = TokenId::generate(4);
        assert_eq!(id.as_str().len(), MIN_TOKEN_ID_BYTES * 2);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let a = TokenId::generate(16);
        let b = TokenId::generate(16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_id_parse_rejects_garbage() {
        assert!(TokenId::parse("").is_err());
        assert!(TokenId::parse("abc").is_err());
        assert!(TokenId::parse(&"g".repeat(32)).is_err());
        assert!(TokenId::parse(&"A".repeat(32)).is_err());
        assert!(TokenId::parse(&"a".repeat(33)).is_err());
        assert!(TokenId::parse(&"a".repeat(130)).is_err());
        assert!(TokenId::parse(&"../".repeat(16)).is_err());
    }

    #[test]
    fn test_token_id_debug_is_truncated() {
        let id = TokenId::generate(32);
        let debug = format!("{id:?}");
        assert!(!debug.contains(id.as_str()));
        assert!(debug.contains(id.log_prefix()));
    }

    #[test]
    fn test_secret_base64_roundtrip() {
        let secret = TokenSecret::generate(8);
        assert_eq!(secret.as_bytes().len(), 8);
        let decoded = TokenSecret::from_base64(&secret.to_base64()).unwrap();
        assert_eq!(decoded, secret);
    }

    #[test]
    fn test_secret_rejects_empty_and_invalid() {
        assert!(TokenSecret::from_bytes(Vec::new()).is_err());
        assert!(TokenSecret::from_base64("").is_err());
        assert!(TokenSecret::from_base64("not base64!!").is_err());
        assert!(TokenSecret::from_bytes(vec![1u8; MAX_SECRET_LEN + 1]).is_err());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = TokenSecret::from_bytes(vec![0xAB; 8]).unwrap();
        assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
    }

    #[test]
    fn test_entitlement_from_flag() {
        assert_eq!(Entitlement::from_flag(true), Entitlement::Full);
        assert_eq!(Entitlement::from_flag(false), Entitlement::Preview);
        assert_eq!(Entitlement::Preview.to_string(), "preview");
    }
}
