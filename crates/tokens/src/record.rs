//! Token records.

use folio_core::{Entitlement, SubjectId, TokenId, TokenSecret};
use std::fmt;
use tokio::time::Instant;

/// What a capability token grants, as stored until redemption.
#[derive(Clone, Debug)]
pub struct TokenRecord {
    /// Subject the token was issued to; redemption must present the same id.
    pub subject: SubjectId,
    /// Sanitized basename of the target document.
    pub filename: String,
    pub entitlement: Entitlement,
    /// Key for the byte codec.
    pub secret: TokenSecret,
    pub issued_at: Instant,
}

/// Result of issuing a token: the id plus its secret in transport encoding.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: TokenId,
    /// Standard base64 of the secret bytes.
    pub secret: String,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}
