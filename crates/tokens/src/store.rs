//! In-memory capability token store.

use crate::error::{TokenError, TokenResult};
use crate::record::{IssuedToken, TokenRecord};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use folio_core::config::TokenConfig;
use folio_core::{Entitlement, SubjectId, Sweep, TokenId, TokenSecret};
use std::time::Duration;
use tokio::time::Instant;

/// Issues and redeems single-use, time-bounded capability tokens.
///
/// Records live only in process memory. Redemption removes the record before
/// inspecting it, so of any number of concurrent redeem calls for one token
/// at most one can succeed, and every failed call still consumes the token.
pub struct TokenStore {
    records: DashMap<TokenId, TokenRecord>,
    ttl: Duration,
    secret_len: usize,
    id_bytes: usize,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new(config: &TokenConfig) -> TokenResult<Self> {
        config.validate().map_err(TokenError::Config)?;
        Ok(Self {
            records: DashMap::new(),
            ttl: config.ttl(),
            secret_len: config.secret_len,
            id_bytes: config.id_bytes,
        })
    }

    /// Time a token stays redeemable after issue.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` to fetch `filename`.
    ///
    /// `filename` must already be a validated basename.
    pub fn issue(&self, subject: SubjectId, filename: &str, entitled: bool) -> IssuedToken {
        let secret = TokenSecret::generate(self.secret_len);
        let encoded = secret.to_base64();
        let entitlement = Entitlement::from_flag(entitled);

        let token = loop {
            let candidate = TokenId::generate(self.id_bytes);
            if let Entry::Vacant(slot) = self.records.entry(candidate.clone()) {
                slot.insert(TokenRecord {
                    subject,
                    filename: filename.to_string(),
                    entitlement,
                    secret,
                    issued_at: Instant::now(),
                });
                break candidate;
            }
        };

        tracing::debug!(
            token = token.log_prefix(),
            subject = %subject,
            filename,
            %entitlement,
            "Issued capability token"
        );

        IssuedToken {
            token,
            secret: encoded,
        }
    }

    /// Read a token's secret without consuming the token.
    ///
    /// Only the step that renders the token into a response may call this.
    pub fn peek_secret(&self, token: &TokenId) -> Option<String> {
        self.records
            .get(token)
            .filter(|record| record.issued_at.elapsed() <= self.ttl)
            .map(|record| record.secret.to_base64())
    }

    /// Redeem a token, returning the reason on failure.
    ///
    /// The token is gone from the store after this returns, whatever the
    /// outcome.
    pub fn redeem_checked(&self, token: &TokenId, subject: SubjectId) -> TokenResult<TokenRecord> {
        let (_, record) = self.records.remove(token).ok_or(TokenError::Unknown)?;

        if record.subject != subject {
            return Err(TokenError::SubjectMismatch);
        }
        if record.issued_at.elapsed() > self.ttl {
            return Err(TokenError::Expired);
        }

        Ok(record)
    }

    /// Redeem a token.
    ///
    /// Returns `None` for an unknown, expired, or foreign token without
    /// saying which.
    pub fn redeem(&self, token: &TokenId, subject: SubjectId) -> Option<TokenRecord> {
        self.redeem_checked(token, subject).ok()
    }

    /// Number of outstanding tokens, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Sweep for TokenStore {
    fn name(&self) -> &'static str {
        "tokens"
    }

    fn sweep(&self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| record.issued_at.elapsed() <= self.ttl);
        before.saturating_sub(self.records.len())
    }
}
