//! Application state shared across handlers.

use crate::entitlement::{ConfigEntitlements, EntitlementResolver};
use crate::metrics;
use anyhow::Context;
use folio_core::config::AppConfig;
use folio_core::{Sweep, SweepHandle, spawn_sweeper};
use folio_storage::DocumentStore;
use folio_tokens::TokenStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Capability token store.
    pub tokens: Arc<TokenStore>,
    /// Documents and the first-page derivative cache.
    pub documents: Arc<DocumentStore>,
    /// Full-document entitlement rules.
    pub entitlements: Arc<dyn EntitlementResolver>,
}

impl AppState {
    /// Assemble state from already-built components.
    pub fn new(
        config: AppConfig,
        tokens: Arc<TokenStore>,
        documents: Arc<DocumentStore>,
        entitlements: Arc<dyn EntitlementResolver>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tokens,
            documents,
            entitlements,
        }
    }

    /// Build state from configuration, failing fast on invalid settings or a
    /// missing uploads root.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;

        let tokens = TokenStore::new(&config.tokens).context("failed to create token store")?;
        let documents = folio_storage::from_config(&config.uploads, &config.derivatives)
            .context("failed to initialize document store")?;
        let entitlements = ConfigEntitlements::new(&config.entitlements);

        Ok(Self::new(
            config,
            Arc::new(tokens),
            Arc::new(documents),
            Arc::new(entitlements),
        ))
    }

    /// Start the token and derivative sweepers.
    ///
    /// The caller owns the returned handles and must stop them on shutdown.
    pub fn start_sweepers(&self) -> Vec<SweepHandle> {
        vec![
            spawn_sweeper(
                Arc::new(TokenSweep(self.tokens.clone())),
                self.config.tokens.sweep_interval(),
            ),
            spawn_sweeper(
                Arc::new(DerivativeSweep(self.documents.clone())),
                self.config.derivatives.sweep_interval(),
            ),
        ]
    }

    /// Refresh the outstanding-token gauge.
    pub fn record_active_tokens(&self) {
        metrics::ACTIVE_TOKENS.set(self.tokens.len() as i64);
    }
}

/// Token sweep that also feeds the token metrics.
struct TokenSweep(Arc<TokenStore>);

impl Sweep for TokenSweep {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn sweep(&self) -> usize {
        let evicted = self.0.sweep();
        metrics::TOKENS_SWEPT.inc_by(evicted as u64);
        metrics::ACTIVE_TOKENS.set(self.0.len() as i64);
        evicted
    }
}

/// Derivative sweep that also feeds the cache metrics.
struct DerivativeSweep(Arc<DocumentStore>);

impl Sweep for DerivativeSweep {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn sweep(&self) -> usize {
        let evicted = self.0.sweep();
        metrics::DERIVATIVES_EVICTED.inc_by(evicted as u64);
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn from_config_requires_uploads_root() {
        let temp = tempdir().unwrap();
        let config = AppConfig::for_testing(temp.path().join("missing"));
        assert!(AppState::from_config(config).is_err());
    }

    #[test]
    fn from_config_rejects_invalid_tokens() {
        let temp = tempdir().unwrap();
        let mut config = AppConfig::for_testing(temp.path());
        config.tokens.ttl_secs = 0;
        assert!(AppState::from_config(config).is_err());
    }

    #[tokio::test]
    async fn start_and_stop_sweepers() {
        let temp = tempdir().unwrap();
        let state = AppState::from_config(AppConfig::for_testing(temp.path())).unwrap();

        let handles = state.start_sweepers();
        let names: Vec<_> = handles.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["tokens", "derivatives"]);

        for handle in handles {
            handle.stop().await;
        }
    }
}
