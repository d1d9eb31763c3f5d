//! Configuration types shared across crates.
//!
//! All values are static process-start configuration; nothing here is
//! consulted per request except through the owning component.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// SECURITY: restrict this endpoint to scraper IPs at the network level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Uploaded documents configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Root directory holding uploaded files. Must exist at startup.
    #[serde(default = "default_uploads_root")]
    pub root: PathBuf,
    /// File extension (without the dot) that may only be fetched through
    /// the gateway. Compared case-insensitively.
    #[serde(default = "default_protected_extension")]
    pub protected_extension: String,
}

fn default_uploads_root() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_protected_extension() -> String {
    "pdf".to_string()
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: default_uploads_root(),
            protected_extension: default_protected_extension(),
        }
    }
}

impl UploadsConfig {
    /// Whether a request path names a protected document.
    pub fn is_protected(&self, path: &str) -> bool {
        let ext = self.protected_extension.trim_start_matches('.');
        if ext.is_empty() {
            return false;
        }
        path.rsplit_once('.')
            .is_some_and(|(_, suffix)| suffix.eq_ignore_ascii_case(ext))
    }
}

/// Capability token configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Seconds a token stays redeemable after issue (default: 30).
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,
    /// Seconds between sweeps of expired tokens (default: 10).
    #[serde(default = "default_token_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Per-token secret length in bytes (default: 8).
    #[serde(default = "default_secret_len")]
    pub secret_len: usize,
    /// Random bytes behind each token id (default: 32, minimum 16).
    #[serde(default = "default_id_bytes")]
    pub id_bytes: usize,
}

fn default_token_ttl_secs() -> u64 {
    30
}

fn default_token_sweep_interval_secs() -> u64 {
    10
}

fn default_secret_len() -> usize {
    8
}

fn default_id_bytes() -> usize {
    32
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_token_ttl_secs(),
            sweep_interval_secs: default_token_sweep_interval_secs(),
            secret_len: default_secret_len(),
            id_bytes: default_id_bytes(),
        }
    }
}

impl TokenConfig {
    /// Token time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Interval between expiry sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate token configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.ttl_secs == 0 {
            return Err("tokens.ttl_secs cannot be 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("tokens.sweep_interval_secs cannot be 0 \
                 (the sweep timer would panic)"
                .to_string());
        }
        if self.secret_len == 0 || self.secret_len > crate::token::MAX_SECRET_LEN {
            return Err(format!(
                "tokens.secret_len must be between 1 and {}, got {}",
                crate::token::MAX_SECRET_LEN,
                self.secret_len
            ));
        }
        if self.id_bytes < crate::token::MIN_TOKEN_ID_BYTES
            || self.id_bytes > crate::token::MAX_TOKEN_ID_BYTES
        {
            return Err(format!(
                "tokens.id_bytes must be between {} and {}, got {}",
                crate::token::MIN_TOKEN_ID_BYTES,
                crate::token::MAX_TOKEN_ID_BYTES,
                self.id_bytes
            ));
        }
        Ok(())
    }
}

/// First-page derivative cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DerivativeConfig {
    /// Seconds a cached derivative is reused (default: 1 hour).
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
    /// Seconds between sweeps of stale derivatives (default: 10 minutes).
    #[serde(default = "default_derivative_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_freshness_secs() -> u64 {
    3600
}

fn default_derivative_sweep_interval_secs() -> u64 {
    600
}

impl Default for DerivativeConfig {
    fn default() -> Self {
        Self {
            freshness_secs: default_freshness_secs(),
            sweep_interval_secs: default_derivative_sweep_interval_secs(),
        }
    }
}

impl DerivativeConfig {
    /// Freshness window for cached derivatives.
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }

    /// Interval between derivative sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate derivative cache configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.freshness_secs == 0 {
            return Err("derivatives.freshness_secs cannot be 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("derivatives.sweep_interval_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// How the host session layer hands the subject to folio.
///
/// The host authenticates the user and sets these headers on the proxied
/// request. They must be stripped from client traffic by the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Header carrying the numeric subject id (absent = anonymous).
    #[serde(default = "default_subject_header")]
    pub subject_header: String,
    /// Header carrying comma-separated role names.
    #[serde(default = "default_roles_header")]
    pub roles_header: String,
    /// Role allowed to fetch protected uploads directly.
    #[serde(default = "default_elevated_role")]
    pub elevated_role: String,
}

fn default_subject_header() -> String {
    "x-folio-subject".to_string()
}

fn default_roles_header() -> String {
    "x-folio-roles".to_string()
}

fn default_elevated_role() -> String {
    "admin".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            subject_header: default_subject_header(),
            roles_header: default_roles_header(),
            elevated_role: default_elevated_role(),
        }
    }
}

impl SessionConfig {
    /// Validate session header configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("session.subject_header", &self.subject_header),
            ("session.roles_header", &self.roles_header),
        ] {
            let valid = !value.is_empty()
                && value
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
            if !valid {
                return Err(format!("{field} is not a valid header name: {value:?}"));
            }
        }
        if self.elevated_role.trim().is_empty() {
            return Err("session.elevated_role cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Full-document entitlement rules.
///
/// A subject not matched by any rule receives first-page previews only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntitlementConfig {
    /// Grant full documents to everyone, including anonymous subjects.
    #[serde(default)]
    pub default_entitled: bool,
    /// Subject ids granted full documents.
    #[serde(default)]
    pub entitled_subjects: Vec<u64>,
    /// Roles granted full documents.
    #[serde(default)]
    pub entitled_roles: Vec<String>,
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Uploaded files configuration.
    #[serde(default)]
    pub uploads: UploadsConfig,
    /// Capability token configuration.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Derivative cache configuration.
    #[serde(default)]
    pub derivatives: DerivativeConfig,
    /// Host session integration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Entitlement rules.
    #[serde(default)]
    pub entitlements: EntitlementConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Points uploads at `root` and keeps every other
    /// default.
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        Self {
            uploads: UploadsConfig {
                root: root.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate every section, returning the first error.
    pub fn validate(&self) -> crate::Result<()> {
        self.tokens
            .validate()
            .and_then(|_| self.derivatives.validate())
            .and_then(|_| self.session.validate())
            .map_err(crate::Error::Config)
    }
}
