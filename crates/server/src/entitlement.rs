//! Full-document entitlement lookup.

use folio_core::Subject;
use folio_core::config::EntitlementConfig;
use std::collections::HashSet;

/// Decides whether a subject may receive a complete document.
///
/// Subjects that are not entitled receive first-page previews.
pub trait EntitlementResolver: Send + Sync {
    fn is_entitled(&self, subject: &Subject, filename: &str) -> bool;
}

/// Entitlement rules read from configuration.
#[derive(Clone, Debug, Default)]
pub struct ConfigEntitlements {
    default_entitled: bool,
    subjects: HashSet<u64>,
    roles: HashSet<String>,
}

impl ConfigEntitlements {
    pub fn new(config: &EntitlementConfig) -> Self {
        Self {
            default_entitled: config.default_entitled,
            subjects: config.entitled_subjects.iter().copied().collect(),
            roles: config
                .entitled_roles
                .iter()
                .map(|r| r.trim().to_ascii_lowercase())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }
}

impl EntitlementResolver for ConfigEntitlements {
    fn is_entitled(&self, subject: &Subject, _filename: &str) -> bool {
        if self.default_entitled {
            return true;
        }
        if subject.id.is_anonymous() {
            return false;
        }
        self.subjects.contains(&subject.id.get())
            || subject.roles.iter().any(|r| self.roles.contains(r))
    }
}
