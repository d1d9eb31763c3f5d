//! Subjects: the identity a request is made on behalf of.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Numeric subject identifier supplied by the host session layer.
///
/// `0` is reserved for anonymous requests.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(u64);

impl SubjectId {
    /// The anonymous sentinel.
    pub const ANONYMOUS: Self = Self(0);

    /// Wrap a raw subject id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Parse from the decimal form used in session headers.
    pub fn parse(s: &str) -> crate::Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| crate::Error::InvalidSubject(format!("{s:?}: {e}")))
    }

    /// Raw numeric value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Whether this is the anonymous sentinel.
    pub const fn is_anonymous(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for SubjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A subject together with the roles the host granted it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subject {
    /// Subject identifier (anonymous when absent).
    pub id: SubjectId,
    /// Role names, normalized to lowercase.
    pub roles: BTreeSet<String>,
}

impl Subject {
    /// The anonymous subject with no roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Create a subject from an id and role names.
    ///
    /// Empty role names are dropped and the rest are trimmed and lowercased.
    pub fn new<I, S>(id: SubjectId, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = roles
            .into_iter()
            .map(|r| r.as_ref().trim().to_ascii_lowercase())
            .filter(|r| !r.is_empty())
            .collect();
        Self { id, roles }
    }

    /// Check whether the subject holds a role (case-insensitive).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(&role.trim().to_ascii_lowercase())
    }
}
