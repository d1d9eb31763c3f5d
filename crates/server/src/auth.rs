//! Request identity middleware.
//!
//! The host application authenticates users; folio only reads the subject
//! and role headers the host sets on proxied requests.

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use folio_core::config::SessionConfig;
use folio_core::{Subject, SubjectId};
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

const TRACE_ID_HEADER: &str = "x-trace-id";

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// The value is truncated to MAX_TRACE_ID_LEN characters and non-printable characters removed.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(headers: &HeaderMap) -> TraceId {
    headers
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Build the request subject from host session headers.
///
/// A missing or unparsable subject header means anonymous.
pub fn subject_from_headers(headers: &HeaderMap, session: &SessionConfig) -> Subject {
    let id = match headers
        .get(session.subject_header.as_str())
        .map(|v| v.to_str())
    {
        None => SubjectId::ANONYMOUS,
        Some(Ok(raw)) => SubjectId::parse(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unparsable subject header, treating as anonymous");
            SubjectId::ANONYMOUS
        }),
        Some(Err(_)) => {
            tracing::debug!("Non-ASCII subject header, treating as anonymous");
            SubjectId::ANONYMOUS
        }
    };

    let roles = headers
        .get_all(session.roles_header.as_str())
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::to_string)
        .collect::<Vec<_>>();

    Subject::new(id, roles)
}

/// Session middleware: assigns a trace id, resolves the subject, and runs
/// the request inside a span carrying both. The trace id is echoed back in
/// the `x-trace-id` response header.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let subject = subject_from_headers(req.headers(), &state.config.session);
    let subject_id = subject.id;

    req.extensions_mut().insert(subject);

    let mut response = next
        .run(req)
        .instrument(tracing::info_span!(
            "request",
            trace_id = %trace_id,
            subject = %subject_id
        ))
        .await;

    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// Get the subject from request extensions, anonymous if unset.
pub fn get_subject(req: &Request) -> Subject {
    req.extensions()
        .get::<Subject>()
        .cloned()
        .unwrap_or_else(Subject::anonymous)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn test_trace_id_from_client_sanitizes() {
        let id = TraceId::from_client("abc\n\tdef");
        assert_eq!(id.as_str(), "abcdef");

        let long = "x".repeat(500);
        assert_eq!(TraceId::from_client(&long).as_str().len(), MAX_TRACE_ID_LEN);

        let id = TraceId::from_client("\n\n");
        assert!(!id.as_str().is_empty());
    }

    #[test]
    fn test_trace_id_taken_from_request() {
        let id = extract_or_generate_trace_id(&headers(&[("x-trace-id", "req-123")]));
        assert_eq!(id.as_str(), "req-123");

        let generated = extract_or_generate_trace_id(&HeaderMap::new());
        assert!(Uuid::parse_str(generated.as_str()).is_ok());
    }

    #[test]
    fn test_subject_from_headers() {
        let session = SessionConfig::default();
        let subject = subject_from_headers(
            &headers(&[("x-folio-subject", "42"), ("x-folio-roles", "Admin, editor")]),
            &session,
        );
        assert_eq!(subject.id, SubjectId::new(42));
        assert!(subject.has_role("admin"));
        assert!(subject.has_role("editor"));
    }

    #[test]
    fn test_missing_subject_is_anonymous() {
        let subject = subject_from_headers(&HeaderMap::new(), &SessionConfig::default());
        assert!(subject.id.is_anonymous());
        assert!(subject.roles.is_empty());
    }

    #[test]
    fn test_garbage_subject_is_anonymous() {
        let subject = subject_from_headers(
            &headers(&[("x-folio-subject", "not-a-number")]),
            &SessionConfig::default(),
        );
        assert!(subject.id.is_anonymous());
    }

    #[test]
    fn test_repeated_role_headers_merge() {
        let subject = subject_from_headers(
            &headers(&[("x-folio-roles", "viewer"), ("x-folio-roles", "admin")]),
            &SessionConfig::default(),
        );
        assert!(subject.has_role("viewer"));
        assert!(subject.has_role("admin"));
    }
}
