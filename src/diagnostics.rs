//! Reporting channel for swallowed sign-in failures.

use crate::error::SessionError;

/// Sink for sign-in failures the manager swallows rather than returns.
///
/// Sign-in reports "still signed out" to callers no matter what went wrong;
/// the error itself lands here. Inject a recording implementation in tests
/// to observe the failure path.
pub trait DiagnosticSink: Send + Sync {
    fn sign_in_failed(&self, error: &SessionError);
}

/// Default sink: forwards failures to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn sign_in_failed(&self, error: &SessionError) {
        tracing::warn!(error = %error, "sign-in failed");
    }
}
