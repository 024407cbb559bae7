//! Error taxonomy for the retrieval and policy-detection paths.
//!
//! Every variant here is recoverable where it arises: the retrieval engine
//! and the policy arbiter treat any of these as a signal to move to the next
//! fallback stage, never as something to surface to their callers.

use thiserror::Error;

/// Failures raised inside the retrieval or agentic-detection paths.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required client or configuration value is missing.
    #[error("required component not configured: {0}")]
    Configuration(&'static str),

    /// An embedding vector's length disagrees with the configured dimension.
    #[error("embedding dimension {actual} != expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An embedding, vector-store, or tool call failed or timed out.
    #[error("external service call failed: {0}")]
    ExternalService(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::ExternalService(err.to_string())
    }
}

/// An unrecognized boundary-policy string was supplied.
///
/// Always recovered by substituting the default policy.
#[derive(Debug, Clone, Error)]
#[error("unrecognized boundary policy: {0:?}")]
pub struct PolicyParseError(pub String);
