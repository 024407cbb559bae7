//! Configuration for the chunking and retrieval core.

use serde::{Deserialize, Serialize};

use crate::types::BoundaryPolicy;
use crate::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_TOKENS, DEFAULT_SNIPPET_CHARS};

/// Settings consulted by chunking, policy arbitration, and retrieval.
///
/// Constructed once by the surrounding service and shared by reference;
/// everything here is read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerSettings {
    /// Default boundary policy name when no override resolves
    pub default_policy: String,

    /// Whether the agentic policy detector may be consulted
    pub detection_enabled: bool,

    /// Target tokens per chunk
    pub target_tokens: usize,

    /// Maximum overlap tokens between neighboring chunks
    pub overlap_tokens: usize,

    /// Embedding model name passed to the embedding client
    pub embedding_model: String,

    /// Expected embedding vector dimension
    pub embedding_dim: usize,

    /// Vector collection searched at query time
    pub collection: String,

    /// Maximum characters per retrieval snippet
    pub snippet_chars: usize,
}

impl Default for ChunkerSettings {
    fn default() -> Self {
        Self {
            default_policy: BoundaryPolicy::DEFAULT.as_str().to_string(),
            detection_enabled: false,
            target_tokens: DEFAULT_CHUNK_TOKENS,
            overlap_tokens: DEFAULT_CHUNK_OVERLAP,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dim: 1536,
            collection: "notes".to_string(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

impl ChunkerSettings {
    /// Load settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_policy: std::env::var("CHUNK_POLICY_DEFAULT")
                .unwrap_or(defaults.default_policy),
            detection_enabled: std::env::var("CHUNK_POLICY_DETECTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.detection_enabled),
            target_tokens: std::env::var("CHUNK_TARGET_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.target_tokens),
            overlap_tokens: std::env::var("CHUNK_OVERLAP_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.overlap_tokens),
            embedding_model: std::env::var("RAG_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            embedding_dim: std::env::var("RAG_EMBEDDING_DIM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.embedding_dim),
            collection: std::env::var("RAG_COLLECTION").unwrap_or(defaults.collection),
            snippet_chars: std::env::var("RAG_SNIPPET_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.snippet_chars),
        }
    }

    /// The configured default policy, or the built-in default if the
    /// configured string does not parse.
    pub fn default_policy(&self) -> BoundaryPolicy {
        BoundaryPolicy::parse_or(&self.default_policy, BoundaryPolicy::DEFAULT)
    }
}
