//! Contracts for external collaborators.
//!
//! The embedding service, vector store, tool invoker, note store, and policy
//! model are consumed through these traits; their wire protocols live with
//! the implementations, not with this core. Every method makes a single
//! attempt — retries belong to the callers' clients.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::EngineError;

/// A note as persisted by the surrounding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredNote {
    pub id: Uuid,
    pub content: String,
    /// Creation time; natural order for fallback padding
    pub created_at: DateTime<Utc>,
}

/// Generates embeddings for a batch of texts.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed `texts` with `model`. One vector per input text.
    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>, EngineError>;
}

/// One candidate from a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    /// Store-internal row id
    pub id: i64,

    /// Similarity distance, lower is closer
    pub distance: f32,

    /// Stored payload fields alongside the vector
    pub fields: serde_json::Map<String, Value>,
}

impl VectorHit {
    /// The source note id carried in the hit's payload, if present and valid.
    pub fn source_id(&self) -> Option<Uuid> {
        self.fields
            .get("note_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

/// Runs nearest-neighbor searches against a vector collection.
#[async_trait]
pub trait VectorSearchClient: Send + Sync {
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        collection: &str,
    ) -> Result<Vec<VectorHit>, EngineError>;
}

/// Result of delegating a policy decision to an external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Policy name chosen by the tool, if it chose one
    pub policy: Option<String>,

    /// The tool's explanation
    pub reason: String,
}

/// Invokes a named external tool with JSON arguments.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn call(&self, tool: &str, args: Value) -> Result<ToolOutcome, EngineError>;
}

/// Read access to stored notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Fetch one note by id; `None` when it does not exist.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredNote>, EngineError>;

    /// All notes in creation order. Used by the substring fallback.
    async fn list_all(&self) -> Result<Vec<StoredNote>, EngineError>;
}

/// A model that answers policy-selection prompts.
#[async_trait]
pub trait PolicyModel: Send + Sync {
    /// Complete `prompt`, returning the raw model output.
    async fn complete(&self, prompt: &str) -> Result<String, EngineError>;
}
