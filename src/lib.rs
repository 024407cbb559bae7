//! Notechunk Core Library
//!
//! The text-chunking and retrieval core for a note-taking RAG pipeline.
//! Turns arbitrary user notes into token-bounded, overlap-stitched chunks
//! ready for embedding, arbitrates which boundary policy governs a piece of
//! text, and resolves semantic queries against stored notes with a
//! deterministic substring fallback.

pub mod chunking;
pub mod clients;
pub mod error;
pub mod policy;
pub mod retrieval;
pub mod tokens;
pub mod types;

pub use chunking::{chunk_text, ChunkOptions};
pub use policy::PolicyArbiter;
pub use retrieval::RetrievalEngine;
pub use tokens::TokenCounter;
pub use types::{
    BoundaryPolicy, Chunk, ChunkerSettings, DecisionSource, PolicyDecision, RetrievalHit,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chunking::{chunk_text, ChunkOptions};
    pub use crate::clients::*;
    pub use crate::policy::PolicyArbiter;
    pub use crate::retrieval::RetrievalEngine;
    pub use crate::tokens::TokenCounter;
    pub use crate::types::*;
}

/// Default target chunk size in tokens
pub const DEFAULT_CHUNK_TOKENS: usize = 800;

/// Default maximum overlap between neighboring chunks, in tokens
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Default bound on retrieval snippet length, in characters
pub const DEFAULT_SNIPPET_CHARS: usize = 240;

/// Notes with fewer whitespace-delimited words than this are treated as
/// short notes by the heuristic policy classifier
pub const HEURISTIC_SHORT_NOTE_WORDS: usize = 120;
