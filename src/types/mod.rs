//! Core types for the chunking and retrieval core.

mod chunk;
mod config;

pub use chunk::{BoundaryPolicy, Chunk, DecisionSource, PolicyDecision, RetrievalHit};
pub use config::ChunkerSettings;
