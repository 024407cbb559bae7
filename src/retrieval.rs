//! Query-time retrieval over stored notes.
//!
//! Vector similarity is the preferred path; any failure there — missing
//! clients, transport errors, dimension mismatches, empty resolutions —
//! falls through to a deterministic substring heuristic. `retrieve` never
//! errors.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::clients::{EmbeddingClient, NoteStore, VectorSearchClient};
use crate::error::EngineError;
use crate::types::{ChunkerSettings, RetrievalHit};

/// Over-fetch factor applied before per-note deduplication: chunked notes
/// produce several vectors per source id.
const OVERFETCH_FACTOR: usize = 4;

/// Characters of context kept before a substring match.
const SNIPPET_BEFORE: usize = 40;

/// Characters of context kept after a substring match, beyond the query.
const SNIPPET_AFTER: usize = 80;

/// Snippet length used when padding the fallback result set.
const FALLBACK_PAD_CHARS: usize = 120;

/// Resolves the most relevant note snippets for a query.
pub struct RetrievalEngine {
    settings: Arc<ChunkerSettings>,
    embeddings: Option<Arc<dyn EmbeddingClient>>,
    vectors: Option<Arc<dyn VectorSearchClient>>,
    notes: Arc<dyn NoteStore>,
}

impl RetrievalEngine {
    pub fn new(settings: Arc<ChunkerSettings>, notes: Arc<dyn NoteStore>) -> Self {
        Self {
            settings,
            embeddings: None,
            vectors: None,
            notes,
        }
    }

    /// Attach an embedding client for the vector path.
    pub fn with_embeddings(mut self, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Attach a vector-search client for the vector path.
    pub fn with_vector_search(mut self, vectors: Arc<dyn VectorSearchClient>) -> Self {
        self.vectors = Some(vectors);
        self
    }

    /// Retrieve up to `limit` relevant notes for `query`, deduplicated by
    /// source note.
    ///
    /// Total: vector-path failures of any kind degrade to the substring
    /// fallback, and the fallback itself returns what it finds.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Vec<RetrievalHit> {
        if limit == 0 {
            return Vec::new();
        }
        match self.vector_path(query, limit).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                debug!(query_chars = query.len(), "vector path empty, using fallback");
                self.fallback_substring(query, limit).await
            }
            Err(err) => {
                warn!(error = %err, "vector path failed, using fallback");
                self.fallback_substring(query, limit).await
            }
        }
    }

    /// Embed the query, search the collection, dedup by note, resolve
    /// snippets.
    async fn vector_path(&self, query: &str, limit: usize) -> Result<Vec<RetrievalHit>, EngineError> {
        let embeddings = self
            .embeddings
            .as_ref()
            .ok_or(EngineError::Configuration("embedding client"))?;
        let vectors = self
            .vectors
            .as_ref()
            .ok_or(EngineError::Configuration("vector search client"))?;

        let mut query_vectors = embeddings
            .embed(&[query.to_string()], &self.settings.embedding_model)
            .await?;
        let query_vector = match query_vectors.pop() {
            Some(v) => v,
            None => {
                return Err(EngineError::ExternalService(
                    "embedding client returned no vector".into(),
                ))
            }
        };
        if query_vector.len() != self.settings.embedding_dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.settings.embedding_dim,
                actual: query_vector.len(),
            });
        }

        let candidates = vectors
            .search(&query_vector, limit * OVERFETCH_FACTOR, &self.settings.collection)
            .await?;

        // Keep only the closest hit per source note.
        let mut best_by_note: HashMap<Uuid, f32> = HashMap::new();
        for hit in &candidates {
            let Some(note_id) = hit.source_id() else {
                continue;
            };
            let entry = best_by_note.entry(note_id).or_insert(hit.distance);
            if hit.distance < *entry {
                *entry = hit.distance;
            }
        }

        let mut ordered: Vec<(Uuid, f32)> = best_by_note.into_iter().collect();
        ordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        ordered.truncate(limit);

        let mut results = Vec::new();
        for (note_id, distance) in ordered {
            let Some(note) = self.notes.get_by_id(note_id).await? else {
                continue;
            };
            if note.content.is_empty() {
                continue;
            }
            let snippet: String = note
                .content
                .chars()
                .take(self.settings.snippet_chars)
                .collect::<String>()
                .trim()
                .to_string();
            results.push(RetrievalHit {
                source_id: note_id,
                snippet: if snippet.is_empty() {
                    "(empty note)".to_string()
                } else {
                    snippet
                },
                distance: Some(distance),
            });
            if results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }

    /// Deterministic case-insensitive substring retrieval.
    ///
    /// Matching documents score `1 / (1 + firstMatchIndex)`; when fewer than
    /// `limit` match, the remainder is padded with unmatched notes in their
    /// stored order.
    async fn fallback_substring(&self, query: &str, limit: usize) -> Vec<RetrievalHit> {
        let candidates = match self.notes.list_all().await {
            Ok(notes) => notes,
            Err(err) => {
                warn!(error = %err, "note store unavailable, returning nothing");
                return Vec::new();
            }
        };

        let query_lower = query.to_lowercase();
        let query_chars = query.chars().count();
        let mut scored: Vec<(f64, RetrievalHit)> = Vec::new();
        for note in &candidates {
            let Some(idx) = find_case_insensitive(&note.content, &query_lower) else {
                continue;
            };
            let score = 1.0 / (1.0 + idx as f64);
            let snippet =
                match_window(&note.content, idx, SNIPPET_BEFORE, query_chars + SNIPPET_AFTER);
            scored.push((
                score,
                RetrievalHit {
                    source_id: note.id,
                    snippet: snippet.trim().to_string(),
                    distance: None,
                },
            ));
        }
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut top: Vec<RetrievalHit> = scored.into_iter().take(limit).map(|(_, h)| h).collect();
        if top.len() < limit {
            let selected: Vec<Uuid> = top.iter().map(|h| h.source_id).collect();
            for note in &candidates {
                if top.len() >= limit {
                    break;
                }
                if selected.contains(&note.id) {
                    continue;
                }
                top.push(RetrievalHit {
                    source_id: note.id,
                    snippet: note.content.chars().take(FALLBACK_PAD_CHARS).collect(),
                    distance: None,
                });
            }
        }
        top.truncate(limit);
        top
    }
}

/// Byte index of the first case-insensitive occurrence of `query_lower`
/// (already lowercased) within `content`.
fn find_case_insensitive(content: &str, query_lower: &str) -> Option<usize> {
    if query_lower.is_empty() {
        return Some(0);
    }
    // Case folding can move interior byte offsets even when the lowered
    // string keeps the original total length, so indices into the lowered
    // string are never trusted; only positions taken from `content` itself
    // are returned.
    content
        .char_indices()
        .find(|(i, _)| content[*i..].to_lowercase().starts_with(query_lower))
        .map(|(i, _)| i)
}

/// A snippet of `content` spanning `before` characters ahead of the match at
/// byte offset `match_start` and `after` characters from the match onward.
fn match_window(content: &str, match_start: usize, before: usize, after: usize) -> &str {
    let start = content[..match_start]
        .char_indices()
        .rev()
        .nth(before.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = content[match_start..]
        .char_indices()
        .nth(after)
        .map(|(i, _)| match_start + i)
        .unwrap_or(content.len());
    &content[start..end]
}
