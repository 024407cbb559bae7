//! Text chunking pipeline: segment, pack, stitch.

mod overlap;
mod packer;
mod segmenter;

pub use overlap::apply_overlap;
pub use packer::{pack, window_split};
pub use segmenter::segment;
pub(crate) use segmenter::{has_heading_line, has_list_line};

use tracing::debug;

use crate::tokens::TokenCounter;
use crate::types::{BoundaryPolicy, Chunk, ChunkerSettings};
use crate::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_TOKENS};

/// Per-call chunking options.
#[derive(Debug, Clone)]
pub struct ChunkOptions {
    /// Boundary policy; the default policy applies when absent
    pub policy: Option<BoundaryPolicy>,

    /// Target tokens per chunk
    pub target_tokens: usize,

    /// Maximum overlap tokens between neighboring chunks
    pub overlap_tokens: usize,

    /// Policy used when none is requested
    pub default_policy: BoundaryPolicy,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            policy: None,
            target_tokens: DEFAULT_CHUNK_TOKENS,
            overlap_tokens: DEFAULT_CHUNK_OVERLAP,
            default_policy: BoundaryPolicy::DEFAULT,
        }
    }
}

impl ChunkOptions {
    /// Derive options from service settings.
    pub fn from_settings(settings: &ChunkerSettings) -> Self {
        Self {
            policy: None,
            target_tokens: settings.target_tokens,
            overlap_tokens: settings.overlap_tokens,
            default_policy: settings.default_policy(),
        }
    }

    /// Set an explicit boundary policy.
    pub fn with_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set the token budget per chunk.
    pub fn with_target_tokens(mut self, target: usize) -> Self {
        self.target_tokens = target;
        self
    }

    /// Set the overlap budget between chunks.
    pub fn with_overlap_tokens(mut self, overlap: usize) -> Self {
        self.overlap_tokens = overlap;
        self
    }
}

/// Chunk `text` according to the resolved boundary policy.
///
/// Empty or whitespace-only input yields an empty list. For any other input
/// the result is never empty: if packing produces nothing, the whole trimmed
/// text becomes one chunk.
pub fn chunk_text(text: &str, counter: &TokenCounter, options: &ChunkOptions) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let policy = options.policy.unwrap_or(options.default_policy);
    let target = options.target_tokens.max(1);

    let units = segment(text, policy);
    let mut raw_chunks = pack(&units, counter, target);
    if raw_chunks.is_empty() {
        raw_chunks.push(text.trim().to_string());
    }
    let stitched = apply_overlap(raw_chunks, counter, options.overlap_tokens);

    let total = stitched.len();
    debug!(%policy, total, target, "chunked text");
    stitched
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            text,
            index,
            total,
            policy,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counter() -> TokenCounter {
        TokenCounter::new()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", &counter(), &ChunkOptions::default()).is_empty());
        assert!(chunk_text("   \n\t ", &counter(), &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn indices_cover_the_total_exactly_once() {
        let text = vec!["the quick brown fox jumps."; 200].join(" ");
        let options = ChunkOptions::default()
            .with_target_tokens(120)
            .with_overlap_tokens(0);
        let chunks = chunk_text(&text, &counter(), &options);
        assert!(!chunks.is_empty());
        let total = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total, total);
        }
    }

    #[test]
    fn no_chunk_is_blank() {
        let text = "A tiny note.";
        let chunks = chunk_text(text, &counter(), &ChunkOptions::default());
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].text.trim().is_empty());
    }

    #[test]
    fn all_words_survive_chunking() {
        let text = "Alpha beta gamma. Delta epsilon zeta.\n\nEta theta iota. Kappa lambda mu.";
        let chunks = chunk_text(
            text,
            &counter(),
            &ChunkOptions::default().with_overlap_tokens(0),
        );
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
        for word in text.split_whitespace() {
            let bare = word.trim_matches('.');
            assert!(joined.contains(bare), "missing {bare}");
        }
    }

    #[test]
    fn overlap_prefix_respects_budget() {
        let body = vec!["the"; 300].join(" ");
        let text = format!("{body}\n\n{body}");
        let c = counter();
        let with_overlap = chunk_text(
            &text,
            &c,
            &ChunkOptions::default()
                .with_target_tokens(300)
                .with_overlap_tokens(25),
        );
        let without = chunk_text(
            &text,
            &c,
            &ChunkOptions::default()
                .with_target_tokens(300)
                .with_overlap_tokens(0),
        );
        assert!(with_overlap.len() >= 2);
        assert_eq!(with_overlap.len(), without.len());
        for (w, plain) in with_overlap.iter().zip(&without).skip(1) {
            assert!(w.text.ends_with(&plain.text));
            let prefix_len = w.text.len() - plain.text.len();
            let prefix = &w.text[..prefix_len];
            assert!(c.count(prefix.trim()) <= 25, "prefix too large: {prefix:?}");
        }
    }

    #[test]
    fn requested_policy_is_recorded() {
        let chunks = chunk_text(
            "Some prose here.",
            &counter(),
            &ChunkOptions::default().with_policy(BoundaryPolicy::SentenceFirst),
        );
        assert_eq!(chunks[0].policy, BoundaryPolicy::SentenceFirst);
    }

    #[test]
    fn code_policy_keeps_fences_within_one_chunk() {
        let text = "Before.\n```\nlet x = 1;\nlet y = 2;\n```\nAfter.";
        let chunks = chunk_text(
            text,
            &counter(),
            &ChunkOptions::default().with_policy(BoundaryPolicy::CodeBlocks),
        );
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("let x = 1;"));
    }
}
