//! Overlap stitching between neighboring chunks.

use crate::tokens::TokenCounter;

/// Floor on injected overlap, in tokens.
const MIN_OVERLAP_TOKENS: usize = 20;

/// Prepend a bounded tail of each chunk's predecessor so neighbors share
/// context.
///
/// The overlap drawn from the previous chunk is
/// `min(max(10% of its token count, 20), max_overlap)` tokens. The first
/// chunk is never modified, and the tail is always taken from the original
/// predecessor text, not its stitched form.
pub fn apply_overlap(chunks: Vec<String>, counter: &TokenCounter, max_overlap: usize) -> Vec<String> {
    if max_overlap == 0 || chunks.len() < 2 {
        return chunks;
    }
    let mut stitched = Vec::with_capacity(chunks.len());
    let mut prev: Option<&String> = None;
    for chunk in &chunks {
        match prev {
            None => stitched.push(chunk.clone()),
            Some(previous) => {
                let prev_tokens = counter.count(previous);
                let overlap = (prev_tokens / 10).max(MIN_OVERLAP_TOKENS).min(max_overlap);
                let tail = counter.tail(previous, overlap);
                if tail.is_empty() {
                    stitched.push(chunk.clone());
                } else {
                    stitched.push(format!("{} {}", tail, chunk).trim().to_string());
                }
            }
        }
        prev = Some(chunk);
    }
    stitched
}
