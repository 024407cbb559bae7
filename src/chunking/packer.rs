//! Greedy packing of atomic units into token-bounded chunks.

use crate::tokens::TokenCounter;

/// A unit larger than `OVERSIZE_FACTOR * target` cannot be packed whole and
/// is sub-split into word windows instead.
const OVERSIZE_FACTOR: f64 = 1.2;

/// Floor on window overlap, in words.
const MIN_WINDOW_OVERLAP: usize = 20;

/// Pack `units` into chunk texts, each close to `target` tokens.
///
/// Units accumulate in a buffer that is flushed when adding the next unit
/// would overflow the budget, and immediately once the buffer reaches it.
/// Oversized units are broken into overlapping word windows first, and the
/// windows flow through the same buffering.
pub fn pack(units: &[String], counter: &TokenCounter, target: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut buffer_tokens = 0usize;

    fn flush(buffer: &mut Vec<String>, buffer_tokens: &mut usize, chunks: &mut Vec<String>) {
        if !buffer.is_empty() {
            let joined = buffer.join(" ").trim().to_string();
            if !joined.is_empty() {
                chunks.push(joined);
            }
            buffer.clear();
            *buffer_tokens = 0;
        }
    }

    let mut push = |piece: String,
                    buffer: &mut Vec<String>,
                    buffer_tokens: &mut usize,
                    chunks: &mut Vec<String>| {
        let piece_tokens = counter.count(&piece);
        if *buffer_tokens > 0 && *buffer_tokens + piece_tokens > target {
            flush(buffer, buffer_tokens, chunks);
        }
        buffer.push(piece);
        *buffer_tokens += piece_tokens;
        if *buffer_tokens >= target {
            flush(buffer, buffer_tokens, chunks);
        }
    };

    for unit in units {
        if unit.trim().is_empty() {
            continue;
        }
        let unit_tokens = counter.count(unit);
        if unit_tokens as f64 > target as f64 * OVERSIZE_FACTOR {
            for sub in window_split(unit, target) {
                push(sub, &mut buffer, &mut buffer_tokens, &mut chunks);
            }
            continue;
        }
        push(unit.clone(), &mut buffer, &mut buffer_tokens, &mut chunks);
    }

    flush(&mut buffer, &mut buffer_tokens, &mut chunks);
    chunks
}

/// Split `text` into sliding windows of `target` words.
///
/// Neighboring windows share `min(max(10% of window, 20), target)` words.
/// The start always advances by at least one word, so the split terminates
/// even when the overlap formula saturates at the window size.
pub fn window_split(text: &str, target: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || target == 0 {
        return Vec::new();
    }
    let mut pieces = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + target).min(words.len());
        pieces.push(words[start..end].join(" "));
        if end >= words.len() {
            break;
        }
        let window = end - start;
        let overlap = (window / 10).max(MIN_WINDOW_OVERLAP).min(target);
        start = end.saturating_sub(overlap).max(start + 1);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    fn words(n: usize, tag: &str) -> String {
        (0..n).map(|i| format!("{tag}{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn small_units_share_a_chunk() {
        let counter = TokenCounter::new();
        let chunks = pack(&units(&["one two three", "four five six"]), &counter, 800);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("three four"));
    }

    #[test]
    fn budget_overflow_flushes_first() {
        let counter = TokenCounter::new();
        // Two ~500-token paragraphs against an 800-token budget: the second
        // does not fit with the first, each fits alone. Single common words
        // keep the token count equal to the word count.
        let a = vec!["the"; 500].join(" ");
        let b = vec!["cat"; 500].join(" ");
        assert!(counter.count(&a) <= 800);
        let chunks = pack(&units(&[&a, &b]), &counter, 800);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("the"));
        assert!(chunks[1].contains("cat"));
    }

    #[test]
    fn oversized_unit_is_window_split() {
        let counter = TokenCounter::new();
        let big = words(3000, "w");
        let chunks = pack(&units(&[&big]), &counter, 400);
        assert!(chunks.len() > 1);
        // All words survive somewhere in the output.
        let joined = chunks.join(" ");
        assert!(joined.contains("w0 "));
        assert!(joined.contains("w2999"));
    }

    #[test]
    fn empty_units_are_skipped() {
        let counter = TokenCounter::new();
        let chunks = pack(&units(&["", "   ", "real content here"]), &counter, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "real content here");
    }

    #[test]
    fn no_units_no_chunks() {
        let counter = TokenCounter::new();
        assert!(pack(&[], &counter, 100).is_empty());
    }

    #[test]
    fn window_split_overlaps_and_terminates() {
        let text = words(250, "t");
        let pieces = window_split(&text, 100);
        assert!(pieces.len() >= 3);
        // Overlap: min(max(10, 20), 100) = 20 words shared between windows.
        let first: Vec<&str> = pieces[0].split_whitespace().collect();
        let second: Vec<&str> = pieces[1].split_whitespace().collect();
        assert_eq!(first.len(), 100);
        assert_eq!(second[0], first[first.len() - 20]);
        assert_eq!(pieces.last().unwrap().split_whitespace().last().unwrap(), "t249");
    }

    #[test]
    fn window_split_makes_progress_with_tiny_target() {
        // Overlap saturates at the window size here; the guard must still
        // advance the cursor.
        let text = words(60, "x");
        let pieces = window_split(&text, 10);
        assert!(!pieces.is_empty());
        assert!(pieces.len() < 100);
        assert!(pieces.last().unwrap().ends_with("x59"));
    }
}
