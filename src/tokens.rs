//! Token counting with graceful degradation.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Estimates token lengths and extracts token-bounded tails.
///
/// Backed by the cl100k_base encoding (GPT-4 / text-embedding models). The
/// encoder is built lazily, at most once per counter, and a construction
/// failure simply leaves the counter in whitespace-word mode rather than
/// propagating.
pub struct TokenCounter {
    encoder: OnceLock<Option<CoreBPE>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self {
            encoder: OnceLock::new(),
        }
    }

    fn encoder(&self) -> Option<&CoreBPE> {
        self.encoder
            .get_or_init(|| match tiktoken_rs::cl100k_base() {
                Ok(bpe) => Some(bpe),
                Err(err) => {
                    debug!(error = %err, "tokenizer unavailable, degrading to word counting");
                    None
                }
            })
            .as_ref()
    }

    /// Count the tokens in `text`.
    ///
    /// Returns 0 for empty input and the whitespace-word count when no
    /// tokenizer is available.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.encoder() {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.split_whitespace().count(),
        }
    }

    /// Return the last `tokens` tokens of `text`, re-joined as text.
    ///
    /// Empty string when `tokens` is 0 or the input is empty. Without a
    /// tokenizer the last `tokens` whitespace words are joined by spaces.
    pub fn tail(&self, text: &str, tokens: usize) -> String {
        if tokens == 0 || text.is_empty() {
            return String::new();
        }
        if let Some(bpe) = self.encoder() {
            let encoded = bpe.encode_ordinary(text);
            let start = encoded.len().saturating_sub(tokens);
            let slice = encoded[start..].to_vec();
            if slice.is_empty() {
                return String::new();
            }
            if let Ok(decoded) = bpe.decode(slice) {
                return decoded;
            }
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        let start = words.len().saturating_sub(tokens);
        words[start..].join(" ")
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_counts_zero() {
        let counter = TokenCounter::new();
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn count_is_positive_for_text() {
        let counter = TokenCounter::new();
        assert!(counter.count("hello world") >= 2);
    }

    #[test]
    fn tail_of_zero_tokens_is_empty() {
        let counter = TokenCounter::new();
        assert_eq!(counter.tail("some text here", 0), "");
        assert_eq!(counter.tail("", 5), "");
    }

    #[test]
    fn tail_is_bounded_and_ends_the_text() {
        let counter = TokenCounter::new();
        let text = "alpha beta gamma delta epsilon zeta";
        let tail = counter.tail(text, 2);
        assert!(!tail.is_empty());
        assert!(counter.count(&tail) <= 2);
        assert!(text.ends_with(tail.trim_start()));
    }

    #[test]
    fn tail_larger_than_text_returns_everything() {
        let counter = TokenCounter::new();
        let tail = counter.tail("just three words", 1000);
        assert_eq!(tail, "just three words");
    }
}
