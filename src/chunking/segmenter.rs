//! Per-policy segmentation of raw text into atomic units.
//!
//! Every policy guarantees that the emitted units, concatenated in order,
//! preserve all non-whitespace content of the input, and that no unit is
//! blank. Units are later packed into token-bounded chunks.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::BoundaryPolicy;

lazy_static! {
    static ref PARAGRAPH_SPLIT: Regex = Regex::new(r"\n\s*\n+").unwrap();
    // A sentence ends at .!? followed by whitespace and an uppercase letter,
    // digit, or opening quote/bracket.
    static ref SENTENCE_BOUNDARY: Regex = Regex::new(r#"[.!?]\s+[A-Z0-9("'\[]"#).unwrap();
    static ref FENCE_BLOCK: Regex = Regex::new(r"(?ms)^```.*?^```|^~~~.*?^~~~").unwrap();
    static ref HEADING_LINE: Regex = Regex::new(r"^#{1,6}\s").unwrap();
    static ref LIST_LINE: Regex = Regex::new(r"^(?:[-*+]\s|\d+\.\s)").unwrap();
}

/// Split `text` into ordered atomic units under the given boundary policy.
pub fn segment(text: &str, policy: BoundaryPolicy) -> Vec<String> {
    match policy {
        BoundaryPolicy::ParagraphSentence => split_paragraph_sentence(text),
        BoundaryPolicy::SentenceFirst => split_sentences(text),
        BoundaryPolicy::CodeBlocks => split_code_blocks(text),
        BoundaryPolicy::HeadingsLists => split_headings_lists(text),
        BoundaryPolicy::MinimalWords => split_paragraphs(text),
    }
}

/// Coarse paragraph units on blank-line boundaries, no sentence splitting.
fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Paragraphs first, sentences within each paragraph.
fn split_paragraph_sentence(text: &str) -> Vec<String> {
    let paragraphs = split_paragraphs(text);
    if paragraphs.is_empty() {
        return split_sentences(text);
    }
    let mut units = Vec::new();
    for para in paragraphs {
        let sentences = split_sentences(&para);
        if sentences.is_empty() {
            units.push(para);
        } else {
            units.extend(sentences);
        }
    }
    units
}

/// Sentence splitting only.
///
/// The boundary regex matches one character into the next sentence, so the
/// cut point is placed just after the terminating punctuation.
fn split_sentences(text: &str) -> Vec<String> {
    let stripped = text.trim();
    if stripped.is_empty() {
        return Vec::new();
    }
    let mut cuts = vec![0];
    for m in SENTENCE_BOUNDARY.find_iter(stripped) {
        // The punctuation mark is a single byte; cut right after it.
        cuts.push(m.start() + 1);
    }
    cuts.push(stripped.len());

    let mut parts: Vec<String> = cuts
        .windows(2)
        .map(|w| stripped[w[0]..w[1]].trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if parts.is_empty() {
        parts.push(stripped.to_string());
    }
    parts
}

/// Fenced code blocks become atomic units; prose between fences is split
/// with the paragraph+sentence strategy.
fn split_code_blocks(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut units = Vec::new();
    let mut last = 0;
    for m in FENCE_BLOCK.find_iter(text) {
        let prefix = &text[last..m.start()];
        if !prefix.trim().is_empty() {
            units.extend(split_paragraph_sentence(prefix));
        }
        let block = m.as_str().trim();
        if !block.is_empty() {
            units.push(block.to_string());
        }
        last = m.end();
    }
    let suffix = &text[last..];
    if !suffix.trim().is_empty() {
        units.extend(split_paragraph_sentence(suffix));
    }
    units
}

/// Walk lines, bucketing content under headings. A heading line flushes the
/// open bucket and starts a new one; list items and plain lines append to
/// the current bucket (opening an implicit bucket if none is open yet).
fn split_headings_lists(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut bucket: Vec<&str> = Vec::new();

    let mut flush = |bucket: &mut Vec<&str>, units: &mut Vec<String>| {
        if !bucket.is_empty() {
            let joined = bucket.join("\n").trim().to_string();
            if !joined.is_empty() {
                units.push(joined);
            }
            bucket.clear();
        }
    };

    for line in text.lines() {
        let stripped = line.trim_end();
        if HEADING_LINE.is_match(stripped) {
            flush(&mut bucket, &mut units);
            bucket.push(stripped);
        } else {
            // List items and plain lines alike stay with the open bucket.
            bucket.push(stripped);
        }
    }
    flush(&mut bucket, &mut units);
    units
}

/// True when any line of `text` starts with a markdown heading marker.
pub(crate) fn has_heading_line(text: &str) -> bool {
    text.lines().any(|l| HEADING_LINE.is_match(l.trim_start()))
}

/// True when any line of `text` starts with a list marker.
pub(crate) fn has_list_line(text: &str) -> bool {
    text.lines().any(|l| LIST_LINE.is_match(l.trim_start()))
}
