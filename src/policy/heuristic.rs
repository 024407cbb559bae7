//! Deterministic boundary-policy classifier.
//!
//! The last arbitration stage: always produces a decision, never fails.

use crate::chunking::{has_heading_line, has_list_line};
use crate::types::{BoundaryPolicy, DecisionSource, PolicyDecision};
use crate::HEURISTIC_SHORT_NOTE_WORDS;

/// Classify `note` by inspecting its surface structure.
///
/// Checks run in order: fenced code markers, markdown headings, list
/// formatting, note length. Anything else gets the configured default.
pub fn classify(note: &str, default_policy: BoundaryPolicy) -> PolicyDecision {
    if note.contains("```") || note.contains("~~~") {
        return PolicyDecision::new(
            BoundaryPolicy::CodeBlocks,
            "detected fenced code blocks",
            DecisionSource::Heuristic,
        );
    }
    if has_heading_line(note) {
        return PolicyDecision::new(
            BoundaryPolicy::HeadingsLists,
            "detected markdown headings",
            DecisionSource::Heuristic,
        );
    }
    if has_list_line(note) {
        return PolicyDecision::new(
            BoundaryPolicy::HeadingsLists,
            "detected list formatting",
            DecisionSource::Heuristic,
        );
    }
    if note.split_whitespace().count() < HEURISTIC_SHORT_NOTE_WORDS {
        return PolicyDecision::new(
            BoundaryPolicy::MinimalWords,
            "short note",
            DecisionSource::Heuristic,
        );
    }
    PolicyDecision::new(default_policy, "fallback default", DecisionSource::Heuristic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_win_over_everything() {
        let note = "# Heading\n```\nprint(1)\n```";
        let decision = classify(note, BoundaryPolicy::DEFAULT);
        assert_eq!(decision.policy, BoundaryPolicy::CodeBlocks);
        assert_eq!(decision.source, DecisionSource::Heuristic);
    }

    #[test]
    fn headings_classify_as_headings_lists() {
        let decision = classify("## Notes\nSome content under it.", BoundaryPolicy::DEFAULT);
        assert_eq!(decision.policy, BoundaryPolicy::HeadingsLists);
        assert_eq!(decision.reason, "detected markdown headings");
    }

    #[test]
    fn list_markers_classify_as_headings_lists() {
        let decision = classify("- first\n- second\n- third", BoundaryPolicy::DEFAULT);
        assert_eq!(decision.policy, BoundaryPolicy::HeadingsLists);
        assert_eq!(decision.reason, "detected list formatting");
    }

    #[test]
    fn short_plain_note_is_minimal_words() {
        let decision = classify(
            "a quick ten word sentence with nothing special inside it",
            BoundaryPolicy::DEFAULT,
        );
        assert_eq!(decision.policy, BoundaryPolicy::MinimalWords);
        assert_eq!(decision.reason, "short note");
    }

    #[test]
    fn long_prose_falls_back_to_default() {
        let note = vec!["plain prose words without structure"; 40].join(" ");
        let decision = classify(&note, BoundaryPolicy::SentenceFirst);
        assert_eq!(decision.policy, BoundaryPolicy::SentenceFirst);
        assert_eq!(decision.reason, "fallback default");
    }

    #[test]
    fn reason_is_always_populated() {
        for note in ["", "```", "# h", "- l", "short", &"w ".repeat(200)] {
            let decision = classify(note, BoundaryPolicy::DEFAULT);
            assert!(!decision.reason.is_empty());
        }
    }
}
