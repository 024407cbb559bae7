//! Chunk, policy, and retrieval-hit type definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PolicyParseError;

/// Available chunk boundary strategies.
///
/// A boundary policy decides where a chunk may legally start and end when a
/// note is segmented for embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Split on blank-line paragraphs, then sentences within each paragraph.
    ParagraphSentence,
    /// Sentence splitting only, ignoring paragraph boundaries.
    SentenceFirst,
    /// Fenced code blocks kept atomic, prose between fences split normally.
    CodeBlocks,
    /// Markdown headings and list items bucketed into sections.
    HeadingsLists,
    /// Coarse paragraph units without sentence splitting.
    MinimalWords,
}

impl BoundaryPolicy {
    /// The built-in default used whenever nothing else resolves.
    pub const DEFAULT: BoundaryPolicy = BoundaryPolicy::ParagraphSentence;

    /// Wire name of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryPolicy::ParagraphSentence => "paragraph_sentence",
            BoundaryPolicy::SentenceFirst => "sentence_first",
            BoundaryPolicy::CodeBlocks => "code_blocks",
            BoundaryPolicy::HeadingsLists => "headings_lists",
            BoundaryPolicy::MinimalWords => "minimal_words",
        }
    }

    /// All policy names, in declaration order. Used when prompting the
    /// agentic detector.
    pub fn names() -> [&'static str; 5] {
        [
            "paragraph_sentence",
            "sentence_first",
            "code_blocks",
            "headings_lists",
            "minimal_words",
        ]
    }

    /// Parse a policy string, substituting the given default on failure.
    pub fn parse_or(raw: &str, default: BoundaryPolicy) -> BoundaryPolicy {
        raw.parse().unwrap_or(default)
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "paragraph_sentence" => Ok(BoundaryPolicy::ParagraphSentence),
            "sentence_first" => Ok(BoundaryPolicy::SentenceFirst),
            "code_blocks" => Ok(BoundaryPolicy::CodeBlocks),
            "headings_lists" => Ok(BoundaryPolicy::HeadingsLists),
            "minimal_words" => Ok(BoundaryPolicy::MinimalWords),
            other => Err(PolicyParseError(other.to_string())),
        }
    }
}

/// A bounded piece of source text prepared for embedding, carrying its
/// position among siblings.
///
/// Chunks exist only for the duration of one chunking call; nothing here is
/// persisted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text, including any overlap prefix from its predecessor
    pub text: String,

    /// Order of this chunk within its source note (0-indexed)
    pub index: usize,

    /// Total number of chunks produced from the source note
    pub total: usize,

    /// Boundary policy that governed segmentation
    pub policy: BoundaryPolicy,
}

/// Where a policy decision came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Caller supplied an explicit override.
    Request,
    /// Detection disabled; the configured default was used.
    Settings,
    /// Deterministic heuristic classifier.
    Heuristic,
    /// Agentic model answered directly.
    Detector,
    /// Agentic model delegated to an external tool.
    Tool,
}

/// The outcome of boundary-policy arbitration for one note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// The policy that will govern segmentation
    pub policy: BoundaryPolicy,

    /// Human-readable explanation; never empty
    pub reason: String,

    /// Which arbitration stage produced the decision
    pub source: DecisionSource,

    /// Name of the external tool consulted, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
}

impl PolicyDecision {
    pub fn new(policy: BoundaryPolicy, reason: impl Into<String>, source: DecisionSource) -> Self {
        Self {
            policy,
            reason: reason.into(),
            source,
            tool_used: None,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool_used = Some(tool.into());
        self
    }
}

/// One relevant source snippet returned for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Id of the note the snippet was drawn from
    pub source_id: Uuid,

    /// Bounded text excerpt from the note
    pub snippet: String,

    /// Similarity distance, lower is closer; absent on the fallback path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}
