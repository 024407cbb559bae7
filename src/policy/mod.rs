//! Boundary-policy arbitration.
//!
//! A precedence pipeline over four stages: request override, settings,
//! agentic detection, deterministic heuristics. Each stage either decides or
//! passes to the next; the fold never raises to its caller, and every
//! decision carries a populated reason.

mod agent;
mod heuristic;

pub use agent::AgenticDetector;
pub use heuristic::classify;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::info;

use crate::types::{BoundaryPolicy, ChunkerSettings, DecisionSource, PolicyDecision};

/// The arbitration stages, in precedence order. Heuristics are the terminal
/// stage and run outside the fold because they cannot pass.
enum Stage {
    Request,
    Settings,
    Agentic,
}

/// Outcome of one arbitration stage.
enum StageOutcome {
    /// This stage decided; arbitration stops here.
    Decided(PolicyDecision),
    /// This stage passes, optionally annotating why it failed.
    TryNext(Option<String>),
}

/// Arbitrates which boundary policy governs segmentation of one note.
///
/// Holds the long-lived settings handle and the optionally-built agentic
/// pipeline; both are read-only after construction and shared across
/// concurrent detections.
pub struct PolicyArbiter {
    settings: Arc<ChunkerSettings>,
    detector: Option<Arc<AgenticDetector>>,
}

impl PolicyArbiter {
    pub fn new(settings: Arc<ChunkerSettings>) -> Self {
        Self {
            settings,
            detector: None,
        }
    }

    /// Attach the agentic decision pipeline built by the startup path.
    pub fn with_detector(mut self, detector: Arc<AgenticDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Decide the boundary policy for `note`.
    ///
    /// Total: always returns a decision, regardless of what the agentic
    /// path does.
    pub async fn detect(
        &self,
        note: &str,
        override_policy: Option<&str>,
        metadata: Option<&Value>,
    ) -> PolicyDecision {
        let started = Instant::now();
        let default_policy = self.settings.default_policy();
        let mut failure: Option<String> = None;
        let mut decision: Option<PolicyDecision> = None;

        // Ordered fold over the stages; later stages only run while earlier
        // ones pass.
        for stage in [Stage::Request, Stage::Settings, Stage::Agentic] {
            let outcome = match stage {
                Stage::Request => self.request_stage(override_policy, default_policy),
                Stage::Settings => self.settings_stage(default_policy),
                Stage::Agentic => self.agentic_stage(note, metadata, default_policy).await,
            };
            match outcome {
                StageOutcome::Decided(d) => {
                    decision = Some(d);
                    break;
                }
                StageOutcome::TryNext(note_of_failure) => {
                    if note_of_failure.is_some() {
                        failure = note_of_failure;
                    }
                }
            }
        }

        let decision = decision.unwrap_or_else(|| {
            let mut d = heuristic::classify(note, default_policy);
            if let Some(why) = &failure {
                d.reason = format!("{} (agentic failure: {why})", d.reason);
            }
            d
        });

        info!(
            policy = %decision.policy,
            source = ?decision.source,
            reason = %decision.reason,
            tool_used = decision.tool_used.as_deref(),
            note_chars = note.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "policy decided"
        );
        decision
    }

    /// Stage 1: an explicit request override wins outright.
    fn request_stage(
        &self,
        override_policy: Option<&str>,
        default_policy: BoundaryPolicy,
    ) -> StageOutcome {
        match override_policy {
            Some(raw) => StageOutcome::Decided(PolicyDecision::new(
                BoundaryPolicy::parse_or(raw, default_policy),
                "request override",
                DecisionSource::Request,
            )),
            None => StageOutcome::TryNext(None),
        }
    }

    /// Stage 2: detection disabled means the configured default applies.
    fn settings_stage(&self, default_policy: BoundaryPolicy) -> StageOutcome {
        if self.settings.detection_enabled {
            StageOutcome::TryNext(None)
        } else {
            StageOutcome::Decided(PolicyDecision::new(
                default_policy,
                "detection disabled",
                DecisionSource::Settings,
            ))
        }
    }

    /// Stage 3: the agentic pipeline, when one was built.
    async fn agentic_stage(
        &self,
        note: &str,
        metadata: Option<&Value>,
        default_policy: BoundaryPolicy,
    ) -> StageOutcome {
        let Some(detector) = &self.detector else {
            return StageOutcome::TryNext(None);
        };
        let metadata = metadata.cloned().unwrap_or(Value::Object(Default::default()));
        match detector.decide(note, &metadata, default_policy).await {
            Ok(decision) => StageOutcome::Decided(decision),
            Err(err) => StageOutcome::TryNext(Some(err.to_string())),
        }
    }
}
