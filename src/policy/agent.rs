//! Agentic boundary-policy detection.
//!
//! A two-step decision pipeline: a policy model proposes a policy and may
//! request delegation to an external tool; when it does, the tool's verdict
//! replaces the model's. Any failure along the way surfaces as an error so
//! the arbiter can fall back to the deterministic classifier.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::clients::{PolicyModel, ToolInvoker};
use crate::error::EngineError;
use crate::types::{BoundaryPolicy, DecisionSource, PolicyDecision};

/// Tool consulted when the model delegates without naming one.
const DEFAULT_TOOL: &str = "detect_chunk_boundary_policy";

/// How much of an unparsable model response to keep in the error.
const RAW_PREVIEW_CHARS: usize = 120;

/// The JSON shape the model is instructed to answer with.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    policy: Option<String>,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    use_tool: bool,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_args: Option<Value>,
}

/// Model-plus-tool decision pipeline.
///
/// Built once by the service startup path and shared by handle; read-only
/// after construction and safe across concurrent detections.
pub struct AgenticDetector {
    model: Arc<dyn PolicyModel>,
    tool: Option<Arc<dyn ToolInvoker>>,
}

impl AgenticDetector {
    pub fn new(model: Arc<dyn PolicyModel>) -> Self {
        Self { model, tool: None }
    }

    /// Attach a tool invoker for delegated decisions.
    pub fn with_tool(mut self, tool: Arc<dyn ToolInvoker>) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Ask the pipeline for a policy decision.
    ///
    /// Errors when the model call fails, its answer is not the expected JSON
    /// shape, or a requested tool delegation cannot be completed. The caller
    /// treats any error as "try the next stage".
    pub async fn decide(
        &self,
        note: &str,
        metadata: &Value,
        default_policy: BoundaryPolicy,
    ) -> Result<PolicyDecision, EngineError> {
        let prompt = build_prompt(note, metadata);
        debug!(note_chars = note.len(), "asking policy model");
        let raw = self.model.complete(&prompt).await?;

        let verdict: ModelVerdict = serde_json::from_str(raw.trim()).map_err(|_| {
            let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
            EngineError::ExternalService(format!("unparsable model response: {preview}"))
        })?;

        if verdict.use_tool {
            return self.delegate(&verdict, note, metadata, default_policy).await;
        }

        let policy = match &verdict.policy {
            Some(raw_policy) => BoundaryPolicy::parse_or(raw_policy, default_policy),
            None => default_policy,
        };
        let reason = if verdict.reason.is_empty() {
            "agentic decision".to_string()
        } else {
            verdict.reason
        };
        info!(policy = %policy, "model decided directly");
        Ok(PolicyDecision::new(policy, reason, DecisionSource::Detector))
    }

    /// Hand the decision to the external tool named by the model.
    async fn delegate(
        &self,
        verdict: &ModelVerdict,
        note: &str,
        metadata: &Value,
        default_policy: BoundaryPolicy,
    ) -> Result<PolicyDecision, EngineError> {
        let tool = self
            .tool
            .as_ref()
            .ok_or(EngineError::Configuration("tool invoker"))?;
        let tool_name = verdict.tool_name.as_deref().unwrap_or(DEFAULT_TOOL);

        let mut args = match &verdict.tool_args {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        };
        // The tool always sees the note and metadata, even when the model
        // left them out of its arguments.
        args.entry("note").or_insert_with(|| json!(note));
        args.entry("metadata").or_insert_with(|| metadata.clone());

        info!(tool = tool_name, "delegating policy decision to tool");
        let outcome = tool.call(tool_name, Value::Object(args)).await?;

        let policy = match &outcome.policy {
            Some(raw_policy) => BoundaryPolicy::parse_or(raw_policy, default_policy),
            None => default_policy,
        };
        let reason = if outcome.reason.is_empty() {
            verdict.reason.clone()
        } else {
            outcome.reason
        };
        let reason = if reason.is_empty() {
            format!("tool {tool_name} decision")
        } else {
            reason
        };
        Ok(PolicyDecision::new(policy, reason, DecisionSource::Tool).with_tool(tool_name))
    }
}

fn build_prompt(note: &str, metadata: &Value) -> String {
    let policies = BoundaryPolicy::names().join(", ");
    format!(
        "You are a chunk policy specialist. Choose the best chunk boundary policy \
         for retrieval augmented generation.\n\
         Policies: {policies}. If you require deterministic heuristics, set \
         use_tool=true and call the tool '{DEFAULT_TOOL}'.\n\
         Respond strictly as JSON with keys: policy (string|null), reason (string), \
         use_tool (bool), tool_name (string|null), tool_args (object).\n\n\
         Note:\n{note}\n\nMetadata:\n{metadata}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::clients::ToolOutcome;

    struct ScriptedModel(String);

    #[async_trait]
    impl PolicyModel for ScriptedModel {
        async fn complete(&self, _prompt: &str) -> Result<String, EngineError> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl PolicyModel for FailingModel {
        async fn complete(&self, _prompt: &str) -> Result<String, EngineError> {
            Err(EngineError::ExternalService("model offline".into()))
        }
    }

    struct ScriptedTool {
        policy: Option<&'static str>,
    }

    #[async_trait]
    impl ToolInvoker for ScriptedTool {
        async fn call(&self, _tool: &str, args: Value) -> Result<ToolOutcome, EngineError> {
            // The detector must seed the note into tool args.
            assert!(args.get("note").is_some());
            Ok(ToolOutcome {
                policy: self.policy.map(String::from),
                reason: "tool says so".to_string(),
            })
        }
    }

    fn detector(model: impl PolicyModel + 'static) -> AgenticDetector {
        AgenticDetector::new(Arc::new(model))
    }

    #[tokio::test]
    async fn direct_model_answer_becomes_detector_decision() {
        let det = detector(ScriptedModel(
            r#"{"policy": "sentence_first", "reason": "short prose", "use_tool": false}"#.into(),
        ));
        let decision = det
            .decide("note", &json!({}), BoundaryPolicy::DEFAULT)
            .await
            .unwrap();
        assert_eq!(decision.policy, BoundaryPolicy::SentenceFirst);
        assert_eq!(decision.source, DecisionSource::Detector);
        assert_eq!(decision.reason, "short prose");
        assert!(decision.tool_used.is_none());
    }

    #[tokio::test]
    async fn unknown_policy_string_falls_back_to_default() {
        let det = detector(ScriptedModel(
            r#"{"policy": "galaxy_brain", "reason": "?", "use_tool": false}"#.into(),
        ));
        let decision = det
            .decide("note", &json!({}), BoundaryPolicy::MinimalWords)
            .await
            .unwrap();
        assert_eq!(decision.policy, BoundaryPolicy::MinimalWords);
    }

    #[tokio::test]
    async fn unparsable_answer_is_an_error_with_preview() {
        let det = detector(ScriptedModel("definitely not json".into()));
        let err = det
            .decide("note", &json!({}), BoundaryPolicy::DEFAULT)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("definitely not json"));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let det = detector(FailingModel);
        assert!(det
            .decide("note", &json!({}), BoundaryPolicy::DEFAULT)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn tool_delegation_uses_the_tool_verdict() {
        let det = detector(ScriptedModel(
            r#"{"policy": "sentence_first", "reason": "unsure", "use_tool": true}"#.into(),
        ))
        .with_tool(Arc::new(ScriptedTool {
            policy: Some("headings_lists"),
        }));
        let decision = det
            .decide("- a list", &json!({"kind": "note"}), BoundaryPolicy::DEFAULT)
            .await
            .unwrap();
        assert_eq!(decision.policy, BoundaryPolicy::HeadingsLists);
        assert_eq!(decision.source, DecisionSource::Tool);
        assert_eq!(decision.tool_used.as_deref(), Some(DEFAULT_TOOL));
        assert_eq!(decision.reason, "tool says so");
    }

    #[tokio::test]
    async fn delegation_without_invoker_is_a_configuration_error() {
        let det = detector(ScriptedModel(r#"{"use_tool": true}"#.into()));
        let err = det
            .decide("note", &json!({}), BoundaryPolicy::DEFAULT)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
