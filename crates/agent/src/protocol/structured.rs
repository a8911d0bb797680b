use cognitor_config::ProtocolKind;
use cognitor_core::value::display_value;
use cognitor_core::{ActionType, Decision, ParseError, PlannerReply};
use serde_json::Value;
use std::collections::HashSet;

use super::{capability_listing, extract_json, preferences_json, PlannerProtocol, PromptContext};

/// One JSON plan per iteration: an ordered `action_plan`, a confidence and
/// a `should_continue` flag.
pub struct StructuredProtocol;

const RULES: &str = r#"Output JSON with this structure:
{
    "action_plan": [
        {
            "step_number": 1,
            "action_type": "tool_call|response|query_memory",
            "description": "what this step does",
            "tool_name": "tool name or null",
            "parameters": {"input": {...}},
            "reasoning": "why this step is needed"
        }
    ],
    "reasoning": "overall plan reasoning",
    "expected_outcome": "what should happen",
    "confidence": 0.0-1.0,
    "should_continue": false
}

Rules:
1. Wrap tool parameters in an "input" object: {"input": {"param": value}}
2. Write "RESULT_FROM_STEP_N" wherever a value comes from step N
3. End with a "response" step whose parameters hold the answer, e.g. {"answer": "RESULT_FROM_STEP_2"}
4. Set should_continue=false when the plan produces the final answer

Respond with ONLY the JSON object."#;

impl PlannerProtocol for StructuredProtocol {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Structured
    }

    fn wants_perception(&self) -> bool {
        true
    }

    fn build_prompt(&self, ctx: &PromptContext<'_>) -> String {
        let perception = ctx
            .perception
            .and_then(|p| serde_json::to_string(p).ok())
            .unwrap_or_else(|| "none".into());
        let memory = if ctx.facts.is_empty() {
            "none".to_string()
        } else {
            ctx.facts
                .iter()
                .map(|f| format!("- {}", f.content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut prompt = format!(
            "You are the planning layer of a math task agent. Build an action plan from the available tools.\n\n\
             User preferences: {}\n\
             Perception: {}\n\
             Memory:\n{}\n\
             Available tools:\n{}\n\n",
            preferences_json(ctx.preferences),
            perception,
            memory,
            capability_listing(ctx.capabilities),
        );

        if !ctx.state.action_results.is_empty() {
            prompt.push_str("Results so far:\n");
            for r in &ctx.state.action_results {
                let outcome = match (&r.result, &r.error) {
                    (Some(v), _) if r.success => display_value(v),
                    (_, Some(e)) => format!("failed: {e}"),
                    _ => "no result".into(),
                };
                let name = r.tool_name.as_deref().unwrap_or("-");
                prompt.push_str(&format!("- step {} {}: {}\n", r.step_number, name, outcome));
            }
            prompt.push('\n');
        }

        prompt.push_str(RULES);
        prompt.push_str(&format!("\n\nUser query: {}", ctx.query));
        prompt
    }

    fn parse_reply(&self, reply: &str) -> Result<PlannerReply, ParseError> {
        let value = extract_json(reply)?;
        let Value::Object(ref map) = value else {
            return Err(ParseError::InvalidPlan("plan must be a JSON object".into()));
        };
        for field in ["action_plan", "should_continue"] {
            if !map.contains_key(field) {
                return Err(ParseError::MissingField(field.into()));
            }
        }
        let mut decision: Decision =
            serde_json::from_value(value).map_err(|e| ParseError::InvalidPlan(e.to_string()))?;
        validate(&decision)?;
        decision.action_plan.sort_by_key(|s| s.step_number);
        Ok(PlannerReply::Plan(decision))
    }
}

fn validate(decision: &Decision) -> Result<(), ParseError> {
    let mut seen = HashSet::new();
    for step in &decision.action_plan {
        if step.step_number == 0 {
            return Err(ParseError::InvalidPlan("step numbers start at 1".into()));
        }
        if !seen.insert(step.step_number) {
            return Err(ParseError::InvalidPlan(format!(
                "step number {} appears twice",
                step.step_number
            )));
        }
        let named = step.tool_name.as_deref().is_some_and(|n| !n.trim().is_empty());
        if step.action_type == ActionType::ToolCall && !named {
            return Err(ParseError::InvalidPlan(format!(
                "tool_call step {} has no tool_name",
                step.step_number
            )));
        }
    }
    Ok(())
}
