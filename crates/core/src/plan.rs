//! Plans, steps and their outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a step asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ToolCall,
    Response,
    QueryMemory,
}

/// One planned unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    /// 1-based, unique within a plan; ascending order is execution order.
    pub step_number: u32,

    pub action_type: ActionType,

    /// Present iff `action_type` is `ToolCall`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Raw arguments, possibly holding `RESULT_FROM_STEP_N` placeholders.
    #[serde(default)]
    pub parameters: Value,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub reasoning: String,
}

impl ActionStep {
    pub fn tool_call(step_number: u32, tool_name: &str, parameters: Value) -> Self {
        Self {
            step_number,
            action_type: ActionType::ToolCall,
            tool_name: Some(tool_name.to_string()),
            parameters,
            description: String::new(),
            reasoning: String::new(),
        }
    }

    pub fn response(step_number: u32, parameters: Value) -> Self {
        Self {
            step_number,
            action_type: ActionType::Response,
            tool_name: None,
            parameters,
            description: String::new(),
            reasoning: String::new(),
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub step_number: u32,
    pub action_type: ActionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts_to_remember: Vec<String>,
}

impl ActionResult {
    pub fn succeeded(step: &ActionStep, result: Value) -> Self {
        Self {
            step_number: step.step_number,
            action_type: step.action_type,
            tool_name: step.tool_name.clone(),
            success: true,
            result: Some(result),
            error: None,
            facts_to_remember: Vec::new(),
        }
    }

    pub fn failed(step: &ActionStep, error: impl Into<String>) -> Self {
        Self {
            step_number: step.step_number,
            action_type: step.action_type,
            tool_name: step.tool_name.clone(),
            success: false,
            result: None,
            error: Some(error.into()),
            facts_to_remember: Vec::new(),
        }
    }

    pub fn with_facts(mut self, facts: Vec<String>) -> Self {
        self.facts_to_remember = facts;
        self
    }
}

/// A multi-step plan from the structured protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action_plan: Vec<ActionStep>,

    #[serde(default)]
    pub reasoning: String,

    #[serde(default)]
    pub expected_outcome: String,

    #[serde(default)]
    pub confidence: f64,

    pub should_continue: bool,
}

/// What the planner made of the query before planning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    #[serde(default)]
    pub intent: String,

    #[serde(default)]
    pub entities: Vec<String>,

    #[serde(default)]
    pub thought_type: String,

    #[serde(default)]
    pub extracted_facts: Vec<String>,

    #[serde(default)]
    pub requires_tools: bool,

    #[serde(default)]
    pub confidence: f64,
}

impl Perception {
    /// Stand-in used when the planner's perception reply is unusable.
    pub fn from_query(query: &str) -> Self {
        Self {
            intent: query.trim().to_string(),
            requires_tools: true,
            ..Self::default()
        }
    }
}

/// A parsed planner reply, whichever protocol produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerReply {
    /// Structured protocol: a whole plan.
    Plan(Decision),
    /// Legacy protocol: one capability call.
    NextAction(ActionStep),
    /// Legacy protocol: the planner verifying its own work.
    SelfCheck(String),
    /// Legacy protocol: the answer, loop ends.
    FinalAnswer(String),
    /// Legacy protocol: a line matching none of the above.
    Unrecognized(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decision_deserializes_from_planner_json() {
        let raw = json!({
            "action_plan": [{
                "step_number": 1,
                "action_type": "tool_call",
                "tool_name": "add",
                "parameters": {"input": {"a": 2, "b": 3}},
                "description": "add"
            }],
            "confidence": 0.9,
            "should_continue": false
        });
        let decision: Decision = serde_json::from_value(raw).unwrap();
        assert_eq!(decision.action_plan[0].action_type, ActionType::ToolCall);
        assert_eq!(decision.action_plan[0].tool_name.as_deref(), Some("add"));
        assert!(!decision.should_continue);
    }

    #[test]
    fn decision_requires_should_continue() {
        let raw = json!({"action_plan": []});
        assert!(serde_json::from_value::<Decision>(raw).is_err());
    }

    #[test]
    fn failed_result_carries_error() {
        let step = ActionStep::tool_call(2, "divide", json!([1, 0]));
        let result = ActionResult::failed(&step, "division by zero");
        assert!(!result.success);
        assert_eq!(result.step_number, 2);
        assert_eq!(result.error.as_deref(), Some("division by zero"));
        assert!(result.result.is_none());
    }

    #[test]
    fn perception_fallback_keeps_query() {
        let p = Perception::from_query("  what is 2+3? ");
        assert_eq!(p.intent, "what is 2+3?");
        assert!(p.requires_tools);
    }
}
