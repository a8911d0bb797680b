use cognitor_config::ProtocolKind;
use cognitor_core::{ActionStep, ParseError, PlannerReply};
use serde_json::{json, Value};

use super::{capability_listing, PlannerProtocol, PromptContext};

const FUNCTION_CALL: &str = "FUNCTION_CALL:";
const SELF_CHECK: &str = "SELF_CHECK:";
const FINAL_ANSWER: &str = "FINAL_ANSWER:";

/// Name of the capability the planner calls when nothing else fits.
pub const FALLBACK_CAPABILITY: &str = "fallback_reasoning";

/// One directive line per iteration, with the conversation history replayed
/// in every prompt.
pub struct LegacyProtocol;

const FORMAT: &str = r#"You must respond with EXACTLY ONE line in one of these formats (no additional text):

1. For function calls:
   FUNCTION_CALL: {"name": "<function_name>", "args": <args>, "reasoning_type": "<type>", "step": "<step description>"}
   - <args> is a JSON array or object matching the tool's parameters.
   - <reasoning_type> is one of: "Arithmetic", "Logical", "Entity Lookup", etc.
2. For self-checks:
   SELF_CHECK: Is the result reasonable? -> Yes/No
3. For fallbacks:
   FUNCTION_CALL: {"name": "fallback_reasoning", "description": "<step description>"}
4. For final answers:
   FINAL_ANSWER: [your final answer here]

Rules:
- Use function calls to split reasoning, calculation and verification.
- Do a SELF_CHECK after a calculation.
- If a tool fails or you are uncertain, call fallback_reasoning.
- Only perform the operations the user asked for and never repeat a call with the same arguments.
- Give FINAL_ANSWER only when every needed operation is done.

Example:
User: What is 2 + 3?
FUNCTION_CALL: {"name": "sum_list", "args": [2, 3], "reasoning_type": "Arithmetic", "step": "Add 2 and 3"}
SELF_CHECK: Is the result reasonable? -> Yes
FINAL_ANSWER: [Query: What is 2 + 3? Result: 5]"#;

impl PlannerProtocol for LegacyProtocol {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Legacy
    }

    fn wants_perception(&self) -> bool {
        false
    }

    fn build_prompt(&self, ctx: &PromptContext<'_>) -> String {
        let history = serde_json::to_string_pretty(&ctx.state.history).unwrap_or_else(|_| "[]".into());
        let query = if ctx.state.has_acted() {
            format!("{}\n\n{} What should I do next?", ctx.query, ctx.state.notes.join(" "))
        } else {
            ctx.query.to_string()
        };
        format!(
            "You are a helpful assistant that performs math calculations, presentation edits and emails.\n\n\
             Available tools:\n{}\n\n{}\n\n\
             Conversation history:\n{}\n\n\
             Query: {}",
            capability_listing(ctx.capabilities),
            FORMAT,
            history,
            query,
        )
    }

    fn parse_reply(&self, reply: &str) -> Result<PlannerReply, ParseError> {
        let first_line = reply.lines().map(str::trim).find(|l| !l.is_empty()).ok_or(ParseError::Empty)?;

        if let Some(payload) = first_line.strip_prefix(FUNCTION_CALL) {
            return parse_call(payload.trim()).map(PlannerReply::NextAction);
        }
        if first_line.starts_with(SELF_CHECK) {
            return Ok(PlannerReply::SelfCheck(first_line.to_string()));
        }
        if let Some(answer) = first_line.strip_prefix(FINAL_ANSWER) {
            return Ok(PlannerReply::FinalAnswer(clean_final_answer(answer)));
        }
        Ok(PlannerReply::Unrecognized(first_line.to_string()))
    }
}

/// `{"name": ..., "args": ..., "reasoning_type": ..., "step": ...}` as a step.
///
/// The step number is left at 0; the loop numbers single steps as they run.
fn parse_call(payload: &str) -> Result<ActionStep, ParseError> {
    let call: Value = serde_json::from_str(payload).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let name = call
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ParseError::MissingField("name".into()))?;
    let text = |key: &str| call.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

    let (parameters, description) = if name == FALLBACK_CAPABILITY {
        let description = match text("description") {
            d if d.is_empty() => text("step"),
            d => d,
        };
        (json!({ "description": description }), description)
    } else {
        (call.get("args").cloned().unwrap_or(Value::Array(vec![])), text("step"))
    };

    let mut step = ActionStep::tool_call(0, name, parameters);
    step.description = description;
    step.reasoning = text("reasoning_type");
    Ok(step)
}

/// `[Query: What is 2 + 3? Result: 5]` → `5`.
pub fn clean_final_answer(raw: &str) -> String {
    let answer = raw.trim().trim_matches(|c: char| c == '[' || c == ']').trim();
    if answer.starts_with("Query:") {
        if let Some((_, result)) = answer.rsplit_once("Result:") {
            return result.trim().to_string();
        }
    }
    answer.to_string()
}
