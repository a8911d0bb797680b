//! Final answer assembly.
//!
//! Tiers, first match wins: the terminal answer, then the aggregated
//! results of successful compute steps, then `"Task completed"`.

use cognitor_core::value::{display_value, format_number};
use cognitor_core::{ActionResult, ActionType, CapabilityKind, CapabilityRegistry};
use serde_json::Value;

pub const TASK_COMPLETED: &str = "Task completed";

/// Pick the final result text for a finished query.
pub fn assemble(final_answer: Option<&str>, results: &[ActionResult], registry: &CapabilityRegistry) -> String {
    if let Some(answer) = final_answer {
        return answer.to_string();
    }

    let values: Vec<&Value> = results
        .iter()
        .filter(|r| r.success && r.action_type == ActionType::ToolCall)
        .filter(|r| {
            r.tool_name
                .as_deref()
                .and_then(|name| registry.kind_of(name))
                .is_some_and(|kind| kind == CapabilityKind::Compute)
        })
        .filter_map(|r| r.result.as_ref())
        .collect();

    match values.as_slice() {
        [] => TASK_COMPLETED.to_string(),
        [single] => display_value(single),
        many => {
            let numbers: Option<Vec<f64>> = many.iter().map(|v| as_number(v)).collect();
            match numbers {
                Some(numbers) => numbers.into_iter().map(format_number).collect::<Vec<_>>().join(", "),
                None => many.iter().map(|v| display_value(v)).collect::<Vec<_>>().join(" | "),
            }
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text a `response` step answers with: the first present answer-like
/// parameter, else its description.
pub fn response_text(parameters: &Value, description: &str) -> Option<String> {
    const KEYS: [&str; 6] = ["answer", "response", "result", "text", "content", "message"];

    let params = match parameters {
        Value::Object(map) => match map.get("input") {
            Some(Value::Object(inner)) => Some(inner),
            _ => Some(map),
        },
        _ => None,
    };
    let from_params = params.and_then(|map| {
        KEYS.iter()
            .filter_map(|k| map.get(*k))
            .find(|v| !v.is_null())
            .map(display_value)
    });
    let from_scalar = match parameters {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) => Some(display_value(parameters)),
        _ => None,
    };

    from_params
        .or(from_scalar)
        .or_else(|| (!description.trim().is_empty()).then(|| description.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cognitor_core::{
        ActionStep, BoundArguments, Capability, CapabilityError, CapabilityOutput, ParamSchema,
    };
    use serde_json::json;

    struct Stub(&'static str, CapabilityKind);

    #[async_trait]
    impl Capability for Stub {
        fn name(&self) -> &str { self.0 }
        fn description(&self) -> &str { "stub" }
        fn schema(&self) -> &ParamSchema {
            static EMPTY: std::sync::LazyLock<ParamSchema> = std::sync::LazyLock::new(ParamSchema::new);
            &EMPTY
        }
        fn kind(&self) -> CapabilityKind { self.1 }
        async fn execute(&self, _args: BoundArguments) -> Result<CapabilityOutput, CapabilityError> {
            Ok(CapabilityOutput::text("ok"))
        }
    }

    fn registry() -> CapabilityRegistry {
        let mut r = CapabilityRegistry::new();
        r.register(Box::new(Stub("solve_linear_equation", CapabilityKind::Compute))).unwrap();
        r.register(Box::new(Stub("add", CapabilityKind::Compute))).unwrap();
        r.register(Box::new(Stub("mean", CapabilityKind::Compute))).unwrap();
        r.register(Box::new(Stub("send_email", CapabilityKind::SideEffect))).unwrap();
        r
    }

    fn ok(n: u32, tool: &str, value: Value) -> ActionResult {
        ActionResult::succeeded(&ActionStep::tool_call(n, tool, Value::Null), value)
    }

    #[test]
    fn terminal_answer_wins() {
        let results = vec![ok(1, "add", json!(5))];
        assert_eq!(assemble(Some("five"), &results, &registry()), "five");
    }

    #[test]
    fn numeric_results_join_with_commas() {
        let results = vec![
            ok(1, "solve_linear_equation", json!(20)),
            ok(2, "add", json!(21)),
            ok(3, "send_email", json!("Email sent successfully to x")),
        ];
        assert_eq!(assemble(None, &results, &registry()), "20, 21");
    }

    #[test]
    fn single_and_mixed_results() {
        let registry = registry();
        assert_eq!(assemble(None, &[ok(1, "mean", json!(2.5))], &registry), "2.5");
        let mixed = vec![ok(1, "add", json!(3)), ok(2, "mean", json!("n/a"))];
        assert_eq!(assemble(None, &mixed, &registry), "3 | n/a");
    }

    #[test]
    fn failures_side_effects_and_unknowns_fall_back() {
        let registry = registry();
        let step = ActionStep::tool_call(1, "add", Value::Null);
        let results = vec![
            ActionResult::failed(&step, "bad"),
            ok(2, "send_email", json!("sent")),
            ok(3, "nonexistent", json!(1)),
        ];
        assert_eq!(assemble(None, &results, &registry), TASK_COMPLETED);
        assert_eq!(assemble(None, &[], &registry), TASK_COMPLETED);
    }

    #[test]
    fn response_text_sources() {
        assert_eq!(response_text(&json!({"answer": 5}), ""), Some("5".into()));
        assert_eq!(response_text(&json!({"input": {"result": "x = 20"}}), ""), Some("x = 20".into()));
        assert_eq!(response_text(&json!({"other": 1}), "Report the sum"), Some("Report the sum".into()));
        assert_eq!(response_text(&json!("plain"), ""), Some("plain".into()));
        assert_eq!(response_text(&Value::Null, "  "), None);
    }
}
