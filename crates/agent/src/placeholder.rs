//! Result placeholder resolver.
//!
//! Plan steps chain results by writing `RESULT_FROM_STEP_N` where a value is
//! expected. Before a step runs, its parameters are rewritten against the
//! results recorded so far:
//!
//! - a textual field (`content`, `text`, `message`, `body`, `description`)
//!   gets a readable rendering, e.g. `"The result is 20"`;
//! - any other field gets the number extracted from the referenced result,
//!   or the raw result when no number can be found;
//! - references to unknown or not-yet-run steps are left as written.
//!
//! The input is never modified; a new value is returned.

use cognitor_core::value::{display_value, format_number, number_value};
use regex_lite::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Results of executed steps, by step number.
pub type StepResults = BTreeMap<u32, Value>;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)RESULT[_\- ]?FROM[_\- ]?STEP[_\- ]?(\d+)").unwrap());

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

const TEXT_FIELDS: [&str; 5] = ["content", "text", "message", "body", "description"];

/// Fields consulted, in order, when a result is a structured payload.
const NUMERIC_FIELDS: [&str; 4] = ["solution", "result", "value", "answer"];

/// Whether `value` mentions a placeholder anywhere.
pub fn contains_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => PLACEHOLDER.is_match(s),
        Value::Array(items) => items.iter().any(contains_placeholder),
        Value::Object(map) => map.values().any(contains_placeholder),
        _ => false,
    }
}

/// Rewrite placeholders in `params` for the step numbered `current_step`.
pub fn resolve(params: &Value, results: &StepResults, current_step: u32) -> Value {
    Resolver { results, current_step }.walk(params, None)
}

struct Resolver<'a> {
    results: &'a StepResults,
    current_step: u32,
}

impl Resolver<'_> {
    fn walk(&self, value: &Value, field: Option<&str>) -> Value {
        match value {
            Value::String(s) => self.string(s, field),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.walk(v, field)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.walk(v, Some(k))))
                    .collect::<Map<_, _>>(),
            ),
            other => other.clone(),
        }
    }

    /// The referenced result, if the reference points backwards at a step that ran.
    fn lookup(&self, caps: &Captures<'_>) -> Option<&Value> {
        let step: u32 = caps.get(1)?.as_str().parse().ok()?;
        if step >= self.current_step {
            return None;
        }
        self.results.get(&step)
    }

    fn string(&self, s: &str, field: Option<&str>) -> Value {
        let Some(caps) = PLACEHOLDER.captures(s) else {
            return Value::String(s.to_string());
        };
        let whole = caps.get(0).is_some_and(|m| m.as_str() == s.trim());
        let textual = field.is_some_and(is_text_field);

        if whole {
            let Some(result) = self.lookup(&caps) else {
                return Value::String(s.to_string());
            };
            return if textual {
                Value::String(format!("The result is {}", render(result)))
            } else {
                extract_number(result).map(number_value).unwrap_or_else(|| result.clone())
            };
        }

        // Embedded in longer text: substitute each reference inline.
        let replaced = PLACEHOLDER.replace_all(s, |caps: &Captures<'_>| match self.lookup(caps) {
            Some(result) if textual => render(result),
            Some(result) => extract_number(result)
                .map(format_number)
                .unwrap_or_else(|| display_value(result)),
            None => caps[0].to_string(),
        });
        Value::String(replaced.into_owned())
    }
}

fn is_text_field(name: &str) -> bool {
    TEXT_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// Human-readable form of a result: its number when it has one.
fn render(result: &Value) -> String {
    extract_number(result)
        .map(format_number)
        .unwrap_or_else(|| display_value(result))
}

/// Best-effort numeric value of a step result.
pub fn extract_number(result: &Value) -> Option<f64> {
    match result {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => from_fields(map).or_else(|| first_literal(&result.to_string())),
        Value::String(s) => {
            let trimmed = s.trim();
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Number(n)) => n.as_f64(),
                Ok(Value::Object(map)) => from_fields(&map).or_else(|| first_literal(trimmed)),
                _ => first_literal(trimmed),
            }
        }
        Value::Array(_) => first_literal(&result.to_string()),
        Value::Bool(_) | Value::Null => None,
    }
}

fn from_fields(map: &Map<String, Value>) -> Option<f64> {
    NUMERIC_FIELDS.iter().find_map(|field| match map.get(*field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn first_literal(text: &str) -> Option<f64> {
    NUMBER.find(text)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results(pairs: &[(u32, Value)]) -> StepResults {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn numeric_parameter_gets_number() {
        let map = results(&[(1, json!(20))]);
        let params = json!({"input": {"a": "RESULT_FROM_STEP_1", "b": 1}});
        assert_eq!(resolve(&params, &map, 2), json!({"input": {"a": 20, "b": 1}}));
    }

    #[test]
    fn text_parameter_gets_sentence() {
        let map = results(&[(1, json!(20.0))]);
        let params = json!({"content": "RESULT_FROM_STEP_1"});
        assert_eq!(resolve(&params, &map, 2), json!({"content": "The result is 20"}));

        let params = json!({"text": "x = RESULT_FROM_STEP_1, so x + 1 = RESULT_FROM_STEP_2"});
        let map = results(&[(1, json!(20)), (2, json!("21"))]);
        assert_eq!(
            resolve(&params, &map, 3),
            json!({"text": "x = 20, so x + 1 = 21"})
        );
    }

    #[test]
    fn structured_results_use_priority_fields() {
        let map = results(&[
            (1, json!({"value": 3, "solution": 7})),
            (2, json!("{\"result\": \"4.5\"}")),
            (3, json!("The answer is 42 apples")),
        ]);
        let params = json!(["RESULT_FROM_STEP_1", "RESULT_FROM_STEP_2", "RESULT_FROM_STEP_3"]);
        assert_eq!(resolve(&params, &map, 4), json!([7, 4.5, 42]));
    }

    #[test]
    fn non_numeric_result_passes_through() {
        let map = results(&[(1, json!("done")), (2, json!({"found": false}))]);
        let params = json!({"a": "RESULT_FROM_STEP_1", "b": "RESULT_FROM_STEP_2"});
        assert_eq!(
            resolve(&params, &map, 3),
            json!({"a": "done", "b": {"found": false}})
        );
    }

    #[test]
    fn forward_and_unknown_references_stay_literal() {
        let map = results(&[(1, json!(5)), (3, json!(9))]);
        let params = json!({"a": "RESULT_FROM_STEP_3", "b": "RESULT_FROM_STEP_7"});
        assert_eq!(resolve(&params, &map, 2), params);
    }

    #[test]
    fn embedded_reference_in_expression() {
        let map = results(&[(1, json!(20))]);
        let params = json!({"expression": "RESULT_FROM_STEP_1 + 1"});
        assert_eq!(resolve(&params, &map, 2), json!({"expression": "20 + 1"}));
    }

    #[test]
    fn token_spelling_is_lenient() {
        let map = results(&[(2, json!(8))]);
        for token in ["result_from_step_2", "RESULT-FROM-STEP-2", "Result From Step 2", "RESULT_FROM_STEP2"] {
            assert_eq!(resolve(&json!({"n": token}), &map, 3), json!({"n": 8}), "{token}");
        }
    }

    #[test]
    fn resolution_without_placeholders_is_identity() {
        let map = results(&[(1, json!(1))]);
        let params = json!({"input": {"numbers": [1, 2.5, "x"], "flag": true, "nested": {"k": null}}});
        assert!(!contains_placeholder(&params));
        assert_eq!(resolve(&params, &map, 2), params);
    }

    #[test]
    fn input_is_not_mutated() {
        let map = results(&[(1, json!(3))]);
        let params = json!({"a": "RESULT_FROM_STEP_1"});
        let before = params.clone();
        let _ = resolve(&params, &map, 2);
        assert_eq!(params, before);
    }

    #[test]
    fn extract_number_preserves_magnitude() {
        for n in [20.0, -3.0, 2.5, 1e6] {
            let as_text = Value::String(format!("Result: {}", format_number(n)));
            assert_eq!(extract_number(&as_text), Some(n));
        }
    }
}
