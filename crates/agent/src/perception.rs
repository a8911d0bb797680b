//! First-iteration perception: intent, entities and facts pulled out of the
//! query by the planner.

use cognitor_core::value::display_value;
use cognitor_core::{ParseError, Perception, Planner, PlannerError, Preferences};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::protocol::{extract_json, invoke};

fn prompt(query: &str, preferences: &Preferences) -> String {
    let preferences = serde_json::to_string(preferences).unwrap_or_else(|_| "{}".into());
    format!(
        r#"You are the perception layer of a math task agent. Analyze the user query and extract structured information.

User preferences: {preferences}

Output JSON with this structure:
{{
    "intent": "calculation|information_query|task_creation|tool_action|conditional_action|multi_step|out_of_scope",
    "entities": {{"<type>": "<value>"}},
    "thought_type": "Planning|Analysis|Decision Making|Problem Solving|Memory Integration",
    "extracted_facts": ["fact1", "fact2"],
    "requires_tools": true,
    "confidence": 0.0
}}

Respond with ONLY the JSON object.

User query: {query}"#
    )
}

/// Ask the planner to perceive `query`.
///
/// A reply that cannot be read degrades to [`Perception::from_query`]; only
/// a failure of the planner itself is an error.
pub async fn perceive(
    planner: &dyn Planner,
    query: &str,
    preferences: &Preferences,
    timeout: Duration,
) -> Result<Perception, PlannerError> {
    let reply = invoke(planner, &prompt(query, preferences), timeout).await?;
    match parse(&reply) {
        Ok(perception) => {
            debug!(intent = %perception.intent, facts = perception.extracted_facts.len(), "Perceived query");
            Ok(perception)
        }
        Err(e) => {
            warn!(error = %e, "Perception reply unreadable, using the raw query");
            Ok(Perception::from_query(query))
        }
    }
}

/// Lenient read of a perception reply: entities may be a list or a map.
pub fn parse(reply: &str) -> Result<Perception, ParseError> {
    let value = extract_json(reply)?;
    let Value::Object(map) = value else {
        return Err(ParseError::InvalidJson("perception must be a JSON object".into()));
    };
    let text = |key: &str| map.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    let intent = text("intent");
    if intent.is_empty() {
        return Err(ParseError::MissingField("intent".into()));
    }

    let entities = match map.get("entities") {
        Some(Value::Array(items)) => items.iter().map(display_value).collect(),
        Some(Value::Object(fields)) => fields
            .iter()
            .map(|(kind, v)| format!("{kind}: {}", display_value(v)))
            .collect(),
        _ => Vec::new(),
    };
    let extracted_facts = match map.get("extracted_facts") {
        Some(Value::Array(items)) => items
            .iter()
            .map(display_value)
            .filter(|f| !f.trim().is_empty())
            .collect(),
        _ => Vec::new(),
    };

    Ok(Perception {
        intent,
        entities,
        thought_type: text("thought_type"),
        extracted_facts,
        requires_tools: map.get("requires_tools").and_then(Value::as_bool).unwrap_or(true),
        confidence: map.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
    })
}
