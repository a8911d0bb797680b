//! Planner protocol adapters.
//!
//! A protocol turns the running context into a prompt and the planner's
//! reply into a [`PlannerReply`]. Which protocol is active is a deployment
//! choice (`planner.protocol`), never inferred from the shape of a reply.

mod legacy;
mod structured;

pub use legacy::{clean_final_answer, LegacyProtocol, FALLBACK_CAPABILITY};
pub use structured::StructuredProtocol;

use cognitor_config::ProtocolKind;
use cognitor_core::{
    CapabilityDescriptor, Fact, ParseError, Perception, Planner, PlannerError, PlannerReply, Preferences,
};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::state::CognitiveState;

/// Everything a protocol may put in a prompt.
pub struct PromptContext<'a> {
    pub query: &'a str,
    pub preferences: &'a Preferences,
    pub perception: Option<&'a Perception>,
    pub facts: &'a [Fact],
    pub capabilities: &'a [CapabilityDescriptor],
    pub state: &'a CognitiveState,
}

pub trait PlannerProtocol: Send + Sync {
    fn kind(&self) -> ProtocolKind;

    /// Whether the loop should run the perception pass before planning.
    fn wants_perception(&self) -> bool;

    fn build_prompt(&self, ctx: &PromptContext<'_>) -> String;

    fn parse_reply(&self, reply: &str) -> Result<PlannerReply, ParseError>;
}

/// The adapter for a configured protocol.
pub fn for_kind(kind: ProtocolKind) -> Box<dyn PlannerProtocol> {
    match kind {
        ProtocolKind::Structured => Box::new(StructuredProtocol),
        ProtocolKind::Legacy => Box::new(LegacyProtocol),
    }
}

/// Call the planner, giving up after `timeout`.
///
/// The pending request is dropped on timeout, so no partial reply can reach
/// the caller's state.
pub async fn invoke(planner: &dyn Planner, prompt: &str, timeout: Duration) -> Result<String, PlannerError> {
    debug!(planner = planner.name(), prompt_len = prompt.len(), "Invoking planner");
    match tokio::time::timeout(timeout, planner.generate(prompt)).await {
        Ok(reply) => reply,
        Err(_) => Err(PlannerError::Timeout {
            timeout_secs: timeout.as_secs(),
        }),
    }
}

/// Pull a JSON value out of a model reply: the whole reply, a fenced
/// ```json block, or the outermost `{...}` span, in that order.
pub fn extract_json(reply: &str) -> Result<Value, ParseError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Ok(v);
    }
    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(v) = serde_json::from_str(fenced) {
            return Ok(v);
        }
    }
    let span = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => return Err(ParseError::InvalidJson("no JSON object in reply".into())),
    };
    serde_json::from_str(span).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Preferences as compact JSON, `{}` when empty.
pub(crate) fn preferences_json(preferences: &Preferences) -> String {
    serde_json::to_string(preferences).unwrap_or_else(|_| "{}".into())
}

/// `1. add(a: number, b: number) - Add two numbers: a + b`
pub(crate) fn capability_listing(capabilities: &[CapabilityDescriptor]) -> String {
    capabilities
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} - {}", i + 1, c.signature(), c.description))
        .collect::<Vec<_>>()
        .join("\n")
}
