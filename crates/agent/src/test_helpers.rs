//! Shared test helpers for the loop tests.

use cognitor_core::{Planner, PlannerError};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A planner that replays scripted replies in order and records every prompt.
///
/// Panics if asked for more replies than it was given.
pub struct ScriptedPlanner {
    replies: Mutex<VecDeque<Result<String, PlannerError>>>,
    prompts: Mutex<Vec<String>>,
    stall_first: Option<Duration>,
}

impl ScriptedPlanner {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    pub fn from_results(replies: Vec<Result<String, PlannerError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            stall_first: None,
        }
    }

    /// Sleep for `delay` on the first call before answering.
    pub fn with_stall_first(mut self, delay: Duration) -> Self {
        self.stall_first = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Planner for ScriptedPlanner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, PlannerError> {
        let first = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() == 1
        };
        if let (true, Some(delay)) = (first, self.stall_first) {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedPlanner: no reply left for prompt:\n{prompt}"))
    }
}

/// A structured-protocol plan reply.
pub fn plan(steps: Value, should_continue: bool) -> String {
    json!({
        "action_plan": steps,
        "reasoning": "scripted",
        "confidence": 0.9,
        "should_continue": should_continue
    })
    .to_string()
}
