//! Per-query cognitive state.
//!
//! A fresh `CognitiveState` is built for every top-level query and owned by
//! that query's run of the loop; nothing in it outlives the query.

use cognitor_core::{ActionResult, Decision, Perception};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::placeholder::StepResults;

/// One entry of the single-step conversation history shown to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryItem {
    FunctionCall {
        name: String,
        args: Value,
        reasoning_type: String,
        step: String,
        result: String,
    },
    SelfCheck {
        content: String,
    },
    Fallback {
        content: String,
    },
}

#[derive(Debug, Default)]
pub struct CognitiveState {
    /// Completed perception→decision→action cycles, bounded by the budget
    pub iteration: u32,

    /// First-iteration perception, reused afterwards
    pub perception: Option<Perception>,

    /// Most recent plan
    pub decision: Option<Decision>,

    /// Every executed step, in execution order
    pub action_results: Vec<ActionResult>,

    pub complete: bool,

    /// Terminal answer from a `response` step or a `FINAL_ANSWER` line
    pub final_answer: Option<String>,

    /// Placeholder targets; a later step with the same number replaces an earlier one
    pub step_results: StepResults,

    pub history: Vec<HistoryItem>,

    /// One line per single-step action, fed back as "what happened so far"
    pub notes: Vec<String>,
}

impl CognitiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result and keep the placeholder map in step with it.
    pub fn record(&mut self, result: ActionResult) {
        match (&result.result, result.success) {
            (Some(value), true) => {
                self.step_results.insert(result.step_number, value.clone());
            }
            _ => {
                self.step_results.remove(&result.step_number);
            }
        }
        self.action_results.push(result);
    }

    /// Number for the next step of a single-step conversation.
    pub fn next_step_number(&self) -> u32 {
        self.action_results
            .iter()
            .map(|r| r.step_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Whether any action has run yet.
    pub fn has_acted(&self) -> bool {
        !self.action_results.is_empty() || !self.history.is_empty()
    }
}
