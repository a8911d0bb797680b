//! The cognitive loop at the centre of cognitor.
//!
//! Each query runs a **Perceive → Plan → Act** cycle:
//!
//! 1. **Perceive** the query once (intent, entities, facts worth keeping)
//! 2. **Recall** relevant facts from memory
//! 3. **Plan** by asking the planner, through the configured protocol
//! 4. **Act** on the reply: run plan steps or a single action, resolving
//!    `RESULT_FROM_STEP_N` references against earlier results
//! 5. **Assemble** the answer once the planner finishes or the budget runs out
//!
//! A query never fails outright: planner errors and timeouts come back as an
//! unsuccessful [`AgentResponse`](cognitor_core::AgentResponse).

pub mod loop_runner;
pub mod perception;
pub mod placeholder;
pub mod protocol;
pub mod response;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{CognitiveAgent, QueryOutcome, Termination};
pub use placeholder::{resolve, StepResults};
pub use protocol::{LegacyProtocol, PlannerProtocol, PromptContext, StructuredProtocol};
pub use response::assemble;
pub use state::{CognitiveState, HistoryItem};
