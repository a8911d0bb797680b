//! The cognitive loop: perceive, recall, plan, act, and assemble an answer.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use cognitor_config::{AgentConfig, PlannerConfig, ProtocolKind};
use cognitor_core::event::{DomainEvent, EventBus};
use cognitor_core::value::display_value;
use cognitor_core::{
    ActionResult, ActionStep, ActionType, AgentResponse, CapabilityKind, CapabilityRegistry, Error, Fact,
    FactMemory, Planner, PlannerReply, Preferences,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::perception;
use crate::placeholder::{self, StepResults};
use crate::protocol::{self, PlannerProtocol, PromptContext, FALLBACK_CAPABILITY};
use crate::response::{assemble, response_text};
use crate::state::{CognitiveState, HistoryItem};

const PREVIEW_CHARS: usize = 80;

/// Why a query left the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The planner finished: a terminal answer or a plan that stops.
    Plan,
    /// The iteration budget ran out.
    Budget,
    /// The planner failed or timed out.
    Error,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plan => "plan",
            Self::Budget => "budget",
            Self::Error => "error",
        })
    }
}

/// A response plus what happened on the way to it.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub response: AgentResponse,
    pub termination: Termination,
    pub iterations: u32,
    pub action_results: Vec<ActionResult>,
}

/// Drives one query at a time through the planner and the capability registry.
pub struct CognitiveAgent {
    planner: Arc<dyn Planner>,
    registry: Arc<CapabilityRegistry>,
    protocol: Box<dyn PlannerProtocol>,

    /// Facts and preferences that outlive a query
    memory: Option<Arc<dyn FactMemory>>,

    event_bus: Arc<EventBus>,

    /// Iterations allowed per query
    max_iterations: u32,

    /// Bound on each planner call
    planner_timeout: Duration,

    recall_limit: usize,
    min_relevance: f64,
    use_perception: bool,
}

impl CognitiveAgent {
    pub fn new(planner: Arc<dyn Planner>, registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            planner,
            registry,
            protocol: protocol::for_kind(ProtocolKind::default()),
            memory: None,
            event_bus: Arc::new(EventBus::default()),
            max_iterations: 5,
            planner_timeout: Duration::from_secs(10),
            recall_limit: 5,
            min_relevance: 0.3,
            use_perception: true,
        }
    }

    /// Agent tuned by the `[planner]` and `[agent]` config sections.
    pub fn from_config(
        planner: Arc<dyn Planner>,
        registry: Arc<CapabilityRegistry>,
        planner_config: &PlannerConfig,
        agent_config: &AgentConfig,
    ) -> Self {
        Self::new(planner, registry)
            .with_protocol(planner_config.protocol)
            .with_timeout(Duration::from_secs(planner_config.timeout_secs))
            .with_max_iterations(agent_config.max_iterations)
            .with_recall(agent_config.recall_limit, agent_config.min_relevance)
            .with_perception(agent_config.use_perception)
    }

    pub fn with_protocol(mut self, kind: ProtocolKind) -> Self {
        self.protocol = protocol::for_kind(kind);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn FactMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.planner_timeout = timeout;
        self
    }

    /// How many facts to recall per iteration, and the relevance they need.
    pub fn with_recall(mut self, limit: usize, min_relevance: f64) -> Self {
        self.recall_limit = limit;
        self.min_relevance = min_relevance;
        self
    }

    pub fn with_perception(mut self, enabled: bool) -> Self {
        self.use_perception = enabled;
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn protocol(&self) -> ProtocolKind {
        self.protocol.kind()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Answer `query`. Never fails: errors come back as an unsuccessful response.
    pub async fn process(&self, query: &str, preferences: Option<&Preferences>) -> AgentResponse {
        self.process_detailed(query, preferences).await.response
    }

    /// Like [`process`](Self::process), keeping the termination reason and
    /// every executed step.
    pub async fn process_detailed(&self, query: &str, preferences: Option<&Preferences>) -> QueryOutcome {
        let mut state = CognitiveState::new();
        let preview: String = query.chars().take(PREVIEW_CHARS).collect();
        info!(query = %preview, protocol = %self.protocol.kind(), "Processing query");
        self.event_bus.publish(DomainEvent::QueryStarted {
            query_preview: preview,
            timestamp: Utc::now(),
        });

        let (response, termination) = match self.run(query, preferences, &mut state).await {
            Ok(termination) => {
                let result = assemble(state.final_answer.as_deref(), &state.action_results, &self.registry);
                self.persist().await;
                info!(
                    iterations = state.iteration,
                    steps = state.action_results.len(),
                    termination = %termination,
                    "Query answered"
                );
                (AgentResponse::success(query, result), termination)
            }
            Err(e) => {
                error!(iteration = state.iteration, error = %e, "Query failed");
                self.event_bus.publish(DomainEvent::ErrorOccurred {
                    context: "query".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                (AgentResponse::failure(query, &e), Termination::Error)
            }
        };

        self.event_bus.publish(DomainEvent::QueryCompleted {
            success: response.success,
            iterations: state.iteration,
            termination: termination.to_string(),
            timestamp: Utc::now(),
        });

        QueryOutcome {
            response,
            termination,
            iterations: state.iteration,
            action_results: state.action_results,
        }
    }

    async fn run(
        &self,
        query: &str,
        preferences: Option<&Preferences>,
        state: &mut CognitiveState,
    ) -> Result<Termination, Error> {
        let preferences = self.preferences(preferences).await?;
        let capabilities = self.registry.list();

        while state.iteration < self.max_iterations {
            state.iteration += 1;
            let iteration = state.iteration;
            debug!(iteration, max = self.max_iterations, "Loop iteration");

            if state.perception.is_none() && self.use_perception && self.protocol.wants_perception() {
                let perceived =
                    perception::perceive(self.planner.as_ref(), query, &preferences, self.planner_timeout).await?;
                self.remember(&perceived.extracted_facts, "perception").await;
                state.perception = Some(perceived);
            }

            let facts = self.recall(query).await;
            let prompt = self.protocol.build_prompt(&PromptContext {
                query,
                preferences: &preferences,
                perception: state.perception.as_ref(),
                facts: &facts,
                capabilities: &capabilities,
                state: &*state,
            });

            let started = Instant::now();
            let reply = protocol::invoke(self.planner.as_ref(), &prompt, self.planner_timeout).await?;
            self.event_bus.publish(DomainEvent::PlannerInvoked {
                planner: self.planner.name().to_string(),
                protocol: self.protocol.kind().to_string(),
                iteration,
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });

            match self.protocol.parse_reply(&reply) {
                Ok(PlannerReply::Plan(decision)) => {
                    debug!(iteration, steps = decision.action_plan.len(), "Executing plan");
                    for step in &decision.action_plan {
                        self.run_step(step, query, state).await;
                    }
                    let stop = !decision.should_continue || state.final_answer.is_some();
                    state.decision = Some(decision);
                    if stop {
                        state.complete = true;
                        return Ok(Termination::Plan);
                    }
                }
                Ok(PlannerReply::NextAction(mut step)) => {
                    step.step_number = state.next_step_number();
                    self.run_single(step, query, state).await;
                }
                Ok(PlannerReply::SelfCheck(line)) => {
                    debug!(iteration, check = %line, "Self-check");
                    state.history.push(HistoryItem::SelfCheck { content: line.clone() });
                    state.notes.push(line);
                }
                Ok(PlannerReply::FinalAnswer(answer)) => {
                    state.final_answer = Some(answer);
                    state.complete = true;
                    return Ok(Termination::Plan);
                }
                Ok(PlannerReply::Unrecognized(line)) => {
                    warn!(iteration, reply = %line, "Unrecognized planner reply");
                    state.notes.push(format!("Unrecognized response: {line}"));
                }
                Err(e) => {
                    warn!(iteration, error = %e, "Planner reply unusable, continuing");
                    let mut step = ActionStep::response(state.next_step_number(), Value::Null);
                    step.description = "read planner reply".into();
                    state.notes.push(format!("Error parsing planner reply: {e}"));
                    state.record(ActionResult::failed(&step, format!("planner reply unusable: {e}")));
                }
            }
        }

        warn!(max = self.max_iterations, "Iteration budget exhausted");
        Ok(Termination::Budget)
    }

    /// Execute one step, capture a terminal answer, and record the outcome.
    async fn run_step(&self, step: &ActionStep, query: &str, state: &mut CognitiveState) -> ActionResult {
        let result = self.execute_step(step, query, &state.step_results).await;

        if result.success && result.action_type == ActionType::Response {
            if let Some(answer) = &result.result {
                state.final_answer = Some(display_value(answer));
            }
        }
        if !result.facts_to_remember.is_empty() {
            self.remember(&result.facts_to_remember, "action").await;
        }
        state.record(result.clone());
        result
    }

    /// A single-step action, echoed into the history the planner sees next.
    async fn run_single(&self, step: ActionStep, query: &str, state: &mut CognitiveState) {
        let result = self.run_step(&step, query, state).await;
        let name = step.tool_name.clone().unwrap_or_default();
        let outcome = match (&result.result, &result.error) {
            (Some(v), _) if result.success => display_value(v),
            (_, Some(e)) => format!("Error: {e}"),
            _ => String::new(),
        };

        state.notes.push(format!(
            "Step: {} | Reasoning: {} | Called {} with {} -> {}",
            step.description, step.reasoning, name, step.parameters, outcome
        ));
        state.history.push(if name == FALLBACK_CAPABILITY {
            HistoryItem::Fallback {
                content: step.description,
            }
        } else {
            HistoryItem::FunctionCall {
                name,
                args: step.parameters,
                reasoning_type: step.reasoning,
                step: step.description,
                result: outcome,
            }
        });
    }

    async fn execute_step(&self, step: &ActionStep, query: &str, results: &StepResults) -> ActionResult {
        let parameters = placeholder::resolve(&step.parameters, results, step.step_number);
        if placeholder::contains_placeholder(&parameters) {
            debug!(step = step.step_number, "Unresolved step reference left in parameters");
        }

        let started = Instant::now();
        let result = match step.action_type {
            ActionType::ToolCall => self.call_capability(step, &parameters).await,
            ActionType::Response => match response_text(&parameters, &step.description).map(Value::String) {
                Some(text) if placeholder::contains_placeholder(&text) => {
                    warn!(step = step.step_number, answer = %display_value(&text), "Response refers to a step with no result");
                    ActionResult::failed(step, format!("response refers to a step with no result: {}", display_value(&text)))
                }
                Some(text) => ActionResult::succeeded(step, text),
                None => ActionResult::failed(step, "response step carried no answer"),
            },
            ActionType::QueryMemory => {
                let text = memory_query(&parameters)
                    .or_else(|| (!step.description.trim().is_empty()).then(|| step.description.clone()))
                    .unwrap_or_else(|| query.to_string());
                let facts = self.recall(&text).await;
                let found = if facts.is_empty() {
                    "No relevant facts found".to_string()
                } else {
                    facts.iter().map(|f| f.content.as_str()).collect::<Vec<_>>().join("; ")
                };
                ActionResult::succeeded(step, Value::String(found))
            }
        };

        self.event_bus.publish(DomainEvent::StepExecuted {
            step_number: step.step_number,
            tool_name: step.tool_name.clone(),
            success: result.success,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
        result
    }

    async fn call_capability(&self, step: &ActionStep, parameters: &Value) -> ActionResult {
        let Some(name) = step.tool_name.as_deref() else {
            return ActionResult::failed(step, "tool_call step has no tool_name");
        };

        match self.registry.call(name, parameters).await {
            Ok(output) if output.success => {
                let value = output.into_result();
                debug!(step = step.step_number, capability = name, result = %display_value(&value), "Step succeeded");
                let facts = match self.registry.kind_of(name) {
                    Some(CapabilityKind::Compute) => vec![fact_for(name, step, &value)],
                    _ => Vec::new(),
                };
                ActionResult::succeeded(step, value).with_facts(facts)
            }
            Ok(output) => {
                warn!(step = step.step_number, capability = name, reason = %output.output, "Capability reported failure");
                ActionResult::failed(step, output.output)
            }
            Err(e) => {
                warn!(step = step.step_number, capability = name, error = %e, "Step failed");
                ActionResult::failed(step, e.to_string())
            }
        }
    }

    /// Caller preferences merged over the remembered ones.
    async fn preferences(&self, supplied: Option<&Preferences>) -> Result<Preferences, Error> {
        let Some(memory) = &self.memory else {
            return Ok(supplied.cloned().unwrap_or_default());
        };
        if let Some(preferences) = supplied {
            memory.merge_preferences(preferences).await?;
        }
        Ok(memory.preferences().await?)
    }

    async fn recall(&self, query: &str) -> Vec<Fact> {
        let Some(memory) = &self.memory else {
            return vec![];
        };
        match memory.recall(query, self.recall_limit, self.min_relevance).await {
            Ok(facts) => {
                if !facts.is_empty() {
                    debug!(count = facts.len(), "Recalled facts");
                }
                facts
            }
            Err(e) => {
                warn!("Fact recall failed: {e}");
                vec![]
            }
        }
    }

    async fn remember(&self, facts: &[String], source: &str) {
        let Some(memory) = &self.memory else {
            return;
        };
        match memory.store_facts(facts, source).await {
            Ok(stored) => debug!(stored, source, "Stored facts"),
            Err(e) => warn!(source, "Failed to store facts: {e}"),
        }
    }

    async fn persist(&self) {
        if let Some(memory) = &self.memory {
            if let Err(e) = memory.save().await {
                warn!(memory = memory.name(), "Failed to save memory: {e}");
            }
        }
    }
}

fn memory_query(parameters: &Value) -> Option<String> {
    let params = match parameters.get("input") {
        Some(inner @ Value::Object(_)) => inner,
        _ => parameters,
    };
    match params.get("query") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => match parameters {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        },
    }
}

fn fact_for(name: &str, step: &ActionStep, value: &Value) -> String {
    let result = display_value(value);
    if step.description.trim().is_empty() {
        format!("{name} returned {result}")
    } else {
        format!("{}: {result}", step.description.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{plan, ScriptedPlanner};
    use cognitor_core::PlannerError;
    use cognitor_memory::{InMemoryFacts, JsonFileMemory};
    use serde_json::json;

    fn math_registry() -> Arc<CapabilityRegistry> {
        let mut registry = CapabilityRegistry::new();
        for capability in cognitor_tools::arithmetic::capabilities() {
            registry.register(Box::new(capability)).unwrap();
        }
        for capability in cognitor_tools::algebra::capabilities() {
            registry.register(Box::new(capability)).unwrap();
        }
        registry.register(Box::new(cognitor_tools::FallbackReasoning::new())).unwrap();
        Arc::new(registry)
    }

    fn agent(planner: ScriptedPlanner) -> CognitiveAgent {
        CognitiveAgent::new(Arc::new(planner), math_registry()).with_perception(false)
    }

    fn sum_plan() -> String {
        plan(
            json!([
                {"step_number": 1, "action_type": "tool_call", "tool_name": "sum_list",
                 "parameters": {"input": {"numbers": [2, 3]}}},
                {"step_number": 2, "action_type": "response", "parameters": {"answer": "RESULT_FROM_STEP_1"}}
            ]),
            false,
        )
    }

    #[tokio::test]
    async fn single_plan_answers() {
        let agent = agent(ScriptedPlanner::new([sum_plan()]));
        let outcome = agent.process_detailed("What is 2 + 3?", None).await;
        assert!(outcome.response.success);
        assert_eq!(outcome.response.result, "5");
        assert_eq!(outcome.response.full_response, "Query: What is 2 + 3?\nResult: 5");
        assert_eq!(outcome.termination, Termination::Plan);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.action_results.len(), 2);
    }

    #[tokio::test]
    async fn chained_steps_aggregate_without_response() {
        let reply = plan(
            json!([
                {"step_number": 1, "action_type": "tool_call", "tool_name": "solve_linear_equation",
                 "parameters": {"input": {"a": 2, "b": 1, "c": 41}}},
                {"step_number": 2, "action_type": "tool_call", "tool_name": "add",
                 "parameters": {"input": {"a": "RESULT_FROM_STEP_1", "b": 1}}}
            ]),
            false,
        );
        let agent = agent(ScriptedPlanner::new([reply]));
        let response = agent.process("Two consecutive numbers sum to 41. Find them.", None).await;
        assert!(response.success);
        assert_eq!(response.result, "20, 21");
    }

    #[tokio::test]
    async fn unknown_capability_does_not_abort_plan() {
        let reply = plan(
            json!([
                {"step_number": 1, "action_type": "tool_call", "tool_name": "teleport", "parameters": {}},
                {"step_number": 2, "action_type": "response", "parameters": {"answer": "done anyway"}}
            ]),
            false,
        );
        let agent = agent(ScriptedPlanner::new([reply]));
        let outcome = agent.process_detailed("teleport me", None).await;
        assert!(outcome.response.success);
        assert_eq!(outcome.response.result, "done anyway");
        let first = &outcome.action_results[0];
        assert!(!first.success);
        assert_eq!(first.error.as_deref(), Some("Unknown capability: teleport"));
    }

    #[tokio::test]
    async fn response_to_a_failed_step_is_not_the_answer() {
        let reply = plan(
            json!([
                {"step_number": 1, "action_type": "tool_call", "tool_name": "divide",
                 "parameters": {"input": {"a": 1, "b": 0}}},
                {"step_number": 2, "action_type": "response", "parameters": {"answer": "RESULT_FROM_STEP_1"}}
            ]),
            false,
        );
        let outcome = agent(ScriptedPlanner::new([reply])).process_detailed("What is 1 / 0?", None).await;

        assert!(outcome.response.success);
        assert_eq!(outcome.response.result, "Task completed");
        assert!(!outcome.action_results[0].success);
        let response = &outcome.action_results[1];
        assert!(!response.success);
        assert!(response.error.as_deref().unwrap().contains("RESULT_FROM_STEP_1"));
    }

    #[tokio::test]
    async fn response_to_a_failed_step_falls_back_to_computed_values() {
        let reply = plan(
            json!([
                {"step_number": 1, "action_type": "tool_call", "tool_name": "add",
                 "parameters": {"input": {"a": 2, "b": 3}}},
                {"step_number": 2, "action_type": "tool_call", "tool_name": "divide",
                 "parameters": {"input": {"a": 1, "b": 0}}},
                {"step_number": 3, "action_type": "response", "parameters": {"answer": "RESULT_FROM_STEP_2"}}
            ]),
            false,
        );
        let response = agent(ScriptedPlanner::new([reply])).process("Add, then divide by zero", None).await;
        assert!(response.success);
        assert_eq!(response.result, "5");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_query_and_next_starts_fresh() {
        let planner = ScriptedPlanner::new([sum_plan()]).with_stall_first(Duration::from_secs(60));
        let agent = agent(planner).with_timeout(Duration::from_secs(10));

        let failed = agent.process_detailed("What is 2 + 3?", None).await;
        assert!(!failed.response.success);
        assert_eq!(failed.termination, Termination::Error);
        assert!(failed.response.result.starts_with("Error:"));
        assert!(failed.response.result.contains("did not answer within 10s"));

        let next = agent.process_detailed("What is 2 + 3?", None).await;
        assert!(next.response.success);
        assert_eq!(next.response.result, "5");
        assert_eq!(next.iterations, 1);
        assert_eq!(next.action_results.len(), 2);
    }

    #[tokio::test]
    async fn planner_error_is_fatal() {
        let planner = ScriptedPlanner::from_results(vec![Err(PlannerError::Network("connection reset".into()))]);
        let response = agent(planner).process("What is 2 + 3?", None).await;
        assert!(!response.success);
        assert!(response.result.contains("connection reset"));
    }

    #[tokio::test]
    async fn budget_exhaustion_still_answers() {
        let looping = plan(
            json!([{"step_number": 1, "action_type": "tool_call", "tool_name": "add",
                    "parameters": {"input": {"a": 2, "b": 3}}}]),
            true,
        );
        let planner = ScriptedPlanner::new([looping.clone(), looping.clone(), looping]);
        let outcome = agent(planner).with_max_iterations(3).process_detailed("keep adding", None).await;
        assert!(outcome.response.success);
        assert_eq!(outcome.termination, Termination::Budget);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.response.result, "5, 5, 5");
    }

    #[tokio::test]
    async fn unreadable_reply_is_recorded_and_loop_continues() {
        let agent = agent(ScriptedPlanner::new(["I think it is five".to_string(), sum_plan()]));
        let outcome = agent.process_detailed("What is 2 + 3?", None).await;
        assert!(outcome.response.success);
        assert_eq!(outcome.response.result, "5");
        assert_eq!(outcome.iterations, 2);
        let degraded = &outcome.action_results[0];
        assert!(!degraded.success);
        assert!(degraded.error.as_deref().unwrap().starts_with("planner reply unusable"));
    }

    #[tokio::test]
    async fn legacy_conversation_runs_to_final_answer() {
        let planner = Arc::new(ScriptedPlanner::new([
            r#"FUNCTION_CALL: {"name": "sum_list", "args": [2, 3], "reasoning_type": "Arithmetic", "step": "Add 2 and 3"}"#.to_string(),
            "SELF_CHECK: Is the result reasonable? -> Yes".to_string(),
            "FINAL_ANSWER: [Query: What is 2 + 3? Result: 5]".to_string(),
        ]));
        let agent = CognitiveAgent::new(planner.clone(), math_registry()).with_protocol(ProtocolKind::Legacy);
        let outcome = agent.process_detailed("What is 2 + 3?", None).await;

        assert_eq!(outcome.response.result, "5");
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.action_results.len(), 1);
        assert_eq!(outcome.action_results[0].step_number, 1);

        let prompts = planner.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].ends_with("Query: What is 2 + 3?"));
        assert!(prompts[1].contains("Called sum_list with [2,3] -> 5 What should I do next?"));
        assert!(prompts[2].contains("\"type\": \"self_check\""));
    }

    #[tokio::test]
    async fn legacy_fallback_is_never_the_answer() {
        let planner = ScriptedPlanner::new([
            r#"FUNCTION_CALL: {"name": "fallback_reasoning", "description": "units unclear"}"#.to_string(),
            "hmm".to_string(),
        ]);
        let agent = agent(planner).with_protocol(ProtocolKind::Legacy).with_max_iterations(2);
        let outcome = agent.process_detailed("convert this", None).await;
        assert_eq!(outcome.termination, Termination::Budget);
        assert_eq!(outcome.response.result, "Task completed");
    }

    #[tokio::test]
    async fn perception_facts_reach_memory_and_prompt() {
        let perception = json!({
            "intent": "calculation",
            "entities": ["2", "3"],
            "extracted_facts": ["the user prefers short answers"],
            "requires_tools": true
        })
        .to_string();
        let planner = Arc::new(ScriptedPlanner::new([perception, sum_plan()]));
        let memory = Arc::new(InMemoryFacts::new());
        let agent = CognitiveAgent::new(planner.clone(), math_registry()).with_memory(memory.clone());

        let response = agent.process("What is 2 + 3?", None).await;
        assert_eq!(response.result, "5");

        let recalled = memory.recall("short answers", 5, 0.3).await.unwrap();
        assert_eq!(recalled[0].content, "the user prefers short answers");
        assert_eq!(recalled[0].source, "perception");
        assert!(planner.prompts()[1].contains("\"intent\":\"calculation\""));
    }

    #[tokio::test]
    async fn memory_query_step_reads_facts() {
        let memory = Arc::new(InMemoryFacts::new());
        memory.store_facts(&["the tax rate is 8 percent".to_string()], "user").await.unwrap();
        let reply = plan(
            json!([{"step_number": 1, "action_type": "query_memory", "parameters": {"query": "tax rate"}}]),
            false,
        );
        let agent = agent(ScriptedPlanner::new([reply])).with_memory(memory);
        let outcome = agent.process_detailed("What tax rate do I use?", None).await;
        assert_eq!(
            outcome.action_results[0].result,
            Some(json!("the tax rate is 8 percent"))
        );
        // memory reads are not compute results
        assert_eq!(outcome.response.result, "Task completed");
    }

    #[tokio::test]
    async fn preferences_are_merged_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let memory = Arc::new(JsonFileMemory::open(&path));
        let agent = agent(ScriptedPlanner::new([sum_plan()])).with_memory(memory.clone());

        let mut prefs = Preferences::new();
        prefs.insert("format".into(), json!("short"));
        let response = agent.process("What is 2 + 3?", Some(&prefs)).await;
        assert!(response.success);

        assert!(path.exists());
        assert_eq!(memory.preferences().await.unwrap().get("format"), Some(&json!("short")));
        // compute results are remembered
        assert!(memory.count().await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn events_bracket_each_query() {
        let bus = Arc::new(EventBus::new(64));
        let mut rx = bus.subscribe();
        let agent = agent(ScriptedPlanner::new([sum_plan()])).with_event_bus(bus);
        agent.process("What is 2 + 3?", None).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.first().map(|e| e.as_ref()), Some(DomainEvent::QueryStarted { .. })));
        assert!(matches!(
            events.last().map(|e| e.as_ref()),
            Some(DomainEvent::QueryCompleted { success: true, iterations: 1, .. })
        ));
        let steps = events
            .iter()
            .filter(|e| matches!(e.as_ref(), DomainEvent::StepExecuted { .. }))
            .count();
        assert_eq!(steps, 2);
    }
}
