//! # cognitor core
//!
//! Domain types, traits, and error definitions for the cognitor task agent.
//! Every other crate depends inward on this one: the capability registry and
//! parameter binder, the planner and fact-memory traits, plan/step/result
//! types, the response shape, and the domain event bus.

pub mod error;
pub mod value;
pub mod capability;
pub mod binding;
pub mod planner;
pub mod plan;
pub mod memory;
pub mod agent;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{
    BindingError, CapabilityError, Error, MemoryError, ParseError, PlannerError, RegistryError, Result,
};
pub use capability::{
    BoundArguments, Capability, CapabilityDescriptor, CapabilityKind, CapabilityOutput, CapabilityRegistry,
    ParamSchema, ParamSpec, ParamType,
};
pub use binding::{bind, RawArguments};
pub use planner::Planner;
pub use plan::{ActionResult, ActionStep, ActionType, Decision, Perception, PlannerReply};
pub use memory::{Fact, FactMemory, Preferences};
pub use agent::AgentResponse;
pub use event::{DomainEvent, EventBus};
