//! Escape hatch the planner can call when no other capability fits.

use async_trait::async_trait;
use cognitor_core::{
    BoundArguments, Capability, CapabilityError, CapabilityKind, CapabilityOutput, ParamSchema, ParamType,
};

pub struct FallbackReasoning {
    schema: ParamSchema,
}

impl FallbackReasoning {
    pub fn new() -> Self {
        Self {
            schema: ParamSchema::new().param("description", ParamType::String),
        }
    }
}

impl Default for FallbackReasoning {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Capability for FallbackReasoning {
    fn name(&self) -> &str {
        "fallback_reasoning"
    }

    fn description(&self) -> &str {
        "Record that no capability fits; describe what is unresolved"
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    // Its text is a note, never an answer.
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::SideEffect
    }

    async fn execute(&self, args: BoundArguments) -> Result<CapabilityOutput, CapabilityError> {
        let description = args.str("description")?;
        Ok(CapabilityOutput::text(format!("Fallback invoked: {description}")))
    }
}
