//! Table-driven pure capabilities.
//!
//! Each formula is a plain function over bound arguments; `MathCapability`
//! gives it a name, a description and a schema so the registry can hold it.

use async_trait::async_trait;
use cognitor_core::{
    BoundArguments, Capability, CapabilityError, CapabilityOutput, ParamSchema,
};
use serde_json::Value;

/// Why a formula refused its input.
#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    #[error(transparent)]
    Args(#[from] CapabilityError),

    #[error("{0}")]
    Domain(String),
}

pub(crate) fn domain(reason: impl Into<String>) -> CalcError {
    CalcError::Domain(reason.into())
}

pub type Formula = fn(&BoundArguments) -> Result<Value, CalcError>;

pub struct MathCapability {
    name: &'static str,
    description: &'static str,
    schema: ParamSchema,
    formula: Formula,
}

impl MathCapability {
    pub fn new(name: &'static str, description: &'static str, schema: ParamSchema, formula: Formula) -> Self {
        Self {
            name,
            description,
            schema,
            formula,
        }
    }
}

#[async_trait]
impl Capability for MathCapability {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn execute(&self, args: BoundArguments) -> Result<CapabilityOutput, CapabilityError> {
        match (self.formula)(&args) {
            Ok(value) => Ok(CapabilityOutput::value(value)),
            Err(CalcError::Args(e)) => Err(e),
            Err(CalcError::Domain(reason)) => Err(CapabilityError::failed(self.name, reason)),
        }
    }
}

/// Reject NaN and infinities before they reach a result.
pub(crate) fn finite(n: f64) -> Result<f64, CalcError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(domain("result is not a finite number"))
    }
}
