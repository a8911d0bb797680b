//! Capability trait and registry.
//!
//! A capability is a named, schema-described unit of work the planner can
//! ask for: an arithmetic formula, a salary lookup, an email send. The
//! registry is built once at startup and is read-only afterwards, so it can
//! be shared between concurrent queries behind an `Arc`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::binding::bind;
use crate::error::{CapabilityError, RegistryError};
use crate::value::{display_value, number_value};

/// Declared type of a capability parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Ordered parameter list. Order matters: positional arguments are zipped
/// against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required parameter.
    pub fn param(mut self, name: &str, kind: ParamType) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
            default: None,
        });
        self
    }

    /// Append a parameter that falls back to `default` when absent.
    pub fn optional(mut self, name: &str, kind: ParamType, default: Value) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
            default: Some(default),
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_required()).count()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// JSON Schema form, for planners that want one.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(p.kind.as_str().into()));
            if let Some(default) = &p.default {
                prop.insert("default".into(), default.clone());
            }
            properties.insert(p.name.clone(), Value::Object(prop));
        }
        let required: Vec<Value> = self
            .params
            .iter()
            .filter(|p| p.is_required())
            .map(|p| Value::String(p.name.clone()))
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Whether a capability computes a value or acts on the outside world.
///
/// Side-effecting results are never offered as the final answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    #[default]
    Compute,
    SideEffect,
}

/// Arguments after binding: one canonical keyed form.
///
/// Values the caller supplied live in `values`; schema defaults for
/// parameters the caller left out are consulted by the accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl BoundArguments {
    pub fn new(values: Map<String, Value>, defaults: Map<String, Value>) -> Self {
        Self { values, defaults }
    }

    /// The caller-supplied values, coerced.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .get(name)
            .filter(|v| !v.is_null())
            .or_else(|| self.defaults.get(name))
    }

    fn require(&self, name: &str) -> Result<&Value, CapabilityError> {
        self.get(name)
            .ok_or_else(|| CapabilityError::InvalidArguments(format!("missing parameter `{name}`")))
    }

    pub fn f64(&self, name: &str) -> Result<f64, CapabilityError> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| CapabilityError::InvalidArguments(format!("`{name}` must be a number")))
    }

    pub fn i64(&self, name: &str) -> Result<i64, CapabilityError> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| CapabilityError::InvalidArguments(format!("`{name}` must be an integer")))
    }

    pub fn bool(&self, name: &str) -> Result<bool, CapabilityError> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| CapabilityError::InvalidArguments(format!("`{name}` must be a boolean")))
    }

    pub fn str(&self, name: &str) -> Result<String, CapabilityError> {
        Ok(display_value(self.require(name)?))
    }

    pub fn array(&self, name: &str) -> Result<&Vec<Value>, CapabilityError> {
        self.require(name)?
            .as_array()
            .ok_or_else(|| CapabilityError::InvalidArguments(format!("`{name}` must be a list")))
    }

    /// A list parameter whose items must all be numeric.
    pub fn numbers(&self, name: &str) -> Result<Vec<f64>, CapabilityError> {
        self.array(name)?
            .iter()
            .map(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CapabilityError::InvalidArguments(format!("`{name}` must hold numbers")))
    }
}

/// What a capability hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityOutput {
    pub success: bool,

    /// Display text.
    pub output: String,

    /// Structured result, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CapabilityOutput {
    /// A successful structured result; the display text is derived from it.
    pub fn value(data: Value) -> Self {
        Self {
            success: true,
            output: display_value(&data),
            data: Some(data),
        }
    }

    pub fn number(n: f64) -> Self {
        Self::value(number_value(n))
    }

    pub fn text(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    /// A completed call that reports failure without raising.
    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            data: None,
        }
    }

    /// The value recorded in an action result.
    pub fn into_result(self) -> Value {
        self.data.unwrap_or(Value::String(self.output))
    }
}

/// Description of a capability, as listed to planners and users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
    pub kind: CapabilityKind,
}

impl CapabilityDescriptor {
    /// `name(a: integer, b: integer)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind))
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// The core Capability trait.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name the planner refers to.
    fn name(&self) -> &str;

    /// What it does, sent to the planner.
    fn description(&self) -> &str;

    fn schema(&self) -> &ParamSchema;

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Compute
    }

    /// Run with arguments already bound against `schema()`.
    async fn execute(&self, args: BoundArguments) -> Result<CapabilityOutput, CapabilityError>;

    fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema().params().to_vec(),
            kind: self.kind(),
        }
    }
}

/// Name-indexed capability table that keeps registration order.
pub struct CapabilityRegistry {
    entries: Vec<Box<dyn Capability>>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a capability. Names are unique.
    pub fn register(&mut self, capability: Box<dyn Capability>) -> Result<(), RegistryError> {
        let name = capability.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.index.insert(name, self.entries.len());
        self.entries.push(capability);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn Capability, CapabilityError> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].as_ref())
            .ok_or_else(|| CapabilityError::NotFound(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<CapabilityDescriptor> {
        self.entries.iter().map(|c| c.descriptor()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.name()).collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<CapabilityKind> {
        self.resolve(name).ok().map(|c| c.kind())
    }

    /// Resolve, bind and execute in one go.
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<CapabilityOutput, CapabilityError> {
        let capability = self.resolve(name)?;
        let bound = bind(name, capability.schema(), arguments)?;
        capability.execute(bound).await
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
