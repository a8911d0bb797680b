//! Parameter binding: raw planner arguments to a capability's schema.
//!
//! Planners send arguments as a list, as an object, or as an object nested
//! under a lone `"input"` key. That ambiguity is settled here, once, into
//! [`BoundArguments`].

use serde_json::{Map, Value};

use crate::capability::{BoundArguments, ParamSchema, ParamType};
use crate::error::BindingError;
use crate::value::format_number;

/// Key that wraps the real argument object.
pub const INPUT_KEY: &str = "input";

/// The two argument shapes a planner may send.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArguments {
    Positional(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl RawArguments {
    /// Classify a raw JSON value, unwrapping one level of `{"input": ...}`.
    pub fn from_value(raw: &Value) -> Result<Self, BindingError> {
        match raw {
            Value::Null => Ok(Self::Keyed(Map::new())),
            Value::Array(items) => Ok(Self::Positional(items.clone())),
            Value::Object(map) => match map.get(INPUT_KEY) {
                Some(inner @ (Value::Object(_) | Value::Array(_))) if map.len() == 1 => {
                    Self::from_value(inner)
                }
                _ => Ok(Self::Keyed(map.clone())),
            },
            other => Err(BindingError::InvalidShape(other.to_string())),
        }
    }
}

/// Bind `raw` against `schema`, coercing each declared parameter.
pub fn bind(capability: &str, schema: &ParamSchema, raw: &Value) -> Result<BoundArguments, BindingError> {
    let values = match RawArguments::from_value(raw)? {
        RawArguments::Keyed(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                let coerced = match schema.get(&key) {
                    Some(spec) => coerce(&key, spec.kind, value)?,
                    None => value,
                };
                out.insert(key, coerced);
            }
            out
        }
        RawArguments::Positional(items) => {
            let items = spread_single_list(schema, items);
            if items.len() < schema.required_count() {
                return Err(BindingError::MissingArguments {
                    capability: capability.to_string(),
                    required: schema.required_count(),
                    given: items.len(),
                });
            }
            let mut out = Map::new();
            for (spec, value) in schema.params().iter().zip(items) {
                out.insert(spec.name.clone(), coerce(&spec.name, spec.kind, value)?);
            }
            out
        }
    };

    let defaults = schema
        .params()
        .iter()
        .filter(|p| !values.contains_key(&p.name))
        .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
        .collect();

    Ok(BoundArguments::new(values, defaults))
}

// `sum_list([2, 3])`: a bare list handed to a capability whose only
// parameter is a list means the list itself.
fn spread_single_list(schema: &ParamSchema, items: Vec<Value>) -> Vec<Value> {
    match schema.params() {
        [only] if only.kind == ParamType::Array => {
            if items.len() == 1 && items[0].is_array() {
                items
            } else {
                vec![Value::Array(items)]
            }
        }
        _ => items,
    }
}

/// Coerce one value to its declared type.
pub fn coerce(parameter: &str, kind: ParamType, value: Value) -> Result<Value, BindingError> {
    if value.is_null() {
        return Ok(value);
    }
    let fail = |value: &Value| BindingError::Coercion {
        parameter: parameter.to_string(),
        expected: kind.to_string(),
        value: value.to_string(),
    };
    match kind {
        ParamType::Integer => match value.as_i64() {
            Some(i) => Ok(Value::from(i)),
            None => as_f64(&value)
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| Value::from(f as i64))
                .ok_or_else(|| fail(&value)),
        },
        ParamType::Number => as_f64(&value)
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| fail(&value)),
        ParamType::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::String(ref s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(ref s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(fail(&value)),
        },
        ParamType::Array => {
            let parsed = match value {
                Value::String(ref s) => serde_json::from_str::<Value>(s).ok().filter(Value::is_array),
                _ => None,
            };
            Ok(parsed.unwrap_or(value))
        }
        ParamType::Object => Ok(value),
        ParamType::String => Ok(match value {
            Value::String(_) => value,
            Value::Number(n) => Value::String(match n.as_f64() {
                Some(f) if n.is_f64() => format_number(f),
                _ => n.to_string(),
            }),
            other => Value::String(other.to_string()),
        }),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
