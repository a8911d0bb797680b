//! Boolean and comparison capabilities.

use cognitor_core::{BoundArguments, ParamSchema, ParamType};
use serde_json::Value;

use crate::math::{CalcError, MathCapability};

fn two_flags() -> ParamSchema {
    ParamSchema::new()
        .param("a", ParamType::Boolean)
        .param("b", ParamType::Boolean)
}

pub fn capabilities() -> Vec<MathCapability> {
    vec![
        MathCapability::new("logical_and", "a AND b", two_flags(), |args| Ok(Value::Bool(args.bool("a")? && args.bool("b")?))),
        MathCapability::new("logical_or", "a OR b", two_flags(), |args| Ok(Value::Bool(args.bool("a")? || args.bool("b")?))),
        MathCapability::new("logical_xor", "a XOR b", two_flags(), |args| Ok(Value::Bool(args.bool("a")? ^ args.bool("b")?))),
        MathCapability::new(
            "logical_not",
            "NOT a",
            ParamSchema::new().param("a", ParamType::Boolean),
            |args| Ok(Value::Bool(!args.bool("a")?)),
        ),
        MathCapability::new(
            "compare_numbers",
            "Compare a with b: \"greater\", \"less\" or \"equal\"",
            ParamSchema::new()
                .param("a", ParamType::Number)
                .param("b", ParamType::Number),
            compare_numbers,
        ),
        MathCapability::new(
            "is_even",
            "Whether an integer is even",
            ParamSchema::new().param("n", ParamType::Integer),
            |args| Ok(Value::Bool(args.i64("n")? % 2 == 0)),
        ),
    ]
}

fn compare_numbers(args: &BoundArguments) -> Result<Value, CalcError> {
    let (a, b) = (args.f64("a")?, args.f64("b")?);
    let word = match a.total_cmp(&b) {
        std::cmp::Ordering::Greater => "greater",
        std::cmp::Ordering::Less => "less",
        std::cmp::Ordering::Equal => "equal",
    };
    Ok(Value::String(word.into()))
}
