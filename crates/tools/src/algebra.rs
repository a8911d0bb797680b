//! Algebra capabilities.

use cognitor_core::value::number_value;
use cognitor_core::{BoundArguments, ParamSchema, ParamType};
use serde_json::Value;

use crate::expression;
use crate::math::{domain, finite, CalcError, MathCapability};

fn coefficients() -> ParamSchema {
    ParamSchema::new()
        .param("a", ParamType::Number)
        .param("b", ParamType::Number)
        .param("c", ParamType::Number)
}

pub fn capabilities() -> Vec<MathCapability> {
    vec![
        MathCapability::new(
            "solve_linear_equation",
            "Solve a*x + b = c for x, e.g. 2x + 1 = 41 is a=2, b=1, c=41",
            coefficients(),
            solve_linear_equation,
        ),
        MathCapability::new(
            "solve_quadratic",
            "Real roots of a*x^2 + b*x + c = 0, largest first",
            coefficients(),
            solve_quadratic,
        ),
        MathCapability::new(
            "evaluate_expression",
            "Evaluate an arithmetic expression with + - * / ^ and parentheses",
            ParamSchema::new().param("expression", ParamType::String),
            evaluate_expression,
        ),
    ]
}

fn solve_linear_equation(args: &BoundArguments) -> Result<Value, CalcError> {
    let (a, b, c) = (args.f64("a")?, args.f64("b")?, args.f64("c")?);
    if a == 0.0 {
        return Err(domain("coefficient a must not be zero"));
    }
    Ok(number_value(finite((c - b) / a)?))
}

fn solve_quadratic(args: &BoundArguments) -> Result<Value, CalcError> {
    let (a, b, c) = (args.f64("a")?, args.f64("b")?, args.f64("c")?);
    if a == 0.0 {
        return Err(domain("coefficient a must not be zero"));
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Err(domain("equation has no real roots"));
    }
    let root = disc.sqrt();
    let mut roots = vec![(-b + root) / (2.0 * a), (-b - root) / (2.0 * a)];
    roots.sort_by(|x, y| y.total_cmp(x));
    roots.dedup();
    Ok(Value::Array(roots.into_iter().map(number_value).collect()))
}

fn evaluate_expression(args: &BoundArguments) -> Result<Value, CalcError> {
    let expr = args.str("expression")?;
    let value = expression::evaluate(&expr).map_err(|e| domain(e.to_string()))?;
    Ok(number_value(finite(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::testing::{find, run};
    use serde_json::json;

    async fn call(name: &str, raw: Value) -> Result<Value, cognitor_core::CapabilityError> {
        let caps = capabilities();
        run(find(&caps, name), raw).await.map(|o| o.into_result())
    }

    #[tokio::test]
    async fn consecutive_numbers_summing_to_41() {
        let x = call("solve_linear_equation", json!({"input": {"a": 2, "b": 1, "c": 41}})).await.unwrap();
        assert_eq!(x, json!(20));
    }

    #[tokio::test]
    async fn linear_with_zero_slope_fails() {
        assert!(call("solve_linear_equation", json!([0, 1, 2])).await.is_err());
    }

    #[tokio::test]
    async fn quadratic_roots() {
        assert_eq!(call("solve_quadratic", json!([1, -3, 2])).await.unwrap(), json!([2, 1]));
        assert_eq!(call("solve_quadratic", json!([1, 2, 1])).await.unwrap(), json!([-1]));
        assert!(call("solve_quadratic", json!([1, 0, 1])).await.is_err());
    }

    #[tokio::test]
    async fn expressions() {
        assert_eq!(call("evaluate_expression", json!(["2 + 3"])).await.unwrap(), json!(5));
        assert_eq!(call("evaluate_expression", json!({"expression": "10 / 4"})).await.unwrap(), json!(2.5));
        assert!(call("evaluate_expression", json!(["1 / 0"])).await.is_err());
    }
}
