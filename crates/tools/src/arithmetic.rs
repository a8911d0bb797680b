//! Arithmetic capabilities: two-operand operators, list folds and sequences.

use cognitor_core::value::number_value;
use cognitor_core::{BoundArguments, ParamSchema, ParamType};
use serde_json::Value;

use crate::math::{domain, finite, CalcError, MathCapability};

fn pair() -> ParamSchema {
    ParamSchema::new()
        .param("a", ParamType::Number)
        .param("b", ParamType::Number)
}

fn one(name: &str, kind: ParamType) -> ParamSchema {
    ParamSchema::new().param(name, kind)
}

pub fn capabilities() -> Vec<MathCapability> {
    vec![
        MathCapability::new("add", "Add two numbers: a + b", pair(), add),
        MathCapability::new("subtract", "Subtract b from a: a - b", pair(), subtract),
        MathCapability::new("multiply", "Multiply two numbers: a * b", pair(), multiply),
        MathCapability::new("divide", "Divide a by b (b must not be zero)", pair(), divide),
        MathCapability::new("power", "Raise a to the power b", pair(), power),
        MathCapability::new("sqrt", "Square root of a non-negative number", one("a", ParamType::Number), sqrt),
        MathCapability::new("cbrt", "Cube root of a number", one("a", ParamType::Number), cbrt),
        MathCapability::new("factorial", "Factorial n! of a non-negative integer", one("n", ParamType::Integer), factorial),
        MathCapability::new("sum_list", "Sum of a list of numbers (0 for an empty list)", one("numbers", ParamType::Array), sum_list),
        MathCapability::new("product_list", "Product of a list of numbers (0 for an empty list)", one("numbers", ParamType::Array), product_list),
        MathCapability::new(
            "percentage",
            "percent% of number, e.g. percentage(10, 5000) = 500",
            ParamSchema::new()
                .param("percent", ParamType::Number)
                .param("number", ParamType::Number),
            percentage,
        ),
        MathCapability::new("ascii_values", "ASCII/Unicode code of every character in a string", one("text", ParamType::String), ascii_values),
        MathCapability::new("exponential_values", "e raised to each number in a list", one("numbers", ParamType::Array), exponential_values),
        MathCapability::new("exponential_sum", "Sum of e raised to each number in a list", one("numbers", ParamType::Array), exponential_sum),
        MathCapability::new("fibonacci_numbers", "The first n Fibonacci numbers, starting 0, 1", one("n", ParamType::Integer), fibonacci_numbers),
        MathCapability::new("factorial_list", "Factorials 0! through (n-1)!", one("n", ParamType::Integer), factorial_list),
        MathCapability::new(
            "permutation",
            "Ordered selections of r items from n: n! / (n-r)!",
            ParamSchema::new().param("n", ParamType::Integer).param("r", ParamType::Integer),
            permutation,
        ),
        MathCapability::new(
            "combination",
            "Unordered selections of r items from n: n! / (r! (n-r)!)",
            ParamSchema::new().param("n", ParamType::Integer).param("r", ParamType::Integer),
            combination,
        ),
    ]
}

fn number(n: f64) -> Result<Value, CalcError> {
    Ok(number_value(finite(n)?))
}

fn add(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.f64("a")? + args.f64("b")?)
}

fn subtract(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.f64("a")? - args.f64("b")?)
}

fn multiply(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.f64("a")? * args.f64("b")?)
}

fn divide(args: &BoundArguments) -> Result<Value, CalcError> {
    let b = args.f64("b")?;
    if b == 0.0 {
        return Err(domain("Division by zero is not allowed"));
    }
    number(args.f64("a")? / b)
}

fn power(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.f64("a")?.powf(args.f64("b")?))
}

fn sqrt(args: &BoundArguments) -> Result<Value, CalcError> {
    let a = args.f64("a")?;
    if a < 0.0 {
        return Err(domain("Square root of a negative number"));
    }
    number(a.sqrt())
}

fn cbrt(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.f64("a")?.cbrt())
}

fn non_negative(args: &BoundArguments, name: &str) -> Result<u64, CalcError> {
    let n = args.i64(name)?;
    u64::try_from(n).map_err(|_| domain(format!("{name} must not be negative")))
}

/// `n!`, failing instead of overflowing.
fn checked_factorial(n: u64) -> Result<u128, CalcError> {
    (1..=n as u128).try_fold(1u128, |acc, k| {
        acc.checked_mul(k).ok_or_else(|| domain(format!("{n}! is too large")))
    })
}

fn factorial(args: &BoundArguments) -> Result<Value, CalcError> {
    let n = non_negative(args, "n")?;
    let f = checked_factorial(n)?;
    Ok(u64::try_from(f).map(Value::from).unwrap_or_else(|_| number_value(f as f64)))
}

fn sum_list(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.numbers("numbers")?.iter().sum())
}

fn product_list(args: &BoundArguments) -> Result<Value, CalcError> {
    let numbers = args.numbers("numbers")?;
    if numbers.is_empty() {
        return Ok(Value::from(0));
    }
    number(numbers.iter().product())
}

fn percentage(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.f64("percent")? / 100.0 * args.f64("number")?)
}

fn ascii_values(args: &BoundArguments) -> Result<Value, CalcError> {
    let text = args.str("text")?;
    Ok(Value::Array(text.chars().map(|c| Value::from(c as u32)).collect()))
}

fn exponential_values(args: &BoundArguments) -> Result<Value, CalcError> {
    let values = args
        .numbers("numbers")?
        .into_iter()
        .map(|x| number(x.exp()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(values))
}

fn exponential_sum(args: &BoundArguments) -> Result<Value, CalcError> {
    number(args.numbers("numbers")?.iter().map(|x| x.exp()).sum())
}

fn fibonacci_numbers(args: &BoundArguments) -> Result<Value, CalcError> {
    let n = non_negative(args, "n")? as usize;
    if n > 93 {
        return Err(domain("n must be at most 93"));
    }
    let mut fib: Vec<u64> = Vec::with_capacity(n);
    for i in 0..n {
        let next = if i < 2 { i as u64 } else { fib[i - 1] + fib[i - 2] };
        fib.push(next);
    }
    Ok(Value::Array(fib.into_iter().map(Value::from).collect()))
}

fn factorial_list(args: &BoundArguments) -> Result<Value, CalcError> {
    let n = args.i64("n")?;
    if n < 0 {
        return Err(domain("Factorial is not defined for negative numbers"));
    }
    if n == 0 {
        return Ok(Value::from(vec![1]));
    }
    // 21! does not fit in a u64
    if n > 21 {
        return Err(domain("n must be at most 21"));
    }
    let mut out = Vec::with_capacity(n as usize);
    let mut current: u64 = 1;
    out.push(Value::from(current));
    for i in 1..n as u64 {
        current = current
            .checked_mul(i)
            .ok_or_else(|| domain(format!("{i}! is too large")))?;
        out.push(Value::from(current));
    }
    Ok(Value::Array(out))
}

fn n_and_r(args: &BoundArguments, what: &str) -> Result<(u64, u64), CalcError> {
    let (n, r) = (args.i64("n")?, args.i64("r")?);
    if n < 0 || r < 0 || r > n {
        return Err(domain(format!("Invalid values for n and r in {what}")));
    }
    Ok((n as u64, r as u64))
}

fn permutation(args: &BoundArguments) -> Result<Value, CalcError> {
    let (n, r) = n_and_r(args, "permutation")?;
    let p = ((n - r + 1)..=n).try_fold(1u128, |acc, k| {
        acc.checked_mul(k as u128).ok_or_else(|| domain("permutation is too large"))
    })?;
    Ok(u64::try_from(p).map(Value::from).unwrap_or_else(|_| number_value(p as f64)))
}

fn combination(args: &BoundArguments) -> Result<Value, CalcError> {
    let (n, r) = n_and_r(args, "combination")?;
    let r = r.min(n - r);
    let mut c: u128 = 1;
    for i in 0..r {
        c = c
            .checked_mul((n - i) as u128)
            .ok_or_else(|| domain("combination is too large"))?
            / (i as u128 + 1);
    }
    Ok(u64::try_from(c).map(Value::from).unwrap_or_else(|_| number_value(c as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::testing::{find, run};
    use cognitor_core::CapabilityError;
    use serde_json::json;

    async fn call(name: &str, raw: Value) -> Result<Value, CapabilityError> {
        let caps = capabilities();
        run(find(&caps, name), raw).await.map(|o| o.into_result())
    }

    #[tokio::test]
    async fn sum_list_of_two() {
        assert_eq!(call("sum_list", json!([2, 3])).await.unwrap(), json!(5));
        assert_eq!(call("sum_list", json!({"numbers": []})).await.unwrap(), json!(0));
    }

    #[tokio::test]
    async fn add_after_placeholder_substitution() {
        assert_eq!(call("add", json!({"a": 20, "b": 1})).await.unwrap(), json!(21));
        assert_eq!(call("add", json!({"a": "20", "b": "1"})).await.unwrap(), json!(21));
    }

    #[tokio::test]
    async fn division_by_zero_is_execution_failure() {
        let err = call("divide", json!([1, 0])).await.unwrap_err();
        assert!(matches!(err, CapabilityError::ExecutionFailed { capability, .. } if capability == "divide"));
        assert_eq!(call("divide", json!([10, 4])).await.unwrap(), json!(2.5));
    }

    #[tokio::test]
    async fn factorials() {
        assert_eq!(call("factorial", json!([5])).await.unwrap(), json!(120));
        assert!(call("factorial", json!([-1])).await.is_err());
        assert!(call("factorial", json!([40])).await.is_err());
        assert_eq!(call("factorial_list", json!([0])).await.unwrap(), json!([1]));
        assert_eq!(call("factorial_list", json!([5])).await.unwrap(), json!([1, 1, 2, 6, 24]));
    }

    #[tokio::test]
    async fn huge_factorial_list_fails_without_allocating() {
        let err = call("factorial_list", json!({"n": 1_000_000_000_000_000_000i64})).await.unwrap_err();
        assert!(matches!(err, CapabilityError::ExecutionFailed { capability, .. } if capability == "factorial_list"));
        let longest = call("factorial_list", json!([21])).await.unwrap();
        assert_eq!(longest.as_array().unwrap().len(), 21);
        assert!(call("factorial_list", json!([22])).await.is_err());
    }

    #[tokio::test]
    async fn permutations_and_combinations() {
        assert_eq!(call("permutation", json!([5, 2])).await.unwrap(), json!(20));
        assert_eq!(call("combination", json!([5, 2])).await.unwrap(), json!(10));
        assert_eq!(call("combination", json!([5, 0])).await.unwrap(), json!(1));
        assert!(call("permutation", json!([2, 5])).await.is_err());
    }

    #[tokio::test]
    async fn sequences() {
        assert_eq!(call("fibonacci_numbers", json!([6])).await.unwrap(), json!([0, 1, 1, 2, 3, 5]));
        assert_eq!(call("fibonacci_numbers", json!([1])).await.unwrap(), json!([0]));
        assert_eq!(call("ascii_values", json!(["AB"])).await.unwrap(), json!([65, 66]));
    }

    #[tokio::test]
    async fn percentage_and_roots() {
        assert_eq!(call("percentage", json!([10, 5000])).await.unwrap(), json!(500));
        assert_eq!(call("sqrt", json!([16])).await.unwrap(), json!(4));
        assert!(call("sqrt", json!([-4])).await.is_err());
        assert_eq!(call("cbrt", json!([27])).await.unwrap(), json!(3));
    }

    #[tokio::test]
    async fn exponentials() {
        assert_eq!(call("exponential_values", json!([0])).await.unwrap(), json!([1]));
        assert_eq!(call("exponential_sum", json!([0, 0])).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn product_of_empty_list_is_zero() {
        assert_eq!(call("product_list", json!({"numbers": []})).await.unwrap(), json!(0));
        assert_eq!(call("product_list", json!([2, 3, 4])).await.unwrap(), json!(24));
    }

    #[tokio::test]
    async fn non_numeric_list_is_invalid_arguments() {
        let err = call("sum_list", json!({"numbers": ["a"]})).await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidArguments(_)));
    }
}
