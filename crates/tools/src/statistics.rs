//! Descriptive statistics over a list of numbers.

use cognitor_core::value::number_value;
use cognitor_core::{BoundArguments, ParamSchema, ParamType};
use serde_json::Value;

use crate::math::{domain, CalcError, MathCapability};

pub fn capabilities() -> Vec<MathCapability> {
    let list = || ParamSchema::new().param("numbers", ParamType::Array);
    vec![
        MathCapability::new("mean", "Arithmetic mean of a list of numbers", list(), mean),
        MathCapability::new("median", "Median of a list of numbers", list(), median),
        MathCapability::new("mode", "Most frequent value(s) of a list, ascending", list(), mode),
        MathCapability::new("variance", "Population variance of a list of numbers", list(), variance),
        MathCapability::new("std_dev", "Population standard deviation of a list of numbers", list(), std_dev),
    ]
}

fn non_empty(args: &BoundArguments) -> Result<Vec<f64>, CalcError> {
    let numbers = args.numbers("numbers")?;
    if numbers.is_empty() {
        return Err(domain("list must not be empty"));
    }
    Ok(numbers)
}

fn average(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn population_variance(xs: &[f64]) -> f64 {
    let m = average(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

fn mean(args: &BoundArguments) -> Result<Value, CalcError> {
    Ok(number_value(average(&non_empty(args)?)))
}

fn median(args: &BoundArguments) -> Result<Value, CalcError> {
    let mut xs = non_empty(args)?;
    xs.sort_by(f64::total_cmp);
    let mid = xs.len() / 2;
    let m = if xs.len() % 2 == 0 {
        (xs[mid - 1] + xs[mid]) / 2.0
    } else {
        xs[mid]
    };
    Ok(number_value(m))
}

fn mode(args: &BoundArguments) -> Result<Value, CalcError> {
    let mut xs = non_empty(args)?;
    xs.sort_by(f64::total_cmp);

    let mut runs: Vec<(f64, usize)> = Vec::new();
    for x in xs {
        match runs.last_mut() {
            Some((v, n)) if *v == x => *n += 1,
            _ => runs.push((x, 1)),
        }
    }
    let best = runs.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let modes: Vec<Value> = runs
        .into_iter()
        .filter(|(_, n)| *n == best)
        .map(|(v, _)| number_value(v))
        .collect();

    Ok(match <[Value; 1]>::try_from(modes) {
        Ok([single]) => single,
        Err(many) => Value::Array(many),
    })
}

fn variance(args: &BoundArguments) -> Result<Value, CalcError> {
    Ok(number_value(population_variance(&non_empty(args)?)))
}

fn std_dev(args: &BoundArguments) -> Result<Value, CalcError> {
    Ok(number_value(population_variance(&non_empty(args)?).sqrt()))
}
