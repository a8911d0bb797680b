//! Geometry capabilities.

use cognitor_core::value::number_value;
use cognitor_core::{BoundArguments, ParamSchema, ParamType};
use serde_json::Value;
use std::f64::consts::PI;

use crate::math::{domain, finite, CalcError, MathCapability};

fn sides(names: &[&str]) -> ParamSchema {
    names
        .iter()
        .fold(ParamSchema::new(), |s, n| s.param(n, ParamType::Number))
}

pub fn capabilities() -> Vec<MathCapability> {
    vec![
        MathCapability::new("circle_area", "Area of a circle: pi * r^2", sides(&["radius"]), circle_area),
        MathCapability::new("circle_circumference", "Circumference of a circle: 2 * pi * r", sides(&["radius"]), circle_circumference),
        MathCapability::new("rectangle_area", "Area of a rectangle: width * height", sides(&["width", "height"]), rectangle_area),
        MathCapability::new("rectangle_perimeter", "Perimeter of a rectangle: 2 * (width + height)", sides(&["width", "height"]), rectangle_perimeter),
        MathCapability::new("triangle_area", "Area of a triangle: base * height / 2", sides(&["base", "height"]), triangle_area),
        MathCapability::new("hypotenuse", "Hypotenuse of a right triangle with legs a and b", sides(&["a", "b"]), hypotenuse),
    ]
}

/// Lengths are never negative.
fn length(args: &BoundArguments, name: &str) -> Result<f64, CalcError> {
    let v = args.f64(name)?;
    if v < 0.0 {
        return Err(domain(format!("{name} must not be negative")));
    }
    Ok(v)
}

fn out(n: f64) -> Result<Value, CalcError> {
    Ok(number_value(finite(n)?))
}

fn circle_area(args: &BoundArguments) -> Result<Value, CalcError> {
    let r = length(args, "radius")?;
    out(PI * r * r)
}

fn circle_circumference(args: &BoundArguments) -> Result<Value, CalcError> {
    out(2.0 * PI * length(args, "radius")?)
}

fn rectangle_area(args: &BoundArguments) -> Result<Value, CalcError> {
    out(length(args, "width")? * length(args, "height")?)
}

fn rectangle_perimeter(args: &BoundArguments) -> Result<Value, CalcError> {
    out(2.0 * (length(args, "width")? + length(args, "height")?))
}

fn triangle_area(args: &BoundArguments) -> Result<Value, CalcError> {
    out(length(args, "base")? * length(args, "height")? / 2.0)
}

fn hypotenuse(args: &BoundArguments) -> Result<Value, CalcError> {
    out(length(args, "a")?.hypot(length(args, "b")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::testing::{find, run};
    use serde_json::json;

    async fn call(name: &str, raw: Value) -> Option<Value> {
        let caps = capabilities();
        run(find(&caps, name), raw).await.ok().map(|o| o.into_result())
    }

    #[tokio::test]
    async fn rectangles_and_triangles() {
        assert_eq!(call("rectangle_area", json!([3, 4])).await, Some(json!(12)));
        assert_eq!(call("rectangle_perimeter", json!([3, 4])).await, Some(json!(14)));
        assert_eq!(call("triangle_area", json!([3, 4])).await, Some(json!(6)));
        assert_eq!(call("hypotenuse", json!([3, 4])).await, Some(json!(5)));
    }

    #[tokio::test]
    async fn circles() {
        let area = call("circle_area", json!({"radius": 1})).await.unwrap();
        assert!((area.as_f64().unwrap() - PI).abs() < 1e-12);
        assert_eq!(call("circle_area", json!({"radius": 0})).await, Some(json!(0)));
    }

    #[tokio::test]
    async fn negative_lengths_fail() {
        assert_eq!(call("circle_circumference", json!([-1])).await, None);
    }
}
