//! Basic shape to path conversion.
//!
//! Only plain numeric geometry is converted. Anything with units,
//! percentages or rounded corners is left alone.

use std::collections::HashMap;

/// Geometry attributes consumed by the conversion, per element.
pub(crate) fn geometry_attrs(element: &str) -> &'static [&'static str] {
    match element {
        "rect" => &["x", "y", "width", "height"],
        "line" => &["x1", "y1", "x2", "y2"],
        "polyline" | "polygon" => &["points"],
        _ => &[],
    }
}

/// Compute path data for a basic shape.
///
/// `attrs` maps attribute names to their raw values. Returns `None` when
/// the element is not a convertible shape or its geometry can't be
/// expressed as plain numbers.
pub fn shape_to_path_data(element: &str, attrs: &HashMap<&str, &str>) -> Option<String> {
    match element {
        "rect" => rect(attrs),
        "line" => line(attrs),
        "polyline" => points(attrs.get("points")?, false),
        "polygon" => points(attrs.get("points")?, true),
        _ => None,
    }
}

fn rect(attrs: &HashMap<&str, &str>) -> Option<String> {
    if attrs.contains_key("rx") || attrs.contains_key("ry") {
        return None;
    }

    let x = number_or_zero(attrs.get("x"))?;
    let y = number_or_zero(attrs.get("y"))?;
    let width = number(attrs.get("width")?)?;
    let height = number(attrs.get("height")?)?;

    Some(format!(
        "M{} {}H{}V{}H{}z",
        x,
        y,
        x + width,
        y + height,
        x
    ))
}

fn line(attrs: &HashMap<&str, &str>) -> Option<String> {
    let x1 = number_or_zero(attrs.get("x1"))?;
    let y1 = number_or_zero(attrs.get("y1"))?;
    let x2 = number_or_zero(attrs.get("x2"))?;
    let y2 = number_or_zero(attrs.get("y2"))?;

    Some(format!("M{} {}L{} {}", x1, y1, x2, y2))
}

fn points(raw: &str, close: bool) -> Option<String> {
    let coords: Vec<f64> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok())
        .collect::<Option<_>>()?;

    if coords.len() < 4 || coords.len() % 2 != 0 {
        return None;
    }

    let mut d = String::new();
    for (i, pair) in coords.chunks(2).enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{}{} {}", cmd, pair[0], pair[1]));
    }
    if close {
        d.push('z');
    }

    Some(d)
}

fn number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_or_zero(raw: Option<&&str>) -> Option<f64> {
    match raw {
        Some(raw) => number(raw),
        None => Some(0.0),
    }
}
