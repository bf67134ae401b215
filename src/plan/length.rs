//! Length expressions used in edit plans.
//!
//! An expression is a sum of terms separated by `+` or `-`. A term is an
//! atom optionally multiplied or divided by plain numbers:
//!
//! - `<number><unit>` with unit `in`, `pt`, `cm` or `emu` (no unit means EMU)
//! - `slide_width`, `slide_height`
//! - `$name[i]`, element `i` of an offset list
//! - `$name.left` (also `top`, `width`, `height`, `right`, `bottom`)
//!
//! For example `"$lefts[1] + 3in + 0.2in"` or `"slide_width / 2 - 1.5in"`.

use crate::error::{Error, Result};
use crate::model::Emu;

/// A side or extent of a bound shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Top,
    Width,
    Height,
    Right,
    Bottom,
}

impl Edge {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "left" | "x" => Some(Edge::Left),
            "top" | "y" => Some(Edge::Top),
            "width" => Some(Edge::Width),
            "height" => Some(Edge::Height),
            "right" => Some(Edge::Right),
            "bottom" => Some(Edge::Bottom),
            _ => None,
        }
    }
}

/// Values an expression can refer to.
pub trait LengthScope {
    fn slide_width(&self) -> Emu;
    fn slide_height(&self) -> Emu;
    /// Element `index` of the offset list bound to `name`.
    fn offset(&self, name: &str, index: usize) -> Result<Emu>;
    /// An edge of the shape bound to `name`.
    fn edge(&self, name: &str, edge: Edge) -> Result<Emu>;
}

fn invalid(expr: &str, why: impl std::fmt::Display) -> Error {
    Error::InvalidLength(format!("{:?}: {}", expr, why))
}

/// Evaluate an expression to EMU, rounding to the nearest unit.
pub fn evaluate(expr: &str, scope: &dyn LengthScope) -> Result<Emu> {
    let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(invalid(expr, "empty expression"));
    }

    // Split into signed terms; a sign right after `*` or `/` belongs to the factor
    let bytes = compact.as_bytes();
    let mut terms: Vec<(f64, &str)> = Vec::new();
    let mut sign = 1.0;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'+' && b != b'-' {
            continue;
        }
        let value = if b == b'-' { -1.0 } else { 1.0 };
        if i == 0 {
            sign = value;
            start = 1;
        } else if i > start && !matches!(bytes[i - 1], b'*' | b'/') {
            terms.push((sign, &compact[start..i]));
            sign = value;
            start = i + 1;
        }
    }
    terms.push((sign, &compact[start..]));

    let mut total = 0.0;
    for (sign, term) in terms {
        total += sign * evaluate_term(expr, term, scope)?;
    }

    if !total.is_finite() {
        return Err(invalid(expr, "result is not a finite number"));
    }
    if total.abs() > Emu::LIMIT as f64 {
        return Err(invalid(expr, "result is out of range"));
    }
    Ok(Emu(total.round() as i64))
}

fn evaluate_term(expr: &str, term: &str, scope: &dyn LengthScope) -> Result<f64> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for (i, c) in term.char_indices() {
        if c == '*' || c == '/' {
            pieces.push(&term[last..i]);
            pieces.push(&term[i..i + 1]);
            last = i + 1;
        }
    }
    pieces.push(&term[last..]);

    let mut value = evaluate_atom(expr, pieces[0], scope)?;
    for pair in pieces[1..].chunks(2) {
        let [op, factor] = pair else {
            return Err(invalid(expr, "dangling operator"));
        };
        let factor: f64 = factor
            .parse()
            .map_err(|_| invalid(expr, format!("{:?} is not a plain number", factor)))?;
        match *op {
            "*" => value *= factor,
            _ if factor == 0.0 => return Err(invalid(expr, "division by zero")),
            _ => value /= factor,
        }
    }
    Ok(value)
}

fn evaluate_atom(expr: &str, atom: &str, scope: &dyn LengthScope) -> Result<f64> {
    match atom {
        "slide_width" => return Ok(scope.slide_width().get() as f64),
        "slide_height" => return Ok(scope.slide_height().get() as f64),
        "" => return Err(invalid(expr, "missing term")),
        _ => {}
    }

    if let Some(reference) = atom.strip_prefix('$') {
        return evaluate_reference(expr, reference, scope).map(|e| e.get() as f64);
    }

    let split = atom
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(atom.len());
    let (number, unit) = atom.split_at(split);
    let number: f64 = number
        .parse()
        .map_err(|_| invalid(expr, format!("{:?} is not a length", atom)))?;

    let per_unit = match unit.to_ascii_lowercase().as_str() {
        "in" | "inch" | "inches" => Emu::PER_INCH as f64,
        "pt" => Emu::PER_POINT as f64,
        "cm" => Emu::PER_CM as f64,
        "mm" => Emu::PER_CM as f64 / 10.0,
        "emu" | "" => 1.0,
        other => return Err(invalid(expr, format!("unknown unit {:?}", other))),
    };
    Ok(number * per_unit)
}

fn evaluate_reference(expr: &str, reference: &str, scope: &dyn LengthScope) -> Result<Emu> {
    if let Some((name, rest)) = reference.split_once('[') {
        let index = rest
            .strip_suffix(']')
            .and_then(|i| i.parse::<usize>().ok())
            .ok_or_else(|| invalid(expr, format!("bad index in ${}", reference)))?;
        return scope.offset(name, index);
    }
    if let Some((name, edge)) = reference.split_once('.') {
        let edge =
            Edge::parse(edge).ok_or_else(|| invalid(expr, format!("unknown edge {:?}", edge)))?;
        return scope.edge(name, edge);
    }
    Err(invalid(
        expr,
        format!("${} needs an index or an edge such as ${}.right", reference, reference),
    ))
}
