//! Applies edit plans to an in-memory presentation.

use super::length::{evaluate, Edge, LengthScope};
use super::{EditPlan, Length, Operation, ShapeRef, SlideRef};
use crate::error::{Error, Result};
use crate::model::{Emu, Presentation, ShapeId};
use crate::ops::{self, ArrowStyle, TextBoxSpec};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A value bound with `"as"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Shape { slide: usize, id: ShapeId },
    Offsets(Vec<Emu>),
    Slide(usize),
}

/// Runs operations in order, keeping the names they bind.
pub struct Interpreter<'a> {
    prs: &'a mut Presentation,
    bindings: HashMap<String, Binding>,
}

/// Apply every operation of `plan`, stopping at the first failure.
///
/// Returns one note per operation. On error the presentation may be
/// partially modified; callers discard it instead of saving.
pub fn apply_plan(prs: &mut Presentation, plan: &EditPlan) -> Result<Vec<String>> {
    let mut interpreter = Interpreter::new(prs);
    let mut notes = Vec::with_capacity(plan.operations.len());
    for (i, op) in plan.operations.iter().enumerate() {
        match interpreter.run(op) {
            Ok(note) => {
                debug!(step = i + 1, op = op.name(), %note, "applied");
                notes.push(note);
            }
            Err(e) => {
                warn!(step = i + 1, op = op.name(), error = %e, "operation failed");
                return Err(e);
            }
        }
    }
    Ok(notes)
}

fn binding_name(name: &str) -> &str {
    name.strip_prefix('$').unwrap_or(name)
}

impl<'a> Interpreter<'a> {
    pub fn new(prs: &'a mut Presentation) -> Self {
        Self {
            prs,
            bindings: HashMap::new(),
        }
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(binding_name(name))
    }

    fn bind(&mut self, name: Option<&str>, value: Binding) {
        if let Some(name) = name {
            self.bindings.insert(binding_name(name).to_string(), value);
        }
    }

    fn lookup(&self, name: &str) -> Result<&Binding> {
        self.binding(name)
            .ok_or_else(|| Error::UnknownBinding(binding_name(name).to_string()))
    }

    fn slide_index(&self, slide: &SlideRef) -> Result<usize> {
        let index = match slide {
            SlideRef::Index(i) => *i,
            SlideRef::Name(name) if name.starts_with('$') => match self.lookup(name)? {
                Binding::Slide(i) => return Ok(*i),
                _ => {
                    return Err(Error::InvalidPlan(format!(
                        "{} is not bound to a slide",
                        name
                    )))
                }
            },
            SlideRef::Name(text) => text.trim().parse::<i64>().map_err(|_| {
                Error::InvalidPlan(format!("{:?} is not a slide index", text))
            })?,
        };
        // Range errors carry the index and slide count
        ops::get_slide(&*self.prs, index)?;
        Ok(index as usize)
    }

    fn length(&self, length: &Length) -> Result<Emu> {
        fn out_of_range(v: impl std::fmt::Display) -> Error {
            Error::InvalidLength(format!("{} is out of range", v))
        }
        match length {
            Length::Emu(v) => Emu::bounded(*v).ok_or_else(|| out_of_range(v)),
            Length::Number(v) if v.is_finite() && v.abs() <= Emu::LIMIT as f64 => {
                Ok(Emu(v.round() as i64))
            }
            Length::Number(v) => Err(out_of_range(v)),
            Length::Expr(expr) => evaluate(expr, self),
        }
    }

    /// Resolve a shape reference; a missing title yields `None`.
    fn try_shape(&self, slide: usize, shape: &ShapeRef) -> Result<Option<ShapeId>> {
        match shape {
            ShapeRef::Id(id) => Ok(Some(ShapeId(*id))),
            ShapeRef::Name(name) if name.eq_ignore_ascii_case("title") => {
                Ok(self.prs.slides()[slide].title_id())
            }
            ShapeRef::Name(name) if name.starts_with('$') => match self.lookup(name)? {
                Binding::Shape { slide: bound, id } if *bound == slide => Ok(Some(*id)),
                Binding::Shape { slide: bound, .. } => Err(Error::InvalidPlan(format!(
                    "{} is on slide {}, not slide {}",
                    name, bound, slide
                ))),
                _ => Err(Error::InvalidPlan(format!("{} is not bound to a shape", name))),
            },
            ShapeRef::Name(text) => text
                .trim()
                .parse::<u32>()
                .map(|id| Some(ShapeId(id)))
                .map_err(|_| Error::InvalidPlan(format!("{:?} is not a shape reference", text))),
        }
    }

    fn shape(&self, slide: usize, shape: &ShapeRef) -> Result<ShapeId> {
        self.try_shape(slide, shape)?
            .ok_or(Error::NoTitlePlaceholder)
    }

    /// Apply one operation and describe what it did.
    pub fn run(&mut self, op: &Operation) -> Result<String> {
        match op {
            Operation::DeleteShapesExcept { slide, keep } => {
                let index = self.slide_index(slide)?;
                let keep = keep
                    .iter()
                    .map(|k| match k {
                        Some(k) => self.try_shape(index, k),
                        None => Ok(None),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let slide = ops::get_slide_mut(self.prs, index as i64)?;
                let removed = ops::delete_shapes_except(slide, &keep);
                Ok(format!("slide {}: removed {} shape(s)", index, removed))
            }

            Operation::RemoveConnectorsAndLines { slide } => {
                let index = self.slide_index(slide)?;
                let slide = ops::get_slide_mut(self.prs, index as i64)?;
                let removed = ops::remove_connectors_and_lines(slide);
                Ok(format!("slide {}: removed {} line(s)", index, removed))
            }

            Operation::AddRoundedTextbox {
                slide,
                text,
                left,
                top,
                width,
                height,
                fill_color,
                text_color,
                font_size,
                alignment,
                anchor,
                bind,
            } => {
                let index = self.slide_index(slide)?;
                let (left, top) = (self.length(left)?, self.length(top)?);
                let (width, height) = (self.length(width)?, self.length(height)?);
                if width.get() <= 0 || height.get() <= 0 {
                    return Err(Error::InvalidPlan(format!(
                        "text box size must be positive, got {}x{}",
                        width, height
                    )));
                }

                let mut spec = TextBoxSpec::new(text.as_str(), left, top, width, height);
                if let Some(color) = fill_color {
                    spec = spec.with_fill_color(*color);
                }
                if let Some(color) = text_color {
                    spec = spec.with_text_color(*color);
                }
                if let Some(size) = font_size {
                    if !(size.is_finite() && *size > 0.0) {
                        return Err(Error::InvalidPlan(format!("bad font size {}", size)));
                    }
                    spec = spec.with_font_size(*size);
                }
                if let Some(alignment) = alignment {
                    spec = spec.with_alignment(*alignment);
                }
                if let Some(anchor) = anchor {
                    spec = spec.with_anchor(*anchor);
                }

                let slide = ops::get_slide_mut(self.prs, index as i64)?;
                let id = ops::add_rounded_textbox(slide, &spec);
                self.bind(bind.as_deref(), Binding::Shape { slide: index, id });
                Ok(format!("slide {}: added text box {}", index, id))
            }

            Operation::AddArrowBetween {
                slide,
                from,
                to,
                color,
                width,
                arrowhead,
                bind,
            } => {
                let index = self.slide_index(slide)?;
                let from = self.shape(index, from)?;
                let to = self.shape(index, to)?;

                let mut style = ArrowStyle::default();
                if let Some(color) = color {
                    style.color = *color;
                }
                if let Some(width) = width {
                    if !(width.is_finite() && *width > 0.0) {
                        return Err(Error::InvalidPlan(format!("bad line width {}", width)));
                    }
                    style.width = *width;
                }
                if let Some(head) = arrowhead {
                    style.head = *head;
                }

                let slide = ops::get_slide_mut(self.prs, index as i64)?;
                let id = ops::add_arrow_between(slide, from, to, &style)?;
                self.bind(bind.as_deref(), Binding::Shape { slide: index, id });
                Ok(format!("slide {}: added arrow {} from {} to {}", index, id, from, to))
            }

            Operation::DistributeHorizontally {
                total_width,
                count,
                box_width,
                gap,
                margin,
                bind,
            } => {
                let total = match total_width {
                    Some(l) => self.length(l)?,
                    None => self.prs.slide_width(),
                };
                let box_width = self.length(box_width)?;
                let gap = gap.as_ref().map(|g| self.length(g)).transpose()?;
                let margin = margin.as_ref().map(|m| self.length(m)).transpose()?;

                let offsets = ops::distribute_horizontally(
                    total,
                    *count,
                    box_width,
                    gap.unwrap_or(Emu::ZERO),
                    margin.unwrap_or_else(|| Emu::from_inches(0.5)),
                )?;
                let note = format!("bound ${} to {} offset(s)", binding_name(bind), offsets.len());
                self.bind(Some(bind.as_str()), Binding::Offsets(offsets));
                Ok(note)
            }

            Operation::AddSlide { layout, bind } => {
                let index = ops::add_slide(self.prs, layout.as_deref())?;
                self.bind(bind.as_deref(), Binding::Slide(index));
                Ok(format!("added slide {}", index))
            }

            Operation::SetTitle { slide, text } => {
                let index = self.slide_index(slide)?;
                let slide = ops::get_slide_mut(self.prs, index as i64)?;
                ops::set_title(slide, text)?;
                Ok(format!("slide {}: set title", index))
            }
        }
    }
}

impl LengthScope for Interpreter<'_> {
    fn slide_width(&self) -> Emu {
        self.prs.slide_width()
    }

    fn slide_height(&self) -> Emu {
        self.prs.slide_height()
    }

    fn offset(&self, name: &str, index: usize) -> Result<Emu> {
        match self.lookup(name)? {
            Binding::Offsets(offsets) => offsets.get(index).copied().ok_or_else(|| {
                Error::InvalidPlan(format!(
                    "${}[{}] is out of range; it holds {} offset(s)",
                    name,
                    index,
                    offsets.len()
                ))
            }),
            _ => Err(Error::InvalidPlan(format!("${} is not an offset list", name))),
        }
    }

    fn edge(&self, name: &str, edge: Edge) -> Result<Emu> {
        let Binding::Shape { slide, id } = self.lookup(name)? else {
            return Err(Error::InvalidPlan(format!("${} is not bound to a shape", name)));
        };
        let rect = self.prs.slides()[*slide]
            .shape(*id)
            .ok_or(Error::ShapeNotFound(id.0))?
            .geometry
            .ok_or(Error::MissingGeometry(id.0))?;
        Ok(match edge {
            Edge::Left => rect.left,
            Edge::Top => rect.top,
            Edge::Width => rect.width,
            Edge::Height => rect.height,
            Edge::Right => rect.right(),
            Edge::Bottom => rect.bottom(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArrowHead, ShapeKind};

    fn deck() -> Presentation {
        let mut prs = ops::new_presentation().unwrap();
        prs.add_slide(Some("Title Only")).unwrap();
        prs
    }

    #[test]
    fn test_boxes_and_arrows() {
        let plan = EditPlan::parse(
            r#"{"operations": [
                {"op": "set_title", "slide": 0, "text": "Flow"},
                {"op": "distribute_horizontally", "count": 2, "box_width": "3in", "gap": "1in", "as": "lefts"},
                {"op": "add_rounded_textbox", "slide": 0, "text": "A", "left": "$lefts[0]", "top": "2in", "width": "3in", "height": "1in", "as": "a"},
                {"op": "add_rounded_textbox", "slide": 0, "text": "B", "left": "$lefts[1]", "top": "$a.top", "width": "3in", "height": "1in", "as": "b"},
                {"op": "add_arrow_between", "slide": 0, "from": "$a", "to": "$b", "as": "link"}
            ]}"#,
        )
        .unwrap();

        let mut prs = deck();
        let notes = apply_plan(&mut prs, &plan).unwrap();
        assert_eq!(notes.len(), 5);

        let slide = &prs.slides()[0];
        assert_eq!(slide.title().and_then(|t| t.text()).as_deref(), Some("Flow"));
        let arrow = slide
            .shapes()
            .iter()
            .find(|s| s.kind == ShapeKind::Connector)
            .unwrap();
        assert_eq!(arrow.line.as_ref().unwrap().tail, Some(ArrowHead::Triangle));

        // 3in + 1in + 3in centered in 13.333in
        let a = slide.shapes().iter().find(|s| s.text().as_deref() == Some("A")).unwrap();
        let b = slide.shapes().iter().find(|s| s.text().as_deref() == Some("B")).unwrap();
        let (ra, rb) = (a.geometry.unwrap(), b.geometry.unwrap());
        assert_eq!(ra.left, Emu((12_192_000 - 7 * 914_400) / 2));
        assert_eq!(rb.left - ra.right(), Emu::from_inches(1.0));
        assert_eq!(arrow.connector.unwrap().begin, ra.right_center());
        assert_eq!(arrow.connector.unwrap().end, rb.left_center());
    }

    #[test]
    fn test_unknown_binding_fails() {
        let plan = EditPlan::parse(
            r#"[{"op": "add_arrow_between", "slide": 0, "from": "$x", "to": "title"}]"#,
        )
        .unwrap();
        let mut prs = deck();
        assert!(matches!(
            apply_plan(&mut prs, &plan),
            Err(Error::UnknownBinding(name)) if name == "x"
        ));
    }

    #[test]
    fn test_slide_out_of_range() {
        let plan =
            EditPlan::parse(r#"[{"op": "remove_connectors_and_lines", "slide": 3}]"#).unwrap();
        let mut prs = deck();
        assert!(matches!(
            apply_plan(&mut prs, &plan),
            Err(Error::SlideIndexOutOfRange { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_huge_length_is_rejected() {
        let plan = EditPlan::parse(
            r#"[{"op": "add_rounded_textbox", "slide": 0, "text": "A", "left": "99999999999999999999in", "top": "1in", "width": "3in", "height": "1in", "as": "a"},
                {"op": "add_rounded_textbox", "slide": 0, "text": "B", "left": "5in", "top": "1in", "width": "3in", "height": "1in", "as": "b"},
                {"op": "add_arrow_between", "slide": 0, "from": "$a", "to": "$b"}]"#,
        )
        .unwrap();
        let mut prs = deck();
        assert!(matches!(apply_plan(&mut prs, &plan), Err(Error::InvalidLength(_))));

        let plan = EditPlan::parse(
            r#"[{"op": "add_rounded_textbox", "slide": 0, "text": "A", "left": 9223372036854775807, "top": 0, "width": 10, "height": 10}]"#,
        )
        .unwrap();
        assert!(matches!(apply_plan(&mut prs, &plan), Err(Error::InvalidLength(_))));
    }

    #[test]
    fn test_huge_count_is_rejected() {
        let plan = EditPlan::parse(
            r#"[{"op": "distribute_horizontally", "count": 100000000000000000, "box_width": "3in", "gap": "0.2in", "as": "lefts"}]"#,
        )
        .unwrap();
        let mut prs = deck();
        assert!(matches!(apply_plan(&mut prs, &plan), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn test_add_slide_binding() {
        let plan = EditPlan::parse(
            r#"[{"op": "add_slide", "layout": "Title Only", "as": "s"},
                {"op": "set_title", "slide": "$s", "text": "Second"}]"#,
        )
        .unwrap();
        let mut prs = deck();
        apply_plan(&mut prs, &plan).unwrap();
        assert_eq!(prs.slide_count(), 2);
        assert_eq!(
            prs.slides()[1].title().and_then(|t| t.text()).as_deref(),
            Some("Second")
        );
    }
}
