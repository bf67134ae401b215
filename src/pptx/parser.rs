//! PresentationML XML parsing.
//!
//! Slides are split into the raw XML of each shape-tree child so untouched
//! shapes can be written back byte-for-byte; each fragment is then parsed
//! into a [`Shape`] for inspection.

use crate::error::{Error, Result};
use crate::model::{
    ArrowHead, ColorValue, ConnectorEnds, Emu, Fill, LineStyle, Margins, PlaceholderType, Point,
    Rect, RgbColor, Shadow, ShadowStyle, Shape, ShapeId, ShapeKind, TextAlignment, TextFrame,
    TextParagraph, VerticalAnchor,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Attribute value by local name, unescaped.
pub(crate) fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.local_name().as_ref() == name {
            Some(
                a.unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned()),
            )
        } else {
            None
        }
    })
}

fn attr_i64(e: &BytesStart, name: &[u8]) -> Option<i64> {
    attr(e, name).and_then(|v| v.trim().parse().ok())
}

fn attr_flag(e: &BytesStart, name: &[u8]) -> bool {
    matches!(attr(e, name).as_deref(), Some("1") | Some("true"))
}

fn local_name(e: &BytesStart) -> Vec<u8> {
    e.name().local_name().as_ref().to_vec()
}

/// Slide size and slide relationship ids from `presentation.xml`.
#[derive(Debug, Default)]
pub(crate) struct PresentationInfo {
    pub slide_width: Emu,
    pub slide_height: Emu,
    /// `(p:sldId/@id, r:id)` in presentation order
    pub slides: Vec<(u32, String)>,
}

pub(crate) fn parse_presentation_xml(xml: &str) -> Result<PresentationInfo> {
    let mut info = PresentationInfo {
        slide_width: Emu::from_inches(10.0),
        slide_height: Emu::from_inches(7.5),
        slides: Vec::new(),
    };
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                match e.name().local_name().as_ref() {
                    b"sldSz" => {
                        if let Some(cx) = attr_i64(e, b"cx") {
                            info.slide_width = Emu(cx);
                        }
                        if let Some(cy) = attr_i64(e, b"cy") {
                            info.slide_height = Emu(cy);
                        }
                    }
                    b"sldId" => {
                        // `id` is unprefixed; `r:id` shares the local name, so match on the full key
                        let mut id = 0u32;
                        let mut rel_id = String::new();
                        for a in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&a.value).to_string();
                            if a.key.as_ref() == b"id" {
                                id = value.parse().unwrap_or(0);
                            } else if a.key.local_name().as_ref() == b"id" {
                                rel_id = value;
                            }
                        }
                        if !rel_id.is_empty() {
                            info.slides.push((id, rel_id));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
    }

    Ok(info)
}

/// `p:cSld/@name` of a layout or slide.
pub(crate) fn parse_common_slide_name(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.name().local_name().as_ref() == b"cSld" =>
            {
                return attr(e, b"name");
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// A slide's shape tree, split into raw pieces.
#[derive(Debug, Clone)]
pub(crate) struct SpTree {
    pub head: String,
    pub tail: String,
    pub fragments: Vec<String>,
    pub header_max_id: u32,
}

/// Split slide (or layout/master) XML around the children of `p:spTree`.
pub(crate) fn split_sp_tree(xml: &str) -> Result<SpTree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut child_start = 0usize;
    let mut tree_end: Option<usize> = None;
    // (local name, start, end) of each direct child
    let mut children: Vec<(Vec<u8>, usize, usize)> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        let after = reader.buffer_position() as usize;
        let is_child = tree_depth.map(|d| depth == d + 1).unwrap_or(false);

        match event {
            Event::Start(ref e) => {
                if tree_depth.is_none() && e.name().local_name().as_ref() == b"spTree" {
                    tree_depth = Some(depth);
                } else if is_child {
                    child_start = before;
                }
                depth += 1;
            }
            Event::Empty(ref e) if is_child => {
                children.push((local_name(e), before, after));
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                let now_child = tree_depth.map(|d| depth == d + 1).unwrap_or(false);
                if now_child {
                    children.push((e.name().local_name().as_ref().to_vec(), child_start, after));
                } else if tree_depth == Some(depth) {
                    tree_end = Some(before);
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let tree_end = tree_end.ok_or_else(|| Error::XmlParse("slide has no p:spTree".to_string()))?;

    let mut insert_at = None;
    let mut first_shape = None;
    let mut last_shape = None;
    let mut fragments = Vec::new();
    let mut header_max_id = 1;

    for (name, start, end) in children {
        match name.as_slice() {
            b"nvGrpSpPr" | b"grpSpPr" => {
                insert_at = Some(end);
                if name.as_slice() == b"nvGrpSpPr" {
                    if let Some(id) = max_cnvpr_id(&xml[start..end]) {
                        header_max_id = id;
                    }
                }
            }
            b"extLst" => {}
            _ => {
                first_shape.get_or_insert(start);
                last_shape = Some(end);
                fragments.push(xml[start..end].to_string());
            }
        }
    }

    let insert_at = insert_at.unwrap_or(tree_end);
    let head_end = first_shape.unwrap_or(insert_at);
    let tail_start = last_shape.unwrap_or(insert_at);

    Ok(SpTree {
        head: xml[..head_end].to_string(),
        tail: xml[tail_start..].to_string(),
        fragments,
        header_max_id,
    })
}

fn max_cnvpr_id(fragment: &str) -> Option<u32> {
    let mut reader = Reader::from_str(fragment);
    let mut max = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.name().local_name().as_ref() == b"cNvPr" =>
            {
                if let Some(id) = attr(e, b"id").and_then(|v| v.parse::<u32>().ok()) {
                    max = Some(max.map_or(id, |m: u32| m.max(id)));
                }
            }
            Ok(Event::Eof) | Err(_) => return max,
            _ => {}
        }
    }
}

/// Which fill-bearing element the reader is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorTarget {
    ShapeFill,
    LineFill,
    ShadowColor,
    RunFill,
}

/// Accumulates shape properties while walking one shape fragment.
struct ShapeBuilder {
    root: Vec<u8>,
    id: u32,
    name: String,
    max_nested_id: u32,
    text_box: bool,
    placeholder: Option<(PlaceholderType, Option<u32>)>,
    preset: Option<String>,
    adjustments: Vec<f64>,
    off: Option<(i64, i64)>,
    ext: Option<(i64, i64)>,
    flip_h: bool,
    flip_v: bool,
    in_xfrm: bool,
    fill: Option<Fill>,
    line: Option<LineStyle>,
    shadow: Option<Shadow>,
    shadow_alpha: Option<f64>,
    color_target: Option<ColorTarget>,
    text: Option<TextFrame>,
    in_text: bool,
    run_fill: bool,
}

impl ShapeBuilder {
    fn new() -> Self {
        Self {
            root: Vec::new(),
            id: 0,
            name: String::new(),
            max_nested_id: 0,
            text_box: false,
            placeholder: None,
            preset: None,
            adjustments: Vec::new(),
            off: None,
            ext: None,
            flip_h: false,
            flip_v: false,
            in_xfrm: false,
            fill: None,
            line: None,
            shadow: None,
            shadow_alpha: None,
            color_target: None,
            text: None,
            in_text: false,
            run_fill: false,
        }
    }

    /// Handle an opening (or empty) element. `path` holds the ancestors
    /// below the root element.
    fn open(&mut self, e: &BytesStart, path: &[Vec<u8>]) {
        let name = e.name().local_name().as_ref().to_vec();
        let path: Vec<&[u8]> = path.iter().map(|p| p.as_slice()).collect();

        if name == b"cNvPr" {
            if let Some(id) = attr(e, b"id").and_then(|v| v.parse::<u32>().ok()) {
                self.max_nested_id = self.max_nested_id.max(id);
                if path.len() == 1 {
                    self.id = id;
                    self.name = attr(e, b"name").unwrap_or_default();
                }
            }
            return;
        }

        match (path.as_slice(), name.as_slice()) {
            ([_], b"cNvSpPr") => self.text_box = attr_flag(e, b"txBox"),
            ([_, b"nvPr"], b"ph") => {
                let ph_type = PlaceholderType::from_xml(attr(e, b"type").as_deref());
                let idx = attr(e, b"idx").and_then(|v| v.parse().ok());
                self.placeholder = Some((ph_type, idx));
            }

            // Geometry: spPr/xfrm, grpSpPr/xfrm, or graphicFrame's own xfrm
            ([b"spPr"], b"xfrm") | ([b"grpSpPr"], b"xfrm") | ([], b"xfrm") => {
                self.flip_h = attr_flag(e, b"flipH");
                self.flip_v = attr_flag(e, b"flipV");
                self.in_xfrm = true;
            }
            ([_], b"off") | ([_, b"xfrm"], b"off") if self.in_xfrm => {
                self.off = Some((attr_i64(e, b"x").unwrap_or(0), attr_i64(e, b"y").unwrap_or(0)));
            }
            ([_], b"ext") | ([_, b"xfrm"], b"ext") if self.in_xfrm => {
                self.ext = Some((
                    attr_i64(e, b"cx").unwrap_or(0),
                    attr_i64(e, b"cy").unwrap_or(0),
                ));
            }
            ([b"spPr"], b"prstGeom") => self.preset = attr(e, b"prst"),
            ([b"spPr", b"prstGeom", b"avLst"], b"gd") => {
                if let Some(value) = attr(e, b"fmla")
                    .as_deref()
                    .and_then(|f| f.strip_prefix("val "))
                    .and_then(|v| v.trim().parse::<f64>().ok())
                {
                    self.adjustments.push(value / 100_000.0);
                }
            }

            // Fill
            ([b"spPr"], b"noFill") => self.fill = Some(Fill::NoFill),
            ([b"spPr"], b"solidFill") => {
                self.fill = Some(Fill::Solid { color: None });
                self.color_target = Some(ColorTarget::ShapeFill);
            }
            ([b"spPr"], b"pattFill") => self.fill = Some(Fill::Pattern { foreground: None }),
            ([b"spPr", b"pattFill"], b"fgClr") => self.color_target = Some(ColorTarget::ShapeFill),
            ([b"spPr"], b"gradFill") => self.fill = Some(Fill::Gradient),
            ([b"spPr"], b"blipFill") => self.fill = Some(Fill::Picture),
            ([b"spPr"], b"grpFill") => self.fill = Some(Fill::Group),

            // Outline
            ([b"spPr"], b"ln") => {
                self.line = Some(LineStyle {
                    width: attr_i64(e, b"w").map(Emu),
                    ..Default::default()
                });
            }
            ([b"spPr", b"ln"], b"noFill") => {
                if let Some(line) = self.line.as_mut() {
                    line.hidden = true;
                }
            }
            ([b"spPr", b"ln"], b"solidFill") => self.color_target = Some(ColorTarget::LineFill),
            ([b"spPr", b"ln"], b"headEnd") | ([b"spPr", b"ln"], b"tailEnd") => {
                let head = attr(e, b"type").as_deref().and_then(ArrowHead::from_xml);
                if let Some(line) = self.line.as_mut() {
                    if name == b"headEnd" {
                        line.head = head;
                    } else {
                        line.tail = head;
                    }
                }
            }

            // Shadow
            ([b"spPr", b"effectLst"], b"outerShdw") | ([b"spPr", b"effectLst"], b"innerShdw") => {
                let direction = attr_i64(e, b"dir").unwrap_or(0);
                self.shadow = Some(Shadow {
                    style: if name == b"outerShdw" {
                        ShadowStyle::Outer
                    } else {
                        ShadowStyle::Inner
                    },
                    distance: Emu(attr_i64(e, b"dist").unwrap_or(0)),
                    angle: direction as f64 / 60_000.0,
                    blur_radius: Emu(attr_i64(e, b"blurRad").unwrap_or(0)),
                    transparency: 0.0,
                });
                self.color_target = Some(ColorTarget::ShadowColor);
            }
            ([b"spPr", b"effectLst", _, _], b"alpha") => {
                self.shadow_alpha = attr_i64(e, b"val").map(|v| v as f64 / 100_000.0);
            }

            // Text
            ([], b"txBody") => {
                self.text = Some(TextFrame::default());
            }
            ([b"txBody"], b"bodyPr") => {
                if let Some(frame) = self.text.as_mut() {
                    frame.word_wrap = attr(e, b"wrap").map(|w| w != "none");
                    frame.anchor = attr(e, b"anchor").as_deref().and_then(VerticalAnchor::from_xml);
                    frame.margins = Margins {
                        left: attr_i64(e, b"lIns").map(Emu),
                        top: attr_i64(e, b"tIns").map(Emu),
                        right: attr_i64(e, b"rIns").map(Emu),
                        bottom: attr_i64(e, b"bIns").map(Emu),
                    };
                }
            }
            ([b"txBody"], b"p") => {
                if let Some(frame) = self.text.as_mut() {
                    frame.paragraphs.push(TextParagraph::default());
                }
            }
            ([b"txBody", b"p"], b"pPr") => {
                if let Some(p) = self.current_paragraph() {
                    p.alignment = attr(e, b"algn").as_deref().and_then(TextAlignment::from_xml);
                }
            }
            ([b"txBody", b"p"], b"br") => {
                if let Some(p) = self.current_paragraph() {
                    p.text.push('\n');
                }
            }
            ([b"txBody", b"p", b"r"], b"rPr") => {
                let size = attr_i64(e, b"sz").map(|sz| sz as f64 / 100.0);
                if let Some(p) = self.current_paragraph() {
                    if p.font.size.is_none() {
                        p.font.size = size;
                    }
                }
            }
            ([b"txBody", b"p", b"r", b"rPr"], b"latin") => {
                let face = attr(e, b"typeface");
                if let Some(p) = self.current_paragraph() {
                    if p.font.name.is_none() {
                        p.font.name = face;
                    }
                }
            }
            ([b"txBody", b"p", b"r", b"rPr"], b"solidFill") => {
                self.run_fill = true;
                self.color_target = Some(ColorTarget::RunFill);
            }
            ([b"txBody", b"p", b"r"], b"t") | ([b"txBody", b"p", b"fld"], b"t") => {
                self.in_text = true;
            }

            _ => {
                if matches!(
                    name.as_slice(),
                    b"srgbClr" | b"schemeClr" | b"prstClr" | b"sysClr"
                ) {
                    self.take_color(e, &name);
                }
            }
        }
    }

    fn close(&mut self, name: &[u8], path: &[Vec<u8>]) {
        match name {
            b"xfrm" if self.in_xfrm && path.len() <= 1 => self.in_xfrm = false,
            b"t" => self.in_text = false,
            b"solidFill" | b"fgClr" | b"outerShdw" | b"innerShdw" => {
                self.color_target = None;
                self.run_fill = false;
            }
            _ => {}
        }
    }

    fn current_paragraph(&mut self) -> Option<&mut TextParagraph> {
        self.text.as_mut().and_then(|f| f.paragraphs.last_mut())
    }

    fn take_color(&mut self, e: &BytesStart, name: &[u8]) {
        let Some(target) = self.color_target else {
            return;
        };
        let value = match name {
            b"srgbClr" => attr(e, b"val")
                .and_then(|v| RgbColor::from_hex(&v).ok())
                .map(ColorValue::Rgb),
            b"schemeClr" => attr(e, b"val").map(ColorValue::Scheme),
            b"prstClr" => attr(e, b"val").map(ColorValue::Preset),
            b"sysClr" => attr(e, b"lastClr")
                .and_then(|v| RgbColor::from_hex(&v).ok())
                .map(ColorValue::Rgb)
                .or_else(|| attr(e, b"val").map(ColorValue::System)),
            _ => None,
        };

        match target {
            ColorTarget::ShapeFill => match self.fill.as_mut() {
                Some(Fill::Solid { color }) => *color = value,
                Some(Fill::Pattern { foreground }) => *foreground = value,
                _ => {}
            },
            ColorTarget::LineFill => {
                if let Some(line) = self.line.as_mut() {
                    line.color = value;
                }
            }
            ColorTarget::ShadowColor => {}
            ColorTarget::RunFill => {
                if self.run_fill {
                    let rgb = value.as_ref().and_then(ColorValue::rgb);
                    if let Some(p) = self.current_paragraph() {
                        if p.font.color.is_none() {
                            p.font.color = rgb;
                        }
                    }
                }
            }
        }
    }

    fn text(&mut self, content: &str) {
        if self.in_text {
            if let Some(p) = self.current_paragraph() {
                p.text.push_str(content);
            }
        }
    }

    fn finish(self, source: &str) -> Shape {
        let kind = match self.root.as_slice() {
            b"sp" => match (&self.placeholder, self.text_box, self.preset.as_deref()) {
                (Some((ph_type, idx)), _, _) => ShapeKind::Placeholder {
                    ph_type: ph_type.clone(),
                    idx: *idx,
                },
                (None, true, _) => ShapeKind::TextBox,
                (None, false, Some("line")) | (None, false, Some("straightConnector1")) => {
                    ShapeKind::Line
                }
                (None, false, preset) => ShapeKind::AutoShape {
                    preset: preset.map(str::to_string),
                },
            },
            b"cxnSp" => ShapeKind::Connector,
            b"pic" => ShapeKind::Picture,
            b"grpSp" => ShapeKind::Group,
            b"graphicFrame" => ShapeKind::GraphicFrame,
            other => ShapeKind::Other {
                tag: String::from_utf8_lossy(other).into_owned(),
            },
        };

        let geometry = match (self.off, self.ext) {
            (Some((x, y)), Some((cx, cy))) => Some(Rect::new(Emu(x), Emu(y), Emu(cx), Emu(cy))),
            _ => None,
        };

        let connector = match (&kind, geometry) {
            (ShapeKind::Connector, Some(rect)) | (ShapeKind::Line, Some(rect)) => {
                let (begin_x, end_x) = if self.flip_h {
                    (rect.right(), rect.left)
                } else {
                    (rect.left, rect.right())
                };
                let (begin_y, end_y) = if self.flip_v {
                    (rect.bottom(), rect.top)
                } else {
                    (rect.top, rect.bottom())
                };
                Some(ConnectorEnds {
                    begin: Point::new(begin_x, begin_y),
                    end: Point::new(end_x, end_y),
                })
            }
            _ => None,
        };

        let mut shadow = self.shadow;
        if let (Some(s), Some(alpha)) = (shadow.as_mut(), self.shadow_alpha) {
            s.transparency = 1.0 - alpha;
        }

        let mut shape = Shape::new(ShapeId(self.id), self.name, kind);
        shape.geometry = geometry;
        shape.text = self.text;
        shape.fill = self.fill;
        shape.line = self.line;
        shape.shadow = shadow;
        shape.adjustments = self.adjustments;
        shape.connector = connector;
        shape.max_nested_id = self.max_nested_id.max(self.id);
        shape.source = Some(source.to_string());
        shape
    }
}

/// Parse one shape-tree child.
///
/// Never fails: malformed XML yields whatever was read before the error,
/// so one broken shape cannot abort loading or summarizing a slide.
pub(crate) fn parse_shape(fragment: &str) -> Shape {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().trim_text(false);

    let mut builder = ShapeBuilder::new();
    // Ancestors of the current element, excluding the root
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if depth == 0 {
                    builder.root = local_name(e);
                } else {
                    builder.open(e, &path);
                    path.push(local_name(e));
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    builder.root = local_name(e);
                } else {
                    builder.open(e, &path);
                    let name = local_name(e);
                    builder.close(&name, &path);
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                if depth > 0 {
                    path.pop();
                    builder.close(e.name().local_name().as_ref(), &path);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Ok(content) = e.unescape() {
                    builder.text(&content);
                }
            }
            Ok(Event::CData(ref e)) => {
                builder.text(&String::from_utf8_lossy(e));
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    builder.finish(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Quarterly &amp; Plan</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="5" name="Box"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="914400" y="1270000"/><a:ext cx="2743200" cy="1828800"/></a:xfrm><a:prstGeom prst="roundRect"><a:avLst><a:gd name="adj" fmla="val 15000"/></a:avLst></a:prstGeom><a:solidFill><a:srgbClr val="E8F4F8"/></a:solidFill><a:ln w="12700"><a:solidFill><a:srgbClr val="B4B4B4"/></a:solidFill></a:ln></p:spPr><p:txBody><a:bodyPr wrap="square" anchor="ctr"/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:r><a:rPr sz="1800"><a:solidFill><a:srgbClr val="323232"/></a:solidFill><a:latin typeface="Microsoft JhengHei"/></a:rPr><a:t>one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r></a:p></p:txBody></p:sp><p:cxnSp><p:nvCxnSpPr><p:cNvPr id="7" name="Straight Connector 6"/><p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr><p:spPr><a:xfrm flipH="1"><a:off x="100" y="200"/><a:ext cx="300" cy="0"/></a:xfrm><a:prstGeom prst="line"><a:avLst/></a:prstGeom><a:ln w="31750"><a:solidFill><a:srgbClr val="464646"/></a:solidFill><a:tailEnd type="triangle"/></a:ln></p:spPr></p:cxnSp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#;

    #[test]
    fn test_split_sp_tree() {
        let tree = split_sp_tree(SLIDE).unwrap();
        assert_eq!(tree.fragments.len(), 3);
        assert!(tree.head.ends_with("<p:grpSpPr/>"));
        assert!(tree.tail.starts_with("</p:spTree>"));
        assert!(tree.fragments[0].starts_with("<p:sp>"));
        assert!(tree.fragments[2].ends_with("</p:cxnSp>"));
        assert_eq!(tree.header_max_id, 1);

        let rebuilt = format!("{}{}{}", tree.head, tree.fragments.concat(), tree.tail);
        assert_eq!(rebuilt, SLIDE);
    }

    #[test]
    fn test_split_empty_tree() {
        let xml = r#"<p:sld xmlns:p="p"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld></p:sld>"#;
        let tree = split_sp_tree(xml).unwrap();
        assert!(tree.fragments.is_empty());
        assert_eq!(format!("{}{}", tree.head, tree.tail), xml);
    }

    #[test]
    fn test_parse_title_placeholder() {
        let tree = split_sp_tree(SLIDE).unwrap();
        let title = parse_shape(&tree.fragments[0]);
        assert!(title.is_title());
        assert_eq!(title.id, ShapeId(2));
        assert_eq!(title.text().as_deref(), Some("Quarterly & Plan"));
        assert!(title.geometry.is_none());
    }

    #[test]
    fn test_parse_rounded_box() {
        let tree = split_sp_tree(SLIDE).unwrap();
        let shape = parse_shape(&tree.fragments[1]);
        assert_eq!(
            shape.kind,
            ShapeKind::AutoShape {
                preset: Some("roundRect".into())
            }
        );
        assert_eq!(
            shape.geometry,
            Some(Rect::new(Emu(914400), Emu(1270000), Emu(2743200), Emu(1828800)))
        );
        assert_eq!(shape.adjustments, vec![0.15]);
        assert_eq!(
            shape.fill.as_ref().and_then(|f| f.fore_color()).and_then(|c| c.rgb()),
            Some(RgbColor::new(232, 244, 248))
        );

        let frame = shape.text.as_ref().unwrap();
        assert_eq!(frame.word_wrap, Some(true));
        assert_eq!(frame.anchor, Some(VerticalAnchor::Middle));
        assert_eq!(frame.text(), "one\ntwo");
        let para = &frame.paragraphs[0];
        assert_eq!(para.alignment, Some(TextAlignment::Center));
        assert_eq!(para.font.size, Some(18.0));
        assert_eq!(para.font.name.as_deref(), Some("Microsoft JhengHei"));
        assert_eq!(para.font.color, Some(RgbColor::new(50, 50, 50)));
    }

    #[test]
    fn test_parse_connector() {
        let tree = split_sp_tree(SLIDE).unwrap();
        let shape = parse_shape(&tree.fragments[2]);
        assert_eq!(shape.kind, ShapeKind::Connector);
        let line = shape.line.as_ref().unwrap();
        assert_eq!(line.width, Some(Emu(31750)));
        assert_eq!(line.tail, Some(ArrowHead::Triangle));
        assert_eq!(
            line.color.as_ref().and_then(ColorValue::rgb),
            Some(RgbColor::new(70, 70, 70))
        );
        let ends = shape.connector.unwrap();
        assert_eq!(ends.begin, Point::new(Emu(400), Emu(200)));
        assert_eq!(ends.end, Point::new(Emu(100), Emu(200)));
    }

    #[test]
    fn test_parse_malformed_shape_is_tolerated() {
        let shape = parse_shape("<p:sp><p:nvSpPr><p:cNvPr id=\"9\" name=\"x\"/><p:spPr><a:xfrm>");
        assert_eq!(shape.id, ShapeId(9));
        assert!(shape.geometry.is_none());
    }

    #[test]
    fn test_presentation_info() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#;
        let info = parse_presentation_xml(xml).unwrap();
        assert_eq!(info.slide_width, Emu(12192000));
        assert_eq!(
            info.slides,
            vec![(256, "rId2".to_string()), (257, "rId3".to_string())]
        );
    }
}
