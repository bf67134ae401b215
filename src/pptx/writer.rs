//! Serialization of new shapes and saving of edited presentations.

use super::template::{empty_slide_xml, CT_SLIDE};
use super::{inherit_from_layout, split_sp_tree};
use crate::container::{escape_attr, Package, REL_SLIDE, REL_SLIDE_LAYOUT};
use crate::error::{Error, Result};
use crate::model::{
    ColorValue, Fill, LineStyle, PlaceholderType, Presentation, Shadow, ShadowStyle, Shape, ShapeId,
    ShapeKind, Slide, TextFrame,
};
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Presets whose first adjustment value is a corner or inset.
const ADJUSTABLE_PRESETS: &[&str] = &[
    "roundRect",
    "round1Rect",
    "round2SameRect",
    "snipRoundRect",
    "plaque",
    "bevel",
    "can",
    "cube",
    "frame",
    "octagon",
];

fn write_color(xml: &mut String, color: &ColorValue) {
    match color {
        ColorValue::Rgb(rgb) => {
            let _ = write!(xml, "<a:srgbClr val=\"{}\"/>", rgb.hex());
        }
        ColorValue::Scheme(v) => {
            let _ = write!(xml, "<a:schemeClr val=\"{}\"/>", escape_attr(v));
        }
        ColorValue::Preset(v) => {
            let _ = write!(xml, "<a:prstClr val=\"{}\"/>", escape_attr(v));
        }
        ColorValue::System(v) => {
            let _ = write!(xml, "<a:sysClr val=\"{}\"/>", escape_attr(v));
        }
    }
}

fn write_fill(xml: &mut String, fill: &Fill) {
    match fill {
        Fill::NoFill => xml.push_str("<a:noFill/>"),
        Fill::Solid { color: Some(color) } => {
            xml.push_str("<a:solidFill>");
            write_color(xml, color);
            xml.push_str("</a:solidFill>");
        }
        // Gradient, picture and colorless fills cannot be created; leave them to the theme
        _ => {}
    }
}

fn write_line(xml: &mut String, line: &LineStyle) {
    match line.width {
        Some(w) => {
            let _ = write!(xml, "<a:ln w=\"{}\">", w.get());
        }
        None => xml.push_str("<a:ln>"),
    }
    if line.hidden {
        xml.push_str("<a:noFill/>");
    } else if let Some(color) = &line.color {
        xml.push_str("<a:solidFill>");
        write_color(xml, color);
        xml.push_str("</a:solidFill>");
    }
    if let Some(head) = line.head {
        let _ = write!(xml, "<a:headEnd type=\"{}\"/>", head.to_xml());
    }
    if let Some(tail) = line.tail {
        let _ = write!(xml, "<a:tailEnd type=\"{}\"/>", tail.to_xml());
    }
    xml.push_str("</a:ln>");
}

fn write_shadow(xml: &mut String, shadow: &Shadow) {
    let tag = match shadow.style {
        ShadowStyle::Outer => "outerShdw",
        ShadowStyle::Inner => "innerShdw",
    };
    let alpha = ((1.0 - shadow.transparency).clamp(0.0, 1.0) * 100_000.0).round() as i64;
    let _ = write!(
        xml,
        "<a:effectLst><a:{tag} blurRad=\"{}\" dist=\"{}\" dir=\"{}\" algn=\"tl\" rotWithShape=\"0\"><a:prstClr val=\"black\"><a:alpha val=\"{}\"/></a:prstClr></a:{tag}></a:effectLst>",
        shadow.blur_radius.get(),
        shadow.distance.get(),
        (shadow.angle * 60_000.0).round() as i64,
        alpha,
    );
}

/// `<p:txBody>` for a text frame. Line breaks become `<a:br/>`.
pub(crate) fn text_body_xml(frame: &TextFrame) -> String {
    let mut xml = String::from("<p:txBody><a:bodyPr");
    if let Some(wrap) = frame.word_wrap {
        let _ = write!(xml, " wrap=\"{}\"", if wrap { "square" } else { "none" });
    }
    let m = &frame.margins;
    for (name, value) in [
        ("lIns", m.left),
        ("tIns", m.top),
        ("rIns", m.right),
        ("bIns", m.bottom),
    ] {
        if let Some(v) = value {
            let _ = write!(xml, " {}=\"{}\"", name, v.get());
        }
    }
    if let Some(anchor) = frame.anchor {
        let _ = write!(xml, " anchor=\"{}\"", anchor.to_xml());
    }
    xml.push_str(" rtlCol=\"0\"/><a:lstStyle/>");
    xml.push_str(&paragraphs_xml(frame));
    xml.push_str("</p:txBody>");
    xml
}

fn paragraphs_xml(frame: &TextFrame) -> String {
    let mut xml = String::new();
    if frame.paragraphs.is_empty() {
        xml.push_str("<a:p><a:endParaRPr lang=\"en-US\" dirty=\"0\"/></a:p>");
        return xml;
    }

    for para in &frame.paragraphs {
        xml.push_str("<a:p>");
        if let Some(alignment) = para.alignment {
            let _ = write!(xml, "<a:pPr algn=\"{}\"/>", alignment.to_xml());
        }

        let mut rpr = String::from("<a:rPr lang=\"en-US\"");
        if let Some(size) = para.font.size {
            let _ = write!(rpr, " sz=\"{}\"", (size * 100.0).round() as i64);
        }
        rpr.push_str(" dirty=\"0\"");
        let mut children = String::new();
        if let Some(color) = para.font.color {
            let _ = write!(
                children,
                "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>",
                color.hex()
            );
        }
        if let Some(face) = &para.font.name {
            let face = escape_attr(face);
            let _ = write!(
                children,
                "<a:latin typeface=\"{face}\"/><a:ea typeface=\"{face}\"/>"
            );
        }
        if children.is_empty() {
            rpr.push_str("/>");
        } else {
            let _ = write!(rpr, ">{}</a:rPr>", children);
        }

        for (i, line) in para.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<a:br>");
                xml.push_str(&rpr);
                xml.push_str("</a:br>");
            }
            if !line.is_empty() {
                let _ = write!(xml, "<a:r>{}<a:t>{}</a:t></a:r>", rpr, escape(line));
            }
        }
        xml.push_str("</a:p>");
    }
    xml
}

fn write_xfrm(xml: &mut String, shape: &Shape, flip: (bool, bool)) {
    let Some(rect) = shape.geometry.filter(|_| !shape.geometry_inherited) else {
        return;
    };
    xml.push_str("<a:xfrm");
    if flip.0 {
        xml.push_str(" flipH=\"1\"");
    }
    if flip.1 {
        xml.push_str(" flipV=\"1\"");
    }
    let _ = write!(
        xml,
        "><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
        rect.left.get(),
        rect.top.get(),
        rect.width.get(),
        rect.height.get()
    );
}

fn write_preset(xml: &mut String, preset: &str, adjustments: &[f64]) {
    let _ = write!(xml, "<a:prstGeom prst=\"{}\"><a:avLst>", escape_attr(preset));
    if ADJUSTABLE_PRESETS.contains(&preset) {
        for (i, value) in adjustments.iter().enumerate() {
            let name = if i == 0 {
                "adj".to_string()
            } else {
                format!("adj{}", i + 1)
            };
            let _ = write!(
                xml,
                "<a:gd name=\"{}\" fmla=\"val {}\"/>",
                name,
                (value * 100_000.0).round() as i64
            );
        }
    }
    xml.push_str("</a:avLst></a:prstGeom>");
}

fn write_sp_pr(xml: &mut String, shape: &Shape, preset: Option<&str>, flip: (bool, bool)) {
    let mut inner = String::new();
    write_xfrm(&mut inner, shape, flip);
    if let Some(preset) = preset {
        write_preset(&mut inner, preset, &shape.adjustments);
    }
    if let Some(fill) = &shape.fill {
        write_fill(&mut inner, fill);
    }
    if let Some(line) = &shape.line {
        write_line(&mut inner, line);
    }
    if let Some(shadow) = &shape.shadow {
        write_shadow(&mut inner, shadow);
    }
    if inner.is_empty() {
        xml.push_str("<p:spPr/>");
    } else {
        let _ = write!(xml, "<p:spPr>{}</p:spPr>", inner);
    }
}

fn connector_flip(shape: &Shape) -> (bool, bool) {
    shape
        .connector
        .map(|ends| (ends.begin.x > ends.end.x, ends.begin.y > ends.end.y))
        .unwrap_or((false, false))
}

/// XML for a shape created in memory.
pub(crate) fn shape_xml(shape: &Shape) -> String {
    let mut xml = String::new();
    let c_nv_pr = format!(
        "<p:cNvPr id=\"{}\" name=\"{}\"/>",
        shape.id,
        escape_attr(&shape.name)
    );

    if let ShapeKind::Connector = shape.kind {
        let _ = write!(
            xml,
            "<p:cxnSp><p:nvCxnSpPr>{}<p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr>",
            c_nv_pr
        );
        write_sp_pr(&mut xml, shape, Some("straightConnector1"), connector_flip(shape));
        xml.push_str("</p:cxnSp>");
        return xml;
    }

    let _ = write!(xml, "<p:sp><p:nvSpPr>{}", c_nv_pr);
    match &shape.kind {
        ShapeKind::TextBox => xml.push_str("<p:cNvSpPr txBox=\"1\"/><p:nvPr/>"),
        ShapeKind::Placeholder { ph_type, idx } => {
            xml.push_str("<p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr><p:nvPr><p:ph");
            if *ph_type != PlaceholderType::Object {
                let _ = write!(xml, " type=\"{}\"", escape_attr(ph_type.to_xml()));
            }
            if let Some(idx) = idx {
                let _ = write!(xml, " idx=\"{}\"", idx);
            }
            xml.push_str("/></p:nvPr>");
        }
        _ => xml.push_str("<p:cNvSpPr/><p:nvPr/>"),
    }
    xml.push_str("</p:nvSpPr>");

    let preset = match &shape.kind {
        ShapeKind::AutoShape { preset } => Some(preset.as_deref().unwrap_or("rect")),
        ShapeKind::TextBox => Some("rect"),
        ShapeKind::Line => Some("line"),
        _ => None,
    };
    write_sp_pr(&mut xml, shape, preset, connector_flip(shape));

    if let Some(frame) = &shape.text {
        xml.push_str(&text_body_xml(frame));
    }
    xml.push_str("</p:sp>");
    xml
}

/// Replace the paragraphs of a loaded shape's text body, keeping its body
/// properties and list styles. A shape without a text body gets a new one.
pub(crate) fn replace_text(source: &str, frame: &TextFrame) -> Result<String> {
    if let Some(body_end) = source.rfind("</p:txBody>") {
        let body_start = source
            .find("<p:txBody")
            .ok_or_else(|| Error::XmlParse("unbalanced p:txBody".to_string()))?;
        let body = &source[body_start..body_end];
        let first_para = [body.find("<a:p>"), body.find("<a:p ")]
            .into_iter()
            .flatten()
            .min()
            .map(|offset| body_start + offset)
            .unwrap_or(body_end);
        return Ok(format!(
            "{}{}{}",
            &source[..first_para],
            paragraphs_xml(frame),
            &source[body_end..]
        ));
    }

    let close = source
        .rfind("</p:sp>")
        .ok_or_else(|| Error::InvalidData("only p:sp elements can hold text".to_string()))?;
    let body = format!(
        "<p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody>",
        paragraphs_xml(frame)
    );
    Ok(format!("{}{}{}", &source[..close], body, &source[close..]))
}

/// Assemble a slide part from its raw pieces and current shapes.
fn slide_xml(slide: &Slide) -> String {
    let mut xml = String::with_capacity(slide.head.len() + slide.tail.len() + 1024);
    xml.push_str(&slide.head);
    for shape in &slide.shapes {
        match &shape.source {
            Some(source) => xml.push_str(source),
            None => xml.push_str(&shape_xml(shape)),
        }
    }
    xml.push_str(&slide.tail);
    xml
}

impl Presentation {
    /// Serialize the presentation, rebuilding only slides that changed.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        for slide in self.slides.iter_mut().filter(|s| s.dirty) {
            for shape in slide.shapes.iter_mut().filter(|s| s.source.is_none()) {
                shape.source = Some(shape_xml(shape));
            }
            let xml = slide_xml(slide);
            debug!(part = %slide.part_name, shapes = slide.shapes.len(), "rebuilt slide");
            self.package.put_part(&slide.part_name, xml.into_bytes());
            slide.dirty = false;
        }
        self.package.to_bytes()
    }

    /// Save back to the path the presentation was loaded from.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| Error::InvalidData("presentation has no file path".to_string()))?;
        self.save_as(path)
    }

    /// Save to `path` in one write and remember it as the presentation's path.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "saved presentation");
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Append a slide based on `layout_name` (first layout when `None`).
    /// Title, subtitle, body and object placeholders are copied from the
    /// layout without a position of their own. Returns the new slide index.
    pub fn add_slide(&mut self, layout_name: Option<&str>) -> Result<usize> {
        let layout = match layout_name {
            Some(name) => self
                .layout(name)
                .ok_or_else(|| Error::LayoutNotFound(name.to_string()))?,
            None => self
                .layouts
                .first()
                .ok_or_else(|| Error::LayoutNotFound("(none)".to_string()))?,
        }
        .clone();

        let mut number = self.slides.len() + 1;
        while self.package.exists(&format!("ppt/slides/slide{}.xml", number)) {
            number += 1;
        }
        let part_name = format!("ppt/slides/slide{}.xml", number);

        let xml = empty_slide_xml();
        let tree = split_sp_tree(&xml)?;
        let mut slide = Slide {
            layout_name: Some(layout.name.clone()),
            shapes: Vec::new(),
            part_name: part_name.clone(),
            head: tree.head,
            tail: tree.tail,
            header_max_id: tree.header_max_id,
            dirty: true,
        };

        for ph in layout.placeholders.iter().filter(|p| {
            matches!(
                p.placeholder_type(),
                Some(
                    PlaceholderType::Title
                        | PlaceholderType::CenterTitle
                        | PlaceholderType::Subtitle
                        | PlaceholderType::Body
                        | PlaceholderType::Object
                )
            )
        }) {
            let id = slide.next_shape_id();
            let mut shape = Shape::new(id, clone_name(ph, id), ph.kind.clone());
            shape.text = Some(TextFrame::default());
            inherit_from_layout(&mut shape, &layout.placeholders);
            slide.push_shape(shape);
        }

        self.package.put_part(&part_name, xml.into_bytes());
        let mut slide_rels = crate::container::Relationships::new();
        slide_rels.add(
            REL_SLIDE_LAYOUT,
            &Package::relative_path(&part_name, &layout.part_name),
        );
        self.package.write_relationships(&part_name, &slide_rels);
        self.package.add_content_type_override(&part_name, CT_SLIDE)?;

        let mut rels = self.package.read_relationships(&self.main_part)?;
        let rel_id = rels.add(
            REL_SLIDE,
            &Package::relative_path(&self.main_part, &part_name),
        );
        self.package.write_relationships(&self.main_part, &rels);

        let slide_id = self.slide_ids.iter().copied().max().unwrap_or(255).max(255) + 1;
        let main_xml = self.package.read_xml(&self.main_part)?;
        let updated = insert_slide_id(&main_xml, slide_id, &rel_id)?;
        self.package.put_part(&self.main_part, updated.into_bytes());

        self.slides.push(slide);
        self.slide_ids.push(slide_id);
        info!(layout = %layout.name, part = %part_name, "added slide");
        Ok(self.slides.len() - 1)
    }
}

fn clone_name(placeholder: &Shape, id: ShapeId) -> String {
    let base = placeholder
        .name
        .rsplit_once(' ')
        .filter(|(_, n)| n.chars().all(|c| c.is_ascii_digit()))
        .map(|(base, _)| base)
        .unwrap_or(&placeholder.name);
    format!("{} {}", base, id.0.saturating_sub(1))
}

/// Add `<p:sldId>` to the slide id list of `presentation.xml`.
fn insert_slide_id(xml: &str, slide_id: u32, rel_id: &str) -> Result<String> {
    let entry = format!("<p:sldId id=\"{}\" r:id=\"{}\"/>", slide_id, rel_id);

    if let Some(pos) = xml.find("</p:sldIdLst>") {
        return Ok(format!("{}{}{}", &xml[..pos], entry, &xml[pos..]));
    }
    if let Some(pos) = xml.find("<p:sldIdLst/>") {
        return Ok(format!(
            "{}<p:sldIdLst>{}</p:sldIdLst>{}",
            &xml[..pos],
            entry,
            &xml[pos + "<p:sldIdLst/>".len()..]
        ));
    }
    let anchor = "</p:sldMasterIdLst>";
    let pos = xml
        .find(anchor)
        .ok_or_else(|| Error::InvalidData("presentation.xml has no slide master list".into()))?
        + anchor.len();
    Ok(format!(
        "{}<p:sldIdLst>{}</p:sldIdLst>{}",
        &xml[..pos],
        entry,
        &xml[pos..]
    ))
}
