//! Properties of the mutation helpers, checked in memory and after a save
//! and reload.

use deckpilot::model::{ColorValue, Emu, Presentation, ShapeKind};
use deckpilot::ops::{self, ArrowStyle, TextBoxSpec};
use deckpilot::{ArrowHead, Error, RgbColor, ShapeId};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A saved deck with one "Title and Content" slide titled "Agenda".
fn titled_deck(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("deck.pptx");
    let mut prs = ops::new_presentation().unwrap();
    let index = ops::add_slide(&mut prs, Some("Title and Content")).unwrap();
    ops::set_title(ops::get_slide_mut(&mut prs, index as i64).unwrap(), "Agenda").unwrap();
    prs.save_as(&path).unwrap();
    path
}

fn reload(path: &Path) -> Presentation {
    ops::load_presentation(path).unwrap()
}

fn add_box(prs: &mut Presentation, text: &str, left_in: f64) -> ShapeId {
    let slide = ops::get_slide_mut(prs, 0).unwrap();
    let spec = TextBoxSpec::new(
        text,
        Emu::from_inches(left_in),
        Emu::from_inches(2.5),
        Emu::from_inches(3.0),
        Emu::from_inches(2.0),
    );
    ops::add_rounded_textbox(slide, &spec)
}

#[test]
fn get_slide_checks_bounds() {
    let dir = TempDir::new().unwrap();
    let prs = reload(&titled_deck(&dir));

    assert!(ops::get_slide(&prs, 0).is_ok());
    for index in [-1, 1, 7] {
        match ops::get_slide(&prs, index) {
            Err(Error::SlideIndexOutOfRange { index: i, count }) => {
                assert_eq!(i, index);
                assert_eq!(count, 1);
            }
            other => panic!("expected out of range for {}, got {:?}", index, other.map(|_| ())),
        }
    }
}

#[test]
fn delete_shapes_except_keeps_only_title() {
    let dir = TempDir::new().unwrap();
    let mut prs = reload(&titled_deck(&dir));
    add_box(&mut prs, "A", 0.5);
    add_box(&mut prs, "B", 4.0);

    let slide = ops::get_slide_mut(&mut prs, 0).unwrap();
    let title = slide.title_id();
    assert!(title.is_some());
    let removed = ops::delete_shapes_except(slide, &[title]);
    assert_eq!(removed, 3);
    assert_eq!(slide.len(), 1);
    assert_eq!(slide.shapes()[0].id, title.unwrap());

    // Idempotent
    assert_eq!(ops::delete_shapes_except(slide, &[title]), 0);
    assert_eq!(slide.len(), 1);

    // A missing title keeps nothing
    assert_eq!(ops::delete_shapes_except(slide, &[None]), 1);
    assert!(slide.is_empty());
}

#[test]
fn remove_connectors_for_zero_one_and_many() {
    let dir = TempDir::new().unwrap();
    let mut prs = reload(&titled_deck(&dir));
    let a = add_box(&mut prs, "A", 0.5);
    let b = add_box(&mut prs, "B", 4.0);
    let c = add_box(&mut prs, "C", 7.5);

    let slide = ops::get_slide_mut(&mut prs, 0).unwrap();
    assert_eq!(ops::remove_connectors_and_lines(slide), 0);

    ops::add_arrow_between(slide, a, b, &ArrowStyle::default()).unwrap();
    let before = slide.len();
    assert_eq!(ops::remove_connectors_and_lines(slide), 1);
    assert_eq!(slide.len(), before - 1);

    ops::add_arrow_between(slide, a, b, &ArrowStyle::default()).unwrap();
    ops::add_arrow_between(slide, b, c, &ArrowStyle::default()).unwrap();
    ops::add_arrow_between(slide, a, c, &ArrowStyle::default()).unwrap();
    assert_eq!(ops::remove_connectors_and_lines(slide), 3);
    assert!(slide.shapes().iter().all(|s| !s.is_line_like()));
}

#[test]
fn textbox_text_survives_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = titled_deck(&dir);
    let mut prs = reload(&path);
    let text = "第一步\nCollect data & <clean> it";
    let id = add_box(&mut prs, text, 1.0);

    {
        let shape = prs.slides()[0].shape(id).unwrap();
        assert_eq!(shape.text().as_deref(), Some(text));
        assert_eq!(shape.text.as_ref().unwrap().word_wrap, Some(true));
    }

    prs.save().unwrap();
    let prs = reload(&path);
    let shape = prs.slides()[0].shape(id).unwrap();
    assert_eq!(shape.text().as_deref(), Some(text));
    assert_eq!(shape.text.as_ref().unwrap().word_wrap, Some(true));
    assert!(matches!(
        &shape.kind,
        ShapeKind::AutoShape { preset: Some(p) } if p == "roundRect"
    ));
    assert_eq!(prs.slides()[0].title().and_then(|t| t.text()).as_deref(), Some("Agenda"));
}

#[test]
fn arrow_adds_one_connector_with_style() {
    let dir = TempDir::new().unwrap();
    let path = titled_deck(&dir);
    let mut prs = reload(&path);
    let a = add_box(&mut prs, "A", 0.5);
    let b = add_box(&mut prs, "B", 5.0);

    let style = ArrowStyle {
        color: RgbColor::new(200, 30, 30),
        ..Default::default()
    };
    let slide = ops::get_slide_mut(&mut prs, 0).unwrap();
    let before = slide.len();
    let arrow = ops::add_arrow_between(slide, a, b, &style).unwrap();
    assert_eq!(slide.len(), before + 1);

    prs.save().unwrap();
    let prs = reload(&path);
    let shape = prs.slides()[0].shape(arrow).unwrap();
    assert_eq!(shape.kind, ShapeKind::Connector);
    let line = shape.line.as_ref().unwrap();
    assert_eq!(line.color, Some(ColorValue::Rgb(RgbColor::new(200, 30, 30))));
    assert_eq!(line.tail, Some(ArrowHead::Triangle));

    let rect = shape.geometry.unwrap();
    assert_eq!(rect.left, Emu::from_inches(3.5));
    assert_eq!(rect.right(), Emu::from_inches(5.0));
}

#[test]
fn arrow_to_missing_shape_fails() {
    let dir = TempDir::new().unwrap();
    let mut prs = reload(&titled_deck(&dir));
    let a = add_box(&mut prs, "A", 0.5);
    let slide = ops::get_slide_mut(&mut prs, 0).unwrap();
    let before = slide.len();
    let err = ops::add_arrow_between(slide, a, ShapeId(999), &ArrowStyle::default()).unwrap_err();
    assert!(matches!(err, Error::ShapeNotFound(999)));
    assert_eq!(slide.len(), before);
}

#[test]
fn distribute_fits_and_increases() {
    let total = Emu::from_inches(13.333);
    let width = Emu::from_inches(3.0);
    let gap = Emu::from_inches(0.2);
    let lefts = ops::distribute_horizontally(total, 4, width, gap, Emu::from_inches(0.5)).unwrap();

    assert_eq!(lefts.len(), 4);
    assert!(lefts.windows(2).all(|w| w[0] < w[1]));
    assert!(lefts[0] >= Emu::ZERO);
    assert!(*lefts.last().unwrap() + width <= total);

    let err = ops::distribute_horizontally(total, 5, width, gap, Emu::ZERO).unwrap_err();
    assert!(matches!(err, Error::LayoutOverflow { .. }));
}
