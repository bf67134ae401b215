//! End-to-end instruction handling with a scripted model and no renderer.

use deckpilot::config::AssistantConfig;
use deckpilot::llm::{ModelClient, ModelRequest, Part};
use deckpilot::model::ShapeKind;
use deckpilot::pipeline::{Assistant, Verdict};
use deckpilot::render::{NoRenderer, Renderer};
use deckpilot::{ops, Error, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Returns canned replies in order and records every request.
#[derive(Clone, Default)]
struct ScriptedModel {
    replies: Rc<RefCell<Vec<String>>>,
    requests: Rc<RefCell<Vec<ModelRequest>>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        let model = Self::default();
        model
            .replies
            .borrow_mut()
            .extend(replies.iter().rev().map(|r| r.to_string()));
        model
    }

    fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ModelClient for ScriptedModel {
    fn generate(&self, request: &ModelRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop()
            .ok_or_else(|| Error::Model("script exhausted".into()))
    }
}

/// Copies the deck to `<dir>/<stem>.pdf` as a stand-in rendering.
struct CopyRenderer;

impl Renderer for CopyRenderer {
    fn name(&self) -> &str {
        "copy"
    }

    fn render(&self, deck: &Path, out_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(out_dir)?;
        let pdf = deckpilot::render::artifact_path(deck, out_dir);
        fs::copy(deck, &pdf)?;
        Ok(pdf)
    }
}

const THREE_BOXES: &str = r#"Sure, here is the plan:
```json
{"operations": [
  {"op": "delete_shapes_except", "slide": 0, "keep": ["title"]},
  {"op": "remove_connectors_and_lines", "slide": 0},
  {"op": "distribute_horizontally", "count": 3, "box_width": "3in", "gap": "0.2in", "as": "lefts"},
  {"op": "add_rounded_textbox", "slide": 0, "text": "Plan", "left": "$lefts[0]", "top": "2.5in", "width": "3in", "height": "2in", "as": "a"},
  {"op": "add_rounded_textbox", "slide": 0, "text": "Build", "left": "$lefts[1]", "top": "2.5in", "width": "3in", "height": "2in", "fill_color": [80, 227, 194], "as": "b"},
  {"op": "add_rounded_textbox", "slide": 0, "text": "Ship", "left": "$lefts[2]", "top": "2.5in", "width": "3in", "height": "2in", "as": "c"},
  {"op": "add_arrow_between", "slide": 0, "from": "$a", "to": "$b"},
  {"op": "add_arrow_between", "slide": 0, "from": "$b", "to": "$c"}
]}
```"#;

fn deck_with_title(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("talk.pptx");
    let mut prs = ops::new_presentation().unwrap();
    ops::add_slide(&mut prs, Some("Title and Content")).unwrap();
    ops::set_title(ops::get_slide_mut(&mut prs, 0).unwrap(), "Process").unwrap();
    prs.save_as(&path).unwrap();
    path
}

fn assistant(dir: &TempDir, model: &ScriptedModel, renderer: Box<dyn Renderer>) -> Assistant {
    let mut config = AssistantConfig::default();
    config.render.visual_dir = dir.path().join("visuals");
    Assistant::new(config, Some(Box::new(model.clone())), renderer)
}

#[test]
fn three_boxes_and_two_arrows() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    let model = ScriptedModel::new(&[THREE_BOXES]);
    let assistant = assistant(&dir, &model, Box::new(NoRenderer));

    let applied = assistant
        .run_instruction(&path, "Replace the bullets with three boxes joined by arrows")
        .unwrap();
    assert_eq!(applied.notes.len(), 8);
    assert_eq!(model.calls(), 1);

    let request = &model.requests.borrow()[0];
    assert_eq!(request.model, "gemini-2.5-flash");
    assert!(!request.has_document());
    match &request.parts[0] {
        Part::Text(prompt) => {
            assert!(prompt.contains("talk.pptx"));
            assert!(prompt.contains("Title: 'Process'"));
            assert!(prompt.contains("three boxes joined by arrows"));
        }
        other => panic!("expected a text prompt, got {:?}", other),
    }

    let prs = ops::load_presentation(&path).unwrap();
    let slide = &prs.slides()[0];
    let boxes: Vec<_> = slide
        .shapes()
        .iter()
        .filter(|s| matches!(&s.kind, ShapeKind::AutoShape { preset: Some(p) } if p == "roundRect"))
        .collect();
    let arrows = slide.shapes().iter().filter(|s| s.kind == ShapeKind::Connector).count();
    assert_eq!(boxes.len(), 3);
    assert_eq!(arrows, 2);
    assert_eq!(slide.len(), 6);

    let texts: Vec<_> = boxes.iter().filter_map(|s| s.text()).collect();
    assert_eq!(texts, ["Plan", "Build", "Ship"]);
    let lefts: Vec<_> = boxes.iter().map(|s| s.geometry.unwrap().left).collect();
    assert!(lefts.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn lock_artifact_rejects_before_model_call() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    fs::write(dir.path().join("~$talk.pptx"), b"owner").unwrap();
    let before = fs::read(&path).unwrap();

    let model = ScriptedModel::new(&[THREE_BOXES]);
    let assistant = assistant(&dir, &model, Box::new(NoRenderer));
    let err = assistant.run_instruction(&path, "anything").unwrap_err();

    assert!(matches!(err, Error::Locked { .. }));
    assert_eq!(model.calls(), 0);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn non_compliant_plan_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    let before = fs::read(&path).unwrap();

    let reply = "```json\n{\"operations\": [\n  {\"op\": \"remove_connectors_and_lines\", \"slide\": 0},\n  {\"op\": \"exec\", \"code\": \"import os\"}\n]}\n```";
    let model = ScriptedModel::new(&[reply]);
    let assistant = assistant(&dir, &model, Box::new(NoRenderer));
    let err = assistant.run_instruction(&path, "anything").unwrap_err();

    assert!(matches!(err, Error::NonCompliant(_)));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn prose_reply_is_not_applied() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    let before = fs::read(&path).unwrap();

    let model = ScriptedModel::new(&["I would remove the bullets and add three boxes."]);
    let assistant = assistant(&dir, &model, Box::new(NoRenderer));
    let err = assistant.run_instruction(&path, "anything").unwrap_err();

    assert!(matches!(err, Error::Extraction(_)));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn failing_operation_discards_all_changes() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    let before = fs::read(&path).unwrap();

    let reply = r#"{"operations": [
        {"op": "delete_shapes_except", "slide": 0, "keep": ["title"]},
        {"op": "set_title", "slide": 4, "text": "Nope"}
    ]}"#;
    let model = ScriptedModel::new(&[reply]);
    let assistant = assistant(&dir, &model, Box::new(NoRenderer));
    let err = assistant.run_instruction(&path, "anything").unwrap_err();

    assert!(matches!(err, Error::SlideIndexOutOfRange { index: 4, count: 1 }));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn missing_deck_is_created_and_populated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.pptx");
    let reply = r#"```json
{"operations": [
  {"op": "add_slide", "layout": "Title Only", "as": "s"},
  {"op": "set_title", "slide": "$s", "text": "Hello"}
]}
```"#;
    let model = ScriptedModel::new(&[reply]);
    let assistant = assistant(&dir, &model, Box::new(NoRenderer));
    assistant.run_instruction(&path, "Add a title slide saying Hello").unwrap();

    let prs = ops::load_presentation(&path).unwrap();
    assert_eq!(prs.slide_count(), 1);
    assert_eq!(
        prs.slides()[0].title().and_then(|t| t.text()).as_deref(),
        Some("Hello")
    );
}

#[test]
fn visual_selects_vision_model_and_validates() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    let model = ScriptedModel::new(&[
        THREE_BOXES,
        "```json\n{\"satisfied\": false, \"discrepancies\": [\"arrows too thin\"]}\n```",
    ]);
    let mut config = AssistantConfig::default();
    config.render.visual_dir = dir.path().join("visuals");
    config.model.vision_model = "vision-model".to_string();
    let assistant = Assistant::new(config, Some(Box::new(model.clone())), Box::new(CopyRenderer));

    assistant.run_instruction(&path, "three boxes").unwrap();
    let verdict = assistant.validate(&path, "three boxes");

    assert_eq!(verdict, Verdict::IssuesReported(vec!["arrows too thin".to_string()]));
    let requests = model.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.model == "vision-model" && r.has_document()));
}

#[test]
fn validation_is_skipped_without_renderer() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    let model = ScriptedModel::new(&[]);
    let assistant = assistant(&dir, &model, Box::new(NoRenderer));

    assert!(matches!(assistant.validate(&path, "anything"), Verdict::Skipped(_)));
    assert_eq!(model.calls(), 0);
}

#[test]
fn apply_refuses_deck_with_lock_artifact() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    fs::write(dir.path().join("~$talk.pptx"), b"owner").unwrap();
    let before = fs::read(&path).unwrap();

    let assistant = Assistant::new(AssistantConfig::default(), None, Box::new(NoRenderer));
    let err = assistant
        .apply(&path, r#"[{"op": "set_title", "slide": 0, "text": "Changed"}]"#)
        .unwrap_err();

    assert!(matches!(err, Error::Locked { .. }));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn empty_validator_reply_reports_issues() {
    let dir = TempDir::new().unwrap();
    let path = deck_with_title(&dir);
    let model = ScriptedModel::new(&[""]);
    let assistant = assistant(&dir, &model, Box::new(CopyRenderer));

    assert_eq!(
        assistant.validate(&path, "three boxes"),
        Verdict::IssuesReported(vec!["No feedback.".to_string()])
    );
    assert_eq!(model.calls(), 1);
}
