//! The instruction pipeline: inspect, generate, apply, validate.
//!
//! Each instruction is one pass with no retries. The deck on disk changes
//! only when a plan was extracted, passed the helper catalogue check and
//! applied without a fault. Validation is advisory and never undoes an edit.
//!
//! ```no_run
//! use deckpilot::config::AssistantConfig;
//! use deckpilot::pipeline::Assistant;
//!
//! let assistant = Assistant::from_config(AssistantConfig::discover(None)?)?;
//! let applied = assistant.run_instruction("deck.pptx".as_ref(), "Put the bullets on slide 2 in three boxes")?;
//! for note in &applied.notes {
//!     println!("{}", note);
//! }
//! println!("{:?}", assistant.validate("deck.pptx".as_ref(), "Put the bullets on slide 2 in three boxes"));
//! # Ok::<(), deckpilot::Error>(())
//! ```

mod prompt;

pub use prompt::{edit_prompt, validation_prompt};

use crate::config::AssistantConfig;
use crate::error::{Error, Result};
use crate::llm::{GeminiClient, ModelClient, ModelRequest};
use crate::lock;
use crate::model::Presentation;
use crate::ops;
use crate::plan::{apply_plan, extract_plan_text, EditPlan};
use crate::render::{self, NoRenderer, Renderer};
use crate::summary;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The structure summary and, when rendering worked, the PDF of a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub summary: String,
    pub visual: Option<PathBuf>,
}

/// A plan that was applied and saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// One note per operation, in order
    pub notes: Vec<String>,
    pub plan: String,
}

/// Outcome of checking the edited deck against the instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    IssuesReported(Vec<String>),
    /// Validation could not run; the edit stands.
    Skipped(String),
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied)
    }
}

#[derive(Debug, Deserialize)]
struct VerdictReply {
    satisfied: bool,
    #[serde(default)]
    discrepancies: Vec<String>,
}

/// Turn a validator reply into a verdict.
///
/// A JSON verdict is taken as is. Free text counts as satisfied only when it
/// says "no issues" or "looks good".
pub fn parse_verdict(reply: &str) -> Verdict {
    let structured = extract_plan_text(reply)
        .ok()
        .and_then(|text| serde_json::from_str::<VerdictReply>(&text).ok());
    if let Some(v) = structured {
        return if v.satisfied {
            Verdict::Satisfied
        } else if v.discrepancies.is_empty() {
            Verdict::IssuesReported(vec!["the validator did not list the issues".to_string()])
        } else {
            Verdict::IssuesReported(v.discrepancies)
        };
    }

    let feedback = reply.trim();
    let lower = feedback.to_lowercase();
    if lower.contains("no issues") || lower.contains("looks good") {
        Verdict::Satisfied
    } else if feedback.is_empty() {
        Verdict::IssuesReported(vec!["No feedback.".to_string()])
    } else {
        Verdict::IssuesReported(vec![feedback.to_string()])
    }
}

/// Drives instructions against deck files.
pub struct Assistant {
    config: AssistantConfig,
    model: Option<Box<dyn ModelClient>>,
    renderer: Box<dyn Renderer>,
}

impl Assistant {
    pub fn new(
        config: AssistantConfig,
        model: Option<Box<dyn ModelClient>>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            config,
            model,
            renderer,
        }
    }

    /// Build the Gemini client and renderer the configuration asks for.
    ///
    /// A missing API key is not an error here; instructions fail later
    /// with [`Error::ModelUnavailable`].
    pub fn from_config(config: AssistantConfig) -> Result<Self> {
        let model: Option<Box<dyn ModelClient>> = match config.model.api_key.as_deref() {
            Some(key) => Some(Box::new(GeminiClient::new(
                key,
                config.model.api_base.as_deref(),
                config.model.timeout(),
            )?)),
            None => {
                warn!("GOOGLE_API_KEY not set; instructions cannot be processed");
                None
            }
        };
        let renderer: Box<dyn Renderer> = if config.render.enabled {
            render::detect_renderer(config.render.command.as_deref())
        } else {
            Box::new(NoRenderer)
        };
        info!(
            text_model = %config.model.text_model,
            vision_model = %config.model.vision_model,
            renderer = renderer.name(),
            "assistant ready"
        );
        Ok(Self::new(config, model, renderer))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Create an empty presentation at `path` if nothing is there yet.
    /// Returns whether a file was created.
    pub fn ensure_deck(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut prs = ops::new_presentation()?;
        prs.save_as(path)?;
        info!(path = %path.display(), "created new presentation");
        Ok(true)
    }

    /// Summarize the deck and render it when possible.
    pub fn inspect(&self, path: &Path) -> Result<Inspection> {
        let prs = ops::load_presentation(path)?;
        let summary = summary::summarize(&prs);
        let visual = render::render_visual(
            self.renderer.as_ref(),
            &prs,
            path,
            &self.config.render.visual_dir,
        );
        debug!(slides = prs.slide_count(), visual = visual.is_some(), "inspected deck");
        Ok(Inspection { summary, visual })
    }

    /// Ask the model for an edit plan and return the extracted plan text.
    pub fn generate(&self, path: &Path, instruction: &str, inspection: &Inspection) -> Result<String> {
        let model = self.model.as_ref().ok_or(Error::ModelUnavailable)?;
        if lock::has_lock_artifact(path) {
            return Err(Error::Locked {
                path: path.to_path_buf(),
            });
        }

        let visual = inspection.visual.as_ref().filter(|p| p.exists());
        let model_name = match visual {
            Some(_) => &self.config.model.vision_model,
            None => &self.config.model.text_model,
        };
        info!(model = %model_name, visual = visual.is_some(), "requesting edit plan");

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut request = ModelRequest::new(model_name.as_str()).text(edit_prompt(
            &file_name,
            &inspection.summary,
            instruction,
            visual.is_some(),
        ));
        if let Some(pdf) = visual {
            request = request.pdf(pdf);
        }

        let reply = model.generate(&request)?;
        debug!(chars = reply.len(), "model replied");
        extract_plan_text(&reply)
    }

    /// Check `plan` against the helper catalogue, apply it and save.
    ///
    /// The file is written only when every operation succeeds and no other
    /// application holds the deck.
    pub fn apply(&self, path: &Path, plan: &str) -> Result<Applied> {
        let edit_plan = EditPlan::parse(plan)?;
        if lock::has_lock_artifact(path) || lock::is_file_locked(path) {
            return Err(Error::Locked {
                path: path.to_path_buf(),
            });
        }

        let mut prs = ops::load_presentation(path)?;
        let notes = apply_plan(&mut prs, &edit_plan)?;
        prs.save()?;
        info!(path = %path.display(), operations = notes.len(), "edit plan applied");
        Ok(Applied {
            notes,
            plan: plan.to_string(),
        })
    }

    /// Inspect, generate and apply in one pass. Creates the deck first if it
    /// does not exist.
    pub fn run_instruction(&self, path: &Path, instruction: &str) -> Result<Applied> {
        self.ensure_deck(path)?;
        let inspection = self.inspect(path)?;
        let plan = self.generate(path, instruction, &inspection)?;
        self.apply(path, &plan)
    }

    /// Re-render the deck and ask the vision model whether it matches.
    pub fn validate(&self, path: &Path, instruction: &str) -> Verdict {
        let Some(model) = self.model.as_ref() else {
            return Verdict::Skipped("model client not initialized".to_string());
        };
        let prs: Presentation = match ops::load_presentation(path) {
            Ok(prs) => prs,
            Err(e) => return Verdict::Skipped(format!("cannot reload deck: {}", e)),
        };
        let Some(pdf) = render::render_visual(
            self.renderer.as_ref(),
            &prs,
            path,
            &self.config.render.visual_dir,
        ) else {
            return Verdict::Skipped("PDF conversion unavailable or failed".to_string());
        };

        let request = ModelRequest::new(self.config.model.vision_model.as_str())
            .text(validation_prompt(instruction))
            .pdf(pdf);
        match model.generate(&request) {
            Ok(reply) if reply.trim().is_empty() => {
                warn!("validator returned no feedback");
                Verdict::IssuesReported(vec!["No feedback.".to_string()])
            }
            Ok(reply) => {
                let verdict = parse_verdict(&reply);
                info!(satisfied = verdict.is_satisfied(), "validation finished");
                verdict
            }
            Err(e) => {
                warn!(error = %e, "validation call failed");
                Verdict::Skipped(format!("validation error: {}", e))
            }
        }
    }
}
