//! Headless LibreOffice conversion.

use super::{artifact_path, Renderer};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Commands tried in order when none is configured.
fn candidates() -> Vec<&'static str> {
    let mut commands = vec!["soffice", "libreoffice"];
    if cfg!(target_os = "macos") {
        commands.push("/Applications/LibreOffice.app/Contents/MacOS/soffice");
    } else if cfg!(windows) {
        commands.push(r"C:\Program Files\LibreOffice\program\soffice.exe");
    }
    commands
}

/// Runs `soffice --headless --convert-to pdf`.
#[derive(Debug, Clone)]
pub struct LibreOfficeRenderer {
    command: String,
}

impl LibreOfficeRenderer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Find a working LibreOffice binary. A configured command is the only
    /// one tried when given.
    pub fn detect(command: Option<&str>) -> Option<Self> {
        let tried: Vec<&str> = match command {
            Some(c) => vec![c],
            None => candidates(),
        };
        tried.into_iter().find_map(|cmd| {
            let ok = Command::new(cmd)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false);
            debug!(command = cmd, available = ok, "probed conversion engine");
            ok.then(|| Self::new(cmd))
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Renderer for LibreOfficeRenderer {
    fn name(&self) -> &str {
        "libreoffice"
    }

    fn render(&self, deck: &Path, out_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(out_dir)?;
        let deck = fs::canonicalize(deck)?;
        let out_dir = fs::canonicalize(out_dir)?;

        let output = Command::new(&self.command)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(&deck)
            .arg("--outdir")
            .arg(&out_dir)
            .output()
            .map_err(|e| Error::Render(format!("cannot run {}: {}", self.command, e)))?;

        if !output.status.success() {
            return Err(Error::Render(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let pdf = artifact_path(&deck, &out_dir);
        if !pdf.exists() {
            return Err(Error::Render(format!(
                "expected {} was not produced",
                pdf.display()
            )));
        }
        info!(pdf = %pdf.display(), "rendered deck");
        Ok(pdf)
    }
}
