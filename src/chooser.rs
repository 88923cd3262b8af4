use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Saved and currently running
pub const LOADED_MARK: &str = "[~]";
/// Running but never saved
pub const UNSAVED_MARK: &str = "[*]";

pub const HEADER: &str = "restore a session   [~] running   [*] not saved";

static RE_ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r" \[[~*]\]$").unwrap());

/// Interactive single-choice picker
#[allow(async_fn_in_trait)]
pub trait Picker {
    /// `None` when the user cancelled
    async fn pick(&self, lines: &[String], header: &str) -> Result<Option<String>>;
}

/// Runs an fzf-compatible program with the menu on stdin
pub struct FzfPicker {
    program: String,
}

impl FzfPicker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Picker for FzfPicker {
    async fn pick(&self, lines: &[String], header: &str) -> Result<Option<String>> {
        let mut child = Command::new(&self.program)
            .args(["--header", header])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut menu = lines.join("\n");
            menu.push('\n');
            stdin.write_all(menu.as_bytes()).await?;
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to read selection from {}", self.program))?;

        // fzf exits 130 on Esc and 1 on no match
        if !output.status.success() {
            debug!(status = ?output.status.code(), "picker cancelled");
            return Ok(None);
        }

        let selection = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!selection.is_empty()).then_some(selection))
    }
}

/// Build the annotated menu.
///
/// Saved sessions come first in name order, marked when they are also
/// running. Running sessions that were never saved follow, also in name order.
pub fn menu(saved: &[String], live: &[String]) -> Vec<String> {
    let mut saved: Vec<&String> = saved.iter().collect();
    saved.sort();
    saved.dedup();

    let mut unsaved: Vec<&String> = live.iter().filter(|name| !saved.contains(name)).collect();
    unsaved.sort();
    unsaved.dedup();

    saved
        .into_iter()
        .map(|name| {
            if live.contains(name) {
                format!("{} {}", name, LOADED_MARK)
            } else {
                name.clone()
            }
        })
        .chain(unsaved.into_iter().map(|name| format!("{} {}", name, UNSAVED_MARK)))
        .collect()
}

/// Session name behind a menu line
pub fn strip_annotation(line: &str) -> &str {
    match RE_ANNOTATION.find(line) {
        Some(m) => &line[..m.start()],
        None => line,
    }
}
