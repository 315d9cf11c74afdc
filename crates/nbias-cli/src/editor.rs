//! The external editor process.

use std::path::Path;
use std::process::Command;
use std::thread::sleep;
use std::time::Duration;

use nbias_core::error::{NbiasError, Result};
use nbias_core::{interrupt, EditorCollaborator, EditorExit};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An editor command line; the scratch path is appended as the last
/// argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEditor {
    program: String,
    args: Vec<String>,
}

impl ProcessEditor {
    /// Split an editor string such as `code --wait` on whitespace.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// `flag` > `config` > `$VISUAL` > `$EDITOR`.
    pub fn resolve(flag: Option<&str>, config: Option<&str>) -> anyhow::Result<Self> {
        let from_env = |name: &str| std::env::var(name).ok();
        flag.map(str::to_string)
            .or_else(|| config.map(str::to_string))
            .or_else(|| from_env("VISUAL"))
            .or_else(|| from_env("EDITOR"))
            .as_deref()
            .and_then(Self::parse)
            .ok_or_else(|| {
                anyhow::anyhow!("No editor configured; set $EDITOR or pass --editor")
            })
    }
}

impl EditorCollaborator for ProcessEditor {
    fn edit(&mut self, path: &Path) -> Result<EditorExit> {
        tracing::debug!(program = %self.program, "launching editor");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .spawn()
            .map_err(|e| {
                NbiasError::EditorFailed(format!("failed to launch {}: {}", self.program, e))
            })?;

        loop {
            if let Some(signal) = interrupt::pending() {
                if interrupt::is_keyboard(signal) {
                    // The editor got it too and decides for itself.
                    interrupt::take();
                    tracing::debug!(signal, "keyboard signal left to the editor");
                } else {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(NbiasError::Interrupted(signal));
                }
            }
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(EditorExit::Success),
                Ok(Some(status)) => return Ok(EditorExit::Failed(status.code())),
                Ok(None) => sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(NbiasError::io("wait for editor", e));
                }
            }
        }
    }
}
