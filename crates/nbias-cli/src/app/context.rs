//! Combines parsed arguments with the loaded configuration.

use std::io::IsTerminal;

use nbias_core::KdfProfile;

use crate::cli::Cli;
use crate::config::{load_config, NbiasConfig};
use crate::editor::ProcessEditor;
use crate::helpers::{CliSecrets, PromptConfirmer};

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: NbiasConfig,
    interactive: bool,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> anyhow::Result<Self> {
        Ok(Self {
            cli,
            config: load_config()?,
            interactive: std::io::stdin().is_terminal(),
        })
    }

    pub fn config(&self) -> &NbiasConfig {
        &self.config
    }

    /// Secret source honouring flag, environment and prompt precedence.
    pub fn secrets(&self) -> CliSecrets<'_> {
        CliSecrets::new(
            self.cli.passphrase.as_deref(),
            self.cli.key_hex.as_deref(),
            self.interactive,
        )
    }

    pub fn confirmer(&self) -> PromptConfirmer {
        PromptConfirmer::new(self.interactive)
    }

    /// `flag` > config > `$VISUAL` > `$EDITOR`.
    pub fn editor(&self, flag: Option<&str>) -> anyhow::Result<ProcessEditor> {
        ProcessEditor::resolve(flag, self.config.defaults.editor.as_deref())
    }

    pub fn kdf_profile(&self, flag: Option<KdfProfile>) -> KdfProfile {
        flag.or(self.config.defaults.kdf_profile)
            .unwrap_or_default()
    }
}
