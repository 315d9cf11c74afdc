//! Secret and confirmation input.

use dialoguer::{Confirm, Password};

use nbias_core::crypto::{validate_passphrase, Secret};
use nbias_core::error::{NbiasError, Result};
use nbias_core::{interrupt, Confirmer, SecretProvider, SecretPurpose};

use crate::constants::{ENV_KEY_HEX, ENV_PASSPHRASE};

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Resolves the session secret from flags, environment, then a prompt.
///
/// `--key-hex` > `--passphrase` > `NBIAS_KEY_HEX` > `NBIAS_PASSPHRASE` >
/// interactive prompt.
pub struct CliSecrets<'a> {
    passphrase: Option<&'a str>,
    key_hex: Option<&'a str>,
    interactive: bool,
}

impl<'a> CliSecrets<'a> {
    pub fn new(passphrase: Option<&'a str>, key_hex: Option<&'a str>, interactive: bool) -> Self {
        Self {
            passphrase,
            key_hex,
            interactive,
        }
    }

    fn prompt(&self, purpose: SecretPurpose) -> Result<Secret> {
        let read_failed = |e: dialoguer::Error| match interrupt::pending() {
            Some(signal) => NbiasError::Interrupted(signal),
            None => NbiasError::InvalidSecret(format!("failed to read passphrase: {}", e)),
        };

        match purpose {
            SecretPurpose::Open => {
                let value = Password::new()
                    .with_prompt("Passphrase")
                    .interact()
                    .map_err(read_failed)?;
                Secret::passphrase(value)
            }
            SecretPurpose::Create => loop {
                let value = Password::new()
                    .with_prompt("New passphrase")
                    .with_confirmation("Confirm passphrase", "Passphrases do not match")
                    .interact()
                    .map_err(read_failed)?;
                if let Err(err) = validate_passphrase(&value) {
                    eprintln!("Passphrase does not meet requirements: {}", err);
                    continue;
                }
                return Secret::passphrase(value);
            },
        }
    }
}

impl SecretProvider for CliSecrets<'_> {
    fn provide(&mut self, purpose: SecretPurpose) -> Result<Secret> {
        if let Some(secret) = Secret::resolve(self.passphrase, self.key_hex)? {
            return Ok(secret);
        }
        let env_passphrase = env_value(ENV_PASSPHRASE);
        let env_key_hex = env_value(ENV_KEY_HEX);
        if let Some(secret) = Secret::resolve(env_passphrase.as_deref(), env_key_hex.as_deref())? {
            return Ok(secret);
        }
        if !self.interactive {
            return Err(NbiasError::InvalidSecret(format!(
                "no passphrase or key provided and no TTY available; set {} or {}",
                ENV_PASSPHRASE, ENV_KEY_HEX
            )));
        }
        self.prompt(purpose)
    }
}

/// Yes/no prompt. Without a terminal the answer is always no.
pub struct PromptConfirmer {
    interactive: bool,
}

impl PromptConfirmer {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

impl Confirmer for PromptConfirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if !self.interactive {
            tracing::warn!("no TTY to confirm; keeping the plaintext source");
            return Ok(false);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| NbiasError::IoFailure(format!("failed to read confirmation: {}", e)))
    }
}
