use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use nbias_core::scratch::TmpfsMode;
use nbias_core::{DeleteSourceMode, KdfProfile, VERSION};

/// nbias - edit notes that only ever rest on disk encrypted
#[derive(Parser)]
#[command(name = "nbias")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Passphrase (visible in process listings; prefer NBIAS_PASSPHRASE or the prompt)
    #[arg(long, global = true, value_name = "PASSPHRASE")]
    pub passphrase: Option<String>,

    /// Raw 256-bit key as 64 hex digits; wins over --passphrase
    #[arg(long, global = true, value_name = "HEX")]
    pub key_hex: Option<String>,

    /// Debug logging and detailed error messages
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Vault to edit, or a plaintext file to bring under encryption
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Editor command (default: config, then $VISUAL, then $EDITOR)
    #[arg(long)]
    pub editor: Option<String>,

    /// Extension that marks a vault file [default: nbv]
    #[arg(long = "ext", value_name = "EXT")]
    pub vault_extension: Option<String>,

    /// Only allow documents with these extensions (comma separated)
    #[arg(long = "allow-ext", value_name = "EXTS")]
    pub allow_ext: Option<String>,

    /// Refuse documents larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_bytes: Option<u64>,

    /// Answer yes to the delete-source prompt
    #[arg(short, long)]
    pub yes: bool,

    /// What to do with a plaintext source once vaulted: ask, yes, no
    #[arg(long, value_name = "MODE")]
    pub delete_source: Option<DeleteSourceMode>,

    /// Document extension recorded in a new vault
    #[arg(long, value_name = "EXT")]
    pub orig_ext: Option<String>,

    /// Key derivation cost for new vaults: fast, balanced, hardened
    #[arg(long, value_name = "PROFILE")]
    pub kdf_profile: Option<KdfProfile>,

    /// Scratch placement: prefer (memory-backed first) or never
    #[arg(long, value_name = "MODE")]
    pub tmpfs: Option<TmpfsMode>,
}

/// Arguments for the `encrypt` command
#[derive(Args)]
pub struct EncryptArgs {
    /// Plaintext input file
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Vault file to write
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Document extension recorded in the vault (default: the input's)
    #[arg(long, value_name = "EXT")]
    pub orig_ext: Option<String>,

    /// Key derivation cost: fast, balanced, hardened
    #[arg(long, value_name = "PROFILE")]
    pub kdf_profile: Option<KdfProfile>,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `decrypt` command
#[derive(Args)]
pub struct DecryptArgs {
    /// Vault file to read
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Plaintext output file, or - for stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `info` command
#[derive(Args)]
pub struct InfoArgs {
    /// Vault file to inspect
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Print the header summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decrypt into a private scratch copy, edit, and reseal
    Edit(EditArgs),

    /// Encrypt a plaintext file into a new vault
    Encrypt(EncryptArgs),

    /// Decrypt a vault to a file or stdout
    Decrypt(DecryptArgs),

    /// Show a vault's header without decrypting it
    Info(InfoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
