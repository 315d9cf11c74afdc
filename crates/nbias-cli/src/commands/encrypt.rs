//! `nbias encrypt`: one-shot vaulting of a plaintext file.

use nbias_core::transfer::{encrypt_file, EncryptRequest};

use crate::app::AppContext;
use crate::cli::EncryptArgs;

pub fn handle_encrypt(ctx: &AppContext, args: &EncryptArgs) -> anyhow::Result<()> {
    let request = EncryptRequest {
        input: args.input.clone(),
        output: args.output.clone(),
        orig_extension: args.orig_ext.clone(),
        profile: ctx.kdf_profile(args.kdf_profile),
        force: args.force,
    };
    encrypt_file(&request, &mut ctx.secrets())?;
    println!(
        "Encrypted {} -> {}",
        args.input.display(),
        args.output.display()
    );
    Ok(())
}
