//! `nbias decrypt`: plaintext to a file or stdout.

use std::io::Write;
use std::path::Path;

use nbias_core::transfer::{decrypt_file, write_plaintext};

use crate::app::AppContext;
use crate::cli::DecryptArgs;

pub fn handle_decrypt(ctx: &AppContext, args: &DecryptArgs) -> anyhow::Result<()> {
    let to_stdout = args.output == Path::new("-");
    if !to_stdout && !args.force && args.output.exists() {
        return Err(anyhow::anyhow!(
            "{} already exists; pass --force to overwrite",
            args.output.display()
        ));
    }

    let decoded = decrypt_file(&args.input, &mut ctx.secrets())?;

    if to_stdout {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(&decoded.plaintext)
            .and_then(|_| stdout.flush())
            .map_err(|e| anyhow::anyhow!("Failed to write to stdout: {}", e))?;
        return Ok(());
    }

    write_plaintext(&args.output, &decoded.plaintext, args.force)?;
    eprintln!(
        "Decrypted {} -> {} (plaintext now on disk)",
        args.input.display(),
        args.output.display()
    );
    Ok(())
}
