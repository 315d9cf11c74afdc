//! `nbias edit`: the secure edit session.

use nbias_core::scratch::ScratchPlacement;
use nbias_core::{EditRequest, EditSession, InterruptGuard, Policy, DEFAULT_VAULT_EXTENSION};

use crate::app::AppContext;
use crate::cli::EditArgs;
use crate::output::outcome_lines;

/// Merge flags over config over built-in defaults.
pub fn build_request(ctx: &AppContext, args: &EditArgs) -> EditRequest {
    let config = ctx.config();

    let allow_extensions = match args.allow_ext.as_deref() {
        Some(list) => Some(Policy::parse_allow_list(list)),
        None => config.policy.allow_extensions.clone(),
    };
    let policy = Policy {
        allow_extensions,
        max_bytes: args.max_bytes.or(config.policy.max_bytes),
    };

    EditRequest {
        target: args.path.clone(),
        vault_extension: args
            .vault_extension
            .clone()
            .or_else(|| config.defaults.vault_extension.clone())
            .unwrap_or_else(|| DEFAULT_VAULT_EXTENSION.to_string()),
        orig_extension: args.orig_ext.clone(),
        requested_profile: args.kdf_profile.or(config.defaults.kdf_profile),
        policy,
        delete_source: args
            .delete_source
            .or(config.defaults.delete_source)
            .unwrap_or_default(),
        assume_yes: args.yes,
        placement: ScratchPlacement::detect(config.scratch.dir.clone()),
        tmpfs: args.tmpfs.or(config.defaults.tmpfs).unwrap_or_default(),
    }
}

pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let request = build_request(ctx, args);
    let mut editor = ctx.editor(args.editor.as_deref())?;
    let mut secrets = ctx.secrets();
    let mut confirmer = ctx.confirmer();

    // Held until the session has finished its cleanup.
    let _guard = InterruptGuard::install()?;
    let mut session = EditSession::new(&request);
    let outcome = session.run(&mut secrets, &mut editor, &mut confirmer)?;

    for line in outcome_lines(&outcome) {
        println!("{}", line);
    }
    Ok(())
}
