//! `nbias info`: header summary without any secret.

use nbias_core::inspect;

use crate::cli::InfoArgs;
use crate::output::{summary_json, summary_lines};

pub fn handle_info(args: &InfoArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.path.display(), e))?;
    let summary = inspect(&bytes)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
    } else {
        for line in summary_lines(&summary) {
            println!("{}", line);
        }
    }
    Ok(())
}
