//! Plain `field: value` output.

use nbias_core::crypto::KdfAlgorithm;
use nbias_core::{HeaderSummary, SessionOutcome, SourceDisposition};

pub fn summary_lines(summary: &HeaderSummary) -> Vec<String> {
    let algorithm = match summary.kdf_algorithm {
        KdfAlgorithm::Argon2id => "argon2id",
        KdfAlgorithm::RawKey => "raw-key",
    };
    let mut lines = vec![
        format!("version: {}", summary.version),
        format!("kdf: {}", algorithm),
    ];
    if let Some(profile) = summary.kdf_profile {
        lines.push(format!("profile: {}", profile));
        lines.push(format!("memory_kib: {}", summary.memory_kib));
        lines.push(format!("iterations: {}", summary.iterations));
        lines.push(format!("parallelism: {}", summary.parallelism));
    }
    lines.push("cipher: xchacha20-poly1305".to_string());
    lines.push(format!("ciphertext_bytes: {}", summary.ciphertext_length));
    lines.push(format!(
        "original_extension: {}",
        summary.original_extension.as_deref().unwrap_or("-")
    ));
    lines
}

pub fn outcome_lines(outcome: &SessionOutcome) -> Vec<String> {
    let path = outcome.vault_path.display();
    let mut lines = vec![match (outcome.created, outcome.content_changed) {
        (true, _) => format!("Created {}", path),
        (false, true) => format!("Saved {}", path),
        (false, false) => format!("No changes; resealed {}", path),
    }];
    match outcome.source_disposition {
        SourceDisposition::Deleted => lines.push("Plaintext source erased".to_string()),
        SourceDisposition::Kept => lines.push("Plaintext source kept".to_string()),
        SourceDisposition::NotApplicable => {}
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbias_core::crypto::{derive, KdfParams, KdfProfile, Secret};
    use nbias_core::vault::{encode, inspect, Metadata};

    #[test]
    fn test_summary_lines_for_passphrase_vault() {
        let secret = Secret::passphrase("correct-horse").unwrap();
        let key = derive(&secret, &KdfParams::for_profile(KdfProfile::Fast).unwrap()).unwrap();
        let sealed = encode(b"abc", &key, &Metadata::with_extension("md").unwrap()).unwrap();
        let lines = summary_lines(&inspect(&sealed).unwrap());

        assert!(lines.contains(&"kdf: argon2id".to_string()));
        assert!(lines.contains(&"profile: fast".to_string()));
        assert!(lines.contains(&"ciphertext_bytes: 3".to_string()));
        assert!(lines.contains(&"original_extension: md".to_string()));
    }
}
