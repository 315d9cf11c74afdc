//! JSON output for `info --json`.

use nbias_core::HeaderSummary;

/// Header summary as a JSON value. Salt and nonce bytes are never included.
pub fn summary_json(summary: &HeaderSummary) -> serde_json::Value {
    serde_json::json!({
        "version": summary.version,
        "kdf_algorithm": summary.kdf_algorithm,
        "kdf_profile": summary.kdf_profile,
        "memory_kib": summary.memory_kib,
        "iterations": summary.iterations,
        "parallelism": summary.parallelism,
        "salt_length": summary.salt_length,
        "nonce_length": summary.nonce_length,
        "ciphertext_length": summary.ciphertext_length,
        "tag_length": summary.tag_length,
        "original_extension": summary.original_extension,
    })
}
