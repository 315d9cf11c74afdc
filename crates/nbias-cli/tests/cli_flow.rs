use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::{tempdir, TempDir};

const PASSPHRASE: &str = "correct-horse";
const HEX_KEY: &str = "4242424242424242424242424242424242424242424242424242424242424242";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_nbias"))
}

/// Isolated HOME, config, temp and runtime directories per test.
struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let root = tempdir().expect("create sandbox");
        for sub in ["tmp", "runtime", "config", "work"] {
            fs::create_dir_all(root.path().join(sub)).expect("create sandbox dir");
        }
        Self { root }
    }

    fn work(&self, name: &str) -> PathBuf {
        self.root.path().join("work").join(name)
    }

    fn config_path(&self) -> PathBuf {
        self.root.path().join("config").join("nbias.toml")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.stdin(Stdio::null())
            .env_remove("NBIAS_PASSPHRASE")
            .env_remove("NBIAS_KEY_HEX")
            .env_remove("NBIAS_LOG")
            .env_remove("VISUAL")
            .env_remove("EDITOR")
            .env("HOME", self.root.path())
            .env("XDG_CONFIG_HOME", self.root.path().join("config"))
            .env("NBIAS_CONFIG", self.config_path())
            .env("TMPDIR", self.root.path().join("tmp"))
            .env("XDG_RUNTIME_DIR", self.root.path().join("runtime"));
        cmd
    }

    fn run(&self, args: &[&str], passphrase: Option<&str>) -> Output {
        let mut cmd = self.command();
        cmd.args(args);
        if let Some(value) = passphrase {
            cmd.env("NBIAS_PASSPHRASE", value);
        }
        cmd.output().expect("run nbias")
    }

    /// Shell script editor running `body` with the scratch path as `$1`.
    fn editor(&self, name: &str, body: &str) -> String {
        let path = self.root.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write editor script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("chmod editor script");
        }
        path.to_string_lossy().to_string()
    }

    fn leftover_scratch(&self) -> Vec<PathBuf> {
        ["tmp", "runtime"]
            .iter()
            .flat_map(|sub| fs::read_dir(self.root.path().join(sub)).expect("read scratch root"))
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().starts_with("nbias-"))
                    .unwrap_or(false)
            })
            .collect()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn decrypt_to_stdout(sandbox: &Sandbox, vault: &Path) -> String {
    let output = sandbox.run(
        &["decrypt", "-i", &path_arg(vault), "-o", "-"],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "decrypt failed: {}", stderr(&output));
    stdout(&output)
}

#[test]
fn test_encrypt_decrypt_round_trip() {
    let sandbox = Sandbox::new();
    let input = sandbox.work("hello.txt");
    let vault = sandbox.work("hello.nbv");
    fs::write(&input, "hello-123\n").unwrap();

    let output = sandbox.run(
        &[
            "encrypt",
            "-i",
            &path_arg(&input),
            "-o",
            &path_arg(&vault),
            "--kdf-profile",
            "fast",
        ],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "encrypt failed: {}", stderr(&output));
    assert!(!fs::read(&vault).unwrap().windows(9).any(|w| w == b"hello-123"));

    assert_eq!(decrypt_to_stdout(&sandbox, &vault), "hello-123\n");

    let out_file = sandbox.work("restored.txt");
    let output = sandbox.run(
        &["decrypt", "-i", &path_arg(&vault), "-o", &path_arg(&out_file)],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "decrypt failed: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&out_file).unwrap(), "hello-123\n");
}

#[test]
fn test_wrong_passphrase_exits_one_with_single_line() {
    let sandbox = Sandbox::new();
    let input = sandbox.work("a.txt");
    let vault = sandbox.work("a.nbv");
    fs::write(&input, "secret").unwrap();
    let output = sandbox.run(
        &["encrypt", "-i", &path_arg(&input), "-o", &path_arg(&vault), "--kdf-profile", "fast"],
        Some(PASSPHRASE),
    );
    assert!(output.status.success());

    let output = sandbox.run(
        &["decrypt", "-i", &path_arg(&vault), "-o", "-"],
        Some("wrong-horse"),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert_eq!(
        stderr(&output).trim_end(),
        "nbias: authentication failed: wrong secret or damaged vault"
    );
}

#[test]
fn test_invalid_flag_values_exit_one_with_single_line() {
    let sandbox = Sandbox::new();
    let input = sandbox.work("a.txt");
    let vault = sandbox.work("a.nbv");
    fs::write(&input, "secret").unwrap();

    let output = sandbox.run(
        &["encrypt", "-i", &path_arg(&input), "-o", &path_arg(&vault), "--kdf-profile", "paranoid"],
        Some(PASSPHRASE),
    );
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert_eq!(err.lines().count(), 1, "stderr: {}", err);
    assert!(err.starts_with("nbias: "));
    assert!(err.contains("paranoid"));
    assert!(!vault.exists());

    let output = sandbox.run(&["edit", &path_arg(&input), "--max-bytes", "abc"], Some(PASSPHRASE));
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output).lines().count(), 1);
}

#[test]
fn test_help_still_exits_zero() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--help"], None);
    assert!(output.status.success());
    assert!(stdout(&output).contains("edit"));
}

#[test]
fn test_info_needs_no_secret() {
    let sandbox = Sandbox::new();
    let input = sandbox.work("doc.md");
    let vault = sandbox.work("doc.md.nbv");
    fs::write(&input, "# doc").unwrap();
    let output = sandbox.run(
        &["encrypt", "-i", &path_arg(&input), "-o", &path_arg(&vault), "--kdf-profile", "fast"],
        Some(PASSPHRASE),
    );
    assert!(output.status.success());

    let output = sandbox.run(&["info", &path_arg(&vault), "--json"], None);
    assert!(output.status.success(), "info failed: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["kdf_algorithm"], "argon2id");
    assert_eq!(json["kdf_profile"], "fast");
    assert_eq!(json["ciphertext_length"], 5);
    assert_eq!(json["original_extension"], "md");

    let output = sandbox.run(&["info", &path_arg(&vault)], None);
    assert!(stdout(&output).contains("profile: fast"));
}

#[test]
fn test_info_rejects_unknown_version() {
    let sandbox = Sandbox::new();
    let vault = sandbox.work("future.nbv");
    let mut bytes = b"NBV\x1a".to_vec();
    bytes.push(0xFF);
    bytes.extend_from_slice(&[0u8; 100]);
    fs::write(&vault, bytes).unwrap();

    let output = sandbox.run(&["info", &path_arg(&vault)], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unsupported vault version 255"));
}

#[test]
fn test_edit_creates_and_updates_vault() {
    let sandbox = Sandbox::new();
    let vault = sandbox.work("journal.nbv");
    let editor = sandbox.editor("append.sh", "printf 'entry\\n' >> \"$1\"");

    for _ in 0..2 {
        let output = sandbox.run(
            &[
                "edit",
                &path_arg(&vault),
                "--editor",
                &editor,
                "--kdf-profile",
                "fast",
                "--tmpfs",
                "never",
            ],
            Some(PASSPHRASE),
        );
        assert!(output.status.success(), "edit failed: {}", stderr(&output));
    }

    assert_eq!(decrypt_to_stdout(&sandbox, &vault), "entry\nentry\n");
    assert!(sandbox.leftover_scratch().is_empty());
}

#[test]
fn test_edit_plaintext_source_and_delete_it() {
    let sandbox = Sandbox::new();
    let source = sandbox.work("notes.md");
    fs::write(&source, "# notes\n").unwrap();
    let editor = sandbox.editor("noop.sh", "exit 0");

    let output = sandbox.run(
        &[
            "edit",
            &path_arg(&source),
            "--editor",
            &editor,
            "--kdf-profile",
            "fast",
            "--tmpfs",
            "never",
            "--delete-source",
            "yes",
        ],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "edit failed: {}", stderr(&output));
    assert!(!source.exists());

    let vault = sandbox.work("notes.md.nbv");
    assert_eq!(decrypt_to_stdout(&sandbox, &vault), "# notes\n");
}

#[test]
fn test_ask_without_tty_keeps_source() {
    let sandbox = Sandbox::new();
    let source = sandbox.work("keep.txt");
    fs::write(&source, "keep me").unwrap();
    let editor = sandbox.editor("noop.sh", "exit 0");

    let output = sandbox.run(
        &[
            "edit",
            &path_arg(&source),
            "--editor",
            &editor,
            "--kdf-profile",
            "fast",
            "--tmpfs",
            "never",
        ],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "edit failed: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&source).unwrap(), "keep me");
    assert!(stdout(&output).contains("Plaintext source kept"));
}

#[test]
fn test_failing_editor_leaves_vault_untouched() {
    let sandbox = Sandbox::new();
    let vault = sandbox.work("stable.nbv");
    let writer = sandbox.editor("write.sh", "printf 'v1' > \"$1\"");
    let output = sandbox.run(
        &["edit", &path_arg(&vault), "--editor", &writer, "--kdf-profile", "fast", "--tmpfs", "never"],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "edit failed: {}", stderr(&output));
    let before = fs::read(&vault).unwrap();

    let failing = sandbox.editor("fail.sh", "printf 'v2' > \"$1\"\nexit 7");
    let output = sandbox.run(
        &["edit", &path_arg(&vault), "--editor", &failing, "--tmpfs", "never"],
        Some(PASSPHRASE),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("editor failed"));
    assert_eq!(fs::read(&vault).unwrap(), before);
    assert!(sandbox.leftover_scratch().is_empty());
}

#[test]
fn test_max_bytes_rejects_before_editor() {
    let sandbox = Sandbox::new();
    let source = sandbox.work("big.txt");
    fs::write(&source, "x".repeat(100)).unwrap();
    let marker = sandbox.work("editor-ran");
    let editor = sandbox.editor("mark.sh", &format!("touch '{}'", marker.display()));

    let output = sandbox.run(
        &["edit", &path_arg(&source), "--editor", &editor, "--max-bytes", "10"],
        Some(PASSPHRASE),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("nbias: policy rejected"));
    assert!(!marker.exists());
    assert!(!sandbox.work("big.txt.nbv").exists());
}

#[test]
fn test_config_allow_list_applies() {
    let sandbox = Sandbox::new();
    fs::write(
        sandbox.config_path(),
        "[policy]\nallow_extensions = [\"txt\"]\n",
    )
    .unwrap();
    let source = sandbox.work("script.sh");
    fs::write(&source, "echo").unwrap();
    let editor = sandbox.editor("noop.sh", "exit 0");

    let output = sandbox.run(&["edit", &path_arg(&source), "--editor", &editor], Some(PASSPHRASE));
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("policy rejected"));
}

#[test]
fn test_missing_secret_without_tty() {
    let sandbox = Sandbox::new();
    let input = sandbox.work("n.txt");
    fs::write(&input, "n").unwrap();
    let output = sandbox.run(
        &["encrypt", "-i", &path_arg(&input), "-o", &path_arg(&sandbox.work("n.nbv"))],
        None,
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("invalid secret"));
}

#[test]
fn test_key_hex_round_trip() {
    let sandbox = Sandbox::new();
    let input = sandbox.work("k.txt");
    let vault = sandbox.work("k.nbv");
    fs::write(&input, "raw key body").unwrap();

    let output = sandbox.run(
        &["encrypt", "-i", &path_arg(&input), "-o", &path_arg(&vault), "--key-hex", HEX_KEY],
        None,
    );
    assert!(output.status.success(), "encrypt failed: {}", stderr(&output));

    // The hex key wins over a passphrase from the environment.
    let output = sandbox.run(
        &["decrypt", "-i", &path_arg(&vault), "-o", "-", "--key-hex", HEX_KEY],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "decrypt failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "raw key body");

    let output = sandbox.run(&["info", &path_arg(&vault), "--json"], None);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["kdf_algorithm"], "raw_key");
}

#[test]
fn test_secret_precedence_in_both_orders() {
    let sandbox = Sandbox::new();
    let input = sandbox.work("p.txt");
    let raw_vault = sandbox.work("raw.nbv");
    let pass_vault = sandbox.work("pass.nbv");
    fs::write(&input, "precedence").unwrap();

    let output = sandbox.run(
        &["encrypt", "-i", &path_arg(&input), "-o", &path_arg(&raw_vault), "--key-hex", HEX_KEY],
        None,
    );
    assert!(output.status.success(), "encrypt failed: {}", stderr(&output));
    let output = sandbox.run(
        &["encrypt", "-i", &path_arg(&input), "-o", &path_arg(&pass_vault), "--kdf-profile", "fast"],
        Some(PASSPHRASE),
    );
    assert!(output.status.success(), "encrypt failed: {}", stderr(&output));

    // Both flags, key first on the command line: the key still wins.
    let output = sandbox
        .command()
        .args(["decrypt", "-i", &path_arg(&raw_vault), "-o", "-"])
        .args(["--key-hex", HEX_KEY, "--passphrase", PASSPHRASE])
        .output()
        .unwrap();
    assert!(output.status.success(), "decrypt failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "precedence");

    // Both in the environment: the key wins there too.
    let output = sandbox
        .command()
        .args(["decrypt", "-i", &path_arg(&raw_vault), "-o", "-"])
        .env("NBIAS_PASSPHRASE", PASSPHRASE)
        .env("NBIAS_KEY_HEX", HEX_KEY)
        .output()
        .unwrap();
    assert!(output.status.success(), "decrypt failed: {}", stderr(&output));

    // A passphrase flag beats a key in the environment.
    let output = sandbox
        .command()
        .args(["decrypt", "-i", &path_arg(&pass_vault), "-o", "-"])
        .args(["--passphrase", PASSPHRASE])
        .env("NBIAS_KEY_HEX", HEX_KEY)
        .output()
        .unwrap();
    assert!(output.status.success(), "decrypt failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "precedence");

    // A key flag beats a passphrase in the environment.
    let output = sandbox.run(
        &["decrypt", "-i", &path_arg(&pass_vault), "-o", "-", "--key-hex", HEX_KEY],
        Some(PASSPHRASE),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}
