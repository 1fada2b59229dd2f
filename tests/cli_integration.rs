//! CLI integration tests
//!
//! Drives the built binary end-to-end.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_aesbatch")).args(args).stdin(Stdio::null()).output().unwrap()
}

fn run_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_aesbatch"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    {
        let mut stdin = child.stdin.take().unwrap();
        let _ = stdin.write_all(input);
    }

    child.wait_with_output().unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_password_roundtrip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.txt");
    let encrypted = dir.path().join("report.txt.aes");
    fs::write(&input, b"quarterly numbers").unwrap();

    let result = run(&["-e", "-q", "-i", "1", "-p", "open sesame", path_str(&input)]);
    assert!(result.status.success(), "encrypt failed: {}", stderr(&result));
    assert!(encrypted.exists());

    fs::remove_file(&input).unwrap();

    let result = run(&["-d", "-q", "-p", "open sesame", path_str(&encrypted)]);
    assert!(result.status.success(), "decrypt failed: {}", stderr(&result));
    assert_eq!(fs::read(&input).unwrap(), b"quarterly numbers");
}

#[test]
fn test_multiple_files() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.txt");
    let second = dir.path().join("b.txt");
    fs::write(&first, b"first").unwrap();
    fs::write(&second, b"second").unwrap();

    let result = run(&["-e", "-i", "1", "-p", "pw", path_str(&first), path_str(&second)]);
    assert!(result.status.success(), "encrypt failed: {}", stderr(&result));

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("a.txt"));
    assert!(stdout.contains("b.txt"));
    assert!(dir.path().join("a.txt.aes").exists());
    assert!(dir.path().join("b.txt.aes").exists());
}

#[test]
fn test_key_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let key = dir.path().join("secret.key");
    let input = dir.path().join("data.bin");
    let decrypted = dir.path().join("data.out");
    fs::write(&input, vec![7u8; 300_000]).unwrap();

    let result = run(&["-g", "-k", path_str(&key), "-s", "100"]);
    assert!(result.status.success(), "generate failed: {}", stderr(&result));
    assert_eq!(fs::read(&key).unwrap().len(), 100);

    let result = run(&["-e", "-q", "-i", "1", "-k", path_str(&key), path_str(&input)]);
    assert!(result.status.success(), "encrypt failed: {}", stderr(&result));

    let encrypted = dir.path().join("data.bin.aes");
    let result = run(&["-d", "-q", "-k", path_str(&key), "-o", path_str(&decrypted), path_str(&encrypted)]);
    assert!(result.status.success(), "decrypt failed: {}", stderr(&result));
    assert_eq!(fs::read(&decrypted).unwrap(), vec![7u8; 300_000]);
}

#[test]
fn test_generate_refuses_existing_key() {
    let dir = TempDir::new().unwrap();
    let key = dir.path().join("secret.key");
    fs::write(&key, b"existing").unwrap();

    let result = run(&["-g", "-k", path_str(&key)]);
    assert!(!result.status.success());
    assert_eq!(fs::read(&key).unwrap(), b"existing");
}

#[test]
fn test_utf16_key_file_matches_utf8() {
    let dir = TempDir::new().unwrap();
    let utf8_key = dir.path().join("utf8.key");
    let utf16_key = dir.path().join("utf16.key");
    let input = dir.path().join("note.txt");
    let decrypted = dir.path().join("note.out");

    fs::write(&utf8_key, "pässwörd\r\n").unwrap();
    let mut utf16 = vec![0xFF, 0xFE];
    utf16.extend("pässwörd".encode_utf16().flat_map(u16::to_le_bytes));
    fs::write(&utf16_key, utf16).unwrap();
    fs::write(&input, b"unicode keys").unwrap();

    let result = run(&["-e", "-q", "-i", "1", "-k", path_str(&utf8_key), path_str(&input)]);
    assert!(result.status.success(), "encrypt failed: {}", stderr(&result));

    let encrypted = dir.path().join("note.txt.aes");
    let result = run(&["-d", "-q", "-k", path_str(&utf16_key), "-o", path_str(&decrypted), path_str(&encrypted)]);
    assert!(result.status.success(), "decrypt failed: {}", stderr(&result));
    assert_eq!(fs::read(&decrypted).unwrap(), b"unicode keys");
}

#[test]
fn test_stdin_to_stdout() {
    let encrypted = run_with_stdin(&["-e", "-i", "1", "-p", "pipe", "-o", "-", "-"], b"streamed data");
    assert!(encrypted.status.success(), "encrypt failed: {}", stderr(&encrypted));
    assert!(encrypted.stdout.starts_with(b"AESB"));

    let decrypted = run_with_stdin(&["-d", "-p", "pipe", "-o", "-", "-"], &encrypted.stdout);
    assert!(decrypted.status.success(), "decrypt failed: {}", stderr(&decrypted));
    assert_eq!(decrypted.stdout, b"streamed data");
}

#[test]
fn test_wrong_password_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a.txt");
    fs::write(&input, b"content").unwrap();

    let result = run(&["-e", "-q", "-i", "1", "-p", "right", path_str(&input)]);
    assert!(result.status.success());
    fs::remove_file(&input).unwrap();

    let result = run(&["-d", "-q", "-p", "wrong", path_str(&dir.path().join("a.txt.aes"))]);
    assert!(!result.status.success());
    assert!(stderr(&result).contains("authentication failed"));
    assert!(!input.exists());
}

#[test]
fn test_existing_output_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a.txt");
    let existing = dir.path().join("a.txt.aes");
    fs::write(&input, b"new").unwrap();
    fs::write(&existing, b"precious").unwrap();

    let result = run(&["-e", "-q", "-i", "1", "-p", "pw", path_str(&input)]);
    assert!(!result.status.success());
    assert!(stderr(&result).contains("Target output file already exists"));
    assert_eq!(fs::read(&existing).unwrap(), b"precious");
}

#[test]
fn test_directory_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("photos");
    fs::create_dir(&folder).unwrap();

    let result = run(&["-e", "-q", "-p", "pw", path_str(&folder)]);
    assert!(!result.status.success());
    assert!(stderr(&result).contains("Input name is not a file"));
}

#[test]
fn test_argument_errors() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.txt");
    let second = dir.path().join("b.txt");
    fs::write(&first, b"a").unwrap();
    fs::write(&second, b"b").unwrap();
    let out = dir.path().join("out.aes");

    assert!(!run(&["-p", "pw", path_str(&first)]).status.success());
    assert!(!run(&["-e", "-p", "pw"]).status.success());
    assert!(!run(&["-e", "-p", "pw", "-k", "key", path_str(&first)]).status.success());
    assert!(!run(&["-g"]).status.success());

    let result = run(&["-e", "-p", "pw", "-o", path_str(&out), path_str(&first), path_str(&second)]);
    assert!(!result.status.success());
    assert!(!out.exists());
    assert!(!dir.path().join("a.txt.aes").exists());
}

#[test]
fn test_version() {
    let result = run(&["--version"]);
    assert!(result.status.success());
    assert!(String::from_utf8_lossy(&result.stdout).starts_with("aesbatch "));
}
