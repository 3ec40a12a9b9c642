/// End-to-end tests for the refdata shell.
/// Each test pipes a script into the binary and checks what it prints.

/// Helper to run shell commands and capture stdout.
fn run_cli_command(command: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new(env!("CARGO_BIN_EXE_refdata"))
        .env("REFDATA_LOG", "off")
        .env("REFDATA_BUFFER_CAPACITY", "64")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        // the shell may already have exited on QUIT, so a broken pipe is fine
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        let script = format!("{command}EXIT\n");
        stdin.write_all(script.as_bytes()).ok();
    }

    let output = child.wait_with_output().expect("Failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// The result lines only: prompts and the banner stripped.
fn result_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .map(|l| l.trim_start_matches("> ").to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[test]
fn test_banner_reflects_config() {
    let output = run_cli_command("");
    assert!(output.starts_with("refdata shell (buffer=64B, pool=16/bucket)"));
    assert!(output.contains("bye"));
}

#[test]
fn test_encode_range_key() {
    let output = run_cli_command("ENCODE RANGE 7 10 20\n");
    assert_eq!(
        result_lines(&output),
        ["00000007800000000000000a8000000000000014", "bye"]
    );
}

#[test]
fn test_locate_within_and_outside() {
    let key = "00000007800000000000000a8000000000000014";
    let script = format!(
        "LOCATE {key} 7 9\nLOCATE {key} 7 10\nLOCATE {key} 7 19\nLOCATE {key} 7 20\nLOCATE {key} 1 15\n"
    );
    let output = run_cli_command(&script);
    assert_eq!(
        result_lines(&output),
        ["below", "within", "within", "above", "uid-mismatch", "bye"]
    );
}

#[test]
fn test_decode_point_key() {
    let output = run_cli_command("DECODE POINT 000000026b6579\n");
    assert!(output.contains("uid=00000002 key=\"key\""));
}

#[test]
fn test_refcount_underflow_is_error() {
    let output = run_cli_command("REFCOUNT DEC 00000000\nREFCOUNT INC 00000000\n");
    let lines = result_lines(&output);
    assert!(lines[0].starts_with("ERR reference count out of range"));
    assert_eq!(lines[1], "00000001 (ref_count=1)");
}

#[test]
fn test_touch_then_decode_info() {
    let create = run_cli_command("ENCODE INFO 100 100 200 complete\n");
    let info = result_lines(&create).remove(0);

    let touched = run_cli_command(&format!("TOUCH {info} 5000\n"));
    let touched = result_lines(&touched).remove(0);
    assert_eq!(touched.len(), info.len());

    let decoded = run_cli_command(&format!("DECODE INFO {touched}\n"));
    assert!(decoded.contains("created=100 accessed=5000 effective=200 state=Complete"));
}

#[test]
fn test_legacy_info_record() {
    // three timestamps and state 2, no suffix
    let legacy = format!("{}{}{}02", "00".repeat(8), "00".repeat(8), "00".repeat(8));
    let output = run_cli_command(&format!("DECODE INFO {legacy}\n"));
    assert!(output.contains("state=Complete legacy"));
}

#[test]
fn test_corrupt_record_reports_context() {
    let output = run_cli_command("DECODE RANGE 0000000180\n");
    assert!(output.contains("ERR malformed range key"));
    assert!(output.contains("crc32="));
}

#[test]
fn test_unknown_command_keeps_running() {
    let output = run_cli_command("FROB\nENCODE META 0 1\n");
    let lines = result_lines(&output);
    assert_eq!(lines[0], "ERR unknown command: FROB");
    assert_eq!(lines[1], "00000001");
}

#[test]
fn test_quit_stops_reading() {
    let output = run_cli_command("QUIT\nENCODE META 0 1\n");
    assert!(!output.contains("00000001"));
    assert_eq!(output.matches("bye").count(), 1);
}
