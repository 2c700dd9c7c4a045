#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const ACCOUNT_SCHEMA: &str = r#"{
    "required": [
        {"name": "email", "type": "string", "format": ["trim", "lowercase"],
         "insert_formatted": true, "min_length": 3}
    ],
    "optional": [
        {"name": "age", "type": "integer", "parse_if_string": true,
         "replace_cast_in_map": true, "min": 0}
    ]
}"#;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/paramcheck-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("file should be writable");
    path
}

fn paramcheck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_paramcheck"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .args(args)
        .output()
        .expect("paramcheck should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn valid_payload_exits_zero_and_prints_normalized() {
    let dir = unique_temp_dir("valid");
    let schema = write(&dir, "account.schema.json", ACCOUNT_SCHEMA);
    let payload = write(&dir, "payload.json", r#"{"email": " A@B.CO ", "age": "30"}"#);

    let output = paramcheck(&[
        "check",
        payload.to_str().unwrap(),
        "--schema",
        schema.to_str().unwrap(),
        "--print-normalized",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let report = stdout_json(&output);
    assert_eq!(report["successful"], true);
    assert_eq!(report["normalized"]["email"], "a@b.co");
    assert_eq!(report["normalized"]["age"], 30);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_check_exits_60_and_hides_unsafe_message() {
    let dir = unique_temp_dir("hidden");
    let schema = write(&dir, "account.schema.json", ACCOUNT_SCHEMA);
    let payload = write(&dir, "payload.json", r#"{"email": "a@b.co", "age": [1]}"#);

    let output = paramcheck(&[
        "check",
        payload.to_str().unwrap(),
        "--schema",
        schema.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(60));
    let report = stdout_json(&output);
    assert_eq!(report["successful"], false);
    assert_eq!(report["failing_parameter_path"], "age");
    assert_eq!(report["kind"], "parameter_cast_failure");
    assert_eq!(report["message"], "Invalid request parameters.");

    let output = paramcheck(&[
        "check",
        payload.to_str().unwrap(),
        "--schema",
        schema.to_str().unwrap(),
        "--show-unsafe",
    ]);
    assert_eq!(output.status.code(), Some(60));
    assert_eq!(
        stdout_json(&output)["message"],
        "age: expected integer, found array"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn schema_dir_and_unknown_name() {
    let dir = unique_temp_dir("schema-dir");
    let schemas = dir.join("schemas");
    std::fs::create_dir_all(&schemas).expect("schema dir should be creatable");
    write(&schemas, "account.schema.json", ACCOUNT_SCHEMA);
    let payload = write(&dir, "payload.json", r#"{}"#);

    let output = paramcheck(&[
        "check",
        payload.to_str().unwrap(),
        "--schema-dir",
        schemas.to_str().unwrap(),
        "--name",
        "account",
    ]);
    assert_eq!(output.status.code(), Some(60));
    let report = stdout_json(&output);
    assert_eq!(report["kind"], "missing_required_parameter");
    assert_eq!(report["message"], "Required, but was not provided.");

    let output = paramcheck(&[
        "check",
        payload.to_str().unwrap(),
        "--schema-dir",
        schemas.to_str().unwrap(),
        "--name",
        "ghost",
    ]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ghost"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_payload_json_exits_60_and_missing_file_exits_1() {
    let dir = unique_temp_dir("bad-input");
    let schema = write(&dir, "account.schema.json", ACCOUNT_SCHEMA);
    let payload = write(&dir, "payload.json", "{not json");

    let output = paramcheck(&[
        "check",
        payload.to_str().unwrap(),
        "--schema",
        schema.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(60));

    let missing = dir.join("missing.json");
    let output = paramcheck(&[
        "check",
        missing.to_str().unwrap(),
        "--schema",
        schema.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn schemas_lists_directory_contents() {
    let dir = unique_temp_dir("schemas");
    write(&dir, "account.schema.json", ACCOUNT_SCHEMA);

    let output = paramcheck(&["schemas", dir.to_str().unwrap()]);
    assert!(output.status.success());
    let listing = stdout_json(&output);
    assert_eq!(listing["schemas"][0]["name"], "account");
    assert_eq!(listing["schemas"][0]["required"][0], "email");
    assert_eq!(listing["schemas"][0]["optional"][0], "age");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = paramcheck(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
