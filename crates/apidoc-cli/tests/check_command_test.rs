use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use apidoc_jsonschema::{ComposeMode, ObjectSchema, Schema, TypeName};
use apidoc_spec::{ApiDocument, Collection, DefinitionModel, Operation};

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_apidoc") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("apidoc{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_apidoc is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn unique_temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time after epoch")
        .as_nanos();
    let filename = format!("apidoc-cli-{name}-{}-{nanos}.json", std::process::id());
    env::temp_dir().join(filename)
}

fn run_apidoc(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .output()
        .expect("run apidoc")
}

fn write_doc(name: &str, doc: &ApiDocument) -> PathBuf {
    let path = unique_temp_path(name);
    fs::write(&path, doc.to_json().unwrap()).expect("fixture should be writable");
    path
}

#[test]
fn check_passes_a_well_formed_document() {
    let mut doc = ApiDocument::new("Check fixture");
    let mut shape = ObjectSchema::default();
    shape
        .properties
        .insert("name".to_string(), Schema::of_type(TypeName::String));
    doc.definitions
        .schemas
        .push(DefinitionModel::new(7, "Pet", Schema::object(shape)));
    doc.collections.push(Collection::Http(Operation {
        title: "List pets".to_string(),
        path: "/pets".to_string(),
        method: "get".to_string(),
        ..Operation::default()
    }));
    let input = write_doc("check-ok", &doc);

    let output = run_apidoc(&["check", input.to_string_lossy().as_ref()]);

    assert!(
        output.status.success(),
        "check should pass; stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Check passed"),
        "expected the pass line; stdout: {stdout}"
    );

    let _ = fs::remove_file(input);
}

#[test]
fn check_lists_violations_and_fails() {
    let mut doc = ApiDocument::new("Check fixture");
    doc.definitions.schemas.push(DefinitionModel::new(
        2,
        "Bad",
        Schema::composed(ComposeMode::AnyOf, vec![]),
    ));
    let input = write_doc("check-bad", &doc);

    let output = run_apidoc(&["check", input.to_string_lossy().as_ref()]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("[INVALID] model definition `Bad`"),
        "expected the violation line; stdout: {stdout}"
    );
    assert!(
        stdout.contains("anyOf has no branches"),
        "expected the underlying error; stdout: {stdout}"
    );
    assert!(
        stdout.contains("Errors: 1"),
        "expected the error count; stdout: {stdout}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("structural violation"),
        "expected the failure summary; stderr: {stderr}"
    );

    let _ = fs::remove_file(input);
}

#[test]
fn check_rejects_unreadable_input() {
    let missing = unique_temp_path("check-missing");

    let output = run_apidoc(&["check", missing.to_string_lossy().as_ref()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("reading"),
        "expected the read context; stderr: {stderr}"
    );
}
