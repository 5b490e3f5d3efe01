use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use apidoc_jsonschema::{ObjectSchema, Schema, SchemaKind, SchemaRef, TypeName};
use apidoc_spec::{
    ApiDocument, Body, Collection, DefinitionModel, Operation, Parameter, ParameterIn, Response,
};
use serde_json::Value;

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

struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(name: &str, content: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time after epoch")
            .as_nanos();
        let filename = format!("apidoc-cli-{name}-{}-{nanos}.json", std::process::id());
        let path = env::temp_dir().join(filename);
        fs::write(&path, content).expect("temporary file should be writable");
        TempFile { path }
    }

    fn empty(name: &str) -> Self {
        let file = TempFile::new(name, "");
        let _ = fs::remove_file(&file.path);
        file
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn run_apidoc(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .output()
        .expect("run apidoc")
}

fn shared_content_doc() -> ApiDocument {
    let mut doc = ApiDocument::new("Deref fixture");

    let mut shape = ObjectSchema::default();
    shape
        .properties
        .insert("name".to_string(), Schema::of_type(TypeName::String));
    doc.definitions
        .schemas
        .push(DefinitionModel::new(7, "Pet", Schema::object(shape)));

    let mut token = Parameter::new("X-Token", Schema::of_type(TypeName::String));
    token.id = 31;
    doc.globals
        .parameters
        .add(ParameterIn::Header, token)
        .unwrap();

    let mut op = Operation {
        title: "Get pet".to_string(),
        path: "/pets/{petId}".to_string(),
        method: "get".to_string(),
        ..Operation::default()
    };
    let mut ok = Response {
        code: 200,
        description: Some("a pet".to_string()),
        ..Response::default()
    };
    ok.content.insert(
        "application/json",
        Body::new(Schema::reference(SchemaRef::schemas(7))),
    );
    op.responses.push(ok);
    doc.collections.push(Collection::Http(op));

    doc
}

#[test]
fn deref_inlines_globals_and_expands_model_references() {
    let doc = shared_content_doc();
    let input = TempFile::new("deref-in", &doc.to_json().unwrap());
    let output_file = TempFile::empty("deref-out");

    let output = run_apidoc(&[
        "deref",
        input.path.to_string_lossy().as_ref(),
        output_file.path.to_string_lossy().as_ref(),
    ]);
    assert!(
        output.status.success(),
        "deref should succeed; stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = fs::read_to_string(&output_file.path).expect("output should be readable");
    let raw: Value = serde_json::from_str(&written).expect("output should be valid JSON");
    // Emptied shared stores disappear from the wire entirely.
    assert!(raw.get("definitions").is_none());
    assert!(raw.get("globals").is_none());

    let expanded = ApiDocument::from_json(written.as_bytes()).expect("output should parse back");
    let Collection::Http(op) = &expanded.collections[0] else {
        panic!("expected an http item");
    };
    let token = op
        .request
        .parameters
        .header
        .lookup_name("X-Token")
        .expect("global header should be inlined");
    assert_eq!(token.id, 31);

    let ok = op.responses.lookup_code(200).expect("response should stay");
    let body = ok.content.get("application/json").expect("body should stay");
    let SchemaKind::Object(shape) = &body.schema.kind else {
        panic!("expected the model reference to be expanded");
    };
    assert!(shape.properties.contains_key("name"));
}

#[test]
fn deref_leaves_a_plain_document_unchanged() {
    let mut doc = ApiDocument::new("Plain fixture");
    doc.collections.push(Collection::Http(Operation {
        title: "Ping".to_string(),
        path: "/ping".to_string(),
        method: "get".to_string(),
        ..Operation::default()
    }));
    let input = TempFile::new("plain-in", &doc.to_json().unwrap());
    let output_file = TempFile::empty("plain-out");

    let output = run_apidoc(&[
        "deref",
        input.path.to_string_lossy().as_ref(),
        output_file.path.to_string_lossy().as_ref(),
    ]);
    assert!(
        output.status.success(),
        "deref should succeed; stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = fs::read_to_string(&output_file.path).expect("output should be readable");
    let expanded = ApiDocument::from_json(written.as_bytes()).expect("output should parse back");
    assert_eq!(expanded.collections, doc.collections);
}
