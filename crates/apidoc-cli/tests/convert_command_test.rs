use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

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

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time after epoch")
        .as_nanos();
    let counter = TEMP_FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let filename = format!(
        "apidoc-cli-{name}-{}-{nanos}-{counter}.{extension}",
        std::process::id()
    );
    env::temp_dir().join(filename)
}

fn write_temp_file(name: &str, extension: &str, content: &str) -> PathBuf {
    let path = unique_temp_path(name, extension);
    fs::write(&path, content).expect("temporary file should be writable");
    path
}

fn run_apidoc(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .output()
        .expect("run apidoc")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected the command to succeed; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

const PETSTORE_SWAGGER: &str = r##"{
  "swagger": "2.0",
  "info": {"title": "Petstore", "version": "1.0.0"},
  "host": "api.example.com",
  "basePath": "/v2",
  "schemes": ["https"],
  "definitions": {
    "Pet-7": {
      "type": "object",
      "properties": {"name": {"type": "string"}},
      "required": ["name"]
    }
  },
  "paths": {
    "/pets": {
      "get": {
        "summary": "List pets",
        "parameters": [{"name": "limit", "in": "query", "type": "integer"}],
        "responses": {
          "200": {
            "description": "ok",
            "schema": {"type": "array", "items": {"$ref": "#/definitions/Pet-7"}}
          }
        }
      }
    }
  }
}"##;

#[test]
fn convert_detects_swagger_and_writes_canonical() {
    let input = write_temp_file("swagger-in", "json", PETSTORE_SWAGGER);
    let output_path = unique_temp_path("canonical-out", "json");

    let output = run_apidoc(&[
        "convert",
        input.to_string_lossy().as_ref(),
        output_path.to_string_lossy().as_ref(),
        "--to",
        "apidoc",
    ]);
    assert_success(&output);

    let written = fs::read_to_string(&output_path).expect("output should be readable");
    let doc: serde_json::Value =
        serde_json::from_str(&written).expect("output should be valid JSON");
    assert_eq!(doc["apidoc"], "1.0.0");
    assert_eq!(doc["info"]["title"], "Petstore");
    assert_eq!(doc["servers"][0]["url"], "https://api.example.com/v2");
    assert_eq!(doc["collections"][0]["type"], "http");
    assert_eq!(doc["collections"][0]["title"], "List pets");

    let _ = fs::remove_file(input);
    let _ = fs::remove_file(output_path);
}

#[test]
fn convert_swagger_to_openapi31_goes_through_the_canonical_model() {
    let input = write_temp_file("swagger-up", "json", PETSTORE_SWAGGER);
    let output_path = unique_temp_path("openapi31-out", "json");

    let output = run_apidoc(&[
        "convert",
        input.to_string_lossy().as_ref(),
        output_path.to_string_lossy().as_ref(),
        "--to",
        "openapi31",
    ]);
    assert_success(&output);

    let written = fs::read_to_string(&output_path).expect("output should be readable");
    let doc: serde_json::Value =
        serde_json::from_str(&written).expect("output should be valid JSON");
    assert_eq!(doc["openapi"], "3.1.0");
    assert_eq!(doc["paths"]["/pets"]["get"]["summary"], "List pets");
    assert!(doc["components"]["schemas"]["Pet-7"].is_object());
    let items = &doc["paths"]["/pets"]["get"]["responses"]["200"]["content"]
        ["application/json"]["schema"]["items"];
    assert_eq!(items["$ref"], "#/components/schemas/Pet-7");

    let _ = fs::remove_file(input);
    let _ = fs::remove_file(output_path);
}

#[test]
fn convert_writes_yaml_for_yaml_extension() {
    let input = write_temp_file("swagger-yaml", "json", PETSTORE_SWAGGER);
    let output_path = unique_temp_path("openapi30-out", "yaml");

    let output = run_apidoc(&[
        "convert",
        input.to_string_lossy().as_ref(),
        output_path.to_string_lossy().as_ref(),
        "--to",
        "openapi30",
    ]);
    assert_success(&output);

    let written = fs::read_to_string(&output_path).expect("output should be readable");
    assert!(
        written.contains("openapi: 3.0.3"),
        "expected YAML output, got: {written}"
    );
    let doc: serde_json::Value =
        serde_yaml::from_str(&written).expect("output should be valid YAML");
    assert_eq!(doc["info"]["title"], "Petstore");

    let _ = fs::remove_file(input);
    let _ = fs::remove_file(output_path);
}

#[test]
fn convert_to_postman_emits_a_collection() {
    let input = write_temp_file("swagger-pm", "json", PETSTORE_SWAGGER);
    let output_path = unique_temp_path("postman-out", "json");

    let output = run_apidoc(&[
        "convert",
        input.to_string_lossy().as_ref(),
        output_path.to_string_lossy().as_ref(),
        "--to",
        "postman",
    ]);
    assert_success(&output);

    let written = fs::read_to_string(&output_path).expect("output should be readable");
    let collection: serde_json::Value =
        serde_json::from_str(&written).expect("output should be valid JSON");
    assert_eq!(collection["info"]["name"], "Petstore");
    assert_eq!(collection["item"][0]["request"]["method"], "GET");
    assert_eq!(
        collection["item"][0]["request"]["url"]["path"],
        serde_json::json!(["v2", "pets"])
    );

    let _ = fs::remove_file(input);
    let _ = fs::remove_file(output_path);
}

#[test]
fn undetectable_input_asks_for_an_explicit_format() {
    let input = write_temp_file("mystery", "json", r#"{"title": "who knows"}"#);
    let output_path = unique_temp_path("never-written", "json");

    let output = run_apidoc(&[
        "convert",
        input.to_string_lossy().as_ref(),
        output_path.to_string_lossy().as_ref(),
        "--to",
        "apidoc",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("could not detect"),
        "expected a detection hint; stderr: {stderr}"
    );
    assert!(!output_path.exists());

    let _ = fs::remove_file(input);
}
