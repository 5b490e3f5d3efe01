//! # apidoc-cli
//!
//! Command line front end for the description toolkit.
//!
//! Every conversion goes through the canonical model: the input format is
//! parsed into a document, the document is written back out in the target
//! format. The other commands work on canonical documents directly.

use std::path::{Path, PathBuf};

use anyhow::Context;
use apidoc_adapter_openapi::OpenApiVersion;
use apidoc_diff::diff_operation;
use apidoc_spec::{collect_operations, ApiDocument, Operation};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "apidoc")]
#[command(about = "API description conversion toolkit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a description into another format
    Convert {
        /// Input file path
        input: PathBuf,

        /// Output file path
        output: PathBuf,

        /// Target format
        #[arg(long, value_enum)]
        to: Format,

        /// Source format, detected from the input when omitted
        #[arg(long, value_enum)]
        from: Option<Format>,
    },

    /// Compare two revisions of one operation and annotate the newer one
    Diff {
        /// Older revision, a canonical document with exactly one operation
        old: PathBuf,

        /// Newer revision, same shape
        new: PathBuf,

        /// Splice entries the newer revision dropped back in, marked removed
        #[arg(long)]
        keep_removed: bool,

        /// Write the annotated operation here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Expand a canonical document into a standalone one
    Deref {
        /// Input file path
        input: PathBuf,

        /// Output file path
        output: PathBuf,
    },

    /// Check a canonical document for structural violations
    Check {
        /// Input file path
        input: PathBuf,
    },
}

/// The formats the converter reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Canonical document
    Apidoc,
    /// OpenAPI 2.0
    Swagger,
    /// OpenAPI 3.0.3
    Openapi30,
    /// OpenAPI 3.1.0
    Openapi31,
    /// Postman collection v2.1
    Postman,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert {
            input,
            output,
            to,
            from,
        } => run_convert(&input, &output, to, from).await,
        Commands::Diff {
            old,
            new,
            keep_removed,
            output,
        } => run_diff(&old, &new, keep_removed, output.as_deref()).await,
        Commands::Deref { input, output } => run_deref(&input, &output).await,
        Commands::Check { input } => run_check(&input).await,
    }
}

async fn run_convert(
    input: &Path,
    output: &Path,
    to: Format,
    from: Option<Format>,
) -> anyhow::Result<()> {
    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let from = match from {
        Some(format) => format,
        None => detect_format(&data).context("could not detect the input format, pass --from")?,
    };
    tracing::debug!(?from, ?to, "converting");
    let doc =
        read_document(&data, from).with_context(|| format!("parsing {}", input.display()))?;
    let bytes = write_document(&doc, to, output)?;
    tokio::fs::write(output, bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

async fn run_diff(
    old: &Path,
    new: &Path,
    keep_removed: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let old_op = load_single_operation(old).await?;
    let new_op = load_single_operation(new).await?;
    let annotated = diff_operation(&old_op, &new_op, keep_removed);
    let json = serde_json::to_string_pretty(&annotated)?;
    match output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

async fn run_deref(input: &Path, output: &Path) -> anyhow::Result<()> {
    let mut doc = load_canonical(input).await?;
    doc.dereference()
        .with_context(|| format!("expanding references in {}", input.display()))?;
    tokio::fs::write(output, doc.to_json_pretty()?)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

async fn run_check(input: &Path) -> anyhow::Result<()> {
    let doc = load_canonical(input).await?;
    let violations = collect_violations(&doc);
    if violations.is_empty() {
        println!("Check passed: no structural violations.");
        return Ok(());
    }
    for violation in &violations {
        println!("[INVALID] {violation}");
    }
    println!("Errors: {}", violations.len());
    anyhow::bail!("{} structural violation(s)", violations.len())
}

async fn load_canonical(path: &Path) -> anyhow::Result<ApiDocument> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    ApiDocument::from_json(&data).with_context(|| format!("parsing {}", path.display()))
}

/// Load a canonical document, expand it, and take its only operation.
async fn load_single_operation(path: &Path) -> anyhow::Result<Operation> {
    let mut doc = load_canonical(path).await?;
    doc.dereference()
        .with_context(|| format!("expanding references in {}", path.display()))?;
    let ops = collect_operations(&doc.collections);
    match ops.as_slice() {
        [op] => Ok((*op).clone()),
        [] => anyhow::bail!("{} contains no operations", path.display()),
        many => anyhow::bail!(
            "{} contains {} operations, expected exactly one",
            path.display(),
            many.len()
        ),
    }
}

/// Guess the format from the document's root keys.
fn detect_format(data: &[u8]) -> Option<Format> {
    let value: Value = serde_json::from_slice(data)
        .or_else(|_| serde_yaml::from_slice(data))
        .ok()?;
    let map = value.as_object()?;
    if map.contains_key("swagger") {
        return Some(Format::Swagger);
    }
    if let Some(version) = map.get("openapi").and_then(Value::as_str) {
        return Some(if version.starts_with("3.1") {
            Format::Openapi31
        } else {
            Format::Openapi30
        });
    }
    if map.contains_key("apidoc") {
        return Some(Format::Apidoc);
    }
    if map.contains_key("item") && map.contains_key("info") {
        return Some(Format::Postman);
    }
    None
}

fn read_document(data: &[u8], from: Format) -> anyhow::Result<ApiDocument> {
    let doc = match from {
        Format::Apidoc => ApiDocument::from_json(data)?,
        Format::Swagger | Format::Openapi30 | Format::Openapi31 => {
            apidoc_adapter_openapi::parse(data)?
        }
        Format::Postman => apidoc_adapter_postman::parse(data)?,
    };
    Ok(doc)
}

/// Serialize for the target format. OpenAPI targets honor a `.yaml`/`.yml`
/// output extension; the JSON-native formats always write JSON.
fn write_document(doc: &ApiDocument, to: Format, output: &Path) -> anyhow::Result<Vec<u8>> {
    let bytes = match to {
        Format::Apidoc => doc.to_json_pretty()?.into_bytes(),
        Format::Swagger => openapi_bytes(doc, OpenApiVersion::V2, output)?,
        Format::Openapi30 => openapi_bytes(doc, OpenApiVersion::V30, output)?,
        Format::Openapi31 => openapi_bytes(doc, OpenApiVersion::V31, output)?,
        Format::Postman => apidoc_adapter_postman::generate(doc)?,
    };
    Ok(bytes)
}

fn openapi_bytes(
    doc: &ApiDocument,
    version: OpenApiVersion,
    output: &Path,
) -> anyhow::Result<Vec<u8>> {
    if is_yaml_path(output) {
        let value = apidoc_adapter_openapi::generate_value(doc, version)?;
        Ok(serde_yaml::to_string(&value)?.into_bytes())
    } else {
        Ok(apidoc_adapter_openapi::generate(doc, version)?)
    }
}

fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn collect_violations(doc: &ApiDocument) -> Vec<String> {
    let mut out = Vec::new();
    for definition in doc.definitions.schemas.flatten() {
        if let Some(schema) = &definition.schema {
            if let Err(error) = schema.validate() {
                out.push(format!("model definition `{}`: {error}", definition.name));
            }
        }
    }
    for definition in doc.definitions.responses.flatten() {
        for parameter in definition.header.iter() {
            if let Some(schema) = &parameter.schema {
                if let Err(error) = schema.validate() {
                    out.push(format!(
                        "response definition `{}`, header `{}`: {error}",
                        definition.name, parameter.name
                    ));
                }
            }
        }
        for (content_type, body) in definition.content.iter() {
            if let Err(error) = body.schema.validate() {
                out.push(format!(
                    "response definition `{}`, content `{content_type}`: {error}",
                    definition.name
                ));
            }
        }
    }
    for (location, bucket) in doc.globals.parameters.buckets() {
        for parameter in bucket.iter() {
            if let Some(schema) = &parameter.schema {
                if let Err(error) = schema.validate() {
                    out.push(format!(
                        "global {location} parameter `{}`: {error}",
                        parameter.name
                    ));
                }
            }
        }
    }
    for op in collect_operations(&doc.collections) {
        op.for_each_schema(&mut |schema| {
            if let Err(error) = schema.validate() {
                out.push(format!("operation `{} {}`: {error}", op.method, op.path));
            }
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_by_root_keys() {
        assert_eq!(
            detect_format(br#"{"swagger": "2.0", "paths": {}}"#),
            Some(Format::Swagger)
        );
        assert_eq!(
            detect_format(br#"{"openapi": "3.0.3"}"#),
            Some(Format::Openapi30)
        );
        assert_eq!(
            detect_format(br#"{"openapi": "3.1.0"}"#),
            Some(Format::Openapi31)
        );
        assert_eq!(
            detect_format(br#"{"apidoc": "1.0.0", "info": {}}"#),
            Some(Format::Apidoc)
        );
        assert_eq!(
            detect_format(br#"{"info": {"name": "x"}, "item": []}"#),
            Some(Format::Postman)
        );
        assert_eq!(detect_format(br#"{"title": "nothing"}"#), None);
        assert_eq!(detect_format(b"]not a document["), None);
    }

    #[test]
    fn test_detection_reads_yaml() {
        assert_eq!(
            detect_format(b"openapi: 3.1.0\ninfo:\n  title: T\n"),
            Some(Format::Openapi31)
        );
    }

    #[test]
    fn test_yaml_extension() {
        assert!(is_yaml_path(Path::new("out.yaml")));
        assert!(is_yaml_path(Path::new("out.yml")));
        assert!(!is_yaml_path(Path::new("out.json")));
        assert!(!is_yaml_path(Path::new("out")));
    }
}
