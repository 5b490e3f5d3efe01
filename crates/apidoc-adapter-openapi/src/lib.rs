//! # apidoc-adapter-openapi
//!
//! OpenAPI 2.0 (Swagger) and OpenAPI 3.x import/export for canonical API
//! documents.
//!
//! Input is detected by the root version key: `swagger` routes to the 2.0
//! module, `openapi` to the 3.x module. Both directions are pure value
//! transformations; reading and writing files stays with the caller.

mod convert;
mod naming;
mod openapi3;
mod swagger;

use std::fmt;
use std::str::FromStr;

use apidoc_spec::ApiDocument;
use serde_json::Value;
use thiserror::Error;

/// Errors from OpenAPI import/export.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported format: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The wire dialects this adapter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenApiVersion {
    /// Swagger 2.0.
    V2,
    /// OpenAPI 3.0.x.
    V30,
    /// OpenAPI 3.1.x.
    V31,
}

impl OpenApiVersion {
    /// The version string written into the document root.
    pub fn as_str(self) -> &'static str {
        match self {
            OpenApiVersion::V2 => "2.0",
            OpenApiVersion::V30 => "3.0.3",
            OpenApiVersion::V31 => "3.1.0",
        }
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "2" | "2.0" | "swagger" => Ok(OpenApiVersion::V2),
            "3.0" | "3.0.3" => Ok(OpenApiVersion::V30),
            "3" | "3.1" | "3.1.0" | "openapi" => Ok(OpenApiVersion::V31),
            other => Err(Error::Unsupported(format!(
                "unknown OpenAPI version '{other}'"
            ))),
        }
    }
}

/// Parse an OpenAPI document, JSON or YAML, into the canonical model.
///
/// # Errors
///
/// Fails when the bytes are neither JSON nor YAML, or carry no
/// `swagger`/`openapi` version key. Malformed elements inside a recognized
/// document degrade individually instead of failing the parse.
pub fn parse(data: &[u8]) -> Result<ApiDocument> {
    let value: Value = match serde_json::from_slice(data) {
        Ok(value) => value,
        Err(_) => serde_yaml::from_slice(data)?,
    };
    if value.get("swagger").is_some() {
        return swagger::parse(value);
    }
    if value.get("openapi").is_some() {
        return openapi3::parse(value);
    }
    Err(Error::Unsupported(
        "document carries neither a 'swagger' nor an 'openapi' version key".to_string(),
    ))
}

/// Generate a document in the requested dialect as a JSON value.
pub fn generate_value(doc: &ApiDocument, version: OpenApiVersion) -> Result<Value> {
    match version {
        OpenApiVersion::V2 => swagger::generate(doc),
        OpenApiVersion::V30 | OpenApiVersion::V31 => openapi3::generate(doc, version),
    }
}

/// Generate a document in the requested dialect as pretty-printed JSON.
pub fn generate(doc: &ApiDocument, version: OpenApiVersion) -> Result<Vec<u8>> {
    let value = generate_value(doc, version)?;
    Ok(serde_json::to_vec_pretty(&value)?)
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
