//! Postman collection v2.1 wire structures.
//!
//! Items are kept as raw values so one malformed entry degrades to a warning
//! instead of failing the whole import.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireCollection {
    pub info: WireInfo,
    #[serde(rename = "item")]
    pub items: Vec<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireInfo {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub schema: String,
}

/// One tree node. A folder carries `items`, a request carries `request`;
/// Postman allows both on the same node.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<WireRequest>,
    #[serde(rename = "item", skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Value>,
    #[serde(rename = "response", skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<WireResponse>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireRequest {
    pub method: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<WireKeyValue>,
    pub url: WireUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<WireBody>,
}

/// Postman writes URLs either as a bare string or as the split form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireUrl {
    Raw(String),
    Detailed(WireUrlParts),
}

impl Default for WireUrl {
    fn default() -> Self {
        WireUrl::Raw(String::new())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireUrlParts {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(rename = "query", skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<WireKeyValue>,
    #[serde(rename = "variable", skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<WireKeyValue>,
}

/// The shared key/value shape used by headers, query entries, URL variables
/// and form fields.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireKeyValue {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "crate::is_false")]
    pub disabled: bool,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireBody {
    pub mode: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<WireBodyOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub formdata: Vec<WireKeyValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urlencoded: Vec<WireKeyValue>,
    #[serde(skip_serializing_if = "crate::is_false")]
    pub disabled: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireBodyOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<WireRawOptions>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireRawOptions {
    pub language: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WireResponse {
    pub name: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<WireKeyValue>,
    #[serde(
        rename = "_postman_previewlanguage",
        skip_serializing_if = "String::is_empty"
    )]
    pub preview_language: String,
}
