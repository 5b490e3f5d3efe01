//! OpenAPI 3.0 / 3.1 documents.
//!
//! Both 3.x minors share one wire shape here; the only divergence is how
//! schemas spell nullability and type lists, and that fold lives in
//! [`crate::convert`]. Globals travel as component-level `$ref` entries plus
//! the shared extension table, so a document survives the round trip with
//! its inheritance intact.

use apidoc_jsonschema::{RefSpace, Schema, SchemaRef};
use apidoc_spec::{
    ApiDocument, Body, Collection, DefinitionModel, DefinitionResponse, Example, HttpBody,
    Operation, Parameter, ParameterIn, Response, Server, collect_operations,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::convert::{generate_globals, model_names, parse_globals, schema_from_wire, schema_to_wire};
use crate::naming::{component_key, key_to_id};
use crate::{OpenApiVersion, Result};

const SCHEMA_PREFIX: &str = "#/components/schemas/";
const RESPONSE_PREFIX: &str = "#/components/responses/";
const GLOBALS_PREFIX: &str = "#/components/x-apidoc-global-parameters/";
const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireDocument {
    openapi: String,
    info: WireInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    servers: Vec<WireServer>,
    #[serde(skip_serializing_if = "WireComponents::is_empty")]
    components: WireComponents,
    paths: IndexMap<String, IndexMap<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<WireTag>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireInfo {
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    version: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireServer {
    url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireTag {
    name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireComponents {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    schemas: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    responses: IndexMap<String, WireResponse>,
    #[serde(rename = "x-apidoc-global-parameters", skip_serializing_if = "IndexMap::is_empty")]
    globals: IndexMap<String, Value>,
}

impl WireComponents {
    fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.responses.is_empty() && self.globals.is_empty()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireMediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    examples: IndexMap<String, WireExample>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireExample {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    value: Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "crate::is_false")]
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireResponse {
    #[serde(rename = "x-apidoc-response-name", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    headers: IndexMap<String, WireHeader>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    content: IndexMap<String, WireMediaType>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireParameter {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "in", skip_serializing_if = "String::is_empty")]
    location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "crate::is_false")]
    required: bool,
    #[serde(skip_serializing_if = "crate::is_false")]
    deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireRequestBody {
    #[serde(skip_serializing_if = "crate::is_false")]
    required: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    content: IndexMap<String, WireMediaType>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireOperation {
    #[serde(skip_serializing_if = "String::is_empty")]
    summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<WireParameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    request_body: Option<WireRequestBody>,
    responses: IndexMap<String, Value>,
}

// ---------------------------------------------------------------- parsing

pub(crate) fn parse(value: Value) -> Result<ApiDocument> {
    let wire: WireDocument = serde_json::from_value(value)?;

    let mut doc = ApiDocument::new(&wire.info.title);
    if !wire.info.description.is_empty() {
        doc.info.description = Some(wire.info.description.clone());
    }
    doc.info.version = wire.info.version.clone();
    doc.servers = wire
        .servers
        .iter()
        .map(|server| Server {
            url: server.url.clone(),
            description: Some(server.description.clone()).filter(|d| !d.is_empty()),
        })
        .collect();
    doc.globals.parameters = parse_globals(wire.components.globals);

    for (key, value) in wire.components.schemas {
        doc.definitions.schemas.push(parse_model(&key, value));
    }
    for (key, response) in wire.components.responses {
        doc.definitions
            .responses
            .push(parse_response_definition(&key, response));
    }

    for (path, methods) in wire.paths {
        for (method, value) in methods {
            let method = method.to_ascii_lowercase();
            if !METHODS.contains(&method.as_str()) {
                continue;
            }
            match serde_json::from_value::<WireOperation>(value) {
                Ok(operation) => {
                    let operation =
                        parse_operation(&path, &method, operation, &doc.globals.parameters);
                    doc.collections.push(Collection::Http(operation));
                }
                Err(err) => {
                    tracing::warn!(path = %path, method = %method, error = %err, "skipping malformed operation");
                }
            }
        }
    }
    Ok(doc)
}

fn parse_model(key: &str, value: Value) -> DefinitionModel {
    let (name, id) = key_to_id(key);
    let mut schema = schema_from_wire(value, &[SCHEMA_PREFIX]);
    schema.id = id;
    let mut model = DefinitionModel::new(id, name, schema);
    model.description = model.schema.as_ref().and_then(|s| s.description.clone());
    model
}

fn parse_response_definition(key: &str, wire: WireResponse) -> DefinitionResponse {
    let (key_name, id) = key_to_id(key);
    let name = wire.name.clone().unwrap_or(key_name);
    DefinitionResponse {
        id,
        name,
        description: Some(wire.description).filter(|d| !d.is_empty()),
        header: parse_headers(wire.headers),
        content: parse_content(wire.content),
        ..DefinitionResponse::default()
    }
}

fn parse_headers(headers: IndexMap<String, WireHeader>) -> apidoc_spec::ParameterList {
    headers
        .into_iter()
        .map(|(name, header)| {
            let schema = header
                .schema
                .map(|value| schema_from_wire(value, &[SCHEMA_PREFIX]))
                .unwrap_or_else(Schema::any);
            let mut parameter = Parameter::new(name, schema);
            parameter.description = header.description;
            parameter.required = header.required;
            parameter
        })
        .collect()
}

fn parse_content(content: IndexMap<String, WireMediaType>) -> HttpBody {
    content
        .into_iter()
        .map(|(ct, media)| {
            let schema = media
                .schema
                .map(|value| schema_from_wire(value, &[SCHEMA_PREFIX]))
                .unwrap_or_else(Schema::any);
            let mut body = Body::new(schema);
            body.examples = media
                .examples
                .into_iter()
                .map(|(key, example)| {
                    (
                        key,
                        Example {
                            summary: example.summary,
                            value: example.value,
                        },
                    )
                })
                .collect();
            (ct, body)
        })
        .collect()
}

fn parse_operation(
    path: &str,
    method: &str,
    wire: WireOperation,
    globals: &apidoc_spec::GlobalParameters,
) -> Operation {
    let mut operation = Operation {
        title: if wire.summary.is_empty() {
            path.to_string()
        } else {
            wire.summary.clone()
        },
        path: path.to_string(),
        method: method.to_string(),
        tags: wire.tags.clone(),
        ..Operation::default()
    };

    // Globals arrive as refs into the extension table. Any table entry the
    // operation does not reference is an opt-out.
    let mut inherited: Vec<String> = Vec::new();
    for parameter in wire.parameters {
        if let Some(reference) = parameter.reference {
            match reference.strip_prefix(GLOBALS_PREFIX) {
                Some(key) => inherited.push(key.to_string()),
                None => {
                    tracing::warn!(reference = %reference, "unresolvable parameter reference, skipping");
                }
            }
            continue;
        }
        let Ok(location) = parameter.location.parse::<ParameterIn>() else {
            tracing::warn!(location = %parameter.location, "unknown parameter location, skipping");
            continue;
        };
        let mut schema = parameter
            .schema
            .map(|value| schema_from_wire(value, &[SCHEMA_PREFIX]))
            .unwrap_or_else(Schema::any);
        if parameter.deprecated {
            schema.deprecated = Some(true);
        }
        if parameter.example.is_some() {
            schema.examples = parameter.example;
        }
        let mut entry = Parameter::new(parameter.name, schema);
        entry.description = parameter.description;
        entry.required = parameter.required;
        operation.request.parameters.add(location, entry);
    }
    for (location, list) in globals.buckets() {
        for global in list {
            let key = format!("{location}-{}", global.name);
            if !inherited.contains(&key) {
                operation.request.global_excepts.add(location, global.id);
            }
        }
    }

    if let Some(request_body) = wire.request_body {
        operation.request.content = parse_content(request_body.content);
    }

    for (code, value) in wire.responses {
        let Ok(code) = code.parse::<u16>() else {
            tracing::warn!(code = %code, "response code is not numeric, skipping");
            continue;
        };
        if let Some(Value::String(reference)) = value.get("$ref") {
            match reference.strip_prefix(RESPONSE_PREFIX) {
                Some(key) => {
                    let (_, id) = key_to_id(key);
                    operation.responses.push(Response {
                        code,
                        reference: Some(SchemaRef::responses(id)),
                        ..Response::default()
                    });
                }
                None => {
                    tracing::warn!(reference = %reference, "unresolvable response reference, skipping");
                }
            }
            continue;
        }
        match serde_json::from_value::<WireResponse>(value) {
            Ok(wire_response) => {
                operation.responses.push(Response {
                    code,
                    name: wire_response.name,
                    description: Some(wire_response.description).filter(|d| !d.is_empty()),
                    header: parse_headers(wire_response.headers),
                    content: parse_content(wire_response.content),
                    ..Response::default()
                });
            }
            Err(err) => {
                tracing::warn!(code, error = %err, "skipping malformed response");
            }
        }
    }
    if operation.responses.is_empty() {
        operation.responses.push(Response::default_success());
    }
    operation
}

// -------------------------------------------------------------- generating

pub(crate) fn generate(doc: &ApiDocument, version: OpenApiVersion) -> Result<Value> {
    let names = model_names(&doc.definitions.schemas);
    let response_keys: IndexMap<i64, String> = doc
        .definitions
        .responses
        .flatten()
        .into_iter()
        .map(|def| (def.id, component_key(&def.name, def.id, "response")))
        .collect();

    let mut wire = WireDocument {
        openapi: version.as_str().to_string(),
        info: WireInfo {
            title: doc.info.title.clone(),
            description: doc.info.description.clone().unwrap_or_default(),
            version: doc.info.version.clone(),
        },
        servers: doc
            .servers
            .iter()
            .map(|server| WireServer {
                url: server.url.clone(),
                description: server.description.clone().unwrap_or_default(),
            })
            .collect(),
        ..WireDocument::default()
    };
    wire.components.globals = generate_globals(&doc.globals.parameters)?;

    for model in doc.definitions.schemas.flatten() {
        let schema = match &model.schema {
            Some(schema) => schema.clone(),
            None => {
                tracing::warn!(id = model.id, name = %model.name, "model definition without a schema");
                Schema::any()
            }
        };
        wire.components.schemas.insert(
            component_key(&model.name, model.id, "model"),
            schema_to_wire(&schema, SCHEMA_PREFIX, &names, version)?,
        );
    }
    for def in doc.definitions.responses.flatten() {
        let key = component_key(&def.name, def.id, "response");
        let response = WireResponse {
            name: Some(def.name.clone()),
            description: def.description.clone().unwrap_or_default(),
            headers: generate_headers(&def.header, &names, version)?,
            content: generate_content(&def.content, &names, version)?,
        };
        wire.components.responses.insert(key, response);
    }

    let mut tags: Vec<String> = Vec::new();
    for operation in collect_operations(&doc.collections) {
        if operation.path.is_empty() {
            tracing::warn!(title = %operation.title, "operation without a path, skipping");
            continue;
        }
        for tag in &operation.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        let value = generate_operation(operation, doc, &names, &response_keys, version)?;
        wire.paths
            .entry(operation.path.clone())
            .or_default()
            .insert(operation.method.clone(), value);
    }
    wire.tags = tags.into_iter().map(|name| WireTag { name }).collect();

    Ok(serde_json::to_value(wire)?)
}

fn generate_headers(
    headers: &apidoc_spec::ParameterList,
    names: &IndexMap<i64, String>,
    version: OpenApiVersion,
) -> Result<IndexMap<String, WireHeader>> {
    let mut out = IndexMap::new();
    for parameter in headers {
        let schema = match &parameter.schema {
            Some(schema) => Some(schema_to_wire(schema, SCHEMA_PREFIX, names, version)?),
            None => None,
        };
        out.insert(
            parameter.name.clone(),
            WireHeader {
                description: parameter.description.clone(),
                required: parameter.required,
                schema,
            },
        );
    }
    Ok(out)
}

fn generate_content(
    content: &HttpBody,
    names: &IndexMap<i64, String>,
    version: OpenApiVersion,
) -> Result<IndexMap<String, WireMediaType>> {
    let mut out = IndexMap::new();
    for (ct, body) in content.iter() {
        if ct == "none" {
            continue;
        }
        let examples = body
            .examples
            .iter()
            .map(|(key, example)| {
                (
                    key.clone(),
                    WireExample {
                        summary: example.summary.clone(),
                        value: example.value.clone(),
                    },
                )
            })
            .collect();
        out.insert(
            ct.clone(),
            WireMediaType {
                schema: Some(schema_to_wire(&body.schema, SCHEMA_PREFIX, names, version)?),
                examples,
            },
        );
    }
    Ok(out)
}

fn generate_operation(
    operation: &Operation,
    doc: &ApiDocument,
    names: &IndexMap<i64, String>,
    response_keys: &IndexMap<i64, String>,
    version: OpenApiVersion,
) -> Result<Value> {
    let mut wire = WireOperation {
        summary: operation.title.clone(),
        tags: operation.tags.clone(),
        ..WireOperation::default()
    };

    for (location, list) in doc.globals.parameters.buckets() {
        for global in list {
            if operation
                .request
                .global_excepts
                .contains(location, global.id)
            {
                continue;
            }
            wire.parameters.push(WireParameter {
                reference: Some(format!("{GLOBALS_PREFIX}{location}-{}", global.name)),
                ..WireParameter::default()
            });
        }
    }
    for (location, list) in operation.request.parameters.buckets() {
        for parameter in list {
            wire.parameters
                .push(generate_parameter(parameter, location, names, version)?);
        }
    }

    let content = generate_content(&operation.request.content, names, version)?;
    if !content.is_empty() {
        wire.request_body = Some(WireRequestBody {
            required: true,
            content,
        });
    }

    for response in &operation.responses {
        if let Some(reference) = response.reference {
            if reference.space != RefSpace::Responses {
                continue;
            }
            match response_keys.get(&reference.id) {
                Some(key) => {
                    wire.responses.insert(
                        response.code.to_string(),
                        json!({ "$ref": format!("{RESPONSE_PREFIX}{key}") }),
                    );
                }
                None => {
                    tracing::warn!(id = reference.id, "dangling response reference, skipping");
                }
            }
            continue;
        }
        let entry = WireResponse {
            name: response.name.clone(),
            description: response
                .description
                .clone()
                .or_else(|| response.name.clone())
                .unwrap_or_default(),
            headers: generate_headers(&response.header, names, version)?,
            content: generate_content(&response.content, names, version)?,
        };
        wire.responses
            .insert(response.code.to_string(), serde_json::to_value(entry)?);
    }
    if wire.responses.is_empty() {
        wire.responses
            .insert("200".to_string(), json!({ "description": "success" }));
    }

    Ok(serde_json::to_value(wire)?)
}

/// Parameter-level `example` and `deprecated` live on the canonical schema;
/// pull them back out of the wire schema so they land at the wire level the
/// way they arrived.
fn generate_parameter(
    parameter: &Parameter,
    location: ParameterIn,
    names: &IndexMap<i64, String>,
    version: OpenApiVersion,
) -> Result<WireParameter> {
    let mut wire = WireParameter {
        name: parameter.name.clone(),
        location: location.as_str().to_string(),
        description: parameter.description.clone(),
        required: parameter.required,
        ..WireParameter::default()
    };
    if let Some(schema) = &parameter.schema {
        let mut value = schema_to_wire(schema, SCHEMA_PREFIX, names, version)?;
        if let Value::Object(map) = &mut value {
            wire.example = map.remove("examples");
            if let Some(Value::Bool(true)) = map.remove("deprecated") {
                wire.deprecated = true;
            }
        }
        wire.schema = Some(value);
    }
    Ok(wire)
}
