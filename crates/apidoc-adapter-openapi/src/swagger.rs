//! OpenAPI 2.0 (Swagger) documents.
//!
//! The 2.0 wire format predates the media-type table: one schema per
//! response, flat non-body parameters, `consumes`/`produces` instead of
//! per-body content types, and form fields as individual `formData`
//! parameters. This module folds all of that into the canonical shape on
//! parse and unfolds it on generate.

use apidoc_jsonschema::{
    ArraySchema, BoolOr, ObjectSchema, RefSpace, Schema, SchemaKind, SchemaRef, TypeName,
};
use apidoc_spec::{
    ApiDocument, Body, Collection, DefinitionModel, DefinitionResponse, Example, GlobalParameters,
    HttpBody, Operation, Parameter, ParameterIn, Response, Server, collect_operations,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::convert::{generate_globals, model_names, parse_globals, schema_from_wire, schema_to_wire};
use crate::naming::{component_key, key_to_id};
use crate::{OpenApiVersion, Result};

const SCHEMA_PREFIX: &str = "#/definitions/";
const RESPONSE_PREFIX: &str = "#/responses/";
const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];
const FORM_TYPES: [&str; 2] = ["application/x-www-form-urlencoded", "multipart/form-data"];
const DEFAULT_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireDocument {
    swagger: String,
    info: WireInfo,
    #[serde(skip_serializing_if = "String::is_empty")]
    host: String,
    #[serde(rename = "basePath", skip_serializing_if = "String::is_empty")]
    base_path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    schemes: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    definitions: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    responses: IndexMap<String, WireResponse>,
    paths: IndexMap<String, IndexMap<String, Value>>,
    #[serde(rename = "x-apidoc-global-parameters", skip_serializing_if = "IndexMap::is_empty")]
    globals: IndexMap<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireInfo {
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    version: String,
}

/// The flat 2.0 parameter shape, shared by query/path/header/formData
/// entries; `schema` is only populated for `in: body`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireParameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "crate::is_false")]
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    enum_values: Vec<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireHeader {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireResponse {
    #[serde(rename = "x-apidoc-response-name", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    headers: IndexMap<String, WireHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    examples: IndexMap<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireOperation {
    #[serde(skip_serializing_if = "String::is_empty")]
    summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    produces: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<Value>,
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
    doc.servers = parse_servers(&wire);
    doc.globals.parameters = parse_globals(wire.globals);

    for (key, value) in wire.definitions {
        doc.definitions.schemas.push(parse_model(&key, value));
    }
    for (key, response) in wire.responses {
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

fn parse_servers(wire: &WireDocument) -> Vec<Server> {
    if wire.host.is_empty() {
        return Vec::new();
    }
    let base = if wire.base_path == "/" {
        ""
    } else {
        wire.base_path.as_str()
    };
    // A bare host without schemes still yields one server.
    if wire.schemes.is_empty() {
        return vec![Server {
            url: format!("https://{}{base}", wire.host),
            description: None,
        }];
    }
    wire.schemes
        .iter()
        .map(|scheme| Server {
            url: format!("{scheme}://{}{base}", wire.host),
            description: None,
        })
        .collect()
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
    let content = response_content(wire.schema, wire.examples, &[]);
    DefinitionResponse {
        id,
        name,
        description: Some(wire.description).filter(|d| !d.is_empty()),
        header: parse_headers(wire.headers),
        content,
        ..DefinitionResponse::default()
    }
}

fn parse_headers(headers: IndexMap<String, WireHeader>) -> apidoc_spec::ParameterList {
    headers
        .into_iter()
        .map(|(name, header)| {
            let schema = flat_schema(&header.kind, &header.format, header.default, Vec::new());
            let mut parameter = Parameter::new(name, schema);
            parameter.description = header.description;
            parameter
        })
        .collect()
}

/// Build body entries from a 2.0 response. The schema lands under every
/// listed content type; `examples` entries are already keyed by media type.
fn response_content(
    schema: Option<Value>,
    examples: IndexMap<String, Value>,
    content_types: &[String],
) -> HttpBody {
    let schema = schema.map(|v| schema_from_wire(v, &[SCHEMA_PREFIX]));
    let mut content = HttpBody::default();
    if let Some(schema) = &schema {
        if content_types.is_empty() {
            content.insert(DEFAULT_CONTENT_TYPE, Body::new(schema.clone()));
        } else {
            for ct in content_types {
                content.insert(ct.clone(), Body::new(schema.clone()));
            }
        }
    }
    for (ct, value) in examples {
        let body = content
            .0
            .entry(ct)
            .or_insert_with(|| Body::new(Schema::any()));
        body.examples.insert(
            "default".to_string(),
            Example {
                summary: None,
                value,
            },
        );
    }
    content
}

fn parse_operation(
    path: &str,
    method: &str,
    wire: WireOperation,
    globals: &GlobalParameters,
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

    let mut form = ObjectSchema::default();
    for value in wire.parameters {
        let parameter: WireParameter = match serde_json::from_value(value) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(path = %path, method = %method, error = %err, "skipping malformed parameter");
                continue;
            }
        };
        match parameter.location.as_str() {
            "body" => {
                let Some(schema) = parameter.schema else {
                    continue;
                };
                let schema = schema_from_wire(schema, &[SCHEMA_PREFIX]);
                for ct in content_types_or_default(&wire.consumes, false) {
                    operation.request.content.insert(ct, Body::new(schema.clone()));
                }
            }
            "formData" => {
                if parameter.required {
                    form.required.push(parameter.name.clone());
                }
                let mut schema = flat_schema(
                    &parameter.kind,
                    &parameter.format,
                    parameter.default,
                    parameter.enum_values,
                );
                schema.description = parameter.description;
                form.properties.insert(parameter.name, schema);
            }
            location => match location.parse::<ParameterIn>() {
                Ok(location) => {
                    let schema = flat_schema(
                        &parameter.kind,
                        &parameter.format,
                        parameter.default,
                        parameter.enum_values,
                    );
                    let mut entry = Parameter::new(parameter.name, schema);
                    entry.description = parameter.description;
                    entry.required = parameter.required;
                    operation.request.parameters.add(location, entry);
                }
                Err(_) => {
                    tracing::warn!(location = %location, "unknown parameter location, skipping");
                }
            },
        }
    }
    if !form.properties.is_empty() {
        let schema = Schema::object(form);
        for ct in content_types_or_default(&wire.consumes, true) {
            operation.request.content.insert(ct, Body::new(schema.clone()));
        }
    }

    reconcile_globals(&mut operation, globals);

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
                let content =
                    response_content(wire_response.schema, wire_response.examples, &wire.produces);
                operation.responses.push(Response {
                    code,
                    name: wire_response.name,
                    description: Some(wire_response.description).filter(|d| !d.is_empty()),
                    header: parse_headers(wire_response.headers),
                    content,
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

/// Content types a body lands under when the operation lists none.
fn content_types_or_default(consumes: &[String], form: bool) -> Vec<String> {
    let picked: Vec<String> = if form {
        consumes
            .iter()
            .filter(|ct| FORM_TYPES.contains(&ct.as_str()))
            .cloned()
            .collect()
    } else {
        consumes
            .iter()
            .filter(|ct| !FORM_TYPES.contains(&ct.as_str()))
            .cloned()
            .collect()
    };
    if !picked.is_empty() {
        return picked;
    }
    if form {
        vec![FORM_TYPES[0].to_string()]
    } else {
        vec![DEFAULT_CONTENT_TYPE.to_string()]
    }
}

/// Match inherited inline copies back to the global table: a copy with the
/// same name and location is dropped in favor of the table entry, and a
/// global with no copy in the operation becomes an opt-out.
fn reconcile_globals(operation: &mut Operation, globals: &GlobalParameters) {
    for location in ParameterIn::GLOBAL {
        let Some(list) = globals.bucket(location) else {
            continue;
        };
        for global in list {
            let bucket = operation.request.parameters.bucket_mut(location);
            if bucket.remove_named(&global.name).is_none() {
                operation.request.global_excepts.add(location, global.id);
            }
        }
    }
}

/// Build a canonical schema from the flat type/format/default fields. `file`
/// has no canonical type and becomes an unconstrained array, restored on
/// generate.
fn flat_schema(kind: &str, format: &str, default: Option<Value>, enum_values: Vec<Value>) -> Schema {
    if kind == "file" {
        return file_placeholder();
    }
    let mut schema = if kind.is_empty() {
        Schema::any()
    } else {
        match kind.parse::<TypeName>() {
            Ok(t) => Schema::of_type(t),
            Err(_) => {
                tracing::warn!(kind = %kind, "unknown flat type, treating as string");
                Schema::of_type(TypeName::String)
            }
        }
    };
    if !format.is_empty() {
        schema.format = Some(format.to_string());
    }
    schema.default = default;
    if let SchemaKind::Scalar(scalar) = &mut schema.kind {
        scalar.enum_values = enum_values;
    }
    schema
}

fn file_placeholder() -> Schema {
    Schema::array(ArraySchema {
        items: Some(BoolOr::Value(Box::new(Schema::any()))),
        ..ArraySchema::default()
    })
}

fn is_file_placeholder(schema: &Schema) -> bool {
    let SchemaKind::Array(array) = &schema.kind else {
        return false;
    };
    match &array.items {
        None => true,
        Some(BoolOr::Bool(_)) => false,
        Some(BoolOr::Value(items)) => !items.is_ref() && items.primary_type().is_none(),
    }
}

// -------------------------------------------------------------- generating

pub(crate) fn generate(doc: &ApiDocument) -> Result<Value> {
    let names = model_names(&doc.definitions.schemas);
    let response_keys: IndexMap<i64, String> = doc
        .definitions
        .responses
        .flatten()
        .into_iter()
        .map(|def| (def.id, component_key(&def.name, def.id, "response")))
        .collect();

    let mut wire = WireDocument {
        swagger: "2.0".to_string(),
        info: WireInfo {
            title: doc.info.title.clone(),
            description: doc.info.description.clone().unwrap_or_default(),
            version: doc.info.version.clone(),
        },
        ..WireDocument::default()
    };
    generate_servers(&doc.servers, &mut wire);
    wire.globals = generate_globals(&doc.globals.parameters)?;

    for model in doc.definitions.schemas.flatten() {
        let schema = match &model.schema {
            Some(schema) => schema.clone(),
            None => {
                tracing::warn!(id = model.id, name = %model.name, "model definition without a schema");
                Schema::any()
            }
        };
        wire.definitions.insert(
            component_key(&model.name, model.id, "model"),
            schema_to_wire(&schema, SCHEMA_PREFIX, &names, OpenApiVersion::V2)?,
        );
    }
    for def in doc.definitions.responses.flatten() {
        let key = component_key(&def.name, def.id, "response");
        wire.responses
            .insert(key, generate_response_definition(def, &names)?);
    }

    for operation in collect_operations(&doc.collections) {
        if operation.path.is_empty() {
            tracing::warn!(title = %operation.title, "operation without a path, skipping");
            continue;
        }
        let value = generate_operation(operation, doc, &names, &response_keys)?;
        wire.paths
            .entry(operation.path.clone())
            .or_default()
            .insert(operation.method.clone(), value);
    }

    Ok(serde_json::to_value(wire)?)
}

fn generate_servers(servers: &[Server], wire: &mut WireDocument) {
    let Some(server) = servers.first() else {
        return;
    };
    let Ok(url) = Url::parse(&server.url) else {
        tracing::warn!(url = %server.url, "server URL does not parse, omitting host");
        return;
    };
    let Some(host) = url.host_str() else {
        return;
    };
    wire.host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    wire.base_path = match url.path() {
        "" => "/".to_string(),
        path => path.to_string(),
    };
    wire.schemes = vec![url.scheme().to_string()];
}

fn generate_response_definition(
    def: &DefinitionResponse,
    names: &IndexMap<i64, String>,
) -> Result<WireResponse> {
    let mut wire = WireResponse {
        name: Some(def.name.clone()),
        description: def.description.clone().unwrap_or_default(),
        headers: generate_headers(&def.header),
        ..WireResponse::default()
    };
    fill_response_body(&mut wire, &def.content, names)?;
    Ok(wire)
}

fn generate_headers(headers: &apidoc_spec::ParameterList) -> IndexMap<String, WireHeader> {
    headers
        .iter()
        .map(|parameter| {
            let schema = parameter.schema.as_ref();
            let header = WireHeader {
                kind: schema
                    .and_then(Schema::primary_type)
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
                format: schema
                    .and_then(|s| s.format.clone())
                    .unwrap_or_default(),
                description: parameter.description.clone(),
                default: schema.and_then(|s| s.default.clone()),
            };
            (parameter.name.clone(), header)
        })
        .collect()
}

/// One schema slot per 2.0 response: the first body wins it, every body
/// contributes its first example keyed by content type.
fn fill_response_body(
    wire: &mut WireResponse,
    content: &HttpBody,
    names: &IndexMap<i64, String>,
) -> Result<()> {
    if let Some((_, body)) = content.first() {
        wire.schema = Some(schema_to_wire(
            &body.schema,
            SCHEMA_PREFIX,
            names,
            OpenApiVersion::V2,
        )?);
    }
    for (ct, body) in content.iter() {
        if let Some((_, example)) = body.examples.first() {
            wire.examples.insert(ct.clone(), example.value.clone());
        }
    }
    Ok(())
}

fn generate_operation(
    operation: &Operation,
    doc: &ApiDocument,
    names: &IndexMap<i64, String>,
    response_keys: &IndexMap<i64, String>,
) -> Result<Value> {
    let mut wire = WireOperation {
        summary: operation.title.clone(),
        tags: operation.tags.clone(),
        ..WireOperation::default()
    };

    // Inherited globals become plain inline copies; the ids live in the root
    // extension, not here.
    for (location, list) in doc.globals.parameters.buckets() {
        for global in list {
            if operation
                .request
                .global_excepts
                .contains(location, global.id)
            {
                continue;
            }
            wire.parameters
                .push(serde_json::to_value(flat_parameter(global, location.as_str()))?);
        }
    }
    for (location, list) in operation.request.parameters.buckets() {
        for parameter in list {
            wire.parameters
                .push(serde_json::to_value(flat_parameter(parameter, location.as_str()))?);
        }
    }

    let mut body_emitted = false;
    for (ct, body) in operation.request.content.iter() {
        if ct == "none" {
            continue;
        }
        wire.consumes.push(ct.clone());
        if FORM_TYPES.contains(&ct.as_str()) {
            if !body_emitted {
                generate_form_parameters(body, &mut wire)?;
                body_emitted = true;
            }
        } else if !body_emitted {
            let parameter = WireParameter {
                name: "body".to_string(),
                location: "body".to_string(),
                required: true,
                schema: Some(schema_to_wire(
                    &body.schema,
                    SCHEMA_PREFIX,
                    names,
                    OpenApiVersion::V2,
                )?),
                ..WireParameter::default()
            };
            wire.parameters.push(serde_json::to_value(parameter)?);
            body_emitted = true;
        }
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
        let mut entry = WireResponse {
            name: response.name.clone(),
            description: response
                .description
                .clone()
                .or_else(|| response.name.clone())
                .unwrap_or_default(),
            headers: generate_headers(&response.header),
            ..WireResponse::default()
        };
        fill_response_body(&mut entry, &response.content, names)?;
        for ct in response.content.content_types() {
            if ct != "none" && !wire.produces.iter().any(|p| p == ct) {
                wire.produces.push(ct.to_string());
            }
        }
        wire.responses
            .insert(response.code.to_string(), serde_json::to_value(entry)?);
    }
    if wire.responses.is_empty() {
        wire.responses
            .insert("default".to_string(), json!({ "description": "success" }));
    }
    if wire.produces.is_empty() {
        wire.produces.push(DEFAULT_CONTENT_TYPE.to_string());
    }

    Ok(serde_json::to_value(wire)?)
}

/// Unfold an object body into individual `formData` parameters. A property
/// is required when the object lists its name, and unconstrained arrays go
/// back to `type: file`.
fn generate_form_parameters(body: &Body, wire: &mut WireOperation) -> Result<()> {
    let SchemaKind::Object(object) = &body.schema.kind else {
        tracing::warn!("form body is not an object schema, emitting no form fields");
        return Ok(());
    };
    for (name, property) in &object.properties {
        let mut parameter = flat_parameter_from_schema(name, property);
        parameter.location = "formData".to_string();
        parameter.required = object.required.contains(name);
        wire.parameters.push(serde_json::to_value(parameter)?);
    }
    Ok(())
}

fn flat_parameter(parameter: &Parameter, location: &str) -> WireParameter {
    let mut wire = match &parameter.schema {
        Some(schema) => flat_parameter_from_schema(&parameter.name, schema),
        None => WireParameter {
            name: parameter.name.clone(),
            ..WireParameter::default()
        },
    };
    wire.location = location.to_string();
    wire.description = parameter.description.clone();
    wire.required = parameter.required;
    wire
}

fn flat_parameter_from_schema(name: &str, schema: &Schema) -> WireParameter {
    let mut wire = WireParameter {
        name: name.to_string(),
        description: schema.description.clone(),
        format: schema.format.clone().unwrap_or_default(),
        default: schema.default.clone(),
        ..WireParameter::default()
    };
    if is_file_placeholder(schema) {
        wire.kind = "file".to_string();
        return wire;
    }
    if let Some(t) = schema.primary_type() {
        wire.kind = t.as_str().to_string();
    }
    if let SchemaKind::Scalar(scalar) = &schema.kind {
        wire.enum_values = scalar.enum_values.clone();
    }
    wire
}
