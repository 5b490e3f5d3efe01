//! Importing Postman collections into the canonical model.

use apidoc_jsonschema::{ArraySchema, BoolOr, ObjectSchema, Schema, TypeName};
use apidoc_spec::{
    ApiDocument, Body, Category, Collection, Example, HttpBody, Operation, Parameter, ParameterIn,
    Response, ResponseList, Server,
};
use serde_json::Value;
use url::Url;

use crate::infer::schema_from_raw_json;
use crate::model::{
    WireCollection, WireItem, WireKeyValue, WireRequest, WireResponse, WireUrl,
};
use crate::Result;

/// Seed for the synthetic item ids; a child at `index` under `parent` gets
/// `parent * 1024 + index + 1`, which stays collision-free for trees under
/// 1023 entries per level.
const ROOT_ID: i64 = 1000;

const DEFAULT_CONTENT_TYPE: &str = "application/json";

pub(crate) fn parse(value: Value) -> Result<ApiDocument> {
    let wire: WireCollection = serde_json::from_value(value)?;

    let mut doc = ApiDocument::new(&wire.info.name);
    if !wire.info.description.is_empty() {
        doc.info.description = Some(wire.info.description.clone());
    }
    if let Some(url) = base_url(&wire.items) {
        doc.servers.push(Server {
            url,
            description: Some("default".to_string()),
        });
    }
    doc.collections = parse_items(&wire.items, ROOT_ID);
    Ok(doc)
}

/// The server advertised by the collection: scheme and authority of the
/// first request found in tree order.
fn base_url(items: &[Value]) -> Option<String> {
    for value in items {
        let Ok(item) = serde_json::from_value::<WireItem>(value.clone()) else {
            continue;
        };
        if let Some(url) = item.request.as_ref().and_then(request_origin) {
            return Some(url);
        }
        if let Some(url) = base_url(&item.items) {
            return Some(url);
        }
    }
    None
}

fn request_origin(request: &WireRequest) -> Option<String> {
    match &request.url {
        WireUrl::Detailed(parts) if !parts.host.is_empty() => {
            let protocol = if parts.protocol.is_empty() {
                "http"
            } else {
                parts.protocol.as_str()
            };
            let mut authority = parts.host.join(".");
            if !parts.port.is_empty() {
                authority.push(':');
                authority.push_str(&parts.port);
            }
            Some(format!("{protocol}://{authority}"))
        }
        WireUrl::Detailed(parts) => origin_of_raw(&parts.raw),
        WireUrl::Raw(raw) => origin_of_raw(raw),
    }
}

fn origin_of_raw(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_string();
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };
    Some(format!("{}://{authority}", url.scheme()))
}

fn parse_items(items: &[Value], parent_id: i64) -> Vec<Collection> {
    let mut out = Vec::new();
    for (index, value) in items.iter().enumerate() {
        let id = parent_id * 1024 + index as i64 + 1;
        let item: WireItem = match serde_json::from_value(value.clone()) {
            Ok(item) => item,
            Err(error) => {
                tracing::warn!(%error, index, "skipping malformed collection item");
                continue;
            }
        };
        if let Some(request) = &item.request {
            out.push(Collection::Http(parse_operation(&item, request, id)));
        }
        if !item.items.is_empty() {
            out.push(Collection::Category(Category {
                id,
                title: item.name.clone(),
                items: parse_items(&item.items, id),
            }));
        }
    }
    out
}

fn parse_operation(item: &WireItem, request: &WireRequest, id: i64) -> Operation {
    let mut op = Operation {
        id,
        title: item.name.clone(),
        method: request.method.to_lowercase(),
        ..Operation::default()
    };

    let (path, path_parameters, queries) = split_url(&request.url);
    op.path = path;
    op.request.parameters.path = path_parameters.into_iter().collect();
    op.request.parameters.query = queries.into_iter().collect();
    for header in &request.header {
        if header.disabled {
            continue;
        }
        op.request
            .parameters
            .add(ParameterIn::Header, key_value_parameter(header));
    }
    op.request.content = parse_body(request);
    op.responses = parse_responses(&item.responses);
    op
}

/// Path template, path parameters and query parameters out of either URL
/// form. `:name` segments become `{name}` templates.
fn split_url(url: &WireUrl) -> (String, Vec<Parameter>, Vec<Parameter>) {
    match url {
        WireUrl::Detailed(parts) => {
            let (path, path_parameters) = template_path(&parts.path, &parts.variables);
            let queries = parts
                .queries
                .iter()
                .filter(|query| !query.disabled)
                .map(key_value_parameter)
                .collect();
            (path, path_parameters, queries)
        }
        WireUrl::Raw(raw) => split_raw_url(raw),
    }
}

fn split_raw_url(raw: &str) -> (String, Vec<Parameter>, Vec<Parameter>) {
    let Ok(url) = Url::parse(raw) else {
        tracing::warn!(url = raw, "unparseable request url, keeping it verbatim");
        return (raw.to_string(), Vec::new(), Vec::new());
    };
    let segments: Vec<String> = url
        .path_segments()
        .map(|parts| parts.map(str::to_string).collect())
        .unwrap_or_default();
    let (path, path_parameters) = template_path(&segments, &[]);
    let queries = url
        .query_pairs()
        .map(|(key, value)| {
            let mut schema = Schema::of_type(TypeName::String);
            if !value.is_empty() {
                schema.examples = Some(Value::String(value.to_string()));
            }
            Parameter::new(key.as_ref(), schema)
        })
        .collect();
    (path, path_parameters, queries)
}

fn template_path(segments: &[String], variables: &[WireKeyValue]) -> (String, Vec<Parameter>) {
    let mut parameters = Vec::new();
    let mut path = String::new();
    for segment in segments {
        path.push('/');
        match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => {
                path.push('{');
                path.push_str(name);
                path.push('}');
                parameters.push(path_parameter(name, variables));
            }
            _ => path.push_str(segment),
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    (path, parameters)
}

fn path_parameter(name: &str, variables: &[WireKeyValue]) -> Parameter {
    let mut schema = Schema::of_type(TypeName::String);
    let mut description = None;
    if let Some(variable) = variables.iter().find(|v| v.key == name) {
        description = variable.description.clone();
        if let Some(value) = variable.value.as_deref().filter(|value| !value.is_empty()) {
            schema.examples = Some(Value::String(value.to_string()));
        }
    }
    let mut parameter = Parameter::new(name, schema);
    parameter.required = true;
    parameter.description = description;
    parameter
}

fn key_value_parameter(kv: &WireKeyValue) -> Parameter {
    let mut schema = Schema::of_type(TypeName::String);
    if let Some(value) = kv.value.as_deref().filter(|value| !value.is_empty()) {
        schema.examples = Some(Value::String(value.to_string()));
    }
    let mut parameter = Parameter::new(&kv.key, schema);
    parameter.description = kv.description.clone();
    parameter
}

/// The request body table. A request without a usable body still gets the
/// default JSON object entry, so every operation has a content table.
fn parse_body(request: &WireRequest) -> HttpBody {
    let mut content = HttpBody::default();
    let Some(body) = request.body.as_ref().filter(|body| !body.disabled) else {
        content.insert(
            DEFAULT_CONTENT_TYPE,
            Body::new(Schema::of_type(TypeName::Object)),
        );
        return content;
    };
    match body.mode.as_str() {
        "raw" => {
            let language = body
                .options
                .as_ref()
                .and_then(|options| options.raw.as_ref())
                .map(|raw| raw.language.as_str())
                .unwrap_or("json");
            match language {
                "json" => {
                    let (schema, example) = schema_from_raw_json(&body.raw);
                    let mut entry = Body::new(schema);
                    if let Some(value) = example {
                        entry.examples.insert(
                            "default".to_string(),
                            Example {
                                summary: None,
                                value,
                            },
                        );
                    }
                    content.insert(DEFAULT_CONTENT_TYPE, entry);
                }
                "text" | "plain" => {
                    let mut entry = Body::new(Schema::of_type(TypeName::String));
                    if !body.raw.is_empty() {
                        entry.examples.insert(
                            "default".to_string(),
                            Example {
                                summary: None,
                                value: Value::String(body.raw.clone()),
                            },
                        );
                    }
                    content.insert("text/plain", entry);
                }
                other => {
                    tracing::warn!(language = other, "unhandled raw body language");
                    content.insert(
                        DEFAULT_CONTENT_TYPE,
                        Body::new(Schema::of_type(TypeName::Object)),
                    );
                }
            }
        }
        "formdata" => {
            content.insert("multipart/form-data", form_body(&body.formdata));
        }
        // Postman writes "urlencoded"; tolerate the truncated spelling too.
        "urlencoded" | "urlencode" => {
            content.insert("application/x-www-form-urlencoded", form_body(&body.urlencoded));
        }
        other => {
            // file and graphql bodies carry nothing a schema could describe
            if !other.is_empty() {
                tracing::warn!(mode = other, "unhandled body mode");
            }
            content.insert(
                DEFAULT_CONTENT_TYPE,
                Body::new(Schema::of_type(TypeName::Object)),
            );
        }
    }
    content
}

fn form_body(fields: &[WireKeyValue]) -> Body {
    let mut shape = ObjectSchema::default();
    for field in fields {
        if field.disabled {
            continue;
        }
        let mut schema = match field.kind.as_str() {
            "file" => file_schema(),
            _ => {
                let mut schema = Schema::of_type(TypeName::String);
                if let Some(value) = field.value.as_deref().filter(|value| !value.is_empty()) {
                    schema.examples = Some(Value::String(value.to_string()));
                }
                schema
            }
        };
        if let Some(description) = &field.description {
            schema.description = Some(description.clone());
        }
        shape.properties.insert(field.key.clone(), schema);
    }
    Body::new(Schema::object(shape))
}

/// The array-of-anything placeholder standing in for binary file fields,
/// matching what the OpenAPI 2.0 side uses for `type: file`.
fn file_schema() -> Schema {
    Schema::array(ArraySchema {
        items: Some(BoolOr::Value(Box::new(Schema::any()))),
        ..ArraySchema::default()
    })
}

fn parse_responses(responses: &[WireResponse]) -> ResponseList {
    let mut list = ResponseList::default();
    if responses.is_empty() {
        let mut response = Response::default_success();
        response.content.insert(
            DEFAULT_CONTENT_TYPE,
            Body::new(Schema::of_type(TypeName::Object)),
        );
        list.push(response);
        return list;
    }
    for wire in responses {
        list.push(parse_response(wire));
    }
    list
}

/// Saved responses keep their name as the canonical description; the body
/// shape comes from the preview language.
fn parse_response(wire: &WireResponse) -> Response {
    let mut response = Response {
        code: wire.code,
        ..Response::default()
    };
    if !wire.name.is_empty() {
        response.description = Some(wire.name.clone());
    }
    for header in &wire.header {
        if header.disabled {
            continue;
        }
        response.header.push(key_value_parameter(header));
    }

    let raw = wire.body.as_deref().unwrap_or_default();
    match wire.preview_language.as_str() {
        "json" => {
            let (schema, example) = schema_from_raw_json(raw);
            let mut entry = Body::new(schema);
            if let Some(value) = example {
                entry.examples.insert(
                    "default".to_string(),
                    Example {
                        summary: None,
                        value,
                    },
                );
            }
            response.content.insert(DEFAULT_CONTENT_TYPE, entry);
        }
        "text" | "plain" => {
            let mut entry = Body::new(Schema::of_type(TypeName::String));
            if !raw.is_empty() {
                entry.examples.insert(
                    "default".to_string(),
                    Example {
                        summary: None,
                        value: Value::String(raw.to_string()),
                    },
                );
            }
            response.content.insert("text/plain", entry);
        }
        _ => {
            response
                .content
                .insert("text/plain", Body::new(Schema::of_type(TypeName::Object)));
        }
    }
    response
}
