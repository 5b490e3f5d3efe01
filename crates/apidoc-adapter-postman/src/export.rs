//! Exporting canonical documents as Postman collections.
//!
//! The document is dereferenced first, so shared models, shared responses
//! and global parameters all come out inlined. Postman carries examples
//! rather than schemas; body payloads are rebuilt from stored example
//! values.

use apidoc_jsonschema::{BoolOr, Schema, SchemaKind};
use apidoc_spec::{
    ApiDocument, Body, Collection, HttpBody, Operation, Parameter, ParameterList, Response,
};
use serde_json::Value;
use url::Url;

use crate::model::{
    WireBody, WireBodyOptions, WireCollection, WireInfo, WireItem, WireKeyValue, WireRawOptions,
    WireRequest, WireResponse, WireUrl, WireUrlParts,
};
use crate::Result;

const SCHEMA_URL: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

pub(crate) fn generate(doc: &ApiDocument) -> Result<WireCollection> {
    let mut doc = doc.clone();
    doc.dereference()?;

    let base = doc
        .servers
        .first()
        .map(|server| server.url.clone())
        .unwrap_or_default();
    let mut items = Vec::with_capacity(doc.collections.len());
    for node in &doc.collections {
        items.push(serde_json::to_value(generate_item(node, &base)?)?);
    }
    Ok(WireCollection {
        info: WireInfo {
            name: doc.info.title.clone(),
            description: doc.info.description.clone().unwrap_or_default(),
            schema: SCHEMA_URL.to_string(),
        },
        items,
    })
}

fn generate_item(node: &Collection, base: &str) -> Result<WireItem> {
    match node {
        Collection::Category(category) => {
            let mut items = Vec::with_capacity(category.items.len());
            for child in &category.items {
                items.push(serde_json::to_value(generate_item(child, base)?)?);
            }
            Ok(WireItem {
                name: category.title.clone(),
                items,
                ..WireItem::default()
            })
        }
        Collection::Http(op) => Ok(generate_request_item(op, base)),
    }
}

fn generate_request_item(op: &Operation, base: &str) -> WireItem {
    let mut request = WireRequest {
        method: op.method.to_uppercase(),
        url: WireUrl::Detailed(generate_url(op, base)),
        ..WireRequest::default()
    };
    for parameter in op.request.parameters.header.iter() {
        request.header.push(generate_key_value(parameter));
    }
    if !op.request.parameters.cookie.is_empty() {
        tracing::warn!(path = %op.path, "cookie parameters have no postman slot, dropping them");
    }
    request.body = generate_body(&op.request.content);

    let mut item = WireItem {
        name: op.title.clone(),
        request: Some(request),
        ..WireItem::default()
    };
    for response in op.responses.iter() {
        item.responses.push(generate_response(response));
    }
    item
}

/// Split the first server URL and the operation path into the Postman URL
/// form. `{name}` templates become `:name` segments backed by variables.
fn generate_url(op: &Operation, base: &str) -> WireUrlParts {
    let mut parts = WireUrlParts::default();
    if let Ok(url) = Url::parse(base) {
        parts.protocol = url.scheme().to_string();
        if let Some(host) = url.host_str() {
            parts.host = host.split('.').map(str::to_string).collect();
        }
        if let Some(port) = url.port() {
            parts.port = port.to_string();
        }
        // A server URL may carry a path prefix; it goes in front of the
        // operation segments.
        if let Some(segments) = url.path_segments() {
            parts
                .path
                .extend(segments.filter(|s| !s.is_empty()).map(str::to_string));
        }
    }
    for segment in op.path.split('/').filter(|segment| !segment.is_empty()) {
        match template_name(segment) {
            Some(name) => {
                parts.path.push(format!(":{name}"));
                parts
                    .variables
                    .push(variable_entry(name, &op.request.parameters.path));
            }
            None => parts.path.push(segment.to_string()),
        }
    }
    for parameter in op.request.parameters.query.iter() {
        parts.queries.push(generate_key_value(parameter));
    }
    parts.raw = raw_of(&parts);
    parts
}

fn template_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

fn variable_entry(name: &str, parameters: &ParameterList) -> WireKeyValue {
    match parameters.lookup_name(name) {
        Some(parameter) => generate_key_value(parameter),
        None => WireKeyValue {
            key: name.to_string(),
            ..WireKeyValue::default()
        },
    }
}

fn raw_of(parts: &WireUrlParts) -> String {
    let mut raw = String::new();
    if !parts.host.is_empty() {
        let protocol = if parts.protocol.is_empty() {
            "http"
        } else {
            &parts.protocol
        };
        raw.push_str(protocol);
        raw.push_str("://");
        raw.push_str(&parts.host.join("."));
        if !parts.port.is_empty() {
            raw.push(':');
            raw.push_str(&parts.port);
        }
    }
    for segment in &parts.path {
        raw.push('/');
        raw.push_str(segment);
    }
    let mut separator = '?';
    for query in &parts.queries {
        raw.push(separator);
        separator = '&';
        raw.push_str(&query.key);
        if let Some(value) = &query.value {
            raw.push('=');
            raw.push_str(value);
        }
    }
    raw
}

fn generate_key_value(parameter: &Parameter) -> WireKeyValue {
    WireKeyValue {
        key: parameter.name.clone(),
        value: parameter.schema.as_ref().and_then(schema_text),
        description: parameter.description.clone(),
        ..WireKeyValue::default()
    }
}

/// The example (or default) of a schema rendered as plain text, the way
/// Postman stores parameter values.
fn schema_text(schema: &Schema) -> Option<String> {
    let value = schema.examples.as_ref().or(schema.default.as_ref())?;
    match value {
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn generate_body(content: &HttpBody) -> Option<WireBody> {
    let (content_type, body) = content.first()?;
    match content_type.as_str() {
        "none" => None,
        "multipart/form-data" => Some(WireBody {
            mode: "formdata".to_string(),
            formdata: form_fields(&body.schema, true),
            ..WireBody::default()
        }),
        "application/x-www-form-urlencoded" => Some(WireBody {
            mode: "urlencoded".to_string(),
            urlencoded: form_fields(&body.schema, false),
            ..WireBody::default()
        }),
        "text/plain" => Some(WireBody {
            mode: "raw".to_string(),
            raw: first_example_text(body).unwrap_or_default(),
            options: raw_options("text"),
            ..WireBody::default()
        }),
        _ => {
            let raw = first_example_json(body);
            // The untyped-object default that bodyless requests get on
            // import is not worth writing back out.
            if raw.is_none() && is_untyped_object(&body.schema) {
                return None;
            }
            Some(WireBody {
                mode: "raw".to_string(),
                raw: raw.unwrap_or_else(|| "{}".to_string()),
                options: raw_options("json"),
                ..WireBody::default()
            })
        }
    }
}

fn is_untyped_object(schema: &Schema) -> bool {
    match &schema.kind {
        SchemaKind::Object(shape) => shape.properties.is_empty(),
        _ => false,
    }
}

fn raw_options(language: &str) -> Option<WireBodyOptions> {
    Some(WireBodyOptions {
        raw: Some(WireRawOptions {
            language: language.to_string(),
        }),
    })
}

fn form_fields(schema: &Schema, multipart: bool) -> Vec<WireKeyValue> {
    let SchemaKind::Object(shape) = &schema.kind else {
        tracing::warn!("form body schema is not an object, emitting no fields");
        return Vec::new();
    };
    let mut fields = Vec::with_capacity(shape.properties.len());
    for (name, property) in &shape.properties {
        let file = multipart && is_file_schema(property);
        let mut field = WireKeyValue {
            key: name.clone(),
            description: property.description.clone(),
            ..WireKeyValue::default()
        };
        if multipart {
            field.kind = if file { "file" } else { "text" }.to_string();
        }
        if !file {
            field.value = schema_text(property);
        }
        fields.push(field);
    }
    fields
}

/// The untyped-array placeholder the importers use for binary file fields.
fn is_file_schema(schema: &Schema) -> bool {
    let SchemaKind::Array(shape) = &schema.kind else {
        return false;
    };
    match &shape.items {
        None => true,
        Some(BoolOr::Bool(_)) => false,
        Some(BoolOr::Value(items)) => !items.is_ref() && items.primary_type().is_none(),
    }
}

/// First stored example rendered as a raw JSON payload. A string example is
/// emitted verbatim, matching how unparseable bodies were kept on import.
fn first_example_json(body: &Body) -> Option<String> {
    let (_, example) = body.examples.first()?;
    match &example.value {
        Value::String(text) => Some(text.clone()),
        value => serde_json::to_string_pretty(value).ok(),
    }
}

fn first_example_text(body: &Body) -> Option<String> {
    let (_, example) = body.examples.first()?;
    match &example.value {
        Value::String(text) => Some(text.clone()),
        value => Some(value.to_string()),
    }
}

fn generate_response(response: &Response) -> WireResponse {
    let mut wire = WireResponse {
        name: response
            .description
            .clone()
            .or_else(|| response.name.clone())
            .unwrap_or_default(),
        code: response.code,
        ..WireResponse::default()
    };
    for parameter in response.header.iter() {
        wire.header.push(generate_key_value(parameter));
    }
    let Some((content_type, body)) = response.content.first() else {
        return wire;
    };
    match content_type.as_str() {
        "none" => {}
        "application/json" => {
            wire.preview_language = "json".to_string();
            wire.body = first_example_json(body);
        }
        "text/plain" => {
            wire.preview_language = "text".to_string();
            wire.body = first_example_text(body);
        }
        other => {
            tracing::warn!(
                content_type = other,
                "no postman preview for this content type, exporting as text"
            );
            wire.preview_language = "text".to_string();
            wire.body = first_example_text(body);
        }
    }
    wire
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_jsonschema::{ArraySchema, ObjectSchema, TypeName};
    use apidoc_spec::{Example, ParameterIn};
    use serde_json::json;

    fn pet_operation() -> Operation {
        let mut op = Operation {
            title: "Get pet".to_string(),
            path: "/pets/{petId}".to_string(),
            method: "get".to_string(),
            ..Operation::default()
        };
        let mut schema = Schema::of_type(TypeName::String);
        schema.examples = Some(json!("42"));
        let mut pet_id = Parameter::new("petId", schema);
        pet_id.required = true;
        pet_id.description = Some("pet number".to_string());
        op.request.parameters.add(ParameterIn::Path, pet_id);

        let mut limit = Schema::of_type(TypeName::Integer);
        limit.default = Some(json!(10));
        op.request
            .parameters
            .add(ParameterIn::Query, Parameter::new("limit", limit));
        op
    }

    #[test]
    fn test_url_splits_server_and_templates() {
        let op = pet_operation();
        let parts = generate_url(&op, "https://api.example.com:8443/v2");
        assert_eq!(parts.protocol, "https");
        assert_eq!(parts.host, ["api", "example", "com"]);
        assert_eq!(parts.port, "8443");
        assert_eq!(parts.path, ["v2", "pets", ":petId"]);
        assert_eq!(parts.variables[0].key, "petId");
        assert_eq!(parts.variables[0].value.as_deref(), Some("42"));
        assert_eq!(parts.queries[0].key, "limit");
        assert_eq!(parts.queries[0].value.as_deref(), Some("10"));
        assert_eq!(
            parts.raw,
            "https://api.example.com:8443/v2/pets/:petId?limit=10"
        );
    }

    #[test]
    fn test_url_without_server_keeps_path_only() {
        let op = pet_operation();
        let parts = generate_url(&op, "");
        assert!(parts.host.is_empty());
        assert_eq!(parts.raw, "/pets/:petId?limit=10");
    }

    #[test]
    fn test_form_fields_mark_files() {
        let mut shape = ObjectSchema::default();
        let mut note = Schema::of_type(TypeName::String);
        note.examples = Some(json!("profile"));
        shape.properties.insert("note".to_string(), note);
        shape.properties.insert(
            "photo".to_string(),
            Schema::array(ArraySchema {
                items: Some(BoolOr::Value(Box::new(Schema::any()))),
                ..ArraySchema::default()
            }),
        );
        let schema = Schema::object(shape);

        let multipart = form_fields(&schema, true);
        assert_eq!(multipart[0].kind, "text");
        assert_eq!(multipart[0].value.as_deref(), Some("profile"));
        assert_eq!(multipart[1].kind, "file");
        assert!(multipart[1].value.is_none());

        // urlencoded entries carry no type marker and no file fields
        let encoded = form_fields(&schema, false);
        assert!(encoded[0].kind.is_empty());
        assert_eq!(encoded[1].value, None);
    }

    #[test]
    fn test_json_body_rebuilt_from_example() {
        let mut content = HttpBody::default();
        let mut body = Body::new(Schema::of_type(TypeName::Object));
        body.examples.insert(
            "default".to_string(),
            Example {
                summary: None,
                value: json!({"name": "rex"}),
            },
        );
        content.insert("application/json", body);

        let wire = generate_body(&content).unwrap();
        assert_eq!(wire.mode, "raw");
        assert_eq!(
            wire.options.as_ref().unwrap().raw.as_ref().unwrap().language,
            "json"
        );
        assert_eq!(
            serde_json::from_str::<Value>(&wire.raw).unwrap(),
            json!({"name": "rex"})
        );
    }

    #[test]
    fn test_response_preview_language() {
        let mut response = Response {
            code: 200,
            description: Some("found".to_string()),
            ..Response::default()
        };
        let mut body = Body::new(Schema::of_type(TypeName::Object));
        body.examples.insert(
            "default".to_string(),
            Example {
                summary: None,
                value: json!({"id": 1}),
            },
        );
        response.content.insert("application/json", body);

        let wire = generate_response(&response);
        assert_eq!(wire.name, "found");
        assert_eq!(wire.preview_language, "json");
        assert_eq!(
            serde_json::from_str::<Value>(wire.body.as_deref().unwrap()).unwrap(),
            json!({"id": 1})
        );
    }
}
