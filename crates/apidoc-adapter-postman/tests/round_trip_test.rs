//! Integration test: Postman collection round trips.

use apidoc_adapter_postman::{generate, parse};
use apidoc_jsonschema::{BoolOr, ObjectSchema, Schema, SchemaKind, SchemaRef, TypeName};
use apidoc_spec::{
    collect_operations, ApiDocument, Body, Collection, DefinitionModel, DefinitionResponse,
    Operation, Parameter, ParameterIn, Response, Server,
};
use serde_json::{json, Value};

fn petstore_collection() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "info": {
            "name": "Petstore",
            "description": "Pets over HTTP",
            "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
        },
        "item": [
            {
                "name": "Pets",
                "item": [
                    {
                        "name": "List pets",
                        "request": {
                            "method": "GET",
                            "header": [
                                {"key": "X-Token", "value": "abc", "description": "access token"}
                            ],
                            "url": {
                                "raw": "https://api.example.com/pets?limit=10",
                                "protocol": "https",
                                "host": ["api", "example", "com"],
                                "path": ["pets"],
                                "query": [
                                    {"key": "limit", "value": "10"},
                                    {"key": "debug", "value": "1", "disabled": true}
                                ]
                            }
                        },
                        "response": [
                            {
                                "name": "ok",
                                "code": 200,
                                "_postman_previewlanguage": "json",
                                "body": "[{\"name\": \"rex\", \"age\": 3}]",
                                "header": [{"key": "X-Total", "value": "1"}]
                            }
                        ]
                    },
                    {
                        "name": "Create pet",
                        "request": {
                            "method": "POST",
                            "url": {
                                "protocol": "https",
                                "host": ["api", "example", "com"],
                                "path": ["pets"]
                            },
                            "body": {
                                "mode": "raw",
                                "raw": "{\"name\": \"rex\", \"tags\": [\"dog\"]}",
                                "options": {"raw": {"language": "json"}}
                            }
                        },
                        "response": [
                            {
                                "name": "created",
                                "code": 201,
                                "_postman_previewlanguage": "json",
                                "body": "{\"id\": 7, \"name\": \"rex\"}"
                            }
                        ]
                    },
                    {
                        "name": "Get pet",
                        "request": {
                            "method": "GET",
                            "url": {
                                "protocol": "https",
                                "host": ["api", "example", "com"],
                                "path": ["pets", ":petId"],
                                "variable": [{"key": "petId", "value": "42"}]
                            }
                        }
                    }
                ]
            },
            {
                "name": "Upload photo",
                "request": {
                    "method": "POST",
                    "url": {
                        "protocol": "https",
                        "host": ["api", "example", "com"],
                        "path": ["pets", ":petId", "photos"],
                        "variable": [{"key": "petId", "value": "42"}]
                    },
                    "body": {
                        "mode": "formdata",
                        "formdata": [
                            {"key": "note", "value": "profile", "type": "text"},
                            {"key": "photo", "type": "file"}
                        ]
                    }
                }
            }
        ]
    }))
    .unwrap()
}

#[test]
fn test_import_builds_canonical_tree() {
    let doc = parse(&petstore_collection()).unwrap();
    assert_eq!(doc.info.title, "Petstore");
    assert_eq!(doc.info.description.as_deref(), Some("Pets over HTTP"));
    assert_eq!(doc.servers[0].url, "https://api.example.com");

    let Collection::Category(pets) = &doc.collections[0] else {
        panic!("expected the Pets folder first");
    };
    assert_eq!(pets.title, "Pets");

    let ops = collect_operations(&doc.collections);
    assert_eq!(ops.len(), 4);

    let list = ops[0];
    assert_eq!((list.method.as_str(), list.path.as_str()), ("get", "/pets"));
    assert!(list.request.parameters.query.lookup_name("limit").is_some());
    assert!(list.request.parameters.query.lookup_name("debug").is_none());
    let token = list.request.parameters.header.lookup_name("X-Token").unwrap();
    assert_eq!(token.description.as_deref(), Some("access token"));

    let ok = list.responses.lookup_code(200).unwrap();
    assert_eq!(ok.description.as_deref(), Some("ok"));
    let body = ok.content.get("application/json").unwrap();
    let SchemaKind::Array(shape) = &body.schema.kind else {
        panic!("expected an inferred array schema");
    };
    let Some(BoolOr::Value(items)) = &shape.items else {
        panic!("expected inferred items");
    };
    let SchemaKind::Object(pet) = &items.kind else {
        panic!("expected inferred pet objects");
    };
    assert_eq!(pet.properties["age"].primary_type(), Some(TypeName::Integer));

    let get = ops[2];
    assert_eq!(get.path, "/pets/{petId}");
    let pet_id = get.request.parameters.path.lookup_name("petId").unwrap();
    assert!(pet_id.required);
    assert_eq!(pet_id.schema.as_ref().unwrap().examples, Some(json!("42")));

    let upload = ops[3];
    let form = upload.request.content.get("multipart/form-data").unwrap();
    let SchemaKind::Object(fields) = &form.schema.kind else {
        panic!("expected a form object schema");
    };
    assert!(matches!(fields.properties["photo"].kind, SchemaKind::Array(_)));
    assert_eq!(fields.properties["note"].examples, Some(json!("profile")));
}

#[test]
fn test_round_trip_reaches_a_fixed_point() {
    let first = parse(&petstore_collection()).unwrap();
    let bytes = generate(&first).unwrap();
    let second = parse(&bytes).unwrap();
    let again = generate(&second).unwrap();
    assert_eq!(bytes, again);

    let ops1 = collect_operations(&first.collections);
    let ops2 = collect_operations(&second.collections);
    assert_eq!(ops1.len(), ops2.len());
    for (a, b) in ops1.iter().zip(&ops2) {
        assert_eq!(a.title, b.title);
        assert_eq!(a.path, b.path);
        assert_eq!(a.method, b.method);
        assert_eq!(a.request, b.request);
    }

    // The inferred response schema survives because the example does.
    let list = ops2[0];
    let ok = list.responses.lookup_code(200).unwrap();
    let body = ok.content.get("application/json").unwrap();
    assert_eq!(body.schema.primary_type(), Some(TypeName::Array));
    assert_eq!(body.examples["default"].value, json!([{"name": "rex", "age": 3}]));
}

#[test]
fn test_export_inlines_shared_definitions() {
    let mut doc = ApiDocument::new("Petstore");
    doc.servers.push(Server {
        url: "https://api.example.com".to_string(),
        description: None,
    });

    let mut shape = ObjectSchema::default();
    shape
        .properties
        .insert("name".to_string(), Schema::of_type(TypeName::String));
    doc.definitions
        .schemas
        .push(DefinitionModel::new(7, "Pet", Schema::object(shape)));

    doc.definitions.responses.push(DefinitionResponse {
        id: 4,
        name: "NotFound".to_string(),
        description: Some("missing pet".to_string()),
        ..DefinitionResponse::default()
    });

    let mut token = Parameter::new("X-Token", Schema::of_type(TypeName::String));
    token.id = 31;
    doc.globals
        .parameters
        .add(ParameterIn::Header, token)
        .unwrap();

    let mut op = Operation {
        title: "Create pet".to_string(),
        path: "/pets".to_string(),
        method: "post".to_string(),
        ..Operation::default()
    };
    op.request.content.insert(
        "multipart/form-data",
        Body::new(Schema::reference(SchemaRef::schemas(7))),
    );
    op.responses.push(Response {
        code: 404,
        reference: Some(SchemaRef::responses(4)),
        ..Response::default()
    });
    doc.collections.push(Collection::Http(op));

    let bytes = generate(&doc).unwrap();
    let wire: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        wire["info"]["schema"],
        json!("https://schema.getpostman.com/json/collection/v2.1.0/collection.json")
    );

    let item = &wire["item"][0];
    assert_eq!(item["request"]["method"], json!("POST"));
    // The global header was inlined into the request.
    assert_eq!(item["request"]["header"][0]["key"], json!("X-Token"));
    // The form schema reference was expanded into concrete fields.
    assert_eq!(item["request"]["body"]["mode"], json!("formdata"));
    assert_eq!(item["request"]["body"]["formdata"][0]["key"], json!("name"));
    // The shared response came out inline under its own description.
    assert_eq!(item["response"][0]["code"], json!(404));
    assert_eq!(item["response"][0]["name"], json!("missing pet"));

    // The source document is untouched.
    assert!(doc.definitions.schemas.lookup_id(7).is_some());
    assert!(!doc.globals.parameters.is_empty());
}
