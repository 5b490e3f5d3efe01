//! Integration test: OpenAPI round trips
//!
//! Exports a canonical document to 2.0 and 3.x and parses the output back,
//! checking that definitions, globals, and references survive.

use apidoc_adapter_openapi::{generate, generate_value, parse, OpenApiVersion};
use apidoc_jsonschema::{
    ArraySchema, BoolOr, ObjectSchema, ScalarSchema, Schema, SchemaRef, SchemaType, TypeName,
};
use apidoc_spec::{
    collect_operations, ApiDocument, Body, Collection, DefinitionModel, DefinitionResponse,
    Example, Operation, Parameter, ParameterIn, Response, Server,
};
use serde_json::json;

fn sample_document() -> ApiDocument {
    let mut doc = ApiDocument::new("Pet Store");
    doc.info.version = "1.2.0".to_string();
    doc.servers.push(Server {
        url: "https://api.example.com/v2".to_string(),
        description: Some("production".to_string()),
    });

    let mut pet = ObjectSchema::default();
    pet.properties
        .insert("name".to_string(), Schema::of_type(TypeName::String));
    pet.properties
        .insert("tag".to_string(), Schema::of_type(TypeName::String));
    pet.required.push("name".to_string());
    doc.definitions
        .schemas
        .push(DefinitionModel::new(7, "Pet", Schema::object(pet)));

    let mut not_found = DefinitionResponse {
        id: 4,
        name: "NotFound".to_string(),
        description: Some("no such pet".to_string()),
        ..DefinitionResponse::default()
    };
    not_found.content.insert(
        "application/json",
        Body::new(Schema::of_type(TypeName::Object)),
    );
    doc.definitions.responses.push(not_found);

    let mut token = Parameter::new("X-Token", Schema::of_type(TypeName::String));
    token.id = 31;
    token.required = true;
    doc.globals
        .parameters
        .add(ParameterIn::Header, token)
        .unwrap();

    let mut list = Operation {
        title: "List pets".to_string(),
        path: "/pets".to_string(),
        method: "get".to_string(),
        tags: vec!["pets".to_string()],
        ..Operation::default()
    };
    let mut limit = Parameter::new("limit", Schema::of_type(TypeName::Integer));
    limit.description = Some("page size".to_string());
    list.request.parameters.add(ParameterIn::Query, limit);
    let mut ok = Response {
        code: 200,
        name: Some("ok".to_string()),
        description: Some("pet list".to_string()),
        ..Response::default()
    };
    ok.content.insert(
        "application/json",
        Body::new(Schema::array(ArraySchema {
            items: Some(BoolOr::Value(Box::new(Schema::reference(
                SchemaRef::schemas(7),
            )))),
            ..ArraySchema::default()
        })),
    );
    list.responses.push(ok);
    list.responses.push(Response {
        code: 404,
        reference: Some(SchemaRef::responses(4)),
        ..Response::default()
    });
    doc.collections.push(Collection::Http(list));

    let mut create = Operation {
        title: "Create pet".to_string(),
        path: "/pets".to_string(),
        method: "post".to_string(),
        tags: vec!["pets".to_string()],
        ..Operation::default()
    };
    create.request.global_excepts.add(ParameterIn::Header, 31);
    let mut body = Body::new(Schema::reference(SchemaRef::schemas(7)));
    body.examples.insert(
        "sample".to_string(),
        Example {
            summary: Some("a pet".to_string()),
            value: json!({"name": "rex"}),
        },
    );
    create.request.content.insert("application/json", body);
    create.responses.push(Response {
        code: 201,
        name: Some("created".to_string()),
        description: Some("created".to_string()),
        ..Response::default()
    });
    doc.collections.push(Collection::Http(create));

    doc
}

#[test]
fn test_swagger_round_trip() {
    let doc = sample_document();
    let bytes = generate(&doc, OpenApiVersion::V2).unwrap();
    let back = parse(&bytes).unwrap();

    assert_eq!(back.info.title, "Pet Store");
    assert_eq!(back.servers[0].url, "https://api.example.com/v2");

    let pet = back.definitions.schemas.lookup_id(7).unwrap();
    assert_eq!(pet.name, "Pet");
    assert!(back.definitions.responses.lookup_id(4).is_some());

    let token = back
        .globals
        .parameters
        .lookup(ParameterIn::Header, 31)
        .unwrap();
    assert_eq!(token.name, "X-Token");
    assert!(token.required);

    let ops = collect_operations(&back.collections);
    let list = ops.iter().find(|o| o.method == "get").unwrap();
    assert_eq!(list.title, "List pets");
    assert!(list.request.global_excepts.is_empty());
    let limit = list.request.parameters.query.lookup_name("limit").unwrap();
    assert_eq!(
        limit.schema.as_ref().unwrap().primary_type(),
        Some(TypeName::Integer)
    );
    let ok = list.responses.lookup_code(200).unwrap();
    let (_, body) = ok.content.first().unwrap();
    assert!(body.schema.referenced_ids(apidoc_jsonschema::RefSpace::Schemas).contains(&7));
    let not_found = list.responses.lookup_code(404).unwrap();
    assert_eq!(not_found.reference, Some(SchemaRef::responses(4)));

    let create = ops.iter().find(|o| o.method == "post").unwrap();
    assert!(create
        .request
        .global_excepts
        .contains(ParameterIn::Header, 31));
    let (ct, body) = create.request.content.first().unwrap();
    assert_eq!(ct, "application/json");
    assert_eq!(body.schema.ref_target(), Some(SchemaRef::schemas(7)));
}

#[test]
fn test_openapi31_round_trip() {
    let doc = sample_document();
    let bytes = generate(&doc, OpenApiVersion::V31).unwrap();
    let back = parse(&bytes).unwrap();

    // 3.x keeps server descriptions.
    assert_eq!(back.servers[0].description.as_deref(), Some("production"));

    assert_eq!(back.definitions.schemas.lookup_id(7).unwrap().name, "Pet");
    let token = back
        .globals
        .parameters
        .lookup(ParameterIn::Header, 31)
        .unwrap();
    assert!(token.required);

    let ops = collect_operations(&back.collections);
    let list = ops.iter().find(|o| o.method == "get").unwrap();
    assert!(list.request.global_excepts.is_empty());
    assert_eq!(
        list.responses.lookup_code(404).unwrap().reference,
        Some(SchemaRef::responses(4))
    );

    let create = ops.iter().find(|o| o.method == "post").unwrap();
    assert!(create
        .request
        .global_excepts
        .contains(ParameterIn::Header, 31));
    let body = create.request.content.get("application/json").unwrap();
    assert_eq!(body.schema.ref_target(), Some(SchemaRef::schemas(7)));
    // Media-type examples survive with their keys.
    let example = body.examples.get("sample").unwrap();
    assert_eq!(example.summary.as_deref(), Some("a pet"));
    assert_eq!(example.value, json!({"name": "rex"}));
}

#[test]
fn test_form_body_unfolds_to_parameters() {
    let mut doc = ApiDocument::new("Uploads");
    let mut op = Operation {
        title: "Upload".to_string(),
        path: "/upload".to_string(),
        method: "post".to_string(),
        ..Operation::default()
    };
    let mut form = ObjectSchema::default();
    form.properties.insert(
        "file".to_string(),
        Schema::array(ArraySchema {
            items: Some(BoolOr::Value(Box::new(Schema::any()))),
            ..ArraySchema::default()
        }),
    );
    form.properties
        .insert("note".to_string(), Schema::of_type(TypeName::String));
    form.required.push("note".to_string());
    op.request
        .content
        .insert("multipart/form-data", Body::new(Schema::object(form)));
    op.responses.push(Response::default_success());
    doc.collections.push(Collection::Http(op));

    let value = generate_value(&doc, OpenApiVersion::V2).unwrap();
    let parameters = value["paths"]["/upload"]["post"]["parameters"]
        .as_array()
        .unwrap();
    let file = parameters.iter().find(|p| p["name"] == "file").unwrap();
    assert_eq!(file["type"], "file");
    assert_eq!(file["in"], "formData");
    let note = parameters.iter().find(|p| p["name"] == "note").unwrap();
    assert_eq!(note["type"], "string");
    assert_eq!(note["required"], true);

    let back = parse(&serde_json::to_vec(&value).unwrap()).unwrap();
    let ops = collect_operations(&back.collections);
    let body = ops[0].request.content.get("multipart/form-data").unwrap();
    let apidoc_jsonschema::SchemaKind::Object(object) = &body.schema.kind else {
        panic!("form body should parse back to an object schema");
    };
    assert_eq!(object.required, ["note"]);
    assert_eq!(
        object.properties["note"].primary_type(),
        Some(TypeName::String)
    );
    assert_eq!(
        object.properties["file"].primary_type(),
        Some(TypeName::Array)
    );
}

#[test]
fn test_30_generation_folds_nullable() {
    let mut doc = ApiDocument::new("Nullable");
    let schema = Schema::scalar(ScalarSchema {
        types: Some(SchemaType::Many(vec![TypeName::String, TypeName::Null])),
        ..ScalarSchema::default()
    });
    doc.definitions
        .schemas
        .push(DefinitionModel::new(5, "Label", schema));

    let value = generate_value(&doc, OpenApiVersion::V30).unwrap();
    let wire = &value["components"]["schemas"]["Label-5"];
    assert_eq!(wire["type"], "string");
    assert_eq!(wire["nullable"], true);

    let value = generate_value(&doc, OpenApiVersion::V31).unwrap();
    let wire = &value["components"]["schemas"]["Label-5"];
    assert_eq!(wire["type"], json!(["string", "null"]));
}

#[test]
fn test_foreign_swagger_document() {
    let data = br##"{
        "swagger": "2.0",
        "info": { "title": "External", "version": "0.9" },
        "host": "petstore.example.org",
        "basePath": "/api",
        "schemes": ["https"],
        "paths": {
            "/pets": {
                "get": {
                    "summary": "List",
                    "parameters": [
                        { "name": "limit", "in": "query", "type": "integer", "format": "int32" }
                    ],
                    "responses": {
                        "200": { "description": "ok", "schema": { "$ref": "#/definitions/Pet" } }
                    }
                }
            }
        },
        "definitions": {
            "Pet": {
                "type": "object",
                "properties": { "name": { "type": "string" } }
            }
        }
    }"##;
    let doc = parse(data).unwrap();

    assert_eq!(doc.servers[0].url, "https://petstore.example.org/api");
    // A key without an id suffix gets a stable hashed id, and the operation's
    // reference resolves to the same id.
    let pet = doc.definitions.schemas.lookup_name("Pet").unwrap();
    assert!(pet.id > 0);
    let ops = collect_operations(&doc.collections);
    let ok = ops[0].responses.lookup_code(200).unwrap();
    let (_, body) = ok.content.first().unwrap();
    assert_eq!(body.schema.ref_target(), Some(SchemaRef::schemas(pet.id)));
}
