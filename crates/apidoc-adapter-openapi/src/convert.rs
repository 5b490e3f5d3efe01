//! Wire-side schema handling.
//!
//! Schemas cross the adapter boundary as `serde_json::Value` trees: the
//! reference rewrite and the per-version type folds edit the tree in place,
//! and only then does the tree become (or stop being) a canonical
//! [`Schema`]. This keeps every other wire field intact without the adapter
//! knowing the full keyword set.

use apidoc_jsonschema::{Schema, TypeName};
use apidoc_spec::{DefinitionModels, GlobalParameters, Parameter, ParameterIn};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::naming::{component_key, key_to_id};
use crate::OpenApiVersion;

/// Generate-side id to display-name index, built from the flattened model
/// table.
pub(crate) fn model_names(models: &DefinitionModels) -> IndexMap<i64, String> {
    models
        .flatten()
        .into_iter()
        .map(|model| (model.id, model.name.clone()))
        .collect()
}

/// Rebuild the global parameter table from the shared extension. Each value
/// is a canonical parameter with an injected `in` field; exports without the
/// field fall back to the `<location>-<name>` key prefix.
pub(crate) fn parse_globals(entries: IndexMap<String, Value>) -> GlobalParameters {
    let mut globals = GlobalParameters::new();
    for (key, value) in entries {
        let location = value
            .get("in")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| key.split_once('-').map(|(l, _)| l.to_string()));
        let Some(location) = location.and_then(|l| l.parse::<ParameterIn>().ok()) else {
            tracing::warn!(key = %key, "global parameter without a usable location, skipping");
            continue;
        };
        match serde_json::from_value::<Parameter>(value) {
            Ok(parameter) => {
                if let Err(err) = globals.add(location, parameter) {
                    tracing::warn!(key = %key, error = %err, "skipping global parameter");
                }
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "skipping malformed global parameter");
            }
        }
    }
    globals
}

/// Serialize the global table for the shared extension, keyed
/// `<location>-<name>`. The canonical parameter is stored whole (id
/// included) with an `in` field so the location survives name collisions.
pub(crate) fn generate_globals(
    globals: &GlobalParameters,
) -> crate::Result<IndexMap<String, Value>> {
    let mut out = IndexMap::new();
    for (location, list) in globals.buckets() {
        for parameter in list {
            let mut value = serde_json::to_value(parameter)?;
            if let Value::Object(map) = &mut value {
                map.insert(
                    "in".to_string(),
                    Value::String(location.as_str().to_string()),
                );
            }
            out.insert(format!("{location}-{}", parameter.name), value);
        }
    }
    Ok(out)
}

/// Visit every object in schema position: the node itself, `properties`
/// values, `items`, `additionalProperties`, and composition branches.
/// Non-schema values (examples, defaults, enums) are never entered.
pub(crate) fn walk_schema_objects<F>(value: &mut Value, f: &mut F)
where
    F: FnMut(&mut Map<String, Value>),
{
    let Value::Object(map) = value else {
        return;
    };
    f(map);
    for key in ["items", "additionalProperties"] {
        if let Some(child) = map.get_mut(key) {
            if child.is_object() {
                walk_schema_objects(child, f);
            }
        }
    }
    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        for (_, child) in properties.iter_mut() {
            walk_schema_objects(child, f);
        }
    }
    for key in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(branches)) = map.get_mut(key) {
            for branch in branches.iter_mut() {
                walk_schema_objects(branch, f);
            }
        }
    }
}

/// Rewrite external `$ref` strings to canonical `#/definitions/schemas/<id>`
/// form. A pointer outside the recognized component stores degrades to an
/// empty object schema.
pub(crate) fn rewrite_refs_to_canonical(value: &mut Value, prefixes: &[&str]) {
    walk_schema_objects(value, &mut |map| {
        let Some(Value::String(reference)) = map.get("$ref") else {
            return;
        };
        let key = prefixes
            .iter()
            .find_map(|prefix| reference.strip_prefix(prefix));
        match key {
            Some(key) => {
                let (_, id) = key_to_id(key);
                map.insert(
                    "$ref".to_string(),
                    Value::String(format!("#/definitions/schemas/{id}")),
                );
            }
            None => {
                tracing::warn!(reference = %reference, "unresolvable reference, degrading to object");
                map.clear();
                map.insert("type".to_string(), Value::String("object".to_string()));
            }
        }
    });
}

/// Rewrite canonical schema references to `<prefix><name-id>` form. A ref
/// whose id is missing from the model table degrades to an empty object
/// schema.
pub(crate) fn rewrite_refs_to_external(
    value: &mut Value,
    prefix: &str,
    names: &IndexMap<i64, String>,
) {
    walk_schema_objects(value, &mut |map| {
        let Some(Value::String(reference)) = map.get("$ref") else {
            return;
        };
        let id = reference
            .strip_prefix("#/definitions/schemas/")
            .and_then(|digits| digits.parse::<i64>().ok());
        match id.and_then(|id| names.get(&id).map(|name| (id, name))) {
            Some((id, name)) => {
                let key = component_key(name, id, "model");
                map.insert("$ref".to_string(), Value::String(format!("{prefix}{key}")));
            }
            None => {
                tracing::warn!(reference = %reference, "dangling model reference, degrading to object");
                map.clear();
                map.insert("type".to_string(), Value::String("object".to_string()));
            }
        }
    });
}

/// Reshape `type` lists for the target version. 3.1 takes type arrays
/// verbatim; 3.0 folds `null` into `nullable: true` and keeps one type; 2.0
/// has neither arrays nor nullable, so it keeps the first type.
pub(crate) fn fold_types_for_version(value: &mut Value, version: OpenApiVersion) {
    if version == OpenApiVersion::V31 {
        return;
    }
    walk_schema_objects(value, &mut |map| {
        let Some(Value::Array(list)) = map.get("type") else {
            return;
        };
        let mut types: Vec<String> = list
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        let had_null = types.iter().any(|t| t == "null");
        types.retain(|t| t != "null");
        if had_null && version == OpenApiVersion::V30 {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
        match types.len() {
            0 => {
                map.remove("type");
            }
            1 => {
                map.insert("type".to_string(), Value::String(types.remove(0)));
            }
            _ => {
                tracing::warn!(
                    version = version.as_str(),
                    "multi-type schema not expressible, keeping the first type"
                );
                map.insert("type".to_string(), Value::String(types.remove(0)));
            }
        }
    });
}

/// Turn a wire schema value into a canonical schema, rewriting references
/// first. A malformed schema degrades to an empty object with a warning so
/// one bad element cannot abort the document.
pub(crate) fn schema_from_wire(mut value: Value, prefixes: &[&str]) -> Schema {
    rewrite_refs_to_canonical(&mut value, prefixes);
    match serde_json::from_value(value) {
        Ok(schema) => schema,
        Err(err) => {
            tracing::warn!(error = %err, "unparseable schema, degrading to object");
            Schema::of_type(TypeName::Object)
        }
    }
}

/// Serialize a canonical schema for the wire: canonical refs become
/// `<prefix><key>` pointers and the type list is folded for the version.
/// Marshaling failures propagate.
pub(crate) fn schema_to_wire(
    schema: &Schema,
    prefix: &str,
    names: &IndexMap<i64, String>,
    version: OpenApiVersion,
) -> crate::Result<Value> {
    let mut value = serde_json::to_value(schema)?;
    rewrite_refs_to_external(&mut value, prefix, names);
    fold_types_for_version(&mut value, version);
    Ok(value)
}
