//! Two-revision comparison.
//!
//! The engine clones the newer revision and writes `x-apidoc-diff` marks into
//! the clone. The older revision is never touched, so a caller can diff the
//! same pair repeatedly or in parallel.

use apidoc_jsonschema::{ArraySchema, DiffMark, ObjectSchema, Schema, SchemaKind};
use apidoc_spec::{HttpBody, Operation, Parameter, ParameterIn, ParameterList, Response, ResponseList};

/// Compare two revisions of one operation and annotate the newer one.
///
/// `keep_removed` controls whether entries present only in `old` are spliced
/// back into the result with a `Removed` mark or dropped entirely.
pub fn diff_operation(old: &Operation, new: &Operation, keep_removed: bool) -> Operation {
    tracing::debug!(method = %new.method, path = %new.path, keep_removed, "diffing operation");
    let mut out = new.clone();
    if old.method != new.method || old.path != new.path {
        out.diff = Some(DiffMark::Changed);
    }
    for location in ParameterIn::ALL {
        diff_parameters(
            old.request.parameters.bucket(location),
            out.request.parameters.bucket_mut(location),
            keep_removed,
        );
    }
    diff_content(&old.request.content, &mut out.request.content, keep_removed);
    diff_responses(&old.responses, &mut out.responses, keep_removed);
    out
}

/// Compare two schemas and annotate a clone of the newer one.
pub fn diff_schema(old: &Schema, new: &Schema, keep_removed: bool) -> Schema {
    let mut out = new.clone();
    diff_schema_in_place(old, &mut out, keep_removed);
    out
}

/// Stamp an entry that exists in only one revision: the mark goes on the
/// entry and every schema node below it.
fn mark_parameter(parameter: &mut Parameter, mark: DiffMark) {
    parameter.diff = Some(mark);
    if let Some(schema) = &mut parameter.schema {
        schema.set_diff_recursive(mark);
    }
}

fn mark_response(response: &mut Response, mark: DiffMark) {
    response.diff = Some(mark);
    for parameter in response.header.iter_mut() {
        mark_parameter(parameter, mark);
    }
    for (_, body) in response.content.iter_mut() {
        body.schema.set_diff_recursive(mark);
    }
}

/// Parameter lists match by name. A removed entry goes back in at its old
/// index when that index still lands inside the list, otherwise at the end.
fn diff_parameters(old: &ParameterList, new: &mut ParameterList, keep_removed: bool) {
    if keep_removed {
        for (index, parameter) in old.iter().enumerate() {
            if new.lookup_name(&parameter.name).is_none() {
                let mut removed = parameter.clone();
                mark_parameter(&mut removed, DiffMark::Removed);
                if index + 1 < new.len() {
                    new.0.insert(index, removed);
                } else {
                    new.0.push(removed);
                }
            }
        }
    }
    for parameter in new.iter_mut() {
        if parameter.diff == Some(DiffMark::Removed) {
            continue;
        }
        match old.lookup_name(&parameter.name) {
            None => mark_parameter(parameter, DiffMark::Added),
            Some(previous) => diff_parameter(previous, parameter, keep_removed),
        }
    }
}

fn diff_parameter(old: &Parameter, new: &mut Parameter, keep_removed: bool) {
    match (old.reference, new.reference) {
        (Some(a), Some(b)) if a == b => return,
        (None, None) => {}
        _ => {
            new.diff = Some(DiffMark::Changed);
            return;
        }
    }
    if old.description != new.description || old.required != new.required {
        new.diff = Some(DiffMark::Changed);
        return;
    }
    match (&old.schema, &mut new.schema) {
        (Some(previous), Some(schema)) => diff_schema_in_place(previous, schema, keep_removed),
        (None, None) => {}
        _ => new.diff = Some(DiffMark::Changed),
    }
}

/// Content maps match by content type. Order is map order, so removed
/// entries land at the end.
fn diff_content(old: &HttpBody, new: &mut HttpBody, keep_removed: bool) {
    if keep_removed {
        for (content_type, body) in old.iter() {
            if new.get(content_type).is_none() {
                let mut removed = body.clone();
                removed.schema.set_diff_recursive(DiffMark::Removed);
                new.insert(content_type.clone(), removed);
            }
        }
    }
    for (content_type, body) in new.iter_mut() {
        if body.schema.diff == Some(DiffMark::Removed) {
            continue;
        }
        match old.get(content_type) {
            None => body.schema.set_diff_recursive(DiffMark::Added),
            Some(previous) => {
                diff_schema_in_place(&previous.schema, &mut body.schema, keep_removed);
            }
        }
    }
}

/// Responses match by status code, with the same splice rule as parameters.
fn diff_responses(old: &ResponseList, new: &mut ResponseList, keep_removed: bool) {
    if keep_removed {
        for (index, response) in old.iter().enumerate() {
            if new.lookup_code(response.code).is_none() {
                let mut removed = response.clone();
                mark_response(&mut removed, DiffMark::Removed);
                if index + 1 < new.len() {
                    new.0.insert(index, removed);
                } else {
                    new.0.push(removed);
                }
            }
        }
    }
    for response in new.iter_mut() {
        if response.diff == Some(DiffMark::Removed) {
            continue;
        }
        match old.lookup_code(response.code) {
            None => mark_response(response, DiffMark::Added),
            Some(previous) => diff_response(previous, response, keep_removed),
        }
    }
}

fn diff_response(old: &Response, new: &mut Response, keep_removed: bool) {
    match (old.reference, new.reference) {
        (Some(a), Some(b)) if a == b => return,
        (None, None) => {}
        _ => {
            new.diff = Some(DiffMark::Changed);
            return;
        }
    }
    // A renamed or redescribed response is marked as a whole; its payload is
    // not descended into.
    if old.name != new.name || old.description != new.description {
        new.diff = Some(DiffMark::Changed);
        return;
    }
    diff_parameters(&old.header, &mut new.header, keep_removed);
    diff_content(&old.content, &mut new.content, keep_removed);
}

fn diff_schema_in_place(old: &Schema, new: &mut Schema, keep_removed: bool) {
    // References compare by target id alone. A ref against a non-ref is a
    // shape change.
    match (old.ref_target(), new.ref_target()) {
        (Some(a), Some(b)) => {
            if a != b {
                new.diff = Some(DiffMark::Changed);
            }
            return;
        }
        (None, None) => {}
        _ => {
            new.diff = Some(DiffMark::Changed);
            return;
        }
    }

    // A type change short-circuits: mismatched shapes are not compared
    // member-wise. The list compare is order-sensitive.
    if std::mem::discriminant(&old.kind) != std::mem::discriminant(&new.kind)
        || old.type_list() != new.type_list()
    {
        new.diff = Some(DiffMark::Changed);
        return;
    }

    // Metadata changes mark the node but still allow the shape walk below to
    // mark nested nodes.
    if old.default != new.default || old.description != new.description || old.mock != new.mock {
        new.diff = Some(DiffMark::Changed);
    }

    match (&old.kind, &mut new.kind) {
        (SchemaKind::Object(previous), SchemaKind::Object(shape)) => {
            diff_object(previous, shape, keep_removed);
        }
        (SchemaKind::Array(previous), SchemaKind::Array(shape)) => {
            diff_array(previous, shape, keep_removed);
        }
        (SchemaKind::Composed(previous), SchemaKind::Composed(composed)) => {
            if previous.mode != composed.mode
                || previous.branches.len() != composed.branches.len()
            {
                new.diff = Some(DiffMark::Changed);
            } else {
                for (old_branch, branch) in
                    previous.branches.iter().zip(composed.branches.iter_mut())
                {
                    diff_schema_in_place(old_branch, branch, keep_removed);
                }
            }
        }
        _ => {}
    }
}

/// Properties match by name. A flip of the property's `required` membership
/// marks it changed without descending.
fn diff_object(old: &ObjectSchema, new: &mut ObjectSchema, keep_removed: bool) {
    let required = &new.required;
    for (name, property) in new.properties.iter_mut() {
        match old.properties.get(name) {
            None => property.set_diff_recursive(DiffMark::Added),
            Some(previous) => {
                if old.required.contains(name) != required.contains(name) {
                    property.diff = Some(DiffMark::Changed);
                } else {
                    diff_schema_in_place(previous, property, keep_removed);
                }
            }
        }
    }
    if keep_removed {
        for (name, property) in old.properties.iter() {
            if !new.properties.contains_key(name) {
                let mut removed = property.clone();
                removed.set_diff_recursive(DiffMark::Removed);
                new.properties.insert(name.clone(), removed);
            }
        }
    }
}

/// Arrays are not compared element-wise; the single items schema recurses.
fn diff_array(old: &ArraySchema, new: &mut ArraySchema, keep_removed: bool) {
    use apidoc_jsonschema::BoolOr;
    match (&old.items, &mut new.items) {
        (Some(BoolOr::Value(previous)), Some(BoolOr::Value(items))) => {
            diff_schema_in_place(previous, items, keep_removed);
        }
        (None, None) | (Some(BoolOr::Bool(_)), Some(BoolOr::Bool(_))) => {}
        (_, Some(BoolOr::Value(items))) => items.diff = Some(DiffMark::Changed),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_jsonschema::SchemaRef;

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    fn collect_marks(root: &Schema) -> Vec<(Option<DiffMark>, String)> {
        let mut out = Vec::new();
        root.walk(&mut |node| {
            out.push((node.diff, node.description.clone().unwrap_or_default()));
        });
        out
    }

    #[test]
    fn test_identical_schemas_stay_unmarked() {
        let a = schema(r#"{"type":"object","properties":{"name":{"type":"string"}}}"#);
        let out = diff_schema(&a, &a, true);
        assert!(collect_marks(&out).iter().all(|(mark, _)| mark.is_none()));
    }

    #[test]
    fn test_type_change_short_circuits() {
        let old = schema(
            r#"{"type":"object","properties":{"a":{"type":"object","properties":{"x":{"type":"string"}}}}}"#,
        );
        let new = schema(r#"{"type":"object","properties":{"a":{"type":"string"}}}"#);
        let out = diff_schema(&old, &new, true);
        let SchemaKind::Object(o) = &out.kind else {
            panic!("expected object")
        };
        assert_eq!(o.properties["a"].diff, Some(DiffMark::Changed));
        // The mismatched shapes are not merged.
        assert!(matches!(o.properties["a"].kind, SchemaKind::Scalar(_)));
    }

    #[test]
    fn test_property_add_and_remove() {
        let old = schema(r#"{"type":"object","properties":{"a":{"type":"string"}}}"#);
        let new = schema(r#"{"type":"object","properties":{"b":{"type":"string"}}}"#);

        let out = diff_schema(&old, &new, true);
        let SchemaKind::Object(o) = &out.kind else {
            panic!("expected object")
        };
        assert_eq!(o.properties["b"].diff, Some(DiffMark::Added));
        assert_eq!(o.properties["a"].diff, Some(DiffMark::Removed));

        let out = diff_schema(&old, &new, false);
        let SchemaKind::Object(o) = &out.kind else {
            panic!("expected object")
        };
        assert!(!o.properties.contains_key("a"));
    }

    #[test]
    fn test_required_flip_marks_without_descent() {
        let old = schema(
            r#"{"type":"object","required":["a"],"properties":{"a":{"type":"object","properties":{"deep":{"type":"string"}}}}}"#,
        );
        let new = schema(
            r#"{"type":"object","properties":{"a":{"type":"object","properties":{"deep":{"type":"integer"}}}}}"#,
        );
        let out = diff_schema(&old, &new, true);
        let SchemaKind::Object(o) = &out.kind else {
            panic!("expected object")
        };
        assert_eq!(o.properties["a"].diff, Some(DiffMark::Changed));
        let SchemaKind::Object(inner) = &o.properties["a"].kind else {
            panic!("expected object")
        };
        // The flip alone explains the mark; the nested type change is not
        // walked.
        assert_eq!(inner.properties["deep"].diff, None);
    }

    #[test]
    fn test_metadata_change_still_descends() {
        let old = schema(
            r#"{"type":"object","description":"v1","properties":{"a":{"type":"string"}}}"#,
        );
        let new = schema(
            r#"{"type":"object","description":"v2","properties":{"a":{"type":"string"},"b":{"type":"string"}}}"#,
        );
        let out = diff_schema(&old, &new, true);
        assert_eq!(out.diff, Some(DiffMark::Changed));
        let SchemaKind::Object(o) = &out.kind else {
            panic!("expected object")
        };
        assert_eq!(o.properties["b"].diff, Some(DiffMark::Added));
    }

    #[test]
    fn test_refs_compare_by_id() {
        let same_a = Schema::reference(SchemaRef::schemas(1));
        let same_b = Schema::reference(SchemaRef::schemas(1));
        assert_eq!(diff_schema(&same_a, &same_b, true).diff, None);

        let other = Schema::reference(SchemaRef::schemas(2));
        assert_eq!(
            diff_schema(&same_a, &other, true).diff,
            Some(DiffMark::Changed)
        );

        let inline = schema(r#"{"type":"object"}"#);
        assert_eq!(
            diff_schema(&same_a, &inline, true).diff,
            Some(DiffMark::Changed)
        );
    }

    #[test]
    fn test_array_items_recurse() {
        let old = schema(r#"{"type":"array","items":{"type":"object","properties":{"a":{"type":"string"}}}}"#);
        let new = schema(r#"{"type":"array","items":{"type":"object","properties":{"a":{"type":"integer"}}}}"#);
        let out = diff_schema(&old, &new, true);
        let SchemaKind::Array(arr) = &out.kind else {
            panic!("expected array")
        };
        let Some(apidoc_jsonschema::BoolOr::Value(items)) = &arr.items else {
            panic!("expected items")
        };
        let SchemaKind::Object(o) = &items.kind else {
            panic!("expected object")
        };
        assert_eq!(o.properties["a"].diff, Some(DiffMark::Changed));
    }

    #[test]
    fn test_nullable_flip_is_a_type_change() {
        let old = schema(r#"{"type":"object"}"#);
        let new = schema(r#"{"type":["object","null"]}"#);
        let out = diff_schema(&old, &new, true);
        assert_eq!(out.diff, Some(DiffMark::Changed));
    }
}
