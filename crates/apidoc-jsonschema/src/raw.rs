//! Flat wire form of a schema node and its classification into [`Schema`].
//!
//! The wire shape is ordinary JSON Schema (draft 2020-12 keys plus the
//! OpenAPI 3.0 `nullable` spelling) extended with `id` and the `x-apidoc-*`
//! keys. Deserialization runs through [`RawSchema`] and picks exactly one
//! shape; conflicting keyword combinations are structural violations, not
//! silently-ignored fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{
    ArraySchema, ComposeMode, Composed, ObjectSchema, ScalarSchema, Schema, SchemaKind,
};
use crate::types::{BoolOr, DiffMark, SchemaType, TypeName};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RawSchema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    schema_type: Option<SchemaType>,
    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    all_of: Option<Vec<RawSchema>>,
    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    any_of: Option<Vec<RawSchema>>,
    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    one_of: Option<Vec<RawSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<IndexMap<String, RawSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    additional_properties: Option<BoolOr<Box<RawSchema>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<BoolOr<Box<RawSchema>>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    examples: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum: Option<f64>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    exclusive_minimum: Option<BoolOr<f64>>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    exclusive_maximum: Option<BoolOr<f64>>,
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    multiple_of: Option<f64>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    max_items: Option<u64>,
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    unique_items: Option<bool>,
    #[serde(rename = "minProperties", skip_serializing_if = "Option::is_none")]
    min_properties: Option<u64>,
    #[serde(rename = "maxProperties", skip_serializing_if = "Option::is_none")]
    max_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deprecated: Option<bool>,
    #[serde(rename = "x-apidoc-orders", skip_serializing_if = "Option::is_none")]
    orders: Option<Vec<String>>,
    #[serde(rename = "x-apidoc-mock", skip_serializing_if = "Option::is_none")]
    mock: Option<String>,
    #[serde(rename = "x-apidoc-diff", skip_serializing_if = "Option::is_none")]
    diff: Option<DiffMark>,
    #[serde(rename = "x-apidoc-focus", skip_serializing_if = "Option::is_none")]
    focus: Option<bool>,
    #[serde(rename = "x-apidoc-suggestion", skip_serializing_if = "Option::is_none")]
    suggestion: Option<bool>,
}

fn non_empty(list: &Option<Vec<RawSchema>>) -> bool {
    list.as_ref().is_some_and(|l| !l.is_empty())
}

impl RawSchema {
    fn is_object_shape(&self) -> bool {
        self.schema_type
            .as_ref()
            .is_some_and(|t| t.contains(TypeName::Object))
            || self.properties.is_some()
            || self.additional_properties.is_some()
            || self.required.as_ref().is_some_and(|r| !r.is_empty())
            || self.min_properties.is_some()
            || self.max_properties.is_some()
    }

    fn is_array_shape(&self) -> bool {
        self.schema_type
            .as_ref()
            .is_some_and(|t| t.contains(TypeName::Array))
            || self.items.is_some()
            || self.min_items.is_some()
            || self.max_items.is_some()
            || self.unique_items.is_some()
    }

    /// Fold `null` out of a container type list into the nullable flag and
    /// reject lists that mix a container with other concrete types.
    fn fold_container_nullable(&mut self, container: TypeName) -> Result<()> {
        if let Some(t) = &self.schema_type {
            for name in t.as_list() {
                if name == TypeName::Null {
                    self.nullable = Some(true);
                } else if name != container {
                    return Err(Error::structural(format!(
                        "type list mixes {container} with {name}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn take_properties(&mut self) -> Result<IndexMap<String, Schema>> {
        let Some(raw_props) = self.properties.take() else {
            if self.orders.take().is_some_and(|o| !o.is_empty()) {
                return Err(Error::structural("x-apidoc-orders does not match properties"));
            }
            return Ok(IndexMap::new());
        };
        let mut properties = IndexMap::with_capacity(raw_props.len());
        if let Some(orders) = self.orders.take() {
            if orders.len() != raw_props.len() {
                return Err(Error::structural("x-apidoc-orders does not match properties"));
            }
            let mut remaining = raw_props;
            for key in orders {
                let Some(raw) = remaining.shift_remove(&key) else {
                    return Err(Error::structural("x-apidoc-orders does not match properties"));
                };
                properties.insert(key, Schema::try_from(raw)?);
            }
        } else {
            for (key, raw) in raw_props {
                properties.insert(key, Schema::try_from(raw)?);
            }
        }
        Ok(properties)
    }
}

fn convert_boxed(value: Option<BoolOr<Box<RawSchema>>>) -> Result<Option<BoolOr<Box<Schema>>>> {
    match value {
        None => Ok(None),
        Some(BoolOr::Bool(b)) => Ok(Some(BoolOr::Bool(b))),
        Some(BoolOr::Value(raw)) => Ok(Some(BoolOr::Value(Box::new(Schema::try_from(*raw)?)))),
    }
}

fn unconvert_boxed(value: Option<BoolOr<Box<Schema>>>) -> Option<BoolOr<Box<RawSchema>>> {
    match value {
        None => None,
        Some(BoolOr::Bool(b)) => Some(BoolOr::Bool(b)),
        Some(BoolOr::Value(schema)) => Some(BoolOr::Value(Box::new(RawSchema::from(*schema)))),
    }
}

impl TryFrom<RawSchema> for Schema {
    type Error = Error;

    fn try_from(mut raw: RawSchema) -> Result<Self> {
        let comp_count = usize::from(non_empty(&raw.all_of))
            + usize::from(non_empty(&raw.any_of))
            + usize::from(non_empty(&raw.one_of));
        if comp_count > 1 {
            return Err(Error::structural(
                "more than one composition keyword on one node",
            ));
        }

        let kind = if let Some(reference) = raw.reference.take() {
            if comp_count > 0
                || raw.schema_type.is_some()
                || raw.properties.is_some()
                || raw.items.is_some()
                || raw.additional_properties.is_some()
            {
                return Err(Error::structural("$ref node carries structural keywords"));
            }
            SchemaKind::Reference(reference.parse()?)
        } else if comp_count == 1 {
            let (mode, list) = if non_empty(&raw.all_of) {
                (ComposeMode::AllOf, raw.all_of.take().unwrap_or_default())
            } else if non_empty(&raw.any_of) {
                (ComposeMode::AnyOf, raw.any_of.take().unwrap_or_default())
            } else {
                (ComposeMode::OneOf, raw.one_of.take().unwrap_or_default())
            };
            let branches = list
                .into_iter()
                .map(Schema::try_from)
                .collect::<Result<Vec<_>>>()?;
            SchemaKind::Composed(Composed { mode, branches })
        } else if raw.is_object_shape() {
            raw.fold_container_nullable(TypeName::Object)?;
            SchemaKind::Object(ObjectSchema {
                properties: raw.take_properties()?,
                required: raw.required.take().unwrap_or_default(),
                additional: convert_boxed(raw.additional_properties.take())?,
                min_properties: raw.min_properties,
                max_properties: raw.max_properties,
            })
        } else if raw.is_array_shape() {
            raw.fold_container_nullable(TypeName::Array)?;
            SchemaKind::Array(ArraySchema {
                items: convert_boxed(raw.items.take())?,
                min_items: raw.min_items,
                max_items: raw.max_items,
                unique_items: raw.unique_items,
            })
        } else {
            if let Some(t) = &raw.schema_type {
                if t.is_empty() {
                    return Err(Error::structural("empty type list"));
                }
            }
            SchemaKind::Scalar(ScalarSchema {
                types: raw.schema_type.take(),
                enum_values: raw.enum_values.take().unwrap_or_default(),
                pattern: raw.pattern.take(),
                min_length: raw.min_length,
                max_length: raw.max_length,
                minimum: raw.minimum,
                maximum: raw.maximum,
                exclusive_minimum: raw.exclusive_minimum.take(),
                exclusive_maximum: raw.exclusive_maximum.take(),
                multiple_of: raw.multiple_of,
            })
        };

        Ok(Schema {
            id: raw.id.unwrap_or(0),
            title: raw.title,
            description: raw.description,
            default: raw.default,
            examples: raw.examples,
            format: raw.format,
            nullable: raw.nullable,
            deprecated: raw.deprecated,
            mock: raw.mock,
            diff: raw.diff,
            focus: raw.focus.unwrap_or(false),
            suggestion: raw.suggestion.unwrap_or(false),
            kind,
        })
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> RawSchema {
        let mut raw = RawSchema {
            id: (schema.id != 0).then_some(schema.id),
            title: schema.title,
            description: schema.description,
            default: schema.default,
            examples: schema.examples,
            format: schema.format,
            nullable: schema.nullable,
            deprecated: schema.deprecated,
            mock: schema.mock,
            diff: schema.diff,
            focus: schema.focus.then_some(true),
            suggestion: schema.suggestion.then_some(true),
            ..RawSchema::default()
        };
        match schema.kind {
            SchemaKind::Reference(r) => raw.reference = Some(r.to_string()),
            SchemaKind::Composed(c) => {
                let list: Vec<RawSchema> = c.branches.into_iter().map(RawSchema::from).collect();
                match c.mode {
                    ComposeMode::AllOf => raw.all_of = Some(list),
                    ComposeMode::AnyOf => raw.any_of = Some(list),
                    ComposeMode::OneOf => raw.one_of = Some(list),
                }
            }
            SchemaKind::Object(o) => {
                raw.schema_type = Some(SchemaType::One(TypeName::Object));
                if !o.properties.is_empty() {
                    raw.orders = Some(o.properties.keys().cloned().collect());
                    raw.properties = Some(
                        o.properties
                            .into_iter()
                            .map(|(k, v)| (k, RawSchema::from(v)))
                            .collect(),
                    );
                }
                if !o.required.is_empty() {
                    raw.required = Some(o.required);
                }
                raw.additional_properties = unconvert_boxed(o.additional);
                raw.min_properties = o.min_properties;
                raw.max_properties = o.max_properties;
            }
            SchemaKind::Array(a) => {
                raw.schema_type = Some(SchemaType::One(TypeName::Array));
                raw.items = unconvert_boxed(a.items);
                raw.min_items = a.min_items;
                raw.max_items = a.max_items;
                raw.unique_items = a.unique_items;
            }
            SchemaKind::Scalar(s) => {
                raw.schema_type = s.types;
                if !s.enum_values.is_empty() {
                    raw.enum_values = Some(s.enum_values);
                }
                raw.pattern = s.pattern;
                raw.min_length = s.min_length;
                raw.max_length = s.max_length;
                raw.minimum = s.minimum;
                raw.maximum = s.maximum;
                raw.exclusive_minimum = s.exclusive_minimum;
                raw.exclusive_maximum = s.exclusive_maximum;
                raw.multiple_of = s.multiple_of;
            }
        }
        raw
    }
}
