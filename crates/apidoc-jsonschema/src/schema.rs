//! The schema node model.
//!
//! A node is a bundle of shared metadata plus exactly one shape: reference,
//! composition, object, array, or scalar. The shape is fixed at construction:
//! a node that mixes `$ref` with `properties`, or carries two composition
//! keywords at once, never makes it into this type (see [`crate::raw`]).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::raw::RawSchema;
use crate::refs::SchemaRef;
use crate::types::{BoolOr, DiffMark, SchemaType, TypeName};
use crate::{Error, Result};

/// One schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub struct Schema {
    /// Definition id when the node is an addressable shared definition,
    /// `0` for anonymous/inline nodes.
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub examples: Option<Value>,
    pub format: Option<String>,
    pub nullable: Option<bool>,
    pub deprecated: Option<bool>,
    /// Mock generation hint, carried verbatim.
    pub mock: Option<String>,
    /// Diff annotation, written by the diff engine.
    pub diff: Option<DiffMark>,
    /// Editor focus flag. Transient, but must survive serialization.
    pub focus: bool,
    /// Editor suggestion flag. Transient, but must survive serialization.
    pub suggestion: bool,
    pub kind: SchemaKind,
}

/// The exactly-one shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// A `$ref` pointer; the node has no structure of its own.
    Reference(SchemaRef),
    /// One of `allOf` / `anyOf` / `oneOf` with at least one branch.
    Composed(Composed),
    Object(ObjectSchema),
    Array(ArraySchema),
    /// Scalar constraints, or the empty "anything" schema when `types` is
    /// `None`.
    Scalar(ScalarSchema),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeMode {
    AllOf,
    AnyOf,
    OneOf,
}

impl ComposeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ComposeMode::AllOf => "allOf",
            ComposeMode::AnyOf => "anyOf",
            ComposeMode::OneOf => "oneOf",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composed {
    pub mode: ComposeMode,
    pub branches: Vec<Schema>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Properties in display order. The map order is authoritative; the wire
    /// form re-emits it as the ordering extension.
    pub properties: IndexMap<String, Schema>,
    pub required: Vec<String>,
    pub additional: Option<BoolOr<Box<Schema>>>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySchema {
    /// `None` leaves elements unconstrained, `Bool` is the boolean wire form.
    pub items: Option<BoolOr<Box<Schema>>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarSchema {
    /// `None` is the empty schema that accepts anything.
    pub types: Option<SchemaType>,
    pub enum_values: Vec<Value>,
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<BoolOr<f64>>,
    pub exclusive_maximum: Option<BoolOr<f64>>,
    pub multiple_of: Option<f64>,
}

impl Schema {
    fn with_kind(kind: SchemaKind) -> Self {
        Schema {
            id: 0,
            title: None,
            description: None,
            default: None,
            examples: None,
            format: None,
            nullable: None,
            deprecated: None,
            mock: None,
            diff: None,
            focus: false,
            suggestion: false,
            kind,
        }
    }

    /// The empty schema: no type, no constraints.
    pub fn any() -> Self {
        Schema::with_kind(SchemaKind::Scalar(ScalarSchema::default()))
    }

    /// An empty schema of the given top-level type.
    pub fn of_type(t: TypeName) -> Self {
        match t {
            TypeName::Object => Schema::object(ObjectSchema::default()),
            TypeName::Array => Schema::array(ArraySchema::default()),
            _ => Schema::scalar(ScalarSchema {
                types: Some(SchemaType::One(t)),
                ..ScalarSchema::default()
            }),
        }
    }

    pub fn reference(target: SchemaRef) -> Self {
        Schema::with_kind(SchemaKind::Reference(target))
    }

    pub fn composed(mode: ComposeMode, branches: Vec<Schema>) -> Self {
        Schema::with_kind(SchemaKind::Composed(Composed { mode, branches }))
    }

    pub fn object(shape: ObjectSchema) -> Self {
        Schema::with_kind(SchemaKind::Object(shape))
    }

    pub fn array(shape: ArraySchema) -> Self {
        Schema::with_kind(SchemaKind::Array(shape))
    }

    pub fn scalar(shape: ScalarSchema) -> Self {
        Schema::with_kind(SchemaKind::Scalar(shape))
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, SchemaKind::Reference(_))
    }

    pub fn ref_target(&self) -> Option<SchemaRef> {
        match &self.kind {
            SchemaKind::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// The node's top-level type, when it has one. References and
    /// compositions have none; untyped scalars have none.
    pub fn primary_type(&self) -> Option<TypeName> {
        match &self.kind {
            SchemaKind::Reference(_) | SchemaKind::Composed(_) => None,
            SchemaKind::Object(_) => Some(TypeName::Object),
            SchemaKind::Array(_) => Some(TypeName::Array),
            SchemaKind::Scalar(s) => s.types.as_ref().and_then(SchemaType::first),
        }
    }

    /// The full type list of the node, expanded. Object and array nodes
    /// report their container type plus `null` when nullable.
    pub fn type_list(&self) -> Vec<TypeName> {
        match &self.kind {
            SchemaKind::Reference(_) | SchemaKind::Composed(_) => Vec::new(),
            SchemaKind::Object(_) | SchemaKind::Array(_) => {
                let container = match self.kind {
                    SchemaKind::Array(_) => TypeName::Array,
                    _ => TypeName::Object,
                };
                if self.nullable == Some(true) {
                    vec![container, TypeName::Null]
                } else {
                    vec![container]
                }
            }
            SchemaKind::Scalar(s) => s.types.as_ref().map(SchemaType::as_list).unwrap_or_default(),
        }
    }

    /// Recursive structural check. Returns the first violation with a path
    /// context such as `properties.user.items`.
    pub fn validate(&self) -> Result<()> {
        self.validate_at("schema")
    }

    fn validate_at(&self, path: &str) -> Result<()> {
        match &self.kind {
            SchemaKind::Reference(_) => Ok(()),
            SchemaKind::Composed(c) => {
                if c.branches.is_empty() {
                    return Err(Error::structural(format!(
                        "{path}: {} has no branches",
                        c.mode.as_str()
                    )));
                }
                for (i, branch) in c.branches.iter().enumerate() {
                    branch.validate_at(&format!("{path}.{}[{i}]", c.mode.as_str()))?;
                }
                Ok(())
            }
            SchemaKind::Object(o) => {
                for (name, prop) in &o.properties {
                    prop.validate_at(&format!("{path}.properties.{name}"))?;
                }
                if let Some(BoolOr::Value(extra)) = &o.additional {
                    extra.validate_at(&format!("{path}.additionalProperties"))?;
                }
                Ok(())
            }
            SchemaKind::Array(a) => {
                if let Some(BoolOr::Value(items)) = &a.items {
                    items.validate_at(&format!("{path}.items"))?;
                }
                Ok(())
            }
            SchemaKind::Scalar(s) => {
                if let Some(types) = &s.types {
                    if types.is_empty() {
                        return Err(Error::structural(format!("{path}: empty type list")));
                    }
                    if types.contains(TypeName::Object) || types.contains(TypeName::Array) {
                        return Err(Error::structural(format!(
                            "{path}: container type on a scalar node"
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_type_picks_shape() {
        assert!(matches!(
            Schema::of_type(TypeName::Object).kind,
            SchemaKind::Object(_)
        ));
        assert!(matches!(
            Schema::of_type(TypeName::Array).kind,
            SchemaKind::Array(_)
        ));
        let s = Schema::of_type(TypeName::String);
        assert_eq!(s.primary_type(), Some(TypeName::String));
    }

    #[test]
    fn test_type_list_includes_null_when_nullable() {
        let mut s = Schema::of_type(TypeName::Object);
        assert_eq!(s.type_list(), vec![TypeName::Object]);
        s.nullable = Some(true);
        assert_eq!(s.type_list(), vec![TypeName::Object, TypeName::Null]);
    }

    #[test]
    fn test_validate_rejects_empty_composition() {
        let s = Schema::composed(ComposeMode::AnyOf, Vec::new());
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_reports_nested_path() {
        let mut obj = ObjectSchema::default();
        obj.properties.insert(
            "user".to_string(),
            Schema::scalar(ScalarSchema {
                types: Some(SchemaType::Many(vec![])),
                ..ScalarSchema::default()
            }),
        );
        let err = Schema::object(obj).validate().unwrap_err();
        assert!(err.to_string().contains("properties.user"));
    }
}
