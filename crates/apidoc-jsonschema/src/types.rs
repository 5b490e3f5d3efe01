//! Scalar type vocabulary and small wire primitives shared across the model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The seven type names the data model recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl TypeName {
    /// Wire spelling of the type name.
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::String => "string",
            TypeName::Integer => "integer",
            TypeName::Number => "number",
            TypeName::Boolean => "boolean",
            TypeName::Object => "object",
            TypeName::Array => "array",
            TypeName::Null => "null",
        }
    }

    /// True for the container types that carry their own shape.
    pub fn is_container(self) -> bool {
        matches!(self, TypeName::Object | TypeName::Array)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(TypeName::String),
            "integer" => Ok(TypeName::Integer),
            "number" => Ok(TypeName::Number),
            "boolean" => Ok(TypeName::Boolean),
            "object" => Ok(TypeName::Object),
            "array" => Ok(TypeName::Array),
            "null" => Ok(TypeName::Null),
            other => Err(crate::Error::structural(format!(
                "unknown type name '{other}'"
            ))),
        }
    }
}

/// A single type name or an ordered list of type names.
///
/// OpenAPI 3.0 schemas carry a single string, draft 2020-12 schemas may carry
/// an array. Both forms are kept verbatim so documents serialize back the way
/// they arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    One(TypeName),
    Many(Vec<TypeName>),
}

impl SchemaType {
    /// Primary type: the single name, or the first entry of the list.
    pub fn first(&self) -> Option<TypeName> {
        match self {
            SchemaType::One(t) => Some(*t),
            SchemaType::Many(list) => list.first().copied(),
        }
    }

    pub fn contains(&self, t: TypeName) -> bool {
        match self {
            SchemaType::One(own) => *own == t,
            SchemaType::Many(list) => list.contains(&t),
        }
    }

    /// Expanded list view, regardless of which form is stored.
    pub fn as_list(&self) -> Vec<TypeName> {
        match self {
            SchemaType::One(t) => vec![*t],
            SchemaType::Many(list) => list.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SchemaType::Many(list) if list.is_empty())
    }

    /// Order-sensitive comparison over the expanded lists. `One(t)` and
    /// `Many([t])` compare equal here even though they serialize differently.
    pub fn same_order(&self, other: &SchemaType) -> bool {
        self.as_list() == other.as_list()
    }

    /// Order-independent comparison, used by structural validation.
    pub fn same_types(&self, other: &SchemaType) -> bool {
        let mut a = self.as_list();
        let mut b = other.as_list();
        a.sort();
        b.sort();
        a == b
    }
}

impl From<TypeName> for SchemaType {
    fn from(t: TypeName) -> Self {
        SchemaType::One(t)
    }
}

/// Diff annotation attached to nodes by the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffMark {
    /// Present in the new revision only.
    #[serde(rename = "+")]
    Added,
    /// Present in the old revision only.
    #[serde(rename = "-")]
    Removed,
    /// Present in both revisions with differing content.
    #[serde(rename = "!")]
    Changed,
}

/// A position that accepts either a boolean or a full value, the way `items`,
/// `additionalProperties`, and the draft-4 exclusive bounds do on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoolOr<T> {
    Bool(bool),
    Value(T),
}

impl<T> BoolOr<T> {
    pub fn as_value(&self) -> Option<&T> {
        match self {
            BoolOr::Value(v) => Some(v),
            BoolOr::Bool(_) => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut T> {
        match self {
            BoolOr::Value(v) => Some(v),
            BoolOr::Bool(_) => None,
        }
    }
}
