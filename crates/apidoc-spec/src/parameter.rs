//! Named parameters and the ordered lists they live in.

use apidoc_jsonschema::{DiffMark, RefSpace, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Where a parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    Query,
    Path,
    Cookie,
    Header,
}

impl ParameterIn {
    /// Every location, in bucket order.
    pub const ALL: [ParameterIn; 4] = [
        ParameterIn::Query,
        ParameterIn::Path,
        ParameterIn::Cookie,
        ParameterIn::Header,
    ];

    /// The locations global parameters may use. Path parameters are bound to
    /// a concrete URL and stay local.
    pub const GLOBAL: [ParameterIn; 3] = [
        ParameterIn::Query,
        ParameterIn::Header,
        ParameterIn::Cookie,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParameterIn::Query => "query",
            ParameterIn::Path => "path",
            ParameterIn::Cookie => "cookie",
            ParameterIn::Header => "header",
        }
    }
}

impl fmt::Display for ParameterIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterIn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "query" => Ok(ParameterIn::Query),
            "path" => Ok(ParameterIn::Path),
            "cookie" => Ok(ParameterIn::Cookie),
            "header" => Ok(ParameterIn::Header),
            other => Err(Error::UnknownLocation(other.to_string())),
        }
    }
}

/// One named parameter. Either `schema` describes it inline or `reference`
/// points at a global parameter definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    #[serde(skip_serializing_if = "crate::is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<SchemaRef>,
    #[serde(rename = "x-apidoc-diff", skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffMark>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Parameter {
            name: name.into(),
            schema: Some(schema),
            ..Parameter::default()
        }
    }

    pub fn is_ref(&self) -> bool {
        self.reference.is_some()
    }

    /// Unpack one global parameter: overwrite this pointer entry with a clone
    /// of its target.
    ///
    /// # Errors
    ///
    /// Fails when the entry is not a parameters-space pointer or the ids do
    /// not match.
    pub fn replace_ref(&mut self, target: &Parameter) -> Result<()> {
        let Some(r) = self.reference else {
            return Err(Error::Schema(apidoc_jsonschema::Error::structural(
                "parameter is not a reference",
            )));
        };
        if r.space != RefSpace::Parameters {
            return Err(Error::Schema(apidoc_jsonschema::Error::structural(
                "reference does not target the parameters space",
            )));
        }
        if r.id != target.id {
            return Err(Error::Schema(apidoc_jsonschema::Error::RefMismatch {
                expected: target.id,
                found: r.id,
            }));
        }
        *self = target.clone();
        Ok(())
    }
}

/// An ordered list of parameters, matched by name during diffing and
/// conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterList(pub Vec<Parameter>);

impl ParameterList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, parameter: Parameter) {
        self.0.push(parameter);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Parameter> {
        self.0.iter_mut()
    }

    pub fn lookup_name(&self, name: &str) -> Option<&Parameter> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn lookup_id(&self, id: i64) -> Option<&Parameter> {
        if id == 0 {
            return None;
        }
        self.0.iter().find(|p| p.id == id)
    }

    /// Remove and return the first entry with the given name.
    pub fn remove_named(&mut self, name: &str) -> Option<Parameter> {
        let idx = self.0.iter().position(|p| p.name == name)?;
        Some(self.0.remove(idx))
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Parameter> for ParameterList {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        ParameterList(iter.into_iter().collect())
    }
}
