//! Typed reference pointers into the three definition spaces.
//!
//! Every `$ref` in this system is a local pointer of the exact form
//! `#/definitions/<space>/<id>`. Anything else is rejected at parse time so
//! the rest of the code never has to inspect pointer strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// The three spaces a pointer may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefSpace {
    /// Shared data models.
    Schemas,
    /// Shared response definitions.
    Responses,
    /// Project-level global parameters.
    Parameters,
}

impl RefSpace {
    pub fn as_str(self) -> &'static str {
        match self {
            RefSpace::Schemas => "schemas",
            RefSpace::Responses => "responses",
            RefSpace::Parameters => "parameters",
        }
    }
}

impl fmt::Display for RefSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local pointer of the form `#/definitions/<space>/<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaRef {
    pub space: RefSpace,
    pub id: i64,
}

impl SchemaRef {
    pub fn schemas(id: i64) -> Self {
        SchemaRef {
            space: RefSpace::Schemas,
            id,
        }
    }

    pub fn responses(id: i64) -> Self {
        SchemaRef {
            space: RefSpace::Responses,
            id,
        }
    }

    pub fn parameters(id: i64) -> Self {
        SchemaRef {
            space: RefSpace::Parameters,
            id,
        }
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#/definitions/{}/{}", self.space, self.id)
    }
}

impl FromStr for SchemaRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("#/definitions/")
            .ok_or_else(|| Error::malformed_ref(s))?;
        let (space, id) = rest.split_once('/').ok_or_else(|| Error::malformed_ref(s))?;
        let space = match space {
            "schemas" => RefSpace::Schemas,
            "responses" => RefSpace::Responses,
            "parameters" => RefSpace::Parameters,
            _ => return Err(Error::malformed_ref(s)),
        };
        let id = id.parse::<i64>().map_err(|_| Error::malformed_ref(s))?;
        Ok(SchemaRef { space, id })
    }
}

impl Serialize for SchemaRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
