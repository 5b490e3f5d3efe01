//! Document-wide request parameters.
//!
//! Global parameters apply to every operation unless the operation excepts
//! them by id. Path parameters cannot be global.

use serde::{Deserialize, Serialize};

use crate::parameter::{Parameter, ParameterIn, ParameterList};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalParameters {
    #[serde(skip_serializing_if = "ParameterList::is_empty")]
    pub query: ParameterList,
    #[serde(skip_serializing_if = "ParameterList::is_empty")]
    pub header: ParameterList,
    #[serde(skip_serializing_if = "ParameterList::is_empty")]
    pub cookie: ParameterList,
}

impl GlobalParameters {
    pub fn new() -> Self {
        GlobalParameters::default()
    }

    pub fn bucket(&self, location: ParameterIn) -> Option<&ParameterList> {
        match location {
            ParameterIn::Query => Some(&self.query),
            ParameterIn::Header => Some(&self.header),
            ParameterIn::Cookie => Some(&self.cookie),
            ParameterIn::Path => None,
        }
    }

    pub fn bucket_mut(&mut self, location: ParameterIn) -> Option<&mut ParameterList> {
        match location {
            ParameterIn::Query => Some(&mut self.query),
            ParameterIn::Header => Some(&mut self.header),
            ParameterIn::Cookie => Some(&mut self.cookie),
            ParameterIn::Path => None,
        }
    }

    pub fn add(&mut self, location: ParameterIn, parameter: Parameter) -> Result<()> {
        let bucket = self
            .bucket_mut(location)
            .ok_or_else(|| Error::UnknownLocation("path parameters cannot be global".to_string()))?;
        bucket.push(parameter);
        Ok(())
    }

    pub fn lookup(&self, location: ParameterIn, id: i64) -> Option<&Parameter> {
        self.bucket(location)?.lookup_id(id)
    }

    /// Buckets paired with their location, in query, header, cookie order.
    pub fn buckets(&self) -> impl Iterator<Item = (ParameterIn, &ParameterList)> {
        ParameterIn::GLOBAL
            .iter()
            .filter_map(|&location| Some((location, self.bucket(location)?)))
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.header.is_empty() && self.cookie.is_empty()
    }

    pub fn clear(&mut self) {
        self.query = ParameterList::default();
        self.header = ParameterList::default();
        self.cookie = ParameterList::default();
    }
}
