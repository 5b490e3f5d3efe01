//! Request and response nodes of an operation.

use apidoc_jsonschema::{DiffMark, RefSpace, SchemaRef};
use serde::{Deserialize, Serialize};

use crate::body::HttpBody;
use crate::definitions::DefinitionResponse;
use crate::parameter::{Parameter, ParameterIn, ParameterList};
use crate::Result;

/// The four parameter buckets of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpParameters {
    pub query: ParameterList,
    pub path: ParameterList,
    pub cookie: ParameterList,
    pub header: ParameterList,
}

impl HttpParameters {
    pub fn bucket(&self, location: ParameterIn) -> &ParameterList {
        match location {
            ParameterIn::Query => &self.query,
            ParameterIn::Path => &self.path,
            ParameterIn::Cookie => &self.cookie,
            ParameterIn::Header => &self.header,
        }
    }

    pub fn bucket_mut(&mut self, location: ParameterIn) -> &mut ParameterList {
        match location {
            ParameterIn::Query => &mut self.query,
            ParameterIn::Path => &mut self.path,
            ParameterIn::Cookie => &mut self.cookie,
            ParameterIn::Header => &mut self.header,
        }
    }

    pub fn add(&mut self, location: ParameterIn, parameter: Parameter) {
        self.bucket_mut(location).push(parameter);
    }

    /// Buckets in the fixed query, path, cookie, header order.
    pub fn buckets(&self) -> impl Iterator<Item = (ParameterIn, &ParameterList)> {
        ParameterIn::ALL.into_iter().map(|l| (l, self.bucket(l)))
    }

    pub fn is_empty(&self) -> bool {
        ParameterIn::ALL.iter().all(|l| self.bucket(*l).is_empty())
    }
}

/// Per-operation opt-out from inherited global parameters, by definition id.
/// Only the three global locations exist here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalExcepts {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cookie: Vec<i64>,
}

impl GlobalExcepts {
    pub fn bucket(&self, location: ParameterIn) -> Option<&Vec<i64>> {
        match location {
            ParameterIn::Query => Some(&self.query),
            ParameterIn::Header => Some(&self.header),
            ParameterIn::Cookie => Some(&self.cookie),
            ParameterIn::Path => None,
        }
    }

    fn bucket_mut(&mut self, location: ParameterIn) -> Option<&mut Vec<i64>> {
        match location {
            ParameterIn::Query => Some(&mut self.query),
            ParameterIn::Header => Some(&mut self.header),
            ParameterIn::Cookie => Some(&mut self.cookie),
            ParameterIn::Path => None,
        }
    }

    /// True when the given global parameter is opted out here. Id zero never
    /// matches.
    pub fn contains(&self, location: ParameterIn, id: i64) -> bool {
        if id == 0 {
            return false;
        }
        self.bucket(location).is_some_and(|ids| ids.contains(&id))
    }

    pub fn add(&mut self, location: ParameterIn, id: i64) {
        if id == 0 {
            return;
        }
        if let Some(ids) = self.bucket_mut(location) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }

    pub fn remove(&mut self, location: ParameterIn, id: i64) {
        if let Some(ids) = self.bucket_mut(location) {
            ids.retain(|v| *v != id);
        }
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.header.clear();
        self.cookie.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.header.is_empty() && self.cookie.is_empty()
    }
}

/// The request side of an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRequest {
    #[serde(rename = "globalExcepts", skip_serializing_if = "GlobalExcepts::is_empty")]
    pub global_excepts: GlobalExcepts,
    pub parameters: HttpParameters,
    #[serde(skip_serializing_if = "HttpBody::is_empty")]
    pub content: HttpBody,
}

/// One response, keyed by status code. Either the fields describe it inline
/// or `reference` points at a shared response definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "ParameterList::is_empty")]
    pub header: ParameterList,
    #[serde(skip_serializing_if = "HttpBody::is_empty")]
    pub content: HttpBody,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<SchemaRef>,
    #[serde(rename = "x-apidoc-diff", skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffMark>,
}

impl Response {
    /// The fallback entry formats receive when a source declares no
    /// responses at all.
    pub fn default_success() -> Self {
        Response {
            code: 200,
            name: Some("success".to_string()),
            description: Some("success".to_string()),
            ..Response::default()
        }
    }

    pub fn is_ref(&self) -> bool {
        self.reference.is_some()
    }

    pub fn is_ref_to(&self, id: i64) -> bool {
        self.reference
            .is_some_and(|r| r.space == RefSpace::Responses && r.id == id)
    }

    /// Inline a shared definition into this entry, keeping the status code.
    pub fn expand_ref(&mut self, definition: &DefinitionResponse) {
        if !self.is_ref_to(definition.id) {
            return;
        }
        self.name = Some(definition.name.clone());
        self.description = definition.description.clone();
        self.header = definition.header.clone();
        self.content = definition.content.clone();
        self.reference = None;
    }
}

/// Ordered response list, matched by status code during diffing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseList(pub Vec<Response>);

impl ResponseList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, response: Response) {
        self.0.push(response);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Response> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Response> {
        self.0.iter_mut()
    }

    pub fn lookup_code(&self, code: u16) -> Option<&Response> {
        self.0.iter().find(|r| r.code == code)
    }

    /// Replace the entry with the same code, or append.
    pub fn upsert(&mut self, response: Response) {
        match self.0.iter_mut().find(|r| r.code == response.code) {
            Some(slot) => *slot = response,
            None => self.0.push(response),
        }
    }

    pub fn sort_by_code(&mut self) {
        self.0.sort_by_key(|r| r.code);
    }

    /// Inline every shared-response pointer against the definition table.
    ///
    /// # Errors
    ///
    /// Fails on the first pointer whose definition is missing.
    pub fn expand_refs(&mut self, definitions: &crate::definitions::DefinitionResponses) -> Result<()> {
        for response in &mut self.0 {
            let Some(r) = response.reference else {
                continue;
            };
            if r.space != RefSpace::Responses {
                continue;
            }
            let Some(definition) = definitions.lookup_id(r.id) else {
                return Err(apidoc_jsonschema::Error::DanglingReference { id: r.id }.into());
            };
            response.expand_ref(definition);
        }
        Ok(())
    }

    /// Drop every entry still pointing at the definition being deleted.
    pub fn remove_refs_to(&mut self, id: i64) {
        self.0.retain(|r| !r.is_ref_to(id));
    }
}

impl<'a> IntoIterator for &'a ResponseList {
    type Item = &'a Response;
    type IntoIter = std::slice::Iter<'a, Response>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
