//! The operation tree: categories and HTTP operations.

use apidoc_jsonschema::{DiffMark, RefSpace, Resolver, Schema};
use serde::{Deserialize, Serialize};

use crate::definitions::DefinitionResponses;
use crate::globals::GlobalParameters;
use crate::http::{HttpRequest, ResponseList};
use crate::parameter::ParameterIn;
use crate::Result;

/// One HTTP operation: method, URL template, request and responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    #[serde(skip_serializing_if = "crate::is_zero")]
    pub id: i64,
    pub title: String,
    pub path: String,
    /// Lowercase HTTP method, `"get"`, `"post"`, ...
    pub method: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub request: HttpRequest,
    #[serde(skip_serializing_if = "ResponseList::is_empty")]
    pub responses: ResponseList,
    #[serde(rename = "x-apidoc-diff", skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffMark>,
}

/// A folder grouping operations and nested folders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(skip_serializing_if = "crate::is_zero")]
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Collection>,
}

/// A node in the operation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Collection {
    Category(Category),
    Http(Operation),
}

/// Every operation in the tree, folders collapsed, in declaration order.
pub fn collect_operations(collections: &[Collection]) -> Vec<&Operation> {
    let mut out = Vec::new();
    fn visit<'a>(nodes: &'a [Collection], out: &mut Vec<&'a Operation>) {
        for node in nodes {
            match node {
                Collection::Http(op) => out.push(op),
                Collection::Category(category) => visit(&category.items, out),
            }
        }
    }
    visit(collections, &mut out);
    out
}

pub fn collect_operations_mut(collections: &mut [Collection]) -> Vec<&mut Operation> {
    let mut out = Vec::new();
    fn visit<'a>(nodes: &'a mut [Collection], out: &mut Vec<&'a mut Operation>) {
        for node in nodes {
            match node {
                Collection::Http(op) => out.push(op),
                Collection::Category(category) => visit(&mut category.items, out),
            }
        }
    }
    visit(collections, &mut out);
    out
}

impl Operation {
    /// Visit every schema the operation carries: request parameters and
    /// bodies, response headers and bodies.
    pub fn try_for_each_schema_mut<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&mut Schema) -> Result<()>,
    {
        for location in ParameterIn::ALL {
            for parameter in self.request.parameters.bucket_mut(location).iter_mut() {
                if let Some(schema) = &mut parameter.schema {
                    f(schema)?;
                }
            }
        }
        for (_, body) in self.request.content.iter_mut() {
            f(&mut body.schema)?;
        }
        for response in self.responses.iter_mut() {
            for parameter in response.header.iter_mut() {
                if let Some(schema) = &mut parameter.schema {
                    f(schema)?;
                }
            }
            for (_, body) in response.content.iter_mut() {
                f(&mut body.schema)?;
            }
        }
        Ok(())
    }

    pub fn for_each_schema_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Schema),
    {
        // The closure never fails, so neither can the walk.
        let _ = self.try_for_each_schema_mut(&mut |schema| {
            f(schema);
            Ok(())
        });
    }

    pub fn for_each_schema<F>(&self, f: &mut F)
    where
        F: FnMut(&Schema),
    {
        for location in ParameterIn::ALL {
            for parameter in self.request.parameters.bucket(location).iter() {
                if let Some(schema) = &parameter.schema {
                    f(schema);
                }
            }
        }
        for (_, body) in self.request.content.iter() {
            f(&body.schema);
        }
        for response in self.responses.iter() {
            for parameter in response.header.iter() {
                if let Some(schema) = &parameter.schema {
                    f(schema);
                }
            }
            for (_, body) in response.content.iter() {
                f(&body.schema);
            }
        }
    }

    /// Copy every global parameter the operation does not except into its own
    /// buckets, then drop the except lists. After this the operation is
    /// self-contained with respect to globals.
    pub fn inline_globals(&mut self, globals: &GlobalParameters) {
        for (location, bucket) in globals.buckets() {
            for parameter in bucket.iter() {
                if self.request.global_excepts.contains(location, parameter.id) {
                    continue;
                }
                self.request.parameters.add(location, parameter.clone());
            }
        }
        self.request.global_excepts.clear();
    }

    /// Deep-dereference every schema against the shared model table.
    pub fn expand_model_refs(&mut self, resolver: &Resolver<'_>) -> Result<()> {
        self.try_for_each_schema_mut(&mut |schema| {
            *schema = resolver.deep_deref(schema)?;
            Ok(())
        })
    }

    /// Expand every shared-response pointer in place.
    pub fn expand_response_refs(&mut self, definitions: &DefinitionResponses) -> Result<()> {
        self.responses.expand_refs(definitions)
    }

    /// Degrade every reference to a model being deleted.
    pub fn strip_model_ref(&mut self, target: &Schema) {
        self.for_each_schema_mut(&mut |schema| schema.strip_ref(target));
    }

    /// Drop responses still pointing at a response definition being deleted.
    pub fn strip_response_ref(&mut self, id: i64) {
        self.responses.remove_refs_to(id);
    }

    /// Distinct model ids referenced anywhere in the operation.
    pub fn referenced_model_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        self.for_each_schema(&mut |schema| {
            for id in schema.referenced_ids(RefSpace::Schemas) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        });
        ids
    }

    /// Distinct shared-response ids the operation points at.
    pub fn referenced_response_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for response in self.responses.iter() {
            if let Some(r) = response.reference {
                if r.space == RefSpace::Responses && !ids.contains(&r.id) {
                    ids.push(r.id);
                }
            }
        }
        ids
    }
}
