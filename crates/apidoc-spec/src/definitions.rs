//! Shared definition tables for data models and responses.
//!
//! Definitions may be organized in a category tree for display. Resolution,
//! diffing, and conversion only ever see the flattened id-keyed view.

use apidoc_jsonschema::Schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::body::HttpBody;
use crate::parameter::ParameterList;

/// Tree node role: a real definition or a grouping category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    #[default]
    Item,
    Category,
}

/// A shared data model, or a category grouping other models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionModel {
    #[serde(skip_serializing_if = "crate::is_zero")]
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: DefinitionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<DefinitionModel>,
}

impl DefinitionModel {
    pub fn new(id: i64, name: impl Into<String>, schema: Schema) -> Self {
        DefinitionModel {
            id,
            name: name.into(),
            schema: Some(schema),
            ..DefinitionModel::default()
        }
    }
}

/// The shared model table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionModels(pub Vec<DefinitionModel>);

impl DefinitionModels {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, definition: DefinitionModel) {
        self.0.push(definition);
    }

    /// Every real definition, tree collapsed, in declaration order.
    pub fn flatten(&self) -> Vec<&DefinitionModel> {
        let mut out = Vec::new();
        fn visit<'a>(nodes: &'a [DefinitionModel], out: &mut Vec<&'a DefinitionModel>) {
            for node in nodes {
                match node.kind {
                    DefinitionKind::Item => out.push(node),
                    DefinitionKind::Category => visit(&node.items, out),
                }
            }
        }
        visit(&self.0, &mut out);
        out
    }

    pub fn lookup_id(&self, id: i64) -> Option<&DefinitionModel> {
        if id == 0 {
            return None;
        }
        self.flatten().into_iter().find(|d| d.id == id)
    }

    pub fn lookup_name(&self, name: &str) -> Option<&DefinitionModel> {
        self.flatten().into_iter().find(|d| d.name == name)
    }

    /// The id-keyed schema table the resolver works against. Each schema is
    /// stamped with its definition id.
    pub fn schema_table(&self) -> IndexMap<i64, Schema> {
        let mut table = IndexMap::new();
        for definition in self.flatten() {
            if let Some(schema) = &definition.schema {
                let mut schema = schema.clone();
                schema.id = definition.id;
                table.insert(definition.id, schema);
            }
        }
        table
    }

    /// Remove a definition from the tree by id, returning it.
    pub fn remove_id(&mut self, id: i64) -> Option<DefinitionModel> {
        fn visit(nodes: &mut Vec<DefinitionModel>, id: i64) -> Option<DefinitionModel> {
            if let Some(idx) = nodes
                .iter()
                .position(|d| d.kind == DefinitionKind::Item && d.id == id)
            {
                return Some(nodes.remove(idx));
            }
            for node in nodes {
                if node.kind == DefinitionKind::Category {
                    if let Some(found) = visit(&mut node.items, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        visit(&mut self.0, id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// A shared response definition, or a category grouping them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionResponse {
    #[serde(skip_serializing_if = "crate::is_zero")]
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: DefinitionKind,
    #[serde(skip_serializing_if = "ParameterList::is_empty")]
    pub header: ParameterList,
    #[serde(skip_serializing_if = "HttpBody::is_empty")]
    pub content: HttpBody,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<DefinitionResponse>,
}

/// The shared response table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionResponses(pub Vec<DefinitionResponse>);

impl DefinitionResponses {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, definition: DefinitionResponse) {
        self.0.push(definition);
    }

    pub fn flatten(&self) -> Vec<&DefinitionResponse> {
        let mut out = Vec::new();
        fn visit<'a>(nodes: &'a [DefinitionResponse], out: &mut Vec<&'a DefinitionResponse>) {
            for node in nodes {
                match node.kind {
                    DefinitionKind::Item => out.push(node),
                    DefinitionKind::Category => visit(&node.items, out),
                }
            }
        }
        visit(&self.0, &mut out);
        out
    }

    pub fn lookup_id(&self, id: i64) -> Option<&DefinitionResponse> {
        if id == 0 {
            return None;
        }
        self.flatten().into_iter().find(|d| d.id == id)
    }

    pub fn lookup_name(&self, name: &str) -> Option<&DefinitionResponse> {
        self.flatten().into_iter().find(|d| d.name == name)
    }

    pub fn remove_id(&mut self, id: i64) -> Option<DefinitionResponse> {
        fn visit(nodes: &mut Vec<DefinitionResponse>, id: i64) -> Option<DefinitionResponse> {
            if let Some(idx) = nodes
                .iter()
                .position(|d| d.kind == DefinitionKind::Item && d.id == id)
            {
                return Some(nodes.remove(idx));
            }
            for node in nodes {
                if node.kind == DefinitionKind::Category {
                    if let Some(found) = visit(&mut node.items, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        visit(&mut self.0, id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
