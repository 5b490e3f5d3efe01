//! Request/response bodies keyed by content type.

use apidoc_jsonschema::Schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named example attached to a body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub value: Value,
}

/// One body: a schema plus optional named examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub schema: Schema,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Example>,
}

impl Body {
    pub fn new(schema: Schema) -> Self {
        Body {
            schema,
            examples: IndexMap::new(),
        }
    }
}

/// Bodies keyed by content type, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HttpBody(pub IndexMap<String, Body>);

impl HttpBody {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, content_type: &str) -> Option<&Body> {
        self.0.get(content_type)
    }

    pub fn insert(&mut self, content_type: impl Into<String>, body: Body) {
        self.0.insert(content_type.into(), body);
    }

    /// First entry in declaration order, the one single-schema formats use.
    pub fn first(&self) -> Option<(&String, &Body)> {
        self.0.first()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Body> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, Body> {
        self.0.iter_mut()
    }

    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Body)> for HttpBody {
    fn from_iter<I: IntoIterator<Item = (String, Body)>>(iter: I) -> Self {
        HttpBody(iter.into_iter().collect())
    }
}
