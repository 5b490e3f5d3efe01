//! The canonical document: metadata, shared tables, and the operation tree.

use apidoc_jsonschema::{Resolver, Schema, TypeName};
use serde::{Deserialize, Serialize};

use crate::collection::{collect_operations, collect_operations_mut, Collection};
use crate::definitions::{DefinitionModels, DefinitionResponses};
use crate::globals::GlobalParameters;
use crate::{Error, Result};

/// Version marker written into every document.
pub const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Globals {
    #[serde(skip_serializing_if = "GlobalParameters::is_empty")]
    pub parameters: GlobalParameters,
}

impl Globals {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Definitions {
    #[serde(skip_serializing_if = "DefinitionModels::is_empty")]
    pub schemas: DefinitionModels,
    #[serde(skip_serializing_if = "DefinitionResponses::is_empty")]
    pub responses: DefinitionResponses,
}

impl Definitions {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.responses.is_empty()
    }
}

/// A complete API description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiDocument {
    pub apidoc: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Globals::is_empty")]
    pub globals: Globals,
    #[serde(skip_serializing_if = "Definitions::is_empty")]
    pub definitions: Definitions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<Collection>,
}

impl Default for ApiDocument {
    fn default() -> Self {
        ApiDocument {
            apidoc: FORMAT_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            globals: Globals::default(),
            definitions: Definitions::default(),
            collections: Vec::new(),
        }
    }
}

impl ApiDocument {
    pub fn new(title: impl Into<String>) -> Self {
        ApiDocument {
            info: Info {
                title: title.into(),
                ..Info::default()
            },
            ..ApiDocument::default()
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        let doc: ApiDocument = serde_json::from_slice(data)?;
        if !doc.apidoc.is_empty() && doc.apidoc != FORMAT_VERSION {
            tracing::warn!(version = %doc.apidoc, "unknown document format version");
        }
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Make every operation self-contained: inline globals, expand shared
    /// responses, deep-dereference every schema, then drop the shared tables.
    ///
    /// A definition cycle survives as a pointer inside the expanded tree, so
    /// a cyclic document keeps its model table instead of dropping it.
    pub fn dereference(&mut self) -> Result<()> {
        let globals = std::mem::take(&mut self.globals);
        let table = self.definitions.schemas.schema_table();
        let resolver = Resolver::new(&table);

        for operation in collect_operations_mut(&mut self.collections) {
            operation.inline_globals(&globals.parameters);
            operation.expand_response_refs(&self.definitions.responses)?;
            operation.expand_model_refs(&resolver)?;
        }

        let cyclic = collect_operations(&self.collections)
            .iter()
            .any(|op| !op.referenced_model_ids().is_empty());
        if cyclic {
            tracing::warn!("definition cycle detected, keeping the model table");
        } else {
            self.definitions.schemas.clear();
        }
        self.definitions.responses.clear();
        Ok(())
    }

    /// Delete a shared model without re-inlining it. Every reference to the
    /// model degrades to an empty schema of its top-level type.
    pub fn strip_model(&mut self, id: i64) -> Result<()> {
        let target = {
            let definition = self
                .definitions
                .schemas
                .lookup_id(id)
                .ok_or(Error::Schema(apidoc_jsonschema::Error::DanglingReference {
                    id,
                }))?;
            let mut schema = definition
                .schema
                .clone()
                .unwrap_or_else(|| Schema::of_type(TypeName::Object));
            schema.id = id;
            schema
        };

        for operation in collect_operations_mut(&mut self.collections) {
            operation.strip_model_ref(&target);
        }
        for definition in &mut self.definitions.schemas.0 {
            strip_in_model_tree(definition, &target);
        }
        for definition in &mut self.definitions.responses.0 {
            strip_in_response_tree(definition, &target);
        }
        self.definitions.schemas.remove_id(id);
        Ok(())
    }

    /// Delete a shared response. Operation responses still pointing at it are
    /// dropped from their lists.
    pub fn strip_response(&mut self, id: i64) -> Result<()> {
        if self.definitions.responses.lookup_id(id).is_none() {
            return Err(Error::Schema(
                apidoc_jsonschema::Error::DanglingReference { id },
            ));
        }
        for operation in collect_operations_mut(&mut self.collections) {
            operation.strip_response_ref(id);
        }
        self.definitions.responses.remove_id(id);
        Ok(())
    }

    /// Check every schema in the document for structural violations.
    pub fn validate(&self) -> Result<()> {
        for definition in self.definitions.schemas.flatten() {
            if let Some(schema) = &definition.schema {
                schema.validate().map_err(|source| Error::Invalid {
                    context: format!("model definition `{}`", definition.name),
                    source,
                })?;
            }
        }
        for definition in self.definitions.responses.flatten() {
            validate_parameters(
                definition.header.iter(),
                &format!("response definition `{}`", definition.name),
            )?;
            for (content_type, body) in definition.content.iter() {
                body.schema.validate().map_err(|source| Error::Invalid {
                    context: format!(
                        "response definition `{}`, content `{content_type}`",
                        definition.name
                    ),
                    source,
                })?;
            }
        }
        for (location, bucket) in self.globals.parameters.buckets() {
            validate_parameters(bucket.iter(), &format!("global {location} parameters"))?;
        }
        for node in &self.collections {
            validate_collection(node)?;
        }
        Ok(())
    }
}

fn validate_parameters<'a>(
    parameters: impl Iterator<Item = &'a crate::parameter::Parameter>,
    context: &str,
) -> Result<()> {
    for parameter in parameters {
        if let Some(schema) = &parameter.schema {
            schema.validate().map_err(|source| Error::Invalid {
                context: format!("{context}, parameter `{}`", parameter.name),
                source,
            })?;
        }
    }
    Ok(())
}

fn validate_collection(node: &Collection) -> Result<()> {
    match node {
        Collection::Category(category) => {
            for item in &category.items {
                validate_collection(item)?;
            }
            Ok(())
        }
        Collection::Http(op) => {
            let mut first_err = None;
            op.for_each_schema(&mut |schema| {
                if first_err.is_none() {
                    if let Err(source) = schema.validate() {
                        first_err = Some(Error::Invalid {
                            context: format!("operation `{} {}`", op.method, op.path),
                            source,
                        });
                    }
                }
            });
            match first_err {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }
}

fn strip_in_model_tree(node: &mut crate::definitions::DefinitionModel, target: &Schema) {
    if node.id != target.id {
        if let Some(schema) = &mut node.schema {
            schema.strip_ref(target);
        }
    }
    for item in &mut node.items {
        strip_in_model_tree(item, target);
    }
}

fn strip_in_response_tree(node: &mut crate::definitions::DefinitionResponse, target: &Schema) {
    for parameter in node.header.iter_mut() {
        if let Some(schema) = &mut parameter.schema {
            schema.strip_ref(target);
        }
    }
    for (_, body) in node.content.iter_mut() {
        body.schema.strip_ref(target);
    }
    for item in &mut node.items {
        strip_in_response_tree(item, target);
    }
}
