//! # apidoc-spec
//!
//! The canonical API description model.
//!
//! A document bundles metadata, global parameters, shared definition tables,
//! and a category tree of HTTP operations. Format adapters convert into and
//! out of this model; the resolver and diff engine operate directly on it.

pub mod body;
pub mod collection;
pub mod definitions;
pub mod document;
pub mod globals;
pub mod http;
pub mod parameter;

pub use body::{Body, Example, HttpBody};
pub use collection::{collect_operations, collect_operations_mut, Category, Collection, Operation};
pub use definitions::{
    DefinitionKind, DefinitionModel, DefinitionModels, DefinitionResponse, DefinitionResponses,
};
pub use document::{ApiDocument, Definitions, Globals, Info, Server, FORMAT_VERSION};
pub use globals::GlobalParameters;
pub use http::{GlobalExcepts, HttpParameters, HttpRequest, Response, ResponseList};
pub use parameter::{Parameter, ParameterIn, ParameterList};

use thiserror::Error;

/// Errors that can occur when working with documents
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] apidoc_jsonschema::Error),

    #[error("Unknown parameter location: {0}")]
    UnknownLocation(String),

    #[error("Invalid {context}")]
    Invalid {
        context: String,
        #[source]
        source: apidoc_jsonschema::Error,
    },

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn is_zero(value: &i64) -> bool {
    *value == 0
}
