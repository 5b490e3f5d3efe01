#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # apidoc-jsonschema
//!
//! The JSON Schema node model shared by the whole toolkit.
//!
//! A schema node carries common metadata plus exactly one shape (reference,
//! composition, object, array, or scalar), enforced at construction. The
//! crate also owns the typed `#/definitions/<space>/<id>` pointers and the
//! cycle-safe reference resolver.

/// Reference expansion against a definition table.
pub mod deref;
/// Flat wire form and its classification into the typed model.
pub mod raw;
/// Typed reference pointers into the three definition spaces.
pub mod refs;
/// The schema node model.
pub mod schema;
/// Scalar type vocabulary and shared wire primitives.
pub mod types;
/// Recursive traversal over schema trees.
pub mod walk;

/// Resolver entry point.
pub use deref::Resolver;
/// Pointer primitives.
pub use refs::{RefSpace, SchemaRef};
/// Node model types.
pub use schema::{ArraySchema, ComposeMode, Composed, ObjectSchema, ScalarSchema, Schema, SchemaKind};
/// Wire primitives shared across the model.
pub use types::{BoolOr, DiffMark, SchemaType, TypeName};

use thiserror::Error;

/// Errors that can occur when building or resolving schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("structural violation: {message}")]
    StructuralViolation { message: String },

    #[error("malformed reference '{reference}'")]
    MalformedRef { reference: String },

    #[error("dangling reference to definition {id}")]
    DanglingReference { id: i64 },

    #[error("reference id mismatch: expected {expected}, found {found}")]
    RefMismatch { expected: i64, found: i64 },

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl Error {
    /// Build a structural-violation error with a message.
    pub fn structural(message: impl Into<String>) -> Self {
        Self::StructuralViolation {
            message: message.into(),
        }
    }

    /// Build a malformed-reference error carrying the offending pointer.
    pub fn malformed_ref(reference: impl Into<String>) -> Self {
        Self::MalformedRef {
            reference: reference.into(),
        }
    }
}

/// Crate-local result type for schema operations.
pub type Result<T> = std::result::Result<T, Error>;
