//! # apidoc-adapter-postman
//!
//! Postman collection v2.1 import and export.
//!
//! Importing walks the item tree, turning folders into categories and
//! requests into operations, and infers schemas from the example payloads
//! the collection carries. Exporting goes the other way: the document is
//! dereferenced and rebuilt as a self-contained collection.

mod export;
mod import;
mod infer;
mod model;

use apidoc_spec::ApiDocument;

/// Errors produced while importing or exporting collections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Document error: {0}")]
    Document(#[from] apidoc_spec::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Read a Postman collection into a canonical document.
pub fn parse(data: &[u8]) -> Result<ApiDocument> {
    let value: serde_json::Value = serde_json::from_slice(data)?;
    import::parse(value)
}

/// Write a canonical document as a Postman v2.1 collection.
pub fn generate(doc: &ApiDocument) -> Result<Vec<u8>> {
    let wire = export::generate(doc)?;
    Ok(serde_json::to_vec_pretty(&wire)?)
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
