#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # apidoc-diff
//!
//! Structural comparison of two revisions of one operation.
//!
//! [`diff_operation`] clones the newer revision and annotates it with
//! `+`/`-`/`!` markers: parameters and object properties match by name,
//! responses by status code, content by content type. The older revision is
//! read-only throughout.

/// The comparison walk itself.
pub mod engine;

pub use engine::{diff_operation, diff_schema};
