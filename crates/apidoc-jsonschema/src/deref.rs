//! Reference expansion against a definition table.
//!
//! [`Resolver::deep_deref`] is pure: it returns a new tree and leaves both
//! the input and the table untouched. Cycles are not errors; a pointer back
//! to a definition already being expanded stays a pointer, which keeps the
//! output finite and makes the operation idempotent.

use indexmap::IndexMap;

use crate::refs::RefSpace;
use crate::schema::Schema;
use crate::types::TypeName;
use crate::{Error, Result};

/// Expands schema-space references against an id-keyed definition table.
pub struct Resolver<'a> {
    defs: &'a IndexMap<i64, Schema>,
}

impl<'a> Resolver<'a> {
    pub fn new(defs: &'a IndexMap<i64, Schema>) -> Self {
        Resolver { defs }
    }

    /// Replace every expandable schema-space reference with a clone of its
    /// definition, recursively. References into other spaces are left as-is.
    pub fn deep_deref(&self, schema: &Schema) -> Result<Schema> {
        let mut visiting = Vec::new();
        self.expand(schema, &mut visiting)
    }

    fn expand(&self, schema: &Schema, visiting: &mut Vec<i64>) -> Result<Schema> {
        if let Some(r) = schema.ref_target() {
            if r.space != RefSpace::Schemas {
                return Ok(schema.clone());
            }
            if visiting.contains(&r.id) {
                tracing::debug!(id = r.id, "reference cycle, leaving pointer unexpanded");
                return Ok(schema.clone());
            }
            let Some(target) = self.defs.get(&r.id) else {
                return Err(Error::DanglingReference { id: r.id });
            };
            visiting.push(r.id);
            let expanded = self.expand(target, visiting);
            visiting.pop();
            return expanded;
        }

        let mut out = schema.clone();
        out.try_for_each_child_mut(&mut |child| {
            let expanded = self.expand(child, visiting)?;
            *child = expanded;
            Ok::<(), Error>(())
        })?;
        Ok(out)
    }
}

impl Schema {
    /// Overwrite this reference node with a clone of its target.
    ///
    /// # Errors
    ///
    /// Fails when the node is not a schema-space reference or when its id
    /// does not match the target's id.
    pub fn replace_ref(&mut self, target: &Schema) -> Result<()> {
        let Some(r) = self.ref_target() else {
            return Err(Error::structural("schema node is not a reference"));
        };
        if r.space != RefSpace::Schemas {
            return Err(Error::structural(
                "reference does not target the schemas space",
            ));
        }
        if r.id != target.id {
            return Err(Error::RefMismatch {
                expected: target.id,
                found: r.id,
            });
        }
        *self = target.clone();
        Ok(())
    }

    /// Degrade every nested reference to `target` into an empty schema of the
    /// target's top-level type. Used when a shared definition is deleted
    /// without re-inlining its content.
    pub fn strip_ref(&mut self, target: &Schema) {
        let degraded = target.primary_type().unwrap_or(TypeName::Object);
        self.walk_mut(&mut |node| {
            if let Some(r) = node.ref_target() {
                if r.space == RefSpace::Schemas && r.id == target.id {
                    node.kind = Schema::of_type(degraded).kind;
                }
            }
        });
    }
}
