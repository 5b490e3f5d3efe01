//! Recursive traversal over a schema tree.
//!
//! A node's children are its composition branches, its property values, the
//! `additionalProperties` schema, and the `items` schema. References and
//! scalars are leaves.

use crate::refs::RefSpace;
use crate::schema::{Schema, SchemaKind};
use crate::types::{BoolOr, DiffMark};

impl Schema {
    /// Visit each direct child once.
    pub fn for_each_child<F>(&self, f: &mut F)
    where
        F: FnMut(&Schema),
    {
        match &self.kind {
            SchemaKind::Reference(_) | SchemaKind::Scalar(_) => {}
            SchemaKind::Composed(c) => {
                for branch in &c.branches {
                    f(branch);
                }
            }
            SchemaKind::Object(o) => {
                for prop in o.properties.values() {
                    f(prop);
                }
                if let Some(BoolOr::Value(extra)) = &o.additional {
                    f(extra);
                }
            }
            SchemaKind::Array(a) => {
                if let Some(BoolOr::Value(items)) = &a.items {
                    f(items);
                }
            }
        }
    }

    /// Visit each direct child once, mutably.
    pub fn for_each_child_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Schema),
    {
        match &mut self.kind {
            SchemaKind::Reference(_) | SchemaKind::Scalar(_) => {}
            SchemaKind::Composed(c) => {
                for branch in &mut c.branches {
                    f(branch);
                }
            }
            SchemaKind::Object(o) => {
                for prop in o.properties.values_mut() {
                    f(prop);
                }
                if let Some(BoolOr::Value(extra)) = &mut o.additional {
                    f(extra);
                }
            }
            SchemaKind::Array(a) => {
                if let Some(BoolOr::Value(items)) = &mut a.items {
                    f(items);
                }
            }
        }
    }

    /// Visit each direct child once, stopping at the first error.
    pub fn try_for_each_child_mut<F, E>(&mut self, f: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&mut Schema) -> std::result::Result<(), E>,
    {
        match &mut self.kind {
            SchemaKind::Reference(_) | SchemaKind::Scalar(_) => Ok(()),
            SchemaKind::Composed(c) => {
                for branch in &mut c.branches {
                    f(branch)?;
                }
                Ok(())
            }
            SchemaKind::Object(o) => {
                for prop in o.properties.values_mut() {
                    f(prop)?;
                }
                if let Some(BoolOr::Value(extra)) = &mut o.additional {
                    f(extra)?;
                }
                Ok(())
            }
            SchemaKind::Array(a) => {
                if let Some(BoolOr::Value(items)) = &mut a.items {
                    f(items)?;
                }
                Ok(())
            }
        }
    }

    /// Depth-first visit of this node and every descendant.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&Schema),
    {
        f(self);
        self.for_each_child(&mut |child| child.walk(f));
    }

    /// Depth-first mutable visit of this node and every descendant.
    pub fn walk_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Schema),
    {
        f(self);
        self.for_each_child_mut(&mut |child| child.walk_mut(f));
    }

    /// True when this node or any descendant is a reference.
    pub fn has_deep_ref(&self) -> bool {
        let mut found = false;
        self.walk(&mut |node| found |= node.is_ref());
        found
    }

    /// Ids referenced anywhere in this tree for the given space, in visit
    /// order, deduplicated.
    pub fn referenced_ids(&self, space: RefSpace) -> Vec<i64> {
        let mut ids = Vec::new();
        self.walk(&mut |node| {
            if let Some(r) = node.ref_target() {
                if r.space == space && !ids.contains(&r.id) {
                    ids.push(r.id);
                }
            }
        });
        ids
    }

    /// Stamp this node and every descendant with one diff mark.
    pub fn set_diff_recursive(&mut self, mark: DiffMark) {
        self.walk_mut(&mut |node| node.diff = Some(mark));
    }
}
