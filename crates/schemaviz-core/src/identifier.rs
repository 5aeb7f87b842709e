//! Graph node identities.
//!
//! This module provides the [`NodeId`] key used by [`SchemaGraph`](crate::graph::SchemaGraph)
//! and the [`Allocator`] that hands out fresh identities during a build.
//!
//! Node identities are deliberately independent of type labels: two types in
//! different categories may share a label, and renderers need identifier-safe
//! keys that are distinct from display text.

use std::fmt;

use crate::category::Category;

/// Identity of a node in a schema graph.
///
/// Anchor identities are fixed per category; type identities are produced by an
/// [`Allocator`] and are only meaningful within the graph built alongside it.
///
/// # Examples
///
/// ```
/// use schemaviz_core::{category::Category, identifier::{Allocator, NodeId}};
///
/// let mut allocator = Allocator::new();
/// let first = allocator.allocate();
/// let second = allocator.allocate();
///
/// assert_ne!(first, second);
/// assert_eq!(NodeId::anchor(Category::Entity).to_string(), "E");
/// assert_eq!(first.to_string(), "t1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// The synthetic anchor node of a category.
    Anchor(Category),
    /// A schema type visited during a build.
    Type(u32),
}

impl NodeId {
    /// Returns the fixed identity of the anchor node for `category`.
    pub fn anchor(category: Category) -> Self {
        NodeId::Anchor(category)
    }

    /// Returns `true` if this is an anchor identity.
    pub fn is_anchor(self) -> bool {
        matches!(self, NodeId::Anchor(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Anchor(Category::Entity) => f.write_str("E"),
            NodeId::Anchor(Category::Attribute) => f.write_str("A"),
            NodeId::Anchor(Category::Relation) => f.write_str("R"),
            NodeId::Type(n) => write!(f, "t{n}"),
        }
    }
}

/// Hands out distinct [`NodeId::Type`] identities.
///
/// An allocator is scoped to a single build; two calls on the same allocator
/// never return the same value. Separate allocators are fully independent.
#[derive(Debug)]
pub struct Allocator {
    next: u32,
}

impl Allocator {
    /// Creates an allocator whose first identity is `t1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns a fresh identity.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` identities are requested from one allocator.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId::Type(self.next);
        self.next = self
            .next
            .checked_add(1)
            .expect("node identity space exhausted");
        id
    }

    /// Returns the number of identities handed out so far.
    pub fn allocated(&self) -> usize {
        (self.next - 1) as usize
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}
