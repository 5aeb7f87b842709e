//! The schema graph produced by a build.
//!
//! A [`SchemaGraph`] holds one [`TypeNode`] per visited schema type (plus the
//! three category anchors) and three kinds of directed edges:
//!
//! - [`SubtypeEdge`]: supertype → direct subtype (anchor → top-level types)
//! - [`OwnershipEdge`]: owner type → owned attribute type
//! - [`RoleEdge`]: relation type → role player type, labeled with the role
//!
//! The graph enforces referential integrity on insertion: an edge can only be
//! added between nodes that are already present, and a node identity can only
//! be inserted once. Nodes and edges iterate in insertion order.

use indexmap::IndexMap;
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use thiserror::Error;

use crate::{category::Category, identifier::NodeId};

/// Errors raised when a graph mutation would break a graph invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node `{0}` is already present in the graph")]
    DuplicateNode(NodeId),

    #[error("edge endpoint `{0}` is not a node in the graph")]
    UnknownNode(NodeId),

    #[error("node `{child}` already has a supertype, cannot attach it under `{parent}`")]
    MultipleSupertypes { parent: NodeId, child: NodeId },

    #[error("subtype edge `{parent}` -> `{child}` crosses categories")]
    CategoryMismatch { parent: NodeId, child: NodeId },
}

/// One schema type (or category anchor) in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    id: NodeId,
    label: String,
    category: Category,
}

impl TypeNode {
    /// Creates a node for a schema type.
    pub fn new(id: NodeId, label: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            label: label.into(),
            category,
        }
    }

    /// Creates the synthetic anchor node for `category`.
    pub fn anchor(category: Category) -> Self {
        Self::new(NodeId::anchor(category), category.anchor_label(), category)
    }

    /// Returns the node identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the category this node belongs to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns `true` if this is a category anchor rather than a schema type.
    pub fn is_anchor(&self) -> bool {
        self.id.is_anchor()
    }
}

/// Edge weight stored in the underlying graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaEdge {
    /// Supertype → subtype.
    Subtype,
    /// Owner → attribute.
    Owns,
    /// Relation → player, carrying the role label.
    Plays(String),
}

/// A supertype → direct subtype edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubtypeEdge {
    pub parent: NodeId,
    pub child: NodeId,
}

/// An owner → attribute edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnershipEdge {
    pub owner: NodeId,
    pub attribute: NodeId,
}

/// A relation → player edge for one declared role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleEdge<'a> {
    pub relation: NodeId,
    pub role: &'a str,
    pub player: NodeId,
}

/// The node/edge graph of a schema snapshot.
#[derive(Debug, Default)]
pub struct SchemaGraph {
    graph: DiGraph<TypeNode, SchemaEdge>,
    index: IndexMap<NodeId, NodeIndex>,
}

impl SchemaGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if a node with the same identity exists.
    pub fn add_node(&mut self, node: TypeNode) -> Result<(), GraphError> {
        let id = node.id();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        Ok(())
    }

    /// Adds a subtype edge from `parent` to `child`.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint is missing, if `child` already has a supertype,
    /// or if the two nodes belong to different categories.
    pub fn add_subtype_edge(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        let (parent_idx, child_idx) = self.endpoints(parent, child)?;

        if self.graph[parent_idx].category() != self.graph[child_idx].category() {
            return Err(GraphError::CategoryMismatch { parent, child });
        }
        if self.supertype_index(child_idx).is_some() {
            return Err(GraphError::MultipleSupertypes { parent, child });
        }

        self.graph.add_edge(parent_idx, child_idx, SchemaEdge::Subtype);
        Ok(())
    }

    /// Adds an ownership edge. Returns `false` if the pair was already present.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if either endpoint is missing.
    pub fn add_ownership_edge(
        &mut self,
        owner: NodeId,
        attribute: NodeId,
    ) -> Result<bool, GraphError> {
        self.add_unique_edge(owner, attribute, SchemaEdge::Owns)
    }

    /// Adds a role edge. Returns `false` if the triple was already present.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if either endpoint is missing.
    pub fn add_role_edge(
        &mut self,
        relation: NodeId,
        role: impl Into<String>,
        player: NodeId,
    ) -> Result<bool, GraphError> {
        self.add_unique_edge(relation, player, SchemaEdge::Plays(role.into()))
    }

    /// Returns the node with the given identity.
    pub fn node(&self, id: NodeId) -> Option<&TypeNode> {
        self.index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Checks if a node with the given identity exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &TypeNode> {
        self.index.values().map(|idx| &self.graph[*idx])
    }

    /// Returns the schema-type nodes (anchors excluded) in insertion order.
    pub fn type_nodes(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes().filter(|node| !node.is_anchor())
    }

    /// Returns the nodes of one category, anchor included, in insertion order.
    pub fn nodes_in(&self, category: Category) -> impl Iterator<Item = &TypeNode> {
        self.nodes().filter(move |node| node.category() == category)
    }

    /// Returns the total number of nodes, anchors included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the total number of edges of all kinds.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Finds the schema-type node with `label` in `category`.
    pub fn find(&self, category: Category, label: &str) -> Option<&TypeNode> {
        self.type_nodes()
            .find(|node| node.category() == category && node.label() == label)
    }

    /// Returns all subtype edges in insertion order.
    pub fn subtype_edges(&self) -> impl Iterator<Item = SubtypeEdge> + '_ {
        self.edges_of(|weight| matches!(weight, SchemaEdge::Subtype))
            .map(|(parent, child, _)| SubtypeEdge { parent, child })
    }

    /// Returns all ownership edges in insertion order.
    pub fn ownership_edges(&self) -> impl Iterator<Item = OwnershipEdge> + '_ {
        self.edges_of(|weight| matches!(weight, SchemaEdge::Owns))
            .map(|(owner, attribute, _)| OwnershipEdge { owner, attribute })
    }

    /// Returns all role edges in insertion order.
    pub fn role_edges(&self) -> impl Iterator<Item = RoleEdge<'_>> + '_ {
        self.edges_of(|weight| matches!(weight, SchemaEdge::Plays(_)))
            .filter_map(|(relation, player, weight)| match weight {
                SchemaEdge::Plays(role) => Some(RoleEdge {
                    relation,
                    role: role.as_str(),
                    player,
                }),
                _ => None,
            })
    }

    /// Returns the direct supertype of `id` (an anchor for top-level types).
    pub fn supertype(&self, id: NodeId) -> Option<&TypeNode> {
        let idx = self.index.get(&id)?;
        self.supertype_index(*idx).map(|parent| &self.graph[parent])
    }

    /// Returns the direct subtypes of `id` in insertion order.
    pub fn subtypes(&self, id: NodeId) -> Vec<&TypeNode> {
        let Some(idx) = self.index.get(&id) else {
            return Vec::new();
        };

        let mut children: Vec<_> = self
            .graph
            .edges_directed(*idx, Direction::Outgoing)
            .filter(|edge| matches!(edge.weight(), SchemaEdge::Subtype))
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        // Adjacency lists are walked newest-first.
        children.sort_by_key(|(edge_idx, _)| *edge_idx);

        children
            .into_iter()
            .map(|(_, target)| &self.graph[target])
            .collect()
    }

    fn endpoints(&self, source: NodeId, target: NodeId) -> Result<(NodeIndex, NodeIndex), GraphError> {
        let source_idx = *self
            .index
            .get(&source)
            .ok_or(GraphError::UnknownNode(source))?;
        let target_idx = *self
            .index
            .get(&target)
            .ok_or(GraphError::UnknownNode(target))?;
        Ok((source_idx, target_idx))
    }

    fn supertype_index(&self, child: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(child, Direction::Incoming)
            .find(|edge| matches!(edge.weight(), SchemaEdge::Subtype))
            .map(|edge| edge.source())
    }

    fn add_unique_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        weight: SchemaEdge,
    ) -> Result<bool, GraphError> {
        let (source_idx, target_idx) = self.endpoints(source, target)?;

        let exists = self
            .graph
            .edges_connecting(source_idx, target_idx)
            .any(|edge| *edge.weight() == weight);
        if exists {
            return Ok(false);
        }

        self.graph.add_edge(source_idx, target_idx, weight);
        Ok(true)
    }

    fn edges_of<F>(&self, predicate: F) -> impl Iterator<Item = (NodeId, NodeId, &SchemaEdge)> + '_
    where
        F: Fn(&SchemaEdge) -> bool + 'static,
    {
        self.graph
            .edge_references()
            .filter(move |edge| predicate(edge.weight()))
            .map(|edge| {
                (
                    self.graph[edge.source()].id(),
                    self.graph[edge.target()].id(),
                    edge.weight(),
                )
            })
    }
}
