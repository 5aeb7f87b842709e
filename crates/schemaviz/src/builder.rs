//! Schema graph construction.
//!
//! [`GraphBuilder`] walks the three category trees of a [`TypeSource`] and
//! produces a [`SchemaGraph`]. The build runs in two passes:
//!
//! 1. **Allocate** - depth-first, pre-order walk of each category tree from
//!    its anchor. Every visited type gets a fresh [`NodeId`] and a subtype
//!    edge from its parent. Category root labels are skipped and not
//!    descended into.
//! 2. **Connect** - optional ownership and role edges, emitted by looking up
//!    the node allocated for each referenced type in pass one.
//!
//! Each build owns its own [`Allocator`], so builds never share identity
//! state.

use std::fmt::Debug;

use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use schemaviz_core::{
    category::Category,
    graph::{SchemaGraph, TypeNode},
    identifier::{Allocator, NodeId},
    source::TypeSource,
};

use crate::{config::BuildOptions, error::SchemaVizError};

/// Builds a [`SchemaGraph`] from a [`TypeSource`].
///
/// # Examples
///
/// ```
/// use schemaviz::{GraphBuilder, config::BuildOptions};
/// use schemaviz_core::{category::Category, snapshot::SchemaSnapshot};
///
/// let mut schema = SchemaSnapshot::new();
/// schema.add_type("person", schema.root(Category::Entity)).unwrap();
///
/// let graph = GraphBuilder::new(&schema, BuildOptions::default()).build().unwrap();
/// assert!(graph.find(Category::Entity, "person").is_some());
/// ```
#[derive(Debug)]
pub struct GraphBuilder<S> {
    source: S,
    options: BuildOptions,
}

/// Node allocated for a visited type.
#[derive(Debug, Clone, Copy)]
struct Visited {
    id: NodeId,
    category: Category,
}

impl<S: TypeSource> GraphBuilder<S> {
    pub fn new(source: S, options: BuildOptions) -> Self {
        Self { source, options }
    }

    /// Run both passes and return the finished graph.
    ///
    /// # Errors
    ///
    /// - [`SchemaVizError::SourceUnavailable`] if any source call fails.
    /// - [`SchemaVizError::MalformedType`] for a type or role without a usable label.
    /// - [`SchemaVizError::AmbiguousType`] if the same type is reached twice.
    pub fn build(&self) -> Result<SchemaGraph, SchemaVizError> {
        info!(
            include_ownership = self.options.include_ownership(),
            include_roles = self.options.include_roles();
            "Building schema graph"
        );

        let mut graph = SchemaGraph::new();
        let mut allocator = Allocator::new();
        let mut visited: IndexMap<S::Type, Visited> = IndexMap::new();

        for category in Category::ALL {
            graph.add_node(TypeNode::anchor(category))?;
        }

        for category in Category::ALL {
            self.allocate_category(category, &mut graph, &mut allocator, &mut visited)?;
        }
        debug!(types = visited.len(); "Allocated type nodes");

        if self.options.include_ownership() {
            self.connect_ownership(&mut graph, &visited)?;
        }
        if self.options.include_roles() {
            self.connect_roles(&mut graph, &visited)?;
        }

        info!(nodes = graph.node_count(), edges = graph.edge_count(); "Schema graph built");
        Ok(graph)
    }

    /// Pass one for a single category tree.
    fn allocate_category(
        &self,
        category: Category,
        graph: &mut SchemaGraph,
        allocator: &mut Allocator,
        visited: &mut IndexMap<S::Type, Visited>,
    ) -> Result<(), SchemaVizError> {
        let anchor = NodeId::anchor(category);
        let root = self.source.category_root(category)?;

        // Children are pushed in reverse so they pop in source order.
        let mut worklist: Vec<(NodeId, S::Type)> = self
            .source
            .direct_subtypes(&root)?
            .into_iter()
            .rev()
            .map(|ty| (anchor, ty))
            .collect();

        let mut allocated = 0usize;
        while let Some((parent, ty)) = worklist.pop() {
            let label = usable(self.source.type_label(&ty)?)
                .ok_or_else(|| SchemaVizError::MalformedType(describe(&ty)))?;

            if Category::from_root_label(&label).is_some() {
                trace!(label = label.as_str(), category:% = category; "Skipping category root");
                continue;
            }

            if let Some(previous) = visited.get(&ty) {
                return Err(SchemaVizError::AmbiguousType(format!(
                    "`{label}` {} (first under {}, again under {})",
                    describe(&ty),
                    previous.category,
                    category
                )));
            }

            let id = allocator.allocate();
            trace!(label = label.as_str(), id:% = id, parent:% = parent; "Visiting type");
            graph.add_node(TypeNode::new(id, label, category))?;
            graph.add_subtype_edge(parent, id)?;

            let children = self.source.direct_subtypes(&ty)?;
            visited.insert(ty, Visited { id, category });
            allocated += 1;

            worklist.extend(children.into_iter().rev().map(|child| (id, child)));
        }

        debug!(category:% = category, types = allocated; "Category allocated");
        Ok(())
    }

    /// Pass two: owner → attribute edges, in visit order.
    fn connect_ownership(
        &self,
        graph: &mut SchemaGraph,
        visited: &IndexMap<S::Type, Visited>,
    ) -> Result<(), SchemaVizError> {
        let mut added = 0usize;
        for (ty, owner) in visited {
            for attribute in self.source.owned_attributes(ty)? {
                let Some(target) = visited.get(&attribute) else {
                    warn!(
                        owner:% = owner.id,
                        attribute = describe(&attribute).as_str();
                        "Skipping ownership of a type outside the graph"
                    );
                    continue;
                };
                if graph.add_ownership_edge(owner.id, target.id)? {
                    added += 1;
                }
            }
        }
        debug!(edges = added; "Ownership edges added");
        Ok(())
    }

    /// Pass two: relation → player edges, one per declared role and player.
    fn connect_roles(
        &self,
        graph: &mut SchemaGraph,
        visited: &IndexMap<S::Type, Visited>,
    ) -> Result<(), SchemaVizError> {
        let mut added = 0usize;
        let relations = visited
            .iter()
            .filter(|(_, node)| node.category == Category::Relation);

        for (ty, relation) in relations {
            for role in self.source.declared_roles(ty)? {
                let role_label = usable(self.source.role_label(&role)?)
                    .ok_or_else(|| SchemaVizError::MalformedType(format!("role {}", describe(&role))))?;

                for player in self.source.role_players(&role)? {
                    let Some(target) = visited.get(&player) else {
                        warn!(
                            relation:% = relation.id,
                            role = role_label.as_str(),
                            player = describe(&player).as_str();
                            "Skipping role player outside the graph"
                        );
                        continue;
                    };
                    if graph.add_role_edge(relation.id, role_label.as_str(), target.id)? {
                        added += 1;
                    }
                }
            }
        }
        debug!(edges = added; "Role edges added");
        Ok(())
    }
}

/// A label is usable when it has at least one non-whitespace character.
fn usable(label: Option<String>) -> Option<String> {
    label.filter(|label| !label.trim().is_empty())
}

fn describe(handle: &impl Debug) -> String {
    format!("{handle:?}")
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use proptest::prelude::*;

    use schemaviz_core::{
        snapshot::SchemaSnapshot,
        source::SourceError,
    };

    use super::*;

    fn build(source: &SchemaSnapshot, options: BuildOptions) -> SchemaGraph {
        GraphBuilder::new(source, options).build().unwrap()
    }

    fn labels(graph: &SchemaGraph, category: Category) -> Vec<String> {
        graph
            .nodes_in(category)
            .filter(|node| !node.is_anchor())
            .map(|node| node.label().to_string())
            .collect()
    }

    /// A hand-written source with explicit handles, used to produce shapes
    /// a snapshot cannot: shared handles, missing labels, failing calls.
    #[derive(Debug, Default)]
    struct FakeSource {
        labels: HashMap<u32, Option<String>>,
        children: HashMap<u32, Vec<u32>>,
        owns: HashMap<u32, Vec<u32>>,
        roles: HashMap<u32, Vec<u32>>,
        role_labels: HashMap<u32, Option<String>>,
        players: HashMap<u32, Vec<u32>>,
        failing: Option<u32>,
    }

    impl FakeSource {
        /// Roots are handles 1, 2 and 3.
        fn new() -> Self {
            let mut source = Self::default();
            for (handle, category) in (1..).zip(Category::ALL) {
                source
                    .labels
                    .insert(handle, Some(category.root_label().to_string()));
            }
            source
        }

        fn child(mut self, parent: u32, handle: u32, label: Option<&str>) -> Self {
            self.labels.insert(handle, label.map(str::to_string));
            self.children.entry(parent).or_default().push(handle);
            self
        }
    }

    impl TypeSource for FakeSource {
        type Type = u32;
        type Role = u32;

        fn category_root(&self, category: Category) -> Result<u32, SourceError> {
            Ok(category as u32 + 1)
        }

        fn direct_subtypes(&self, ty: &u32) -> Result<Vec<u32>, SourceError> {
            if self.failing == Some(*ty) {
                return Err(SourceError::unavailable("connection reset"));
            }
            Ok(self.children.get(ty).cloned().unwrap_or_default())
        }

        fn owned_attributes(&self, ty: &u32) -> Result<Vec<u32>, SourceError> {
            Ok(self.owns.get(ty).cloned().unwrap_or_default())
        }

        fn declared_roles(&self, ty: &u32) -> Result<Vec<u32>, SourceError> {
            Ok(self.roles.get(ty).cloned().unwrap_or_default())
        }

        fn role_players(&self, role: &u32) -> Result<Vec<u32>, SourceError> {
            Ok(self.players.get(role).cloned().unwrap_or_default())
        }

        fn type_label(&self, ty: &u32) -> Result<Option<String>, SourceError> {
            Ok(self.labels.get(ty).cloned().flatten())
        }

        fn role_label(&self, role: &u32) -> Result<Option<String>, SourceError> {
            Ok(self.role_labels.get(role).cloned().flatten())
        }
    }

    #[test]
    fn test_empty_source_has_only_anchors() {
        let graph = build(&SchemaSnapshot::new(), BuildOptions::default());

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 0);
        for category in Category::ALL {
            let anchor = graph.node(NodeId::anchor(category)).unwrap();
            assert_eq!(anchor.label(), category.anchor_label());
        }
    }

    #[test]
    fn test_nested_subtypes_hang_off_their_parent() {
        let mut schema = SchemaSnapshot::new();
        let person = schema.add_type("person", schema.root(Category::Entity)).unwrap();
        schema.add_type("student", person).unwrap();
        schema.add_type("tutor", person).unwrap();

        let graph = build(&schema, BuildOptions::default());
        let person = graph.find(Category::Entity, "person").unwrap();
        let children: Vec<_> = graph.subtypes(person.id()).iter().map(|n| n.label()).collect();

        assert_eq!(children, vec!["student", "tutor"]);
        assert_eq!(
            graph.supertype(person.id()).map(|n| n.id()),
            Some(NodeId::anchor(Category::Entity))
        );
    }

    #[test]
    fn test_visit_order_is_preorder() {
        let mut schema = SchemaSnapshot::new();
        let root = schema.root(Category::Entity);
        let a = schema.add_type("a", root).unwrap();
        schema.add_type("b", root).unwrap();
        schema.add_type("a1", a).unwrap();

        let graph = build(&schema, BuildOptions::default());

        assert_eq!(labels(&graph, Category::Entity), vec!["a", "a1", "b"]);
    }

    #[test]
    fn test_root_labels_are_skipped_and_not_descended() {
        let source = FakeSource::new()
            .child(1, 10, Some("entity"))
            .child(10, 11, Some("hidden"))
            .child(1, 12, Some("person"));

        let graph = GraphBuilder::new(source, BuildOptions::default()).build().unwrap();

        assert_eq!(labels(&graph, Category::Entity), vec!["person"]);
    }

    #[test]
    fn test_same_label_in_two_categories_gets_two_nodes() {
        let mut schema = SchemaSnapshot::new();
        schema.add_type("status", schema.root(Category::Entity)).unwrap();
        schema.add_type("status", schema.root(Category::Attribute)).unwrap();

        let graph = build(&schema, BuildOptions::default());
        let entity = graph.find(Category::Entity, "status").unwrap();
        let attribute = graph.find(Category::Attribute, "status").unwrap();

        assert_ne!(entity.id(), attribute.id());
    }

    #[test]
    fn test_handle_reached_twice_is_ambiguous() {
        let source = FakeSource::new()
            .child(1, 10, Some("shared"))
            .child(3, 10, Some("shared"));

        let err = GraphBuilder::new(source, BuildOptions::default())
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaVizError::AmbiguousType(_)), "{err:?}");
    }

    #[test]
    fn test_missing_type_label_is_malformed() {
        let source = FakeSource::new().child(2, 10, None);

        let err = GraphBuilder::new(source, BuildOptions::default())
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaVizError::MalformedType(ref msg) if msg == "10"));
    }

    #[test]
    fn test_missing_role_label_is_malformed() {
        let mut source = FakeSource::new().child(3, 10, Some("marriage"));
        source.roles.insert(10, vec![100]);
        source.role_labels.insert(100, None);

        let err = GraphBuilder::new(source, BuildOptions::default())
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaVizError::MalformedType(_)));
    }

    #[test]
    fn test_blank_type_label_is_malformed() {
        let source = FakeSource::new().child(1, 10, Some("   "));

        let err = GraphBuilder::new(source, BuildOptions::default())
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaVizError::MalformedType(ref msg) if msg == "10"));
    }

    #[test]
    fn test_blank_role_label_is_malformed() {
        let mut source = FakeSource::new()
            .child(3, 10, Some("marriage"))
            .child(1, 11, Some("person"));
        source.roles.insert(10, vec![100]);
        source.role_labels.insert(100, Some(" \t".to_string()));
        source.players.insert(100, vec![11]);

        let err = GraphBuilder::new(source, BuildOptions::default())
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaVizError::MalformedType(ref msg) if msg == "role 100"));
    }

    #[test]
    fn test_source_failure_aborts() {
        let mut source = FakeSource::new().child(1, 10, Some("person"));
        source.failing = Some(10);

        let err = GraphBuilder::new(source, BuildOptions::default())
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaVizError::SourceUnavailable(_)));
    }

    #[test]
    fn test_unvisited_references_are_skipped() {
        let mut source = FakeSource::new()
            .child(1, 10, Some("person"))
            .child(3, 20, Some("friendship"));
        source.owns.insert(10, vec![99]);
        source.roles.insert(20, vec![200]);
        source.role_labels.insert(200, Some("friend".to_string()));
        source.players.insert(200, vec![10, 98]);

        let graph = GraphBuilder::new(source, BuildOptions::default()).build().unwrap();

        assert_eq!(graph.ownership_edges().count(), 0);
        assert_eq!(graph.role_edges().count(), 1);
    }

    #[test]
    fn test_duplicate_ownership_emitted_once() {
        let mut source = FakeSource::new()
            .child(1, 10, Some("person"))
            .child(2, 20, Some("name"));
        source.owns.insert(10, vec![20, 20]);

        let graph = GraphBuilder::new(source, BuildOptions::default()).build().unwrap();

        assert_eq!(graph.ownership_edges().count(), 1);
    }

    #[test]
    fn test_roles_only_read_from_relations() {
        let mut source = FakeSource::new()
            .child(1, 10, Some("person"))
            .child(3, 20, Some("friendship"));
        // Roles reported for an entity are ignored.
        source.roles.insert(10, vec![100]);
        source.role_labels.insert(100, Some("bogus".to_string()));
        source.players.insert(100, vec![10]);

        let graph = GraphBuilder::new(source, BuildOptions::default()).build().unwrap();

        assert_eq!(graph.role_edges().count(), 0);
    }

    #[test]
    fn test_toggles() {
        let mut schema = SchemaSnapshot::new();
        let person = schema.add_type("person", schema.root(Category::Entity)).unwrap();
        let name = schema.add_type("name", schema.root(Category::Attribute)).unwrap();
        schema.add_owns(person, name).unwrap();
        let friendship = schema
            .add_type("friendship", schema.root(Category::Relation))
            .unwrap();
        let friend = schema.add_role(friendship, "friend").unwrap();
        schema.add_player(friend, person).unwrap();

        let only_owns = build(&schema, BuildOptions::new(true, false));
        assert_eq!(only_owns.ownership_edges().count(), 1);
        assert_eq!(only_owns.role_edges().count(), 0);

        let only_roles = build(&schema, BuildOptions::new(false, true));
        assert_eq!(only_roles.ownership_edges().count(), 0);
        assert_eq!(only_roles.role_edges().count(), 1);
    }

    /// A generated schema: `(category index, parent position)` per type,
    /// where a parent position that does not point at an earlier type of the
    /// same category means "directly under the root".
    fn snapshot_from(shape: &[(usize, usize)], owns: &[(usize, usize)]) -> SchemaSnapshot {
        let mut schema = SchemaSnapshot::new();
        let mut created = Vec::new();

        for (i, &(category, parent)) in shape.iter().enumerate() {
            let category = Category::ALL[category % 3];
            let supertype = created
                .get(parent)
                .filter(|(c, _)| *c == category)
                .map(|(_, ty)| *ty)
                .unwrap_or_else(|| schema.root(category));
            let ty = schema.add_type(format!("t{i}"), supertype).unwrap();
            created.push((category, ty));
        }

        for &(owner, attribute) in owns {
            if let (Some((_, owner)), Some((Category::Attribute, attribute))) =
                (created.get(owner), created.get(attribute))
            {
                schema.add_owns(*owner, *attribute).unwrap();
            }
        }
        schema
    }

    fn schema_strategy() -> impl Strategy<Value = SchemaSnapshot> {
        (
            prop::collection::vec((0usize..3, 0usize..24), 0..24),
            prop::collection::vec((0usize..24, 0usize..24), 0..16),
        )
            .prop_map(|(shape, owns)| snapshot_from(&shape, &owns))
    }

    proptest! {
        #[test]
        fn prop_node_ids_unique(schema in schema_strategy()) {
            let graph = build(&schema, BuildOptions::default());
            let ids: HashSet<NodeId> = graph.nodes().map(|n| n.id()).collect();

            prop_assert_eq!(ids.len(), graph.node_count());
            prop_assert_eq!(graph.node_count(), schema.type_count());
        }

        #[test]
        fn prop_root_labels_never_nodes(schema in schema_strategy()) {
            let graph = build(&schema, BuildOptions::default());

            for node in graph.type_nodes() {
                prop_assert!(Category::from_root_label(node.label()).is_none());
            }
        }

        #[test]
        fn prop_build_is_idempotent(schema in schema_strategy()) {
            let summarize = |graph: &SchemaGraph| {
                let label = |id| {
                    let node = graph.node(id).unwrap();
                    (node.category(), node.label().to_string())
                };
                let mut subtypes: Vec<_> = graph
                    .subtype_edges()
                    .map(|e| (label(e.parent), label(e.child)))
                    .collect();
                let mut owns: Vec<_> = graph
                    .ownership_edges()
                    .map(|e| (label(e.owner), label(e.attribute)))
                    .collect();
                subtypes.sort();
                owns.sort();
                (subtypes, owns)
            };

            let first = build(&schema, BuildOptions::default());
            let second = build(&schema, BuildOptions::default());
            prop_assert_eq!(summarize(&first), summarize(&second));
        }

        #[test]
        fn prop_edges_reference_nodes(schema in schema_strategy()) {
            let graph = build(&schema, BuildOptions::default());

            for edge in graph.ownership_edges() {
                prop_assert!(graph.contains(edge.owner));
                let attribute = graph.node(edge.attribute).unwrap();
                prop_assert_eq!(attribute.category(), Category::Attribute);
            }
            for edge in graph.role_edges() {
                prop_assert!(graph.contains(edge.relation));
                prop_assert!(graph.contains(edge.player));
            }
        }
    }
}
