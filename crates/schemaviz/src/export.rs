//! Export of schema graphs to diagrams.
//!
//! A finished [`SchemaGraph`] is first mapped to a renderer-neutral
//! [`Diagram`]: nodes with shapes, edges with labels and colors, plus layout
//! hints. A [`DiagramSink`] then turns the diagram into output bytes.
//!
//! # Pipeline Position
//!
//! ```text
//! TypeSource
//!     ↓ build
//! SchemaGraph
//!     ↓ Diagram::from_graph (this module)
//! Diagram
//!     ↓ DiagramSink::render
//! Output bytes
//! ```
//!
//! # Available Backends
//!
//! - [`graphviz`]: DOT text, PNG and SVG via [`graphviz::GraphvizSink`]

/// Graphviz export backend.
pub mod graphviz;

use std::{fmt, str::FromStr};

use log::debug;

use schemaviz_core::{
    category::Category,
    color::Color,
    graph::SchemaGraph,
    identifier::NodeId,
};

use crate::{
    config::{RankDirection, StyleConfig},
    error::SchemaVizError,
};

/// Output formats a diagram can be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
    /// Graphviz source text; needs no Graphviz installation.
    Dot,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Dot => "dot",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SchemaVizError;

    /// Case-insensitive; `gv` is accepted for `dot`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "dot" | "gv" => Ok(OutputFormat::Dot),
            _ => Err(SchemaVizError::UnsupportedOption(format!(
                "output format `{s}` (expected png, svg or dot)"
            ))),
        }
    }
}

/// Node shape per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Box,
    Ellipse,
    Diamond,
}

impl Shape {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Entity => Shape::Box,
            Category::Attribute => Shape::Ellipse,
            Category::Relation => Shape::Diamond,
        }
    }

    /// Graphviz shape name.
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Box => "box",
            Shape::Ellipse => "ellipse",
            Shape::Diamond => "diamond",
        }
    }
}

/// The relationship an edge draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Subtype,
    Ownership,
    Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramNode {
    id: String,
    label: String,
    shape: Shape,
}

impl DiagramNode {
    /// Identifier-safe key, distinct from the label.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramEdge {
    source: String,
    target: String,
    label: String,
    color: Color,
    kind: EdgeKind,
}

impl DiagramEdge {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }
}

/// Validated styling used to map a graph to a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramStyle {
    pub rank_direction: RankDirection,
    pub subtype_color: Color,
    pub ownership_color: Color,
    pub role_color: Color,
}

impl TryFrom<&StyleConfig> for DiagramStyle {
    type Error = SchemaVizError;

    fn try_from(config: &StyleConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            rank_direction: config.rank_direction(),
            subtype_color: config.subtype_color()?,
            ownership_color: config.ownership_color()?,
            role_color: config.role_color()?,
        })
    }
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self::try_from(&StyleConfig::default()).unwrap_or(Self {
            rank_direction: RankDirection::default(),
            subtype_color: Color::default(),
            ownership_color: Color::default(),
            role_color: Color::default(),
        })
    }
}

/// A renderer-neutral diagram of a schema graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    name: String,
    rank_direction: RankDirection,
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
    same_rank: Vec<String>,
}

impl Diagram {
    /// Map `graph` to a diagram named `name`.
    ///
    /// Entity types are boxes, attribute types ellipses and relation types
    /// diamonds; each anchor takes the shape of its category. Subtype edges
    /// are labeled `sub`, ownership edges `owns`, role edges with the role
    /// name. The three anchors share a rank.
    pub fn from_graph(name: impl Into<String>, graph: &SchemaGraph, style: &DiagramStyle) -> Self {
        let key = |id: NodeId| id.to_string();

        let nodes: Vec<DiagramNode> = graph
            .nodes()
            .map(|node| DiagramNode {
                id: key(node.id()),
                label: node.label().to_string(),
                shape: Shape::for_category(node.category()),
            })
            .collect();

        let subtypes = graph.subtype_edges().map(|edge| DiagramEdge {
            source: key(edge.parent),
            target: key(edge.child),
            label: "sub".to_string(),
            color: style.subtype_color,
            kind: EdgeKind::Subtype,
        });
        let ownership = graph.ownership_edges().map(|edge| DiagramEdge {
            source: key(edge.owner),
            target: key(edge.attribute),
            label: "owns".to_string(),
            color: style.ownership_color,
            kind: EdgeKind::Ownership,
        });
        let roles = graph.role_edges().map(|edge| DiagramEdge {
            source: key(edge.relation),
            target: key(edge.player),
            label: edge.role.to_string(),
            color: style.role_color,
            kind: EdgeKind::Role,
        });
        let edges: Vec<DiagramEdge> = subtypes.chain(ownership).chain(roles).collect();

        let same_rank = Category::ALL
            .into_iter()
            .map(|category| key(NodeId::anchor(category)))
            .collect();

        debug!(nodes = nodes.len(), edges = edges.len(); "Diagram mapped from graph");

        Self {
            name: name.into(),
            rank_direction: style.rank_direction,
            nodes,
            edges,
            same_rank,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank_direction(&self) -> RankDirection {
        self.rank_direction
    }

    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DiagramEdge] {
        &self.edges
    }

    /// Node ids that must be laid out on the same rank.
    pub fn same_rank(&self) -> &[String] {
        &self.same_rank
    }
}

/// Abstraction for diagram rendering backends.
///
/// See the [`graphviz`] module for the built-in implementation.
pub trait DiagramSink {
    /// Renders `diagram` to the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the diagram cannot be converted, or
    /// [`Error::Io`] if an external renderer fails to run.
    fn render(&self, diagram: &Diagram) -> Result<Vec<u8>, Error>;
}

/// Errors that can occur during diagram export.
///
/// Converted into [`SchemaVizError::Export`] at the crate boundary.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error, typically from running the Graphviz executable.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
