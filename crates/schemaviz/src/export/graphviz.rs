//! Graphviz rendering.
//!
//! [`GraphvizSink`] converts a [`Diagram`] into a `dot-structures` graph.
//! DOT output is printed in-process; PNG and SVG are produced by running the
//! Graphviz `dot` executable through `graphviz-rust`.

use dot_structures::{
    Attribute, Edge, EdgeTy, Graph, GraphAttributes, Id, Node, NodeId, Stmt, Subgraph, Vertex,
};
use graphviz_rust::{
    cmd::{CommandArg, Format},
    exec,
    printer::{DotPrinter, PrinterContext},
};
use log::{debug, info};

use crate::export::{Diagram, DiagramSink, Error, OutputFormat};

/// Renders diagrams with Graphviz.
///
/// # Examples
///
/// ```
/// use schemaviz::export::{Diagram, DiagramSink, DiagramStyle, OutputFormat, graphviz::GraphvizSink};
/// use schemaviz_core::graph::SchemaGraph;
///
/// let diagram = Diagram::from_graph("empty", &SchemaGraph::new(), &DiagramStyle::default());
/// let dot = GraphvizSink::new(OutputFormat::Dot).render(&diagram).unwrap();
/// assert!(String::from_utf8(dot).unwrap().contains("digraph"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GraphvizSink {
    format: OutputFormat,
}

impl GraphvizSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Build the DOT graph for `diagram`.
    pub fn to_graph(&self, diagram: &Diagram) -> Graph {
        let mut stmts = vec![
            Stmt::Attribute(attr("rankdir", plain(diagram.rank_direction().as_str()))),
            Stmt::GAttribute(GraphAttributes::Node(vec![attr("fontname", quoted("Helvetica"))])),
            Stmt::GAttribute(GraphAttributes::Edge(vec![attr("fontname", quoted("Helvetica"))])),
        ];

        stmts.push(Stmt::Subgraph(Subgraph {
            id: plain("anchors"),
            stmts: std::iter::once(Stmt::Attribute(attr("rank", plain("same"))))
                .chain(diagram.same_rank().iter().map(|id| {
                    Stmt::Node(Node {
                        id: node_id(id),
                        attributes: Vec::new(),
                    })
                }))
                .collect(),
        }));

        stmts.extend(diagram.nodes().iter().map(|node| {
            Stmt::Node(Node {
                id: node_id(node.id()),
                attributes: vec![
                    attr("label", quoted(node.label())),
                    attr("shape", plain(node.shape().as_str())),
                ],
            })
        }));

        stmts.extend(diagram.edges().iter().map(|edge| {
            Stmt::Edge(Edge {
                ty: EdgeTy::Pair(
                    Vertex::N(node_id(edge.source())),
                    Vertex::N(node_id(edge.target())),
                ),
                attributes: vec![
                    attr("label", quoted(edge.label())),
                    attr("color", quoted(&edge.color().to_hex())),
                    attr("fontcolor", quoted(&edge.color().to_hex())),
                ],
            })
        }));

        Graph::DiGraph {
            id: quoted(diagram.name()),
            strict: false,
            stmts,
        }
    }
}

impl DiagramSink for GraphvizSink {
    fn render(&self, diagram: &Diagram) -> Result<Vec<u8>, Error> {
        info!(format:% = self.format, name = diagram.name(); "Rendering diagram with Graphviz");
        let graph = self.to_graph(diagram);
        let mut ctx = PrinterContext::default();

        let bytes = match self.format {
            OutputFormat::Dot => graph.print(&mut ctx).into_bytes(),
            OutputFormat::Png => run_dot(graph, &mut ctx, Format::Png)?,
            OutputFormat::Svg => run_dot(graph, &mut ctx, Format::Svg)?,
        };

        debug!(bytes = bytes.len(); "Diagram rendered");
        Ok(bytes)
    }
}

fn run_dot(graph: Graph, ctx: &mut PrinterContext, format: Format) -> Result<Vec<u8>, Error> {
    let bytes = exec(graph, ctx, vec![CommandArg::Format(format)]).map_err(Error::Io)?;
    if bytes.is_empty() {
        return Err(Error::Render("graphviz produced no output".to_string()));
    }
    Ok(bytes)
}

fn attr(key: &str, value: Id) -> Attribute {
    Attribute(plain(key), value)
}

fn plain(value: &str) -> Id {
    Id::Plain(value.to_string())
}

/// A double-quoted DOT string with `"` and `\` escaped.
fn quoted(value: &str) -> Id {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    Id::Escaped(format!("\"{escaped}\""))
}

fn node_id(id: &str) -> NodeId {
    NodeId(plain(id), None)
}
