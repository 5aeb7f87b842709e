//! schemaviz - type-hierarchy diagrams for TypeQL schemas.
//!
//! A schema is read from a [`TypeSource`](schemaviz_core::source::TypeSource),
//! usually a [`SchemaSnapshot`] parsed from an exported `define` file. The
//! [`GraphBuilder`] turns it into a [`SchemaGraph`] of entity, attribute and
//! relation types with subtype, ownership and role edges, and an
//! [`export::DiagramSink`] renders the graph.

pub mod config;
pub mod export;

mod builder;
mod error;

pub use schemaviz_core::{category, color, graph, identifier, snapshot, source};

pub use builder::GraphBuilder;
pub use error::SchemaVizError;

use log::{debug, info, trace};

use schemaviz_core::{graph::SchemaGraph, snapshot::SchemaSnapshot, source::TypeSource};

use config::AppConfig;
use export::{Diagram, DiagramSink, DiagramStyle, OutputFormat, graphviz::GraphvizSink};

/// Facade over parsing, graph building and rendering.
///
/// # Examples
///
/// ```rust
/// use schemaviz::{Visualizer, config::AppConfig, export::OutputFormat};
///
/// let source = r#"
///     define
///     person sub entity, owns name;
///     name sub attribute, value string;
/// "#;
///
/// let visualizer = Visualizer::new(AppConfig::default());
/// let schema = visualizer.parse(source).expect("Failed to parse");
/// let graph = visualizer.build_graph(&schema).expect("Failed to build");
/// let dot = visualizer
///     .render(&graph, "test", OutputFormat::Dot)
///     .expect("Failed to render");
///
/// assert!(!dot.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Visualizer {
    config: AppConfig,
}

impl Visualizer {
    /// Create a new visualizer with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse TypeQL `define` source into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::Parse`] carrying every diagnostic and the
    /// source text.
    pub fn parse(&self, source: &str) -> Result<SchemaSnapshot, SchemaVizError> {
        info!("Parsing schema");

        let schema = schemaviz_parser::parse(source)
            .map_err(|err| SchemaVizError::new_parse_error(err, source))?;

        debug!(types = schema.type_count(); "Schema parsed successfully");
        trace!(schema:?; "Parsed schema");
        Ok(schema)
    }

    /// Build the schema graph of `source` using the configured build options.
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::build`].
    pub fn build_graph<S: TypeSource>(&self, source: S) -> Result<SchemaGraph, SchemaVizError> {
        GraphBuilder::new(source, *self.config.build()).build()
    }

    /// Validate the configured style.
    ///
    /// Callers that want option errors reported before any schema is read
    /// call this first and pass the result to [`Visualizer::render_styled`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::UnsupportedOption`] if a configured color is invalid.
    pub fn style(&self) -> Result<DiagramStyle, SchemaVizError> {
        DiagramStyle::try_from(self.config.style())
    }

    /// Map `graph` to a diagram named `name` using the configured style.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::UnsupportedOption`] if a configured color is invalid.
    pub fn diagram(&self, graph: &SchemaGraph, name: &str) -> Result<Diagram, SchemaVizError> {
        Ok(Diagram::from_graph(name, graph, &self.style()?))
    }

    /// Render `graph` to `format` with Graphviz.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::UnsupportedOption`] for invalid style settings
    /// and [`SchemaVizError::Export`] if rendering fails.
    pub fn render(
        &self,
        graph: &SchemaGraph,
        name: &str,
        format: OutputFormat,
    ) -> Result<Vec<u8>, SchemaVizError> {
        self.render_with(graph, name, &GraphvizSink::new(format))
    }

    /// Render `graph` with a caller-supplied sink.
    ///
    /// # Errors
    ///
    /// Same as [`Visualizer::render`].
    pub fn render_with(
        &self,
        graph: &SchemaGraph,
        name: &str,
        sink: &impl DiagramSink,
    ) -> Result<Vec<u8>, SchemaVizError> {
        self.render_styled(graph, name, &self.style()?, sink)
    }

    /// Render `graph` with an already validated style.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::Export`] if the sink fails.
    pub fn render_styled(
        &self,
        graph: &SchemaGraph,
        name: &str,
        style: &DiagramStyle,
        sink: &impl DiagramSink,
    ) -> Result<Vec<u8>, SchemaVizError> {
        let diagram = Diagram::from_graph(name, graph, style);
        let bytes = sink.render(&diagram)?;
        info!(bytes = bytes.len(); "Diagram rendered successfully");
        Ok(bytes)
    }
}
