//! Error types for schemaviz operations.
//!
//! This module provides the main error type [`SchemaVizError`] which wraps
//! every failure that can abort a build or a render.

use std::io;

use thiserror::Error;

use schemaviz_core::{graph::GraphError, source::SourceError};
use schemaviz_parser::error::ParseError;

/// The main error type for schemaviz operations.
///
/// No variant is recoverable locally; any of them aborts the run before a
/// diagram is produced.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the schema source next to the parser
/// diagnostics so callers can render labeled source snippets.
#[derive(Debug, Error)]
pub enum SchemaVizError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("type source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("malformed type: {0} has no usable label")]
    MalformedType(String),

    #[error("ambiguous type: {0} was reached more than once")]
    AmbiguousType(String),

    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("export error: {0}")]
    Export(#[from] crate::export::Error),
}

impl SchemaVizError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
