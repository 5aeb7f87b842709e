//! # schemaviz parser
//!
//! Parser for TypeQL `define` schemas. The result is a
//! [`SchemaSnapshot`], an in-memory type source the graph builder can walk
//! without a database connection.
//!
//! ## Usage
//!
//! ```
//! # use schemaviz_parser::{parse, ParseError};
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         define
//!         person sub entity, owns name, plays employment:employee;
//!         name sub attribute, value string;
//!         employment sub relation, relates employee;
//!     "#;
//!
//!     let schema = parse(source)?;
//!     assert!(schema.find_type("employment").is_some());
//!     Ok(())
//! }
//! ```

pub mod error;
mod lexer;
mod parser;
mod parser_types;
mod resolve;
mod span;
mod tokens;

pub use error::ParseError;
pub use span::Span;

use log::{debug, info};

use schemaviz_core::snapshot::SchemaSnapshot;

use resolve::Resolver;

/// Parse schema source text into a [`SchemaSnapshot`].
///
/// The pipeline runs in three phases:
///
/// 1. **Tokenize** - convert source text to tokens
/// 2. **Parse** - build statements from the significant tokens
/// 3. **Resolve** - merge statements, check references, load the snapshot
///
/// Each phase reports every problem it finds before the pipeline stops.
///
/// # Errors
///
/// Returns a [`ParseError`] with one or more diagnostics if any phase fails.
pub fn parse(source: &str) -> Result<SchemaSnapshot, ParseError> {
    let tokens: Vec<_> = lexer::tokenize(source)?
        .into_iter()
        .filter(|token| !token.token.is_trivia())
        .collect();
    debug!(tokens = tokens.len(); "Tokenized schema");

    let statements = parser::build_statements(&tokens)?;
    debug!(statements = statements.len(); "Parsed schema statements");

    let snapshot = Resolver::new().resolve(&statements)?;
    info!(types = snapshot.type_count(); "Schema parsed");
    Ok(snapshot)
}
