//! Diagnostics for schema parsing.
//!
//! Every phase (lexing, parsing, resolution) reports problems as
//! [`Diagnostic`]s. A diagnostic carries an optional
//! [`ErrorCode`], a message, labeled source spans and optional help text.
//! The phases that can keep going after an error accumulate diagnostics in a
//! [`DiagnosticCollector`]; the public API returns them wrapped in a
//! [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use schemaviz_parser::error::{Diagnostic, ErrorCode};
//! # use schemaviz_parser::Span;
//!
//! let diag = Diagnostic::error("type `person` declares two supertypes")
//!     .with_code(ErrorCode::E201)
//!     .with_label(Span::new(40..52), "second declaration")
//!     .with_secondary_label(Span::new(0..17), "first declared here")
//!     .with_help("a type has exactly one direct supertype");
//!
//! assert_eq!(diag.to_string(), "error[E201]: type `person` declares two supertypes");
//! ```

mod diagnostic;
mod error_code;

use std::fmt;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::ErrorCode;

/// Error type for the parsing lifecycle.
///
/// Wraps one or more diagnostics, in the order they were reported.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{first}")?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}

/// Accumulates diagnostics so a phase can report every problem in one pass.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Returns `Err` with every collected diagnostic, if there are any.
    pub(crate) fn finish(self) -> Result<(), ParseError> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ParseError::new(self.diagnostics))
        }
    }
}
