//! Syntax tree produced by the [`parser`](super::parser).
//!
//! Statements are kept exactly as written; merging statements that extend
//! the same type happens during resolution.

use crate::span::{Span, Spanned};

/// One `label clause, clause, ...;` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<'src> {
    pub label: Spanned<&'src str>,
    pub clauses: Vec<Spanned<Clause<'src>>>,
    /// From the label through the terminating `;`.
    pub span: Span,
}

/// A single clause of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause<'src> {
    /// `sub parent`
    Sub(Spanned<&'src str>),
    /// `owns attribute [as overridden] @annotation*`
    Owns {
        attribute: Spanned<&'src str>,
        overridden: Option<Spanned<&'src str>>,
        annotations: Vec<Spanned<&'src str>>,
    },
    /// `plays relation:role [as overridden]`
    Plays {
        relation: Spanned<&'src str>,
        role: Spanned<&'src str>,
        overridden: Option<Spanned<&'src str>>,
    },
    /// `relates role [as overridden]`
    Relates {
        role: Spanned<&'src str>,
        overridden: Option<Spanned<&'src str>>,
    },
    /// `value string`
    Value(Spanned<&'src str>),
    Abstract,
    /// `regex "pattern"`
    Regex(Spanned<String>),
}
