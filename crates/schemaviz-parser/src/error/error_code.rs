//! Error codes, grouped by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Resolution errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unterminated string literal.
    E001,

    /// Unexpected character.
    E002,

    /// Unexpected token.
    E100,

    /// The input ended before the statement was complete.
    E101,

    /// A referenced type is never defined.
    E200,

    /// A type declares more than one supertype.
    E201,

    /// A supertype chain loops back on itself.
    E202,

    /// A type is used in a position that requires another category, e.g.
    /// owning an entity or declaring a role on an attribute.
    E203,

    /// A `plays` clause names a role the relation does not declare.
    E204,

    /// A statement defines one of the built-in root types, or a clause uses
    /// one where a concrete type is required.
    E205,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete statement",
            ErrorCode::E200 => "undefined type",
            ErrorCode::E201 => "duplicate supertype declaration",
            ErrorCode::E202 => "cyclic type hierarchy",
            ErrorCode::E203 => "category mismatch",
            ErrorCode::E204 => "undefined role",
            ErrorCode::E205 => "built-in type misuse",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
