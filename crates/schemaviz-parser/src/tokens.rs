//! Tokens of the TypeQL `define` subset.

use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// Token types for TypeQL schema definitions
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Define,
    Sub,
    Owns,
    Plays,
    Relates,
    As,
    Value,
    Abstract,
    Regex,

    // Literals
    StringLiteral(String),
    Identifier(&'src str),
    Annotation(&'src str), // @key, @unique

    // Punctuation
    Colon,     // :
    Comma,     // ,
    Semicolon, // ;

    // Comments
    LineComment(&'src str), // # comment

    // Whitespace
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Returns `true` for tokens the parser never looks at.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_)
        )
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Define => write!(f, "define"),
            Token::Sub => write!(f, "sub"),
            Token::Owns => write!(f, "owns"),
            Token::Plays => write!(f, "plays"),
            Token::Relates => write!(f, "relates"),
            Token::As => write!(f, "as"),
            Token::Value => write!(f, "value"),
            Token::Abstract => write!(f, "abstract"),
            Token::Regex => write!(f, "regex"),

            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Annotation(name) => write!(f, "@{name}"),

            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),

            Token::LineComment(comment) => write!(f, "#{comment}"),

            Token::Whitespace => write!(f, " "),
            Token::Newline => writeln!(f),
        }
    }
}
