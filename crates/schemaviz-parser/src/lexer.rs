//! Lexical analyzer for TypeQL schema text.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, not, peek, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic details attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_label_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse one character of string content, resolving `\"` and `\\`.
///
/// Other escapes are kept verbatim; regex patterns are passed through
/// untouched.
fn string_char(input: &mut Input<'_>) -> IResult<char> {
    alt((
        preceded('\\', one_of(['"', '\\'])),
        none_of(['"', '\n', '\r']),
    ))
    .parse_next(input)
}

/// Parse a double-quoted string literal.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    '"'.parse_next(input)?;

    cut_err(terminated(
        repeat(0.., string_char).fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        }),
        '"',
    ))
    .context(LexerDiagnostic {
        code: ErrorCode::E001,
        message: "unterminated string literal",
        help: Some("add closing `\"`"),
        start: start_pos,
    })
    .parse_next(input)
    .map(Token::StringLiteral)
}

/// Parse a comment running from `#` to the end of the line
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded('#', take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse keywords with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(
        alt((
            literal("define"),
            literal("sub"),
            literal("owns"),
            literal("plays"),
            literal("relates"),
            literal("as"),
            literal("value"),
            literal("abstract"),
            literal("regex"),
        )),
        // A keyword followed by a label character is a label (`subject`, `owns-car`)
        peek(not(one_of(is_label_char))),
    )
    .map(|keyword: &str| match keyword {
        "define" => Token::Define,
        "sub" => Token::Sub,
        "owns" => Token::Owns,
        "plays" => Token::Plays,
        "relates" => Token::Relates,
        "as" => Token::As,
        "value" => Token::Value,
        "abstract" => Token::Abstract,
        "regex" => Token::Regex,
        _ => unreachable!(),
    })
    .parse_next(input)
}

/// Parse a type or role label: `[A-Za-z_][A-Za-z0-9_-]*`
fn label<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    (one_of(is_label_start), take_while(0.., is_label_char))
        .take()
        .parse_next(input)
}

fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    label.map(Token::Identifier).parse_next(input)
}

fn annotation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded('@', label).map(Token::Annotation).parse_next(input)
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        ':'.value(Token::Colon),
        ','.value(Token::Comma),
        ';'.value(Token::Semicolon),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        string_literal,
        keyword, // Must come before identifier
        identifier,
        annotation,
        punctuation,
        newline, // Must come before whitespace
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(e, error_pos));

                    // An unterminated string consumes the rest of its line;
                    // anything else skips a single character.
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Falls back to E002 (unexpected character) if no context is attached.
    fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..error_pos), code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenize schema text, collecting every lexical error.
///
/// # Errors
///
/// Returns a [`ParseError`] holding one diagnostic per unlexable position.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn significant(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .expect("input should lex")
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    fn error_codes(input: &str) -> Vec<ErrorCode> {
        tokenize(input)
            .expect_err("input should fail to lex")
            .diagnostics()
            .iter()
            .filter_map(|d| d.code())
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            significant("define sub owns plays relates as value abstract regex"),
            vec![
                Token::Define,
                Token::Sub,
                Token::Owns,
                Token::Plays,
                Token::Relates,
                Token::As,
                Token::Value,
                Token::Abstract,
                Token::Regex,
            ]
        );
    }

    #[test]
    fn test_keyword_word_boundaries() {
        assert_eq!(
            significant("subject owner plays-role asset"),
            vec![
                Token::Identifier("subject"),
                Token::Identifier("owner"),
                Token::Identifier("plays-role"),
                Token::Identifier("asset"),
            ]
        );
    }

    #[test]
    fn test_statement() {
        assert_eq!(
            significant("person sub entity, owns name @key, plays employment:employee;"),
            vec![
                Token::Identifier("person"),
                Token::Sub,
                Token::Identifier("entity"),
                Token::Comma,
                Token::Owns,
                Token::Identifier("name"),
                Token::Annotation("key"),
                Token::Comma,
                Token::Plays,
                Token::Identifier("employment"),
                Token::Colon,
                Token::Identifier("employee"),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(
            significant(r#"regex "^\"[a-z]+\\d$""#),
            vec![Token::Regex, Token::StringLiteral(r#"^"[a-z]+\d$"#.to_string())]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("# heading\nperson sub entity; # trailing").unwrap();

        assert_eq!(tokens[0].token, Token::LineComment(" heading"));
        assert_eq!(tokens.last().unwrap().token, Token::LineComment(" trailing"));
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("define\n  person").unwrap();
        let person = tokens
            .iter()
            .find(|t| t.token == Token::Identifier("person"))
            .unwrap();

        assert_eq!(person.span, Span::new(9..15));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("name sub attribute, regex \"abc").unwrap_err();
        let diag = &err.diagnostics()[0];

        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.labels()[0].span().start(), 26);
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(error_codes("person sub entity $"), vec![ErrorCode::E002]);
    }

    #[test]
    fn test_reports_every_error() {
        assert_eq!(
            error_codes("person ! sub ? entity;"),
            vec![ErrorCode::E002, ErrorCode::E002]
        );
    }

    proptest! {
        #[test]
        fn prop_labels_lex_as_single_token(label in "[A-Za-z_][A-Za-z0-9_-]{0,20}") {
            let tokens = tokenize(&label).unwrap();
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(tokens[0].span, Span::new(0..label.len()));
        }
    }
}
