//! Parser for TypeQL schema tokens.
//!
//! This module turns the significant tokens from the [`lexer`](super::lexer)
//! into [`Statement`](types::Statement)s. Parsing is statement-oriented: a
//! statement that fails to parse is reported and skipped up to the next `;`,
//! so a single run reports every syntax error in the file.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, fail, opt, preceded, repeat, separated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected at the failure point
    Expected(&'static str),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Match one token equal to `expected`, returning its span.
fn token<'src>(
    expected: Token<'static>,
    what: &'static str,
) -> impl FnMut(&mut Input<'src>) -> IResult<Span> {
    move |input: &mut Input<'src>| {
        any.verify_map(|token: &PositionedToken<'_>| (token.token == expected).then_some(token.span))
            .context(Context::Expected(what))
            .parse_next(input)
    }
}

/// Parse a type or role label
fn label<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(*name, token.span)),
        _ => None,
    })
    .context(Context::Expected("a label"))
    .parse_next(input)
}

fn annotation<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::Annotation(name) => Some(Spanned::new(*name, token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(value) => Some(Spanned::new(value.clone(), token.span)),
        _ => None,
    })
    .context(Context::Expected("a string literal"))
    .parse_next(input)
}

/// Parse an optional `as label` override
fn overridden<'src>(input: &mut Input<'src>) -> IResult<Option<Spanned<&'src str>>> {
    opt(preceded(token(Token::As, "`as`"), cut_err(label))).parse_next(input)
}

fn sub_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    (token(Token::Sub, "`sub`"), cut_err(label))
        .map(|(keyword, parent)| {
            let span = keyword.union(parent.span());
            Spanned::new(types::Clause::Sub(parent), span)
        })
        .parse_next(input)
}

fn owns_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    (
        token(Token::Owns, "`owns`"),
        cut_err((label, overridden, repeat(0.., annotation))),
    )
        .map(|(keyword, (attribute, overridden, annotations))| {
            let annotations: Vec<Spanned<&str>> = annotations;
            let end = annotations
                .last()
                .or(overridden.as_ref())
                .unwrap_or(&attribute)
                .span();
            let clause = types::Clause::Owns {
                attribute,
                overridden,
                annotations,
            };
            Spanned::new(clause, keyword.union(end))
        })
        .parse_next(input)
}

fn plays_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    (
        token(Token::Plays, "`plays`"),
        cut_err((label, token(Token::Colon, "`:`"), label, overridden)),
    )
        .map(|(keyword, (relation, _, role, overridden))| {
            let end = overridden.as_ref().unwrap_or(&role).span();
            let clause = types::Clause::Plays {
                relation,
                role,
                overridden,
            };
            Spanned::new(clause, keyword.union(end))
        })
        .parse_next(input)
}

fn relates_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    (
        token(Token::Relates, "`relates`"),
        cut_err((label, overridden)),
    )
        .map(|(keyword, (role, overridden))| {
            let end = overridden.as_ref().unwrap_or(&role).span();
            Spanned::new(
                types::Clause::Relates { role, overridden },
                keyword.union(end),
            )
        })
        .parse_next(input)
}

fn value_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    (token(Token::Value, "`value`"), cut_err(label))
        .map(|(keyword, value_type)| {
            let span = keyword.union(value_type.span());
            Spanned::new(types::Clause::Value(value_type), span)
        })
        .parse_next(input)
}

fn regex_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    (token(Token::Regex, "`regex`"), cut_err(string_literal))
        .map(|(keyword, pattern)| {
            let span = keyword.union(pattern.span());
            Spanned::new(types::Clause::Regex(pattern), span)
        })
        .parse_next(input)
}

fn abstract_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    token(Token::Abstract, "`abstract`")
        .map(|keyword| Spanned::new(types::Clause::Abstract, keyword))
        .parse_next(input)
}

/// Parse any clause.
///
/// Once a clause keyword has matched, its own cut error is kept; the generic
/// "a clause" expectation is only reported when no keyword matched.
fn clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Clause<'src>>> {
    let start = input.checkpoint();
    match alt((
        sub_clause,
        owns_clause,
        plays_clause,
        relates_clause,
        value_clause,
        abstract_clause,
        regex_clause,
    ))
    .parse_next(input)
    {
        Err(ErrMode::Backtrack(_)) => {
            input.reset(&start);
            fail.context(Context::Expected(
                "a clause (`sub`, `owns`, `plays`, `relates`, `value`, `abstract` or `regex`)",
            ))
            .parse_next(input)
        }
        result => result,
    }
}

/// Parse `label clause (, clause)* ;`
fn statement<'src>(input: &mut Input<'src>) -> IResult<types::Statement<'src>> {
    let label = label.parse_next(input)?;
    let clauses: Vec<_> =
        cut_err(separated(1.., clause, token(Token::Comma, "`,`"))).parse_next(input)?;
    let end = cut_err(token(Token::Semicolon, "`,` or `;`")).parse_next(input)?;

    let span = label.span().union(end);
    Ok(types::Statement {
        label,
        clauses,
        span,
    })
}

/// Skip past the next `;`, or to the end of input.
fn recover(input: &mut Input<'_>) {
    while let Some(token) = input.next_token() {
        if token.token == Token::Semicolon {
            break;
        }
    }
}

/// Convert a statement failure into a diagnostic at the offending token.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let expected = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().next().map(|ctx| match ctx {
            Context::Expected(what) => *what,
        }),
        ErrMode::Incomplete(_) => None,
    };

    let position = tokens.len() - current_remaining;
    match tokens.get(position) {
        Some(found) => {
            let message = match expected {
                Some(what) => format!("unexpected `{}`, expected {what}", found.token),
                None => format!("unexpected `{}`", found.token),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E100)
                .with_label(found.span, "unexpected token")
        }
        None => {
            let span = tokens.last().map(|token| token.span).unwrap_or_default();
            let mut diag = Diagnostic::error("incomplete statement at end of input")
                .with_code(ErrorCode::E101)
                .with_label(span, "statement starts or continues here");
            if let Some(what) = expected {
                diag = diag.with_help(format!("expected {what}"));
            }
            diag
        }
    }
}

/// Parse significant tokens into statements.
///
/// `define` headers may appear before any statement and are skipped.
/// Whitespace and comment tokens must already be filtered out.
///
/// # Errors
///
/// Returns every syntax diagnostic found; each failing statement is
/// reported once.
pub fn build_statements<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<Vec<types::Statement<'src>>, ParseError> {
    let mut input = TokenSlice::new(tokens);
    let mut statements = Vec::new();
    let mut diagnostics = DiagnosticCollector::new();

    while input.eof_offset() > 0 {
        if token(Token::Define, "`define`").parse_next(&mut input).is_ok() {
            continue;
        }

        match statement.parse_next(&mut input) {
            Ok(statement) => statements.push(statement),
            Err(e) => {
                diagnostics.emit(convert_error(e, tokens, input.eof_offset()));
                recover(&mut input);
            }
        }
    }

    diagnostics.finish().map(|()| statements)
}
