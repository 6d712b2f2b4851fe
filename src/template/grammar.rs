//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::template::ast::{Segment, Spanned, Template};
use crate::template::lexer::Token;

/// Parse a snippet body into a [`Template`]
pub fn parse(input: &str) -> Result<Template, Vec<ParseError>> {
    let len = input.len();

    let token_iter = crate::template::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Template, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let placeholder = select! {
        Token::Placeholder(name) => Segment::Placeholder(name),
    }
    .map_with(|seg, e| Spanned::new(seg, span_range(&e.span())));

    // Adjacent text and stray braces collapse into one literal segment
    let text = select! {
        Token::Text(s) => s,
        Token::Brace => "{".to_string(),
    }
    .repeated()
    .at_least(1)
    .collect::<Vec<String>>()
    .map_with(|pieces, e| Spanned::new(Segment::Text(pieces.concat()), span_range(&e.span())));

    choice((placeholder, text))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|segments| Template { segments })
}
