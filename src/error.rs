//! Error types for template parsing and diagnostic rendering

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A grammar rejection of a lexed body
///
/// The lexer turns every input into tokens the grammar accepts, so these only
/// appear if the two fall out of step; [`Template::parse`] then treats the
/// body as literal text.
///
/// [`Template::parse`]: crate::template::Template::parse
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax { span: Span, message: String },
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        let message = match err.found() {
            Some(tok) => format!("Unexpected {}", describe_token(tok)),
            None => "Unexpected end of input".to_string(),
        };
        ParseError::Syntax {
            span: err.span().into_range(),
            message,
        }
    }
}

fn describe_token(tok: &Token) -> String {
    match tok {
        Token::Placeholder(name) => format!("placeholder '{}'", name),
        Token::Brace => "'{'".to_string(),
        Token::Text(s) => format!("text \"{}\"", s),
    }
}

/// Render a report with one label per span
///
/// Spans are byte offsets into `source`; ariadne counts characters, so they
/// are converted before rendering.
pub(crate) fn render_report(
    kind: ReportKind<'_>,
    source: &str,
    filename: &str,
    message: &str,
    labels: &[(Span, String)],
    color: bool,
) -> String {
    let offset = labels
        .first()
        .map(|(span, _)| char_offset(source, span.start))
        .unwrap_or(0);
    let label_color = match kind {
        ReportKind::Error => Color::Red,
        _ => Color::Yellow,
    };

    let mut builder = Report::build(kind, filename, offset)
        .with_config(Config::default().with_color(color))
        .with_message(message);
    for (span, text) in labels {
        let chars = char_offset(source, span.start)..char_offset(source, span.end);
        builder = builder.with_label(
            Label::new((filename, chars))
                .with_message(text)
                .with_color(label_color),
        );
    }

    let mut buf = Vec::new();
    if builder
        .finish()
        .write((filename, Source::from(source)), &mut buf)
        .is_err()
    {
        return format!("{}: {}", filename, message);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn char_offset(source: &str, byte: usize) -> usize {
    let byte = byte.min(source.len());
    source
        .char_indices()
        .take_while(|(i, _)| *i < byte)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_offset_counts_multibyte() {
        let source = "héllo {{x}}";
        assert_eq!(char_offset(source, 0), 0);
        assert_eq!(char_offset(source, 3), 2);
        assert_eq!(char_offset(source, source.len()), source.chars().count());
    }
}
