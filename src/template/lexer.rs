//! Lexer for snippet bodies using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// `{{name}}` with an identifier-shaped name, braces stripped
    #[regex(r"\{\{[a-zA-Z_][a-zA-Z0-9_]*\}\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 2].to_string()
    })]
    Placeholder(String),

    /// A brace that does not open a valid placeholder
    #[token("{")]
    Brace,

    #[regex(r"[^{]+", |lex| lex.slice().to_string())]
    Text(String),
}

impl Token {
    /// Source text this token was lexed from
    pub fn source_text(&self) -> String {
        match self {
            Token::Placeholder(name) => format!("{{{{{}}}}}", name),
            Token::Brace => "{".to_string(),
            Token::Text(s) => s.clone(),
        }
    }
}

/// Lex a snippet body into tokens with spans
///
/// Every byte of the input ends up in exactly one token. Anything logos
/// rejects is kept as literal text so no part of the body is lost.
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input).spanned().map(move |(tok, span)| match tok {
        Ok(t) => (t, span),
        Err(()) => (Token::Text(input[span.clone()].to_string()), span),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).map(|(t, _)| t).collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            tokens("Hello world"),
            vec![Token::Text("Hello world".to_string())]
        );
    }

    #[test]
    fn test_placeholder_between_text() {
        assert_eq!(
            tokens("Hi {{name}}!"),
            vec![
                Token::Text("Hi ".to_string()),
                Token::Placeholder("name".to_string()),
                Token::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_inside_braces_is_not_a_placeholder() {
        let toks = tokens("{{ name }}");
        assert!(!toks.iter().any(|t| matches!(t, Token::Placeholder(_))));
    }

    #[test]
    fn test_digit_leading_name_is_not_a_placeholder() {
        let toks = tokens("{{123invalid}}");
        assert!(!toks.iter().any(|t| matches!(t, Token::Placeholder(_))));
    }

    #[test]
    fn test_extra_leading_brace() {
        assert_eq!(
            tokens("{{{a}}}"),
            vec![
                Token::Brace,
                Token::Placeholder("a".to_string()),
                Token::Text("}".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_cover_input() {
        let input = "a {b} {{c}} {{ d }} é";
        let rebuilt: String = lex(input).map(|(t, _)| t.source_text()).collect();
        assert_eq!(rebuilt, input);

        let mut end = 0;
        for (_, span) in lex(input) {
            assert_eq!(span.start, end);
            end = span.end;
        }
        assert_eq!(end, input.len());
    }
}
