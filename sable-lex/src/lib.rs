#![forbid(unsafe_code)]

mod lexer;
mod token;

pub use lexer::{LexError, Lexer};
pub use token::{Token, TokenKind};

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_keywords_operators_and_eof() {
        assert_eq!(
            kinds("new if x == 6 & !y"),
            vec![
                TokenKind::KwNew,
                TokenKind::KwIf,
                TokenKind::Ident("x".to_string()),
                TokenKind::EqEq,
                TokenKind::Int(6),
                TokenKind::Amp,
                TokenKind::Bang,
                TokenKind::Ident("y".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_skips_line_comments() {
        let toks = kinds("// outer\nnew() {\n  // inner\n  x / 2\n}");
        assert!(toks.contains(&TokenKind::Slash));
        assert!(!toks
            .iter()
            .any(|t| matches!(t, TokenKind::Ident(n) if n == "outer" || n == "inner")));
    }

    #[test]
    fn lex_keyword_prefix_is_identifier() {
        assert_eq!(
            kinds("newer _lhs"),
            vec![
                TokenKind::Ident("newer".to_string()),
                TokenKind::Ident("_lhs".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_verbatim_keeps_nested_braces_byte_for_byte() {
        let toks = kinds("a ~ [Default()] {{{ assert f(x) { y }; }}} b");
        let text = toks
            .iter()
            .find_map(|t| match t {
                TokenKind::Verbatim(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(text, " assert f(x) { y }; ");
        assert_eq!(toks.last(), Some(&TokenKind::Eof));
        assert!(toks.contains(&TokenKind::Ident("b".to_string())));
    }

    #[test]
    fn lex_rejects_unterminated_verbatim() {
        let err = Lexer::new("{{{ never closed }").lex().unwrap_err();
        assert!(err.message.contains("unterminated verbatim"));
    }

    #[test]
    fn lex_rejects_illegal_character() {
        let err = Lexer::new("x = 1 @ 2").lex().unwrap_err();
        assert!(err.message.contains("illegal character `@`"));
    }

    #[test]
    fn lex_spans_are_byte_offsets() {
        let toks = Lexer::new("  foo").lex().unwrap();
        assert_eq!(toks[0].span.offset(), 2);
        assert_eq!(toks[0].span.len(), 3);
    }
}
