#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use logos::Logos;
use miette::Diagnostic;
use sable_ast::{span_between, Span};
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Diagnostic)]
#[error("lex error: {message}")]
#[diagnostic(code(sable::lex))]
#[allow(unused_assignments)]
pub struct LexError {
    pub message: String,
    #[label]
    pub span: Span,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"([ \t\r\n\f]+|//[^\n]*)")]
enum RawToken {
    #[token("new")]
    KwNew,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("assert")]
    KwAssert,
    #[token("assume")]
    KwAssume,

    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token("{{{", lex_verbatim)]
    Verbatim(Option<String>),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(Option<i64>),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Consume a verbatim block after its opening `{{{`.
///
/// Inner braces nest; the block closes when the brace depth returns to zero on
/// a `}}}`. Returns `None` for an unterminated or unbalanced block.
fn lex_verbatim(lex: &mut logos::Lexer<RawToken>) -> Option<String> {
    let rest = lex.remainder();
    let mut depth = 3usize;
    for (i, b) in rest.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let body_end = i.checked_sub(2)?;
                    if rest.get(body_end..=i) != Some("}}}") {
                        return None;
                    }
                    let body = rest[..body_end].to_string();
                    lex.bump(i + 1);
                    return Some(body);
                }
            }
            _ => {}
        }
    }
    None
}

pub struct Lexer<'a> {
    src: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src }
    }

    /// Tokenize the whole source. The result always ends with an `Eof` token.
    pub fn lex(&self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut lex = RawToken::lexer(self.src);

        while let Some(raw) = lex.next() {
            let range = lex.span();
            let span = span_between(range.start, range.end);

            let kind = match raw {
                Ok(RawToken::KwNew) => TokenKind::KwNew,
                Ok(RawToken::KwIf) => TokenKind::KwIf,
                Ok(RawToken::KwElse) => TokenKind::KwElse,
                Ok(RawToken::KwAssert) => TokenKind::KwAssert,
                Ok(RawToken::KwAssume) => TokenKind::KwAssume,

                Ok(RawToken::EqEq) => TokenKind::EqEq,
                Ok(RawToken::Eq) => TokenKind::Eq,
                Ok(RawToken::Plus) => TokenKind::Plus,
                Ok(RawToken::Minus) => TokenKind::Minus,
                Ok(RawToken::Star) => TokenKind::Star,
                Ok(RawToken::Slash) => TokenKind::Slash,
                Ok(RawToken::Lt) => TokenKind::Lt,
                Ok(RawToken::Gt) => TokenKind::Gt,
                Ok(RawToken::Amp) => TokenKind::Amp,
                Ok(RawToken::Pipe) => TokenKind::Pipe,
                Ok(RawToken::Bang) => TokenKind::Bang,
                Ok(RawToken::Tilde) => TokenKind::Tilde,
                Ok(RawToken::Dot) => TokenKind::Dot,
                Ok(RawToken::Comma) => TokenKind::Comma,
                Ok(RawToken::Colon) => TokenKind::Colon,
                Ok(RawToken::Semi) => TokenKind::Semi,

                Ok(RawToken::LParen) => TokenKind::LParen,
                Ok(RawToken::RParen) => TokenKind::RParen,
                Ok(RawToken::LBrace) => TokenKind::LBrace,
                Ok(RawToken::RBrace) => TokenKind::RBrace,
                Ok(RawToken::LBracket) => TokenKind::LBracket,
                Ok(RawToken::RBracket) => TokenKind::RBracket,

                Ok(RawToken::Ident(s)) => TokenKind::Ident(s),
                Ok(RawToken::Int(Some(n))) => TokenKind::Int(n),
                Ok(RawToken::Int(None)) => {
                    return Err(LexError {
                        message: "integer literal out of range".to_string(),
                        span,
                    });
                }
                Ok(RawToken::Verbatim(Some(text))) => TokenKind::Verbatim(text),
                Ok(RawToken::Verbatim(None)) => {
                    return Err(LexError {
                        message: "unterminated verbatim block; expected `}}}`".to_string(),
                        span: span_between(range.start, self.src.len()),
                    });
                }

                Err(_) => {
                    return Err(LexError {
                        message: format!("illegal character `{}`", lex.slice()),
                        span,
                    });
                }
            };
            tokens.push(Token { kind, span });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: span_between(self.src.len(), self.src.len()),
        });
        Ok(tokens)
    }
}
