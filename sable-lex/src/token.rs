#![forbid(unsafe_code)]

use sable_ast::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwNew,
    KwIf,
    KwElse,
    KwAssert,
    KwAssume,

    // Operators / punctuation
    EqEq,
    Eq,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    Amp,
    Pipe,
    Bang,
    Tilde,
    Dot,
    Comma,
    Colon,
    Semi,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,

    // Literals / identifiers
    Ident(String),
    Int(i64),
    /// Raw text between `{{{` and the matching `}}}`.
    Verbatim(String),
}

impl TokenKind {
    /// Source spelling, for error messages.
    pub fn describe(&self) -> String {
        let s = match self {
            TokenKind::KwNew => "new",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwAssert => "assert",
            TokenKind::KwAssume => "assume",
            TokenKind::EqEq => "==",
            TokenKind::Eq => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semi => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Eof => return "end of input".to_string(),
            TokenKind::Ident(name) => return format!("identifier `{name}`"),
            TokenKind::Int(n) => return format!("integer `{n}`"),
            TokenKind::Verbatim(_) => return "verbatim block".to_string(),
        };
        format!("`{s}`")
    }
}
