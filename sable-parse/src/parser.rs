#![forbid(unsafe_code)]

use std::mem;

use sable_ast::{Node, NodeKind, Span, VarType};
use sable_lex::{Token, TokenKind};

use crate::error::ParseError;
use crate::lower::{join, Lower};

pub struct Parser<'a> {
    tokens: &'a [Token],
    idx: usize,
    lower: Lower,
    /// Cleared while parsing an `if` condition, where `name(args) {` opens the
    /// branch rather than declaring a method.
    allow_decl: bool,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            idx: 0,
            lower: Lower::new(),
            allow_decl: true,
        }
    }

    /// `program := item*` where items are separated by optional `;`.
    pub fn parse_program(&mut self) -> Result<Node, ParseError> {
        let start = self.peek_span().unwrap_or_else(|| sable_ast::span(0, 0));
        let mut items = Vec::new();
        loop {
            self.skip_semis();
            if self.at(TokenKind::Eof) || self.idx >= self.tokens.len() {
                break;
            }
            items.push(self.parse_item()?);
        }
        let span = items
            .iter()
            .fold(start, |acc, item| join(acc, item.span));
        Ok(self.lower.node(span, NodeKind::TopLevel(items)))
    }

    /// A single expression followed by end of input.
    pub fn parse_expr_eof(&mut self) -> Result<Node, ParseError> {
        let expr = self.parse_expr()?;
        if !self.at(TokenKind::Eof) {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    fn parse_item(&mut self) -> Result<Node, ParseError> {
        if self.at(TokenKind::KwAssert) {
            let kw = self.expect_any()?;
            let cond = self.parse_expr()?;
            let span = join(kw.span, cond.span);
            return Ok(self.lower.node(span, NodeKind::Assert(Box::new(cond))));
        }

        if self.at(TokenKind::KwAssume) {
            let kw = self.expect_any()?;
            let first = self.parse_expr()?;
            if !self.at(TokenKind::Tilde) {
                return Err(self.unexpected("`~` in an assumption"));
            }
            let proof = self.parse_proof(first)?;
            if let NodeKind::Proof { terms, .. } = &proof.kind {
                if terms.len() != 2 {
                    return Err(ParseError {
                        message: format!(
                            "an assumption relates exactly two terms, found {}",
                            terms.len()
                        ),
                        span: proof.span,
                    });
                }
            }
            let span = join(kw.span, proof.span);
            return Ok(self.lower.node(span, NodeKind::Assume(Box::new(proof))));
        }

        let expr = self.parse_expr()?;
        if self.at(TokenKind::Tilde) {
            return self.parse_proof(expr);
        }
        Ok(expr)
    }

    /// `t0 ~ [annot] {{{verbatim}}} t1 ~ ... tn`, with `t0` already parsed.
    fn parse_proof(&mut self, first: Node) -> Result<Node, ParseError> {
        let mut span = first.span;
        let mut terms = vec![first];
        let mut hints = Vec::new();
        let mut verbatims = Vec::new();

        while self.at(TokenKind::Tilde) {
            self.next();
            let mut hint = None;
            let mut verbatim = String::new();
            if self.at(TokenKind::LBracket) {
                self.next();
                hint = Some(self.with_decls(true, |p| p.parse_expr())?);
                self.expect(TokenKind::RBracket)?;
                if let Some(TokenKind::Verbatim(text)) = self.peek_kind() {
                    verbatim = text.clone();
                    self.next();
                }
            }
            hints.push(hint);
            verbatims.push(verbatim);

            let term = self.parse_expr()?;
            span = join(span, term.span);
            terms.push(term);
        }
        hints.push(None);
        verbatims.push(String::new());

        Ok(self.lower.node(
            span,
            NodeKind::Proof {
                terms,
                hints,
                verbatims,
            },
        ))
    }

    pub fn parse_expr(&mut self) -> Result<Node, ParseError> {
        self.parse_logic_expr()
    }

    /// `&` and `|`, left associative, loosest binding.
    fn parse_logic_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_assign_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Amp) => "&",
                Some(TokenKind::Pipe) => "|",
                _ => break,
            };
            self.next();
            let right = self.parse_assign_expr()?;
            left = self.lower.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_assign_expr(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_cmp_expr()?;
        if !self.at(TokenKind::Eq) {
            return Ok(lhs);
        }
        if !matches!(lhs.kind, NodeKind::Var { .. } | NodeKind::CompoundVar { .. }) {
            return Err(ParseError {
                message: "left side of `=` must be a variable or a field".to_string(),
                span: lhs.span,
            });
        }
        self.next();
        let rhs = self.parse_cmp_expr()?;
        if self.at(TokenKind::Eq) {
            let span = self.peek_span().unwrap_or(rhs.span);
            return Err(ParseError {
                message: "chained assignments are not supported".to_string(),
                span,
            });
        }
        let span = join(lhs.span, rhs.span);
        Ok(self.lower.node(
            span,
            NodeKind::Assign {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        ))
    }

    fn parse_cmp_expr(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_add_expr()?;
        let Some(op) = cmp_op(self.peek_kind()) else {
            return Ok(left);
        };
        self.next();
        let right = self.parse_add_expr()?;
        let expr = self.lower.binary(op, left, right);

        if cmp_op(self.peek_kind()).is_some() {
            let span = self.peek_span().unwrap_or(expr.span);
            return Err(ParseError {
                message: "chained comparisons are not supported; use parentheses".to_string(),
                span,
            });
        }
        Ok(expr)
    }

    fn parse_add_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_mul_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => "+",
                Some(TokenKind::Minus) => "-",
                _ => break,
            };
            self.next();
            let right = self.parse_mul_expr()?;
            left = self.lower.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_mul_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => "*",
                Some(TokenKind::Slash) => "/",
                _ => break,
            };
            self.next();
            let right = self.parse_unary_expr()?;
            left = self.lower.binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Node, ParseError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => "-",
            Some(TokenKind::Plus) => "+",
            Some(TokenKind::Bang) => "!",
            _ => return self.parse_postfix_expr(),
        };
        let tok = self.expect_any()?;
        let arg = self.parse_unary_expr()?;
        Ok(self.lower.unary(op, tok.span, arg))
    }

    fn parse_postfix_expr(&mut self) -> Result<Node, ParseError> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            if self.at(TokenKind::Dot) {
                self.next();
                let (name, span) = self.expect_ident()?;
                expr = self.lower.field(expr, name, span);
                continue;
            }

            if self.at(TokenKind::LBracket) {
                self.next();
                let idx = self.with_decls(true, |p| p.parse_expr())?;
                let rb = self.expect(TokenKind::RBracket)?;
                expr = self.lower.index(expr, idx, rb.span)?;
                continue;
            }

            // Only a field access can be followed by call arguments.
            if self.at(TokenKind::LParen) && matches!(expr.kind, NodeKind::CompoundVar { .. }) {
                self.next();
                let args = self.with_decls(true, |p| p.parse_args())?;
                let rp = self.expect(TokenKind::RParen)?;
                expr = self.lower.member_call(expr, args, rp.span)?;
                continue;
            }

            break;
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Node, ParseError> {
        let Some(tok) = self.tokens.get(self.idx).cloned() else {
            return Err(self.unexpected("an expression"));
        };
        match tok.kind {
            TokenKind::Int(n) => {
                self.next();
                Ok(self.lower.int(tok.span, n))
            }
            TokenKind::Ident(name) => {
                self.next();
                if self.at(TokenKind::LParen) {
                    self.parse_call_or_decl(name, tok.span)
                } else {
                    Ok(self.lower.node(tok.span, NodeKind::Var { name, ty: None }))
                }
            }
            TokenKind::KwNew => self.parse_new(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::LParen => {
                self.next();
                let inner = self.with_decls(true, |p| p.parse_expr())?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Lt => self.parse_tuple(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `name(args)` or, when a block follows, `name(formals) { body }`.
    fn parse_call_or_decl(&mut self, name: String, start: Span) -> Result<Node, ParseError> {
        self.expect(TokenKind::LParen)?;
        let args = self.with_decls(true, |p| p.parse_args())?;
        let rp = self.expect(TokenKind::RParen)?;

        if !(self.allow_decl && self.at(TokenKind::LBrace)) {
            let span = join(start, rp.span);
            return Ok(self.lower.call(span, name, args));
        }

        if let Some(bad) = args.iter().find(|a| !matches!(a.kind, NodeKind::Var { .. })) {
            return Err(ParseError {
                message: format!("parameter of method `{name}` must be a plain name"),
                span: bad.span,
            });
        }
        let body = self.parse_block()?;
        let span = join(start, body.span);
        Ok(self.lower.node(
            span,
            NodeKind::Method {
                name,
                args,
                body: Box::new(body),
            },
        ))
    }

    /// `new(x, y = e) { body }`
    fn parse_new(&mut self) -> Result<Node, ParseError> {
        let kw = self.expect(TokenKind::KwNew)?;
        self.expect(TokenKind::LParen)?;
        let mut locals = Vec::new();
        while !self.at(TokenKind::RParen) {
            let (name, name_span) = self.expect_ident()?;
            let val = if self.at(TokenKind::Eq) {
                self.next();
                self.with_decls(true, |p| p.parse_expr())?
            } else {
                self.lower.nil(name_span)
            };
            let span = join(name_span, val.span);
            locals.push(self.lower.node(
                span,
                NodeKind::Init {
                    name,
                    val: Box::new(val),
                    immutable: false,
                },
            ));
            if !self.at(TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        let span = join(kw.span, body.span);
        Ok(self.lower.node(
            span,
            NodeKind::New {
                locals,
                body: Box::new(body),
            },
        ))
    }

    /// `if c { ... } [else { ... }]`; a missing else branch is `Nop`.
    fn parse_if(&mut self) -> Result<Node, ParseError> {
        let kw = self.expect(TokenKind::KwIf)?;
        let cond = self.with_decls(false, |p| p.parse_expr())?;
        let then = self.parse_block()?;
        let els = if self.at(TokenKind::KwElse) {
            self.next();
            self.parse_block()?
        } else {
            self.lower.node(then.span, NodeKind::Nop)
        };
        let span = join(kw.span, els.span);
        Ok(self.lower.node(
            span,
            NodeKind::Ite {
                cond: Box::new(cond),
                then: Box::new(then),
                els: Box::new(els),
            },
        ))
    }

    /// `<a, b, ...>`. Elements bind tighter than comparisons so `>` closes.
    fn parse_tuple(&mut self) -> Result<Node, ParseError> {
        let lt = self.expect(TokenKind::Lt)?;
        let mut items = vec![self.parse_add_expr()?];
        while self.at(TokenKind::Comma) {
            self.next();
            items.push(self.parse_add_expr()?);
        }
        let gt = self.expect(TokenKind::Gt)?;
        let span = join(lt.span, gt.span);
        Ok(self.lower.node(span, NodeKind::Tuple(items)))
    }

    /// Brace-delimited statement list, statements separated by optional `;`.
    fn parse_block(&mut self) -> Result<Node, ParseError> {
        let lb = self.expect(TokenKind::LBrace)?;
        let items = self.with_decls(true, |p| {
            let mut items = Vec::new();
            loop {
                p.skip_semis();
                if p.at(TokenKind::RBrace) {
                    break;
                }
                items.push(p.parse_expr()?);
            }
            Ok(items)
        })?;
        let rb = self.expect(TokenKind::RBrace)?;
        Ok(self.lower.block(join(lb.span, rb.span), items))
    }

    /// Comma-separated arguments up to (not including) `)`. `x: type` is a
    /// typed formal.
    fn parse_args(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            let typed = matches!(self.peek_kind(), Some(TokenKind::Ident(_)))
                && matches!(self.peek_kind_n(1), Some(TokenKind::Colon));
            if typed {
                let (name, span) = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                args.push(self.lower.node(
                    span,
                    NodeKind::Var {
                        name,
                        ty: Some(ty),
                    },
                ));
            } else {
                args.push(self.parse_expr()?);
            }
            if !self.at(TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        Ok(args)
    }

    /// `*` or `<type, ...>`
    fn parse_type(&mut self) -> Result<VarType, ParseError> {
        if self.at(TokenKind::Star) {
            self.next();
            return Ok(VarType::Value);
        }
        if self.at(TokenKind::Lt) {
            self.next();
            let mut items = vec![self.parse_type()?];
            while self.at(TokenKind::Comma) {
                self.next();
                items.push(self.parse_type()?);
            }
            self.expect(TokenKind::Gt)?;
            return Ok(VarType::Tuple(items));
        }
        Err(self.unexpected("a type (`*` or `<...>`)"))
    }

    fn with_decls<T>(
        &mut self,
        allow: bool,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved = mem::replace(&mut self.allow_decl, allow);
        let out = f(self);
        self.allow_decl = saved;
        out
    }

    fn skip_semis(&mut self) {
        while self.at(TokenKind::Semi) {
            self.next();
        }
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        match self.tokens.get(self.idx) {
            Some(tok) => ParseError {
                message: format!("expected {wanted}, found {}", tok.kind.describe()),
                span: tok.span,
            },
            None => ParseError {
                message: format!("expected {wanted}, found end of input"),
                span: self.eof_span(),
            },
        }
    }

    fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map(|t| t.span)
            .unwrap_or_else(|| sable_ast::span(0, 0))
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        let tok = self.expect_any()?;
        match tok.kind {
            TokenKind::Ident(name) => Ok((name, tok.span)),
            other => Err(ParseError {
                message: format!("expected identifier, found {}", other.describe()),
                span: tok.span,
            }),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        if self.at(expected.clone()) {
            return self.expect_any();
        }
        Err(self.unexpected(&expected.describe()))
    }

    fn expect_any(&mut self) -> Result<Token, ParseError> {
        self.next().ok_or_else(|| ParseError {
            message: "unexpected end of input".to_string(),
            span: self.eof_span(),
        })
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind()
            .is_some_and(|k| mem::discriminant(k) == mem::discriminant(&kind))
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.idx)?.clone();
        self.idx += 1;
        Some(tok)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.idx).map(|t| &t.kind)
    }

    fn peek_kind_n(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.idx + n).map(|t| &t.kind)
    }

    fn peek_span(&self) -> Option<Span> {
        self.tokens.get(self.idx).map(|t| t.span)
    }
}

fn cmp_op(kind: Option<&TokenKind>) -> Option<&'static str> {
    match kind {
        Some(TokenKind::Lt) => Some("<"),
        Some(TokenKind::Gt) => Some(">"),
        Some(TokenKind::EqEq) => Some("=="),
        _ => None,
    }
}
