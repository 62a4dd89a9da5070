#![forbid(unsafe_code)]

//! Node construction for the parser.
//!
//! Operators become receiver-less calls named by the operator, signs fold into
//! integer literals, postfix accessors become `CompoundVar`/`Call` nodes, and
//! statement lists fold right into `Seq`. Every node gets a fresh id.

use sable_ast::{span_between, Node, NodeIds, NodeKind, Span, Value};

use crate::error::ParseError;

pub(crate) struct Lower {
    ids: NodeIds,
}

impl Lower {
    pub(crate) fn new() -> Self {
        Self {
            ids: NodeIds::new(),
        }
    }

    pub(crate) fn node(&mut self, span: Span, kind: NodeKind) -> Node {
        Node::new(self.ids.fresh(), span, kind)
    }

    pub(crate) fn nil(&mut self, span: Span) -> Node {
        self.node(span, NodeKind::Const(Value::Nil))
    }

    pub(crate) fn int(&mut self, span: Span, n: i64) -> Node {
        self.node(span, NodeKind::Const(Value::Int(n)))
    }

    /// Free call `name(args)` with the nil receiver.
    pub(crate) fn call(&mut self, span: Span, name: String, args: Vec<Node>) -> Node {
        let obj = self.nil(span);
        self.node(
            span,
            NodeKind::Call {
                obj: Box::new(obj),
                name,
                args,
            },
        )
    }

    pub(crate) fn binary(&mut self, op: &str, lhs: Node, rhs: Node) -> Node {
        let span = join(lhs.span, rhs.span);
        self.call(span, op.to_string(), vec![lhs, rhs])
    }

    pub(crate) fn unary(&mut self, op: &str, op_span: Span, arg: Node) -> Node {
        let span = join(op_span, arg.span);
        if let NodeKind::Const(Value::Int(n)) = arg.kind {
            match op {
                "-" => {
                    return Node {
                        span,
                        kind: NodeKind::Const(Value::Int(n.wrapping_neg())),
                        ..arg
                    };
                }
                "+" => return Node { span, ..arg },
                _ => {}
            }
        }
        self.call(span, op.to_string(), vec![arg])
    }

    /// `base.name`
    pub(crate) fn field(&mut self, base: Node, name: String, span: Span) -> Node {
        let span = join(base.span, span);
        let idx = self.nil(span);
        self.node(
            span,
            NodeKind::CompoundVar {
                obj: Box::new(base),
                name,
                idx: Box::new(idx),
            },
        )
    }

    /// `base[idx]`: indexes a field access, or a bare name as `nil.name[idx]`.
    pub(crate) fn index(&mut self, base: Node, idx: Node, end: Span) -> Result<Node, ParseError> {
        let span = join(base.span, end);
        let id = base.id;
        match base.kind {
            NodeKind::CompoundVar { obj, name, idx: old } if old.is_nil() => Ok(Node::new(
                id,
                span,
                NodeKind::CompoundVar {
                    obj,
                    name,
                    idx: Box::new(idx),
                },
            )),
            NodeKind::CompoundVar { .. } => Err(ParseError {
                message: "a value can only be indexed once".to_string(),
                span,
            }),
            NodeKind::Var { name, .. } => {
                let obj = self.nil(base.span);
                Ok(Node::new(
                    id,
                    span,
                    NodeKind::CompoundVar {
                        obj: Box::new(obj),
                        name,
                        idx: Box::new(idx),
                    },
                ))
            }
            _ => Err(ParseError {
                message: "only names and fields can be indexed".to_string(),
                span,
            }),
        }
    }

    /// `obj.name(args)`, given the already-built `obj.name` access.
    pub(crate) fn member_call(
        &mut self,
        target: Node,
        args: Vec<Node>,
        end: Span,
    ) -> Result<Node, ParseError> {
        let span = join(target.span, end);
        let id = target.id;
        match target.kind {
            NodeKind::CompoundVar { obj, name, idx } if idx.is_nil() => Ok(Node::new(
                id,
                span,
                NodeKind::Call { obj, name, args },
            )),
            _ => Err(ParseError {
                message: "cannot call an indexed value".to_string(),
                span,
            }),
        }
    }

    /// Fold a statement list right into nested `Seq`s; empty lists are `Nop`.
    pub(crate) fn block(&mut self, span: Span, items: Vec<Node>) -> Node {
        let mut items = items.into_iter().rev();
        let Some(mut acc) = items.next() else {
            return self.node(span, NodeKind::Nop);
        };
        for item in items {
            let span = join(item.span, acc.span);
            acc = self.node(span, NodeKind::Seq(Box::new(item), Box::new(acc)));
        }
        acc
    }
}

pub(crate) fn join(a: Span, b: Span) -> Span {
    let a0: usize = a.offset();
    let b0: usize = b.offset();
    let a1 = a0 + a.len();
    let b1 = b0 + b.len();
    span_between(a0.min(b0), a1.max(b1))
}
