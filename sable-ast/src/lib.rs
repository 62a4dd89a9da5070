#![forbid(unsafe_code)]

mod display;
mod error;
pub mod visit;

use miette::SourceSpan;

pub use error::AstError;
pub use visit::{walk, ContextStack, Frame, Transform};

pub type Span = SourceSpan;

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}

/// Identity of a node within one parsed program.
///
/// Analyses key per-object results by the id of the `new(...)` node, so every
/// rewrite must carry the id of the node it replaces over to the replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Id of nodes synthesized after parsing (sequenced contexts, default invariants).
    pub const DETACHED: NodeId = NodeId(u32::MAX);

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_detached(self) -> bool {
        self == Self::DETACHED
    }
}

/// Hands out fresh node ids while a program is being built.
#[derive(Debug, Default)]
pub struct NodeIds {
    next: u32,
}

impl NodeIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Nil,
}

/// Structural type on a formal parameter: `*` or `<t, ...>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarType {
    Value,
    Tuple(Vec<VarType>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Const(Value),
    Var {
        name: String,
        ty: Option<VarType>,
    },
    Tuple(Vec<Node>),
    /// Two-statement block; longer blocks nest to the right.
    Seq(Box<Node>, Box<Node>),
    /// `obj.name` or `obj.name[idx]`; `idx` is the nil constant when absent.
    CompoundVar {
        obj: Box<Node>,
        name: String,
        idx: Box<Node>,
    },
    /// Field initializer inside `new(...)`.
    Init {
        name: String,
        val: Box<Node>,
        immutable: bool,
    },
    New {
        locals: Vec<Node>,
        body: Box<Node>,
    },
    Method {
        name: String,
        args: Vec<Node>,
        body: Box<Node>,
    },
    Assign {
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// Receiver is the nil constant for free calls and operators.
    Call {
        obj: Box<Node>,
        name: String,
        args: Vec<Node>,
    },
    Ite {
        cond: Box<Node>,
        then: Box<Node>,
        els: Box<Node>,
    },
    Nop,

    // Surface nodes: consumed while building obligations, never emitted.
    TopLevel(Vec<Node>),
    /// `t0 ~ [h0] {{{v0}}} t1 ~ ... tn`; `hints[i]`/`verbatims[i]` annotate the
    /// arrow after `terms[i]`, so the last slot is always empty.
    Proof {
        terms: Vec<Node>,
        hints: Vec<Option<Node>>,
        verbatims: Vec<String>,
    },
    Assert(Box<Node>),
    Assume(Box<Node>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Const,
    Var,
    Tuple,
    Seq,
    CompoundVar,
    Init,
    New,
    Method,
    Assign,
    Call,
    Ite,
    Nop,
    TopLevel,
    Proof,
    Assert,
    Assume,
}

impl NodeTag {
    pub fn name(self) -> &'static str {
        match self {
            NodeTag::Const => "Const",
            NodeTag::Var => "Var",
            NodeTag::Tuple => "Tuple",
            NodeTag::Seq => "Seq",
            NodeTag::CompoundVar => "CompoundVar",
            NodeTag::Init => "Init",
            NodeTag::New => "New",
            NodeTag::Method => "Method",
            NodeTag::Assign => "Assign",
            NodeTag::Call => "Call",
            NodeTag::Ite => "Ite",
            NodeTag::Nop => "Nop",
            NodeTag::TopLevel => "TopLevel",
            NodeTag::Proof => "Proof",
            NodeTag::Assert => "Assert",
            NodeTag::Assume => "Assume",
        }
    }

    pub fn is_surface(self) -> bool {
        matches!(
            self,
            NodeTag::TopLevel | NodeTag::Proof | NodeTag::Assert | NodeTag::Assume
        )
    }
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Const(_) => NodeTag::Const,
            NodeKind::Var { .. } => NodeTag::Var,
            NodeKind::Tuple(_) => NodeTag::Tuple,
            NodeKind::Seq(..) => NodeTag::Seq,
            NodeKind::CompoundVar { .. } => NodeTag::CompoundVar,
            NodeKind::Init { .. } => NodeTag::Init,
            NodeKind::New { .. } => NodeTag::New,
            NodeKind::Method { .. } => NodeTag::Method,
            NodeKind::Assign { .. } => NodeTag::Assign,
            NodeKind::Call { .. } => NodeTag::Call,
            NodeKind::Ite { .. } => NodeTag::Ite,
            NodeKind::Nop => NodeTag::Nop,
            NodeKind::TopLevel(_) => NodeTag::TopLevel,
            NodeKind::Proof { .. } => NodeTag::Proof,
            NodeKind::Assert(_) => NodeTag::Assert,
            NodeKind::Assume(_) => NodeTag::Assume,
        }
    }
}

impl Node {
    pub fn new(id: NodeId, span: Span, kind: NodeKind) -> Self {
        Self { id, span, kind }
    }

    /// A node built after parsing, with no identity or source location.
    pub fn detached(kind: NodeKind) -> Self {
        Self {
            id: NodeId::DETACHED,
            span: span(0, 0),
            kind,
        }
    }

    pub fn nil() -> Self {
        Self::detached(NodeKind::Const(Value::Nil))
    }

    pub fn int(n: i64) -> Self {
        Self::detached(NodeKind::Const(Value::Int(n)))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::detached(NodeKind::Var {
            name: name.into(),
            ty: None,
        })
    }

    pub fn nop() -> Self {
        Self::detached(NodeKind::Nop)
    }

    pub fn seq(first: Node, second: Node) -> Self {
        Self::detached(NodeKind::Seq(Box::new(first), Box::new(second)))
    }

    /// `obj.name` with no index.
    pub fn field(obj: Node, name: impl Into<String>) -> Self {
        Self::detached(NodeKind::CompoundVar {
            obj: Box::new(obj),
            name: name.into(),
            idx: Box::new(Node::nil()),
        })
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::detached(NodeKind::Call {
            obj: Box::new(Node::nil()),
            name: name.into(),
            args,
        })
    }

    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }

    pub fn is_surface(&self) -> bool {
        self.tag().is_surface()
    }

    /// The nil constant that stands in for "no receiver" and "no index".
    pub fn is_nil(&self) -> bool {
        matches!(self.kind, NodeKind::Const(Value::Nil))
    }

    pub fn is_nop(&self) -> bool {
        matches!(self.kind, NodeKind::Nop)
    }

    pub fn var_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Var { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Name and arguments of a call with no receiver, e.g. `Equal(a, b)` or `Foo()`.
    pub fn as_free_call(&self) -> Option<(&str, &[Node])> {
        match &self.kind {
            NodeKind::Call { obj, name, args } if obj.is_nil() => Some((name, args)),
            _ => None,
        }
    }

    /// Sequence `next` after `self`, treating `Nop` as the empty program.
    pub fn then(self, next: Node) -> Node {
        if self.is_nop() {
            next
        } else {
            Node::seq(self, next)
        }
    }
}
