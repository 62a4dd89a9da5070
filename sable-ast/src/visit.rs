#![forbid(unsafe_code)]

//! The single traversal/rewrite mechanism shared by every pass.
//!
//! A [`Transform`] has one handler per node tag. Each handler receives the node
//! by value and returns its replacement; handlers a pass does not override fall
//! through to [`Transform::visit_node`], which keeps the node unchanged. After a
//! handler returns, [`walk`] checks that the replacement still fits the slot it
//! came from, recurses into the replacement's children, and finally truncates the
//! context stack back to its depth before the handler ran. Frames a handler
//! pushes are therefore visible only to that node's descendants.

use crate::{AstError, Node, NodeId, NodeKind, NodeTag};

/// One ancestor recorded on the context stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub id: NodeId,
    pub tag: NodeTag,
    /// Method name for `Method` frames.
    pub name: Option<String>,
}

impl Frame {
    pub fn of(node: &Node) -> Self {
        let name = match &node.kind {
            NodeKind::Method { name, .. } => Some(name.clone()),
            _ => None,
        };
        Self {
            id: node.id,
            tag: node.tag(),
            name,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContextStack {
    frames: Vec<Frame>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: &Node) {
        self.frames.push(Frame::of(node));
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost frame.
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Frame `depth` levels below the top (`0` is the top).
    pub fn below_top(&self, depth: usize) -> Option<&Frame> {
        self.frames.iter().rev().nth(depth)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    fn truncate(&mut self, len: usize) {
        self.frames.truncate(len);
    }
}

pub trait Transform {
    fn context(&mut self) -> &mut ContextStack;

    /// Fallback for every tag without its own handler.
    fn visit_node(&mut self, node: Node) -> Result<Node, AstError> {
        Ok(node)
    }

    fn visit_const(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_var(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_tuple(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_seq(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_compound_var(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_init(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_new(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_method(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_assign(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_call(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_ite(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_nop(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }

    /// Fallback for the surface tags.
    fn visit_surface(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_node(node)
    }
    fn visit_top_level(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_surface(node)
    }
    fn visit_proof(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_surface(node)
    }
    fn visit_assert(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_surface(node)
    }
    fn visit_assume(&mut self, node: Node) -> Result<Node, AstError> {
        self.visit_surface(node)
    }
}

/// Visit `node` and every node below it, returning the rewritten tree.
pub fn walk<T: Transform + ?Sized>(t: &mut T, node: Node) -> Result<Node, AstError> {
    walk_in(t, node, None)
}

/// A replacement that does not fit `slot` is rejected before its children are visited.
fn walk_in<T: Transform + ?Sized>(
    t: &mut T,
    node: Node,
    slot: Option<(Slot, NodeTag)>,
) -> Result<Node, AstError> {
    let depth = t.context().len();
    let out = dispatch(t, node)
        .and_then(|replaced| match slot {
            Some((slot, parent)) => check_slot(replaced, slot, parent),
            None => Ok(replaced),
        })
        .and_then(|replaced| walk_children(t, replaced));
    t.context().truncate(depth);
    out
}

fn dispatch<T: Transform + ?Sized>(t: &mut T, node: Node) -> Result<Node, AstError> {
    match node.tag() {
        NodeTag::Const => t.visit_const(node),
        NodeTag::Var => t.visit_var(node),
        NodeTag::Tuple => t.visit_tuple(node),
        NodeTag::Seq => t.visit_seq(node),
        NodeTag::CompoundVar => t.visit_compound_var(node),
        NodeTag::Init => t.visit_init(node),
        NodeTag::New => t.visit_new(node),
        NodeTag::Method => t.visit_method(node),
        NodeTag::Assign => t.visit_assign(node),
        NodeTag::Call => t.visit_call(node),
        NodeTag::Ite => t.visit_ite(node),
        NodeTag::Nop => t.visit_nop(node),
        NodeTag::TopLevel => t.visit_top_level(node),
        NodeTag::Proof => t.visit_proof(node),
        NodeTag::Assert => t.visit_assert(node),
        NodeTag::Assume => t.visit_assume(node),
    }
}

/// What a child position accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Any,
    /// Any non-surface node.
    Statement,
    /// Field initializer of a `new(...)`.
    Local,
    /// Formal parameter of a method.
    Formal,
    AssignTarget,
    AssumedProof,
}

impl Slot {
    fn accepts(self, node: &Node) -> bool {
        match self {
            Slot::Any => true,
            Slot::Statement => !node.is_surface(),
            Slot::Local => node.tag() == NodeTag::Init,
            Slot::Formal => node.tag() == NodeTag::Var,
            Slot::AssignTarget => matches!(node.tag(), NodeTag::Var | NodeTag::CompoundVar),
            Slot::AssumedProof => match &node.kind {
                NodeKind::Proof { terms, .. } => terms.len() == 2,
                _ => false,
            },
        }
    }

    fn expectation(self) -> &'static str {
        match self {
            Slot::Any => "any node",
            Slot::Statement => "a non-surface node",
            Slot::Local => "an Init node",
            Slot::Formal => "a Var node",
            Slot::AssignTarget => "a Var or CompoundVar node",
            Slot::AssumedProof => "a two-term Proof node",
        }
    }
}

fn check_slot(node: Node, slot: Slot, parent: NodeTag) -> Result<Node, AstError> {
    if !slot.accepts(&node) {
        return Err(AstError {
            message: format!(
                "{} expects {} here, got {} `{}`",
                parent.name(),
                slot.expectation(),
                node.tag().name(),
                node
            ),
            span: node.span,
        });
    }
    Ok(node)
}

fn walk_child<T: Transform + ?Sized>(
    t: &mut T,
    child: Node,
    slot: Slot,
    parent: NodeTag,
) -> Result<Node, AstError> {
    walk_in(t, child, Some((slot, parent)))
}

fn walk_boxed<T: Transform + ?Sized>(
    t: &mut T,
    child: Box<Node>,
    slot: Slot,
    parent: NodeTag,
) -> Result<Box<Node>, AstError> {
    walk_child(t, *child, slot, parent).map(Box::new)
}

fn walk_all<T: Transform + ?Sized>(
    t: &mut T,
    children: Vec<Node>,
    slot: Slot,
    parent: NodeTag,
) -> Result<Vec<Node>, AstError> {
    children
        .into_iter()
        .map(|c| walk_child(t, c, slot, parent))
        .collect()
}

fn walk_children<T: Transform + ?Sized>(t: &mut T, node: Node) -> Result<Node, AstError> {
    let Node { id, span, kind } = node;
    let parent = kind.tag();
    let kind = match kind {
        NodeKind::Tuple(args) => NodeKind::Tuple(walk_all(t, args, Slot::Any, parent)?),
        NodeKind::Seq(a, b) => {
            let a = walk_boxed(t, a, Slot::Statement, parent)?;
            let b = walk_boxed(t, b, Slot::Statement, parent)?;
            NodeKind::Seq(a, b)
        }
        NodeKind::CompoundVar { obj, name, idx } => {
            let obj = walk_boxed(t, obj, Slot::Any, parent)?;
            let idx = walk_boxed(t, idx, Slot::Any, parent)?;
            NodeKind::CompoundVar { obj, name, idx }
        }
        NodeKind::Init {
            name,
            val,
            immutable,
        } => NodeKind::Init {
            name,
            val: walk_boxed(t, val, Slot::Any, parent)?,
            immutable,
        },
        NodeKind::New { locals, body } => {
            let locals = walk_all(t, locals, Slot::Local, parent)?;
            let body = walk_boxed(t, body, Slot::Any, parent)?;
            NodeKind::New { locals, body }
        }
        NodeKind::Method { name, args, body } => {
            let args = walk_all(t, args, Slot::Formal, parent)?;
            let body = walk_boxed(t, body, Slot::Any, parent)?;
            NodeKind::Method { name, args, body }
        }
        NodeKind::Assign { lhs, rhs } => {
            let lhs = walk_boxed(t, lhs, Slot::AssignTarget, parent)?;
            let rhs = walk_boxed(t, rhs, Slot::Any, parent)?;
            NodeKind::Assign { lhs, rhs }
        }
        NodeKind::Call { obj, name, args } => {
            let obj = walk_boxed(t, obj, Slot::Any, parent)?;
            let args = walk_all(t, args, Slot::Any, parent)?;
            NodeKind::Call { obj, name, args }
        }
        NodeKind::Ite { cond, then, els } => {
            let cond = walk_boxed(t, cond, Slot::Any, parent)?;
            let then = walk_boxed(t, then, Slot::Any, parent)?;
            let els = walk_boxed(t, els, Slot::Any, parent)?;
            NodeKind::Ite { cond, then, els }
        }
        NodeKind::TopLevel(children) => {
            NodeKind::TopLevel(walk_all(t, children, Slot::Any, parent)?)
        }
        NodeKind::Proof {
            terms,
            hints,
            verbatims,
        } => {
            let terms = walk_all(t, terms, Slot::Any, parent)?;
            let hints = hints
                .into_iter()
                .map(|h| h.map(|h| walk_child(t, h, Slot::Any, parent)).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            NodeKind::Proof {
                terms,
                hints,
                verbatims,
            }
        }
        NodeKind::Assert(cond) => NodeKind::Assert(walk_boxed(t, cond, Slot::Any, parent)?),
        NodeKind::Assume(proof) => {
            NodeKind::Assume(walk_boxed(t, proof, Slot::AssumedProof, parent)?)
        }
        leaf @ (NodeKind::Const(_) | NodeKind::Var { .. } | NodeKind::Nop) => leaf,
    };
    Ok(Node { id, span, kind })
}
