#![forbid(unsafe_code)]

//! Which fields are ever assigned.
//!
//! `x = e` inside an allocation mutates field `x` of the innermost enclosing
//! allocation. `o.x = e` and `x[i] = e` cannot be tied to a particular object,
//! so `x` is treated as mutable on every object.

use std::collections::{BTreeSet, HashMap};

use sable_ast::{walk, AstError, ContextStack, Node, NodeId, NodeKind, Transform};

#[derive(Clone, Debug, Default)]
pub struct Mutations {
    must: HashMap<NodeId, BTreeSet<String>>,
    may: BTreeSet<String>,
}

impl Mutations {
    pub fn analyze(root: &Node) -> Result<Self, AstError> {
        let mut pass = FindMutations {
            ctx: ContextStack::new(),
            out: Mutations::default(),
        };
        walk(&mut pass, root.clone())?;
        Ok(pass.out)
    }

    /// Fields directly assigned inside allocation `alloc`.
    pub fn must_mutate(&self, alloc: NodeId) -> Option<&BTreeSet<String>> {
        self.must.get(&alloc)
    }

    /// Fields assigned through a compound target anywhere.
    pub fn may_mutate(&self) -> &BTreeSet<String> {
        &self.may
    }

    pub fn is_mutable(&self, alloc: Option<NodeId>, field: &str) -> bool {
        self.may.contains(field)
            || alloc
                .and_then(|id| self.must.get(&id))
                .is_some_and(|set| set.contains(field))
    }
}

struct FindMutations {
    ctx: ContextStack,
    out: Mutations,
}

impl Transform for FindMutations {
    fn context(&mut self) -> &mut ContextStack {
        &mut self.ctx
    }

    fn visit_new(&mut self, node: Node) -> Result<Node, AstError> {
        self.ctx.push(&node);
        Ok(node)
    }

    fn visit_assign(&mut self, node: Node) -> Result<Node, AstError> {
        if let NodeKind::Assign { lhs, .. } = &node.kind {
            match &lhs.kind {
                NodeKind::Var { name, .. } => {
                    if let Some(alloc) = self.ctx.top() {
                        self.out
                            .must
                            .entry(alloc.id)
                            .or_default()
                            .insert(name.clone());
                    }
                }
                NodeKind::CompoundVar { name, .. } => {
                    tracing::trace!(field = %name, "compound assignment widens may-mutate");
                    self.out.may.insert(name.clone());
                }
                _ => {}
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_parse::parse_source;

    fn alloc_ids(node: &Node, out: &mut Vec<NodeId>) {
        match &node.kind {
            NodeKind::New { locals, body } => {
                out.push(node.id);
                locals.iter().for_each(|l| alloc_ids(l, out));
                alloc_ids(body, out);
            }
            NodeKind::TopLevel(items) => items.iter().for_each(|i| alloc_ids(i, out)),
            NodeKind::Method { body, .. } => alloc_ids(body, out),
            NodeKind::Seq(a, b) => {
                alloc_ids(a, out);
                alloc_ids(b, out);
            }
            NodeKind::Init { val, .. } => alloc_ids(val, out),
            NodeKind::Assign { rhs, .. } => alloc_ids(rhs, out),
            _ => {}
        }
    }

    #[test]
    fn bare_assignment_attributes_to_innermost_allocation() {
        let root = parse_source("new(x, y) { inc() { x = x + 1 } mk() { new(y) { set() { y = 2 } } } }")
            .expect("parse");
        let m = Mutations::analyze(&root).expect("analyze");
        let mut ids = Vec::new();
        alloc_ids(&root, &mut ids);
        let (outer, inner) = (ids[0], ids[1]);

        assert!(m.must_mutate(outer).is_some_and(|s| s.contains("x") && !s.contains("y")));
        assert!(m.must_mutate(inner).is_some_and(|s| s.contains("y")));
        assert!(m.may_mutate().is_empty());
    }

    #[test]
    fn compound_assignment_widens_globally() {
        let root = parse_source("new(f) {} o.f = 1; a[0] = 2").expect("parse");
        let m = Mutations::analyze(&root).expect("analyze");
        assert_eq!(
            m.may_mutate().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["a", "f"]
        );
        assert!(m.is_mutable(None, "f"));
    }

    #[test]
    fn assignment_outside_objects_mutates_nothing() {
        let root = parse_source("x = 6; assert x == 6").expect("parse");
        let m = Mutations::analyze(&root).expect("analyze");
        assert!(m.may_mutate().is_empty());
        assert!(!m.is_mutable(None, "x"));
    }
}
