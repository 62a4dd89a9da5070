#![forbid(unsafe_code)]

use sable_ast::{walk, AstError, ContextStack, Node, NodeKind, Transform};

use crate::mutation::Mutations;

/// Mark every field initializer immutable unless some assignment can reach it.
///
/// Mutation sites are collected over the whole tree before any initializer is
/// rewritten. Node ids are preserved.
pub fn annotate_immutable(root: Node) -> Result<Node, AstError> {
    let mutations = Mutations::analyze(&root)?;
    let mut pass = Annotate {
        ctx: ContextStack::new(),
        mutations,
    };
    walk(&mut pass, root)
}

struct Annotate {
    ctx: ContextStack,
    mutations: Mutations,
}

impl Transform for Annotate {
    fn context(&mut self) -> &mut ContextStack {
        &mut self.ctx
    }

    fn visit_new(&mut self, node: Node) -> Result<Node, AstError> {
        self.ctx.push(&node);
        Ok(node)
    }

    fn visit_init(&mut self, node: Node) -> Result<Node, AstError> {
        let alloc = self.ctx.top().map(|f| f.id);
        match node.kind {
            NodeKind::Init { name, val, .. } => {
                let immutable = !self.mutations.is_mutable(alloc, &name);
                Ok(Node {
                    kind: NodeKind::Init {
                        name,
                        val,
                        immutable,
                    },
                    ..node
                })
            }
            kind => Ok(Node { kind, ..node }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_parse::parse_source;

    fn annotated(src: &str) -> String {
        let root = parse_source(src).expect("parse");
        annotate_immutable(root).expect("annotate").to_string()
    }

    #[test]
    fn unassigned_fields_become_immutable() {
        assert_eq!(
            annotated("new(x=0, y=0) { set(v) { y = v } get() { x } }"),
            "(top (new [(init x 0 imm) (init y 0 mut)] (seq (method set [v] (= y v)) (method get [] x))))"
        );
    }

    #[test]
    fn mutation_later_in_body_still_counts() {
        let out = annotated("new(c=0) { read() { c } bump() { c = c + 1 } }");
        assert!(out.contains("(init c 0 mut)"), "{out}");
    }

    #[test]
    fn compound_assignment_makes_same_name_mutable_everywhere() {
        let out = annotated("new(f=1) {} new(f=2) {} o.f = 3");
        assert!(out.contains("(init f 1 mut)") && out.contains("(init f 2 mut)"), "{out}");
    }

    #[test]
    fn annotation_keeps_node_ids() {
        let root = parse_source("new(x=0) {}").expect("parse");
        let before = root.id;
        let after = annotate_immutable(root).expect("annotate");
        assert_eq!(after.id, before);
    }
}
