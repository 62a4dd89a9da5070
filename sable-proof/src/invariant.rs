#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use sable_analysis::ObjectInfo;
use sable_ast::{AstError, Node, NodeKind};

/// Which object an invariant expression is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Lhs,
    Rhs,
}

impl Side {
    /// `_lhs` / `_rhs` in source.
    pub fn from_var(node: &Node) -> Option<Self> {
        match node.var_name()? {
            "_lhs" => Some(Side::Lhs),
            "_rhs" => Some(Side::Rhs),
            _ => None,
        }
    }

    pub fn var_name(self) -> &'static str {
        match self {
            Side::Lhs => "_lhs",
            Side::Rhs => "_rhs",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.var_name())
    }
}

/// A relation between the two objects of an equivalence, checked with both
/// execution contexts and both object addresses in scope.
#[derive(Clone, Debug, PartialEq)]
pub enum Invariant {
    True,
    False,
    /// `lhs` and `rhs` evaluate to equal values; `_lhs`/`_rhs` name the objects.
    Equal { lhs: Node, rhs: Node },
    /// `expr` evaluated as a method of `side` does not error.
    Valid { side: Side, expr: Node },
    /// ... evaluates to a reference.
    Ref { side: Side, expr: Node },
    /// ... evaluates to an integer.
    Int { side: Side, expr: Node },
    /// For all `args`, `body` does not error on either side.
    Universal { args: Vec<Node>, body: Node },
}

impl Invariant {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Invariant::True => "true",
            Invariant::False => "false",
            Invariant::Equal { .. } => "Equal",
            Invariant::Valid { .. } => "Valid",
            Invariant::Ref { .. } => "Ref",
            Invariant::Int { .. } => "Int",
            Invariant::Universal { .. } => "invariant",
        }
    }
}

/// Invariants for an equivalence between `lhs` and `rhs` under `context`,
/// read from the arrow annotation.
///
/// Unrecognized annotations are reported and replaced by the default invariant.
pub fn interpret(
    annotation: Option<&Node>,
    context: &Node,
    lhs: &Node,
    rhs: &Node,
) -> Result<Vec<Invariant>, AstError> {
    let Some(annot) = annotation else {
        return default_invariant(context, lhs, rhs);
    };

    match &annot.kind {
        NodeKind::Call { name, args, .. } => match (name.as_str(), args.as_slice()) {
            ("Equal", [a, b]) => {
                return Ok(vec![Invariant::Equal {
                    lhs: a.clone(),
                    rhs: b.clone(),
                }]);
            }
            ("&", [_, _]) => {
                let mut out = Vec::new();
                for conjunct in conjuncts(annot) {
                    out.extend(interpret(Some(conjunct), context, lhs, rhs)?);
                }
                return Ok(out);
            }
            ("Default", []) => return default_invariant(context, lhs, rhs),
            ("Valid" | "Ref" | "Int", [side, expr]) => {
                if let Some(side) = Side::from_var(side) {
                    let expr = expr.clone();
                    return Ok(vec![match name.as_str() {
                        "Valid" => Invariant::Valid { side, expr },
                        "Ref" => Invariant::Ref { side, expr },
                        _ => Invariant::Int { side, expr },
                    }]);
                }
            }
            _ => {}
        },
        NodeKind::Var { name, .. } if name == "true" => return Ok(vec![Invariant::True]),
        NodeKind::Var { name, .. } if name == "false" => return Ok(vec![Invariant::False]),
        NodeKind::Method { name, args, body } if name == "invariant" => {
            return Ok(vec![Invariant::Universal {
                args: args.clone(),
                body: (**body).clone(),
            }]);
        }
        _ => {}
    }

    tracing::warn!(annotation = %annot, "unknown invariant; using the default invariant");
    default_invariant(context, lhs, rhs)
}

/// Flatten nested `a & b` annotations into their operands, left to right.
fn conjuncts(node: &Node) -> Vec<&Node> {
    match &node.kind {
        NodeKind::Call { name, args, .. } if name == "&" && args.len() == 2 => {
            let mut out = conjuncts(&args[0]);
            out.extend(conjuncts(&args[1]));
            out
        }
        _ => vec![node],
    }
}

/// `_lhs.f == _rhs.f` for every field `f` both objects declare, sorted by name.
pub fn default_invariant(context: &Node, lhs: &Node, rhs: &Node) -> Result<Vec<Invariant>, AstError> {
    let info = ObjectInfo::gather(&[context, lhs, rhs])?;
    let left: BTreeSet<&String> = info.fields_of(lhs).iter().collect();
    let right: BTreeSet<&String> = info.fields_of(rhs).iter().collect();
    Ok(left
        .intersection(&right)
        .map(|field| Invariant::Equal {
            lhs: Node::field(Node::var(Side::Lhs.var_name()), field.as_str()),
            rhs: Node::field(Node::var(Side::Rhs.var_name()), field.as_str()),
        })
        .collect())
}
