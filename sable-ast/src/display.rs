#![forbid(unsafe_code)]

//! Compact s-expression rendering used by diagnostics and tests.

use std::fmt;

use crate::{Node, NodeKind, Value, VarType};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Nil => f.write_str("nil"),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Value => f.write_str("*"),
            VarType::Tuple(items) => {
                f.write_str("<")?;
                write_joined(f, items, ", ")?;
                f.write_str(">")
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Const(v) => write!(f, "{v}"),
            NodeKind::Var { name, ty: None } => f.write_str(name),
            NodeKind::Var { name, ty: Some(ty) } => write!(f, "{name}:{ty}"),
            NodeKind::Tuple(args) => {
                f.write_str("<")?;
                write_joined(f, args, ", ")?;
                f.write_str(">")
            }
            NodeKind::Seq(a, b) => write!(f, "(seq {a} {b})"),
            NodeKind::CompoundVar { obj, name, idx } => write!(f, "(cvar {obj} {name} {idx})"),
            NodeKind::Init {
                name,
                val,
                immutable,
            } => {
                let tag = if *immutable { "imm" } else { "mut" };
                write!(f, "(init {name} {val} {tag})")
            }
            NodeKind::New { locals, body } => {
                f.write_str("(new [")?;
                write_joined(f, locals, " ")?;
                write!(f, "] {body})")
            }
            NodeKind::Method { name, args, body } => {
                write!(f, "(method {name} [")?;
                write_joined(f, args, " ")?;
                write!(f, "] {body})")
            }
            NodeKind::Assign { lhs, rhs } => write!(f, "(= {lhs} {rhs})"),
            NodeKind::Call { obj, name, args } => {
                write!(f, "(call {obj} {name}")?;
                for a in args {
                    write!(f, " {a}")?;
                }
                f.write_str(")")
            }
            NodeKind::Ite { cond, then, els } => write!(f, "(if {cond} {then} {els})"),
            NodeKind::Nop => f.write_str("nop"),
            NodeKind::TopLevel(children) => {
                f.write_str("(top")?;
                for c in children {
                    write!(f, " {c}")?;
                }
                f.write_str(")")
            }
            NodeKind::Proof {
                terms,
                hints,
                verbatims,
            } => {
                f.write_str("(proof")?;
                for (i, t) in terms.iter().enumerate() {
                    write!(f, " {t}")?;
                    if i + 1 == terms.len() {
                        break;
                    }
                    f.write_str(" ~")?;
                    if let Some(Some(h)) = hints.get(i) {
                        write!(f, "[{h}]")?;
                    }
                    if let Some(v) = verbatims.get(i).filter(|v| !v.is_empty()) {
                        write!(f, "{{{{{{{}}}}}}}", v.trim())?;
                    }
                }
                f.write_str(")")
            }
            NodeKind::Assert(cond) => write!(f, "(assert {cond})"),
            NodeKind::Assume(proof) => write!(f, "(assume {proof})"),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
