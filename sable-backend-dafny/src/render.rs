#![forbid(unsafe_code)]

use sable_ast::{Node, NodeKind, Value};
use sable_codegen::CodegenError;

/// `Cons(a, Cons(b, LNil))`
pub fn cons_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .rev()
        .fold("LNil".to_string(), |tail, item| format!("Cons({}, {tail})", item.as_ref()))
}

/// `Cons("a", Cons("b", LNil))`
pub fn name_list<S: AsRef<str>>(names: &[S]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| quote(n.as_ref())).collect();
    cons_list(&quoted)
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

pub fn value(v: &Value) -> String {
    match v {
        Value::Int(n) => format!("Int({n})"),
        Value::Nil => "Nil()".to_string(),
    }
}

/// Expression constructors of the Dafny language model.
pub fn term(node: &Node) -> Result<String, CodegenError> {
    let list = |nodes: &[Node]| -> Result<String, CodegenError> {
        let items = nodes.iter().map(term).collect::<Result<Vec<_>, _>>()?;
        Ok(cons_list(&items))
    };

    Ok(match &node.kind {
        NodeKind::Const(v) => format!("EConst({})", value(v)),
        NodeKind::Var { name, .. } => format!("EVar({})", quote(name)),
        NodeKind::Tuple(items) => format!("ETuple({})", list(items)?),
        NodeKind::Seq(a, b) => format!("ESeq({}, {})", term(a)?, term(b)?),
        NodeKind::CompoundVar { obj, name, idx } => {
            format!("ECVar({}, {}, {})", term(obj)?, quote(name), term(idx)?)
        }
        NodeKind::Init { name, val, .. } => format!("Init({}, {})", quote(name), term(val)?),
        NodeKind::New { locals, body } => format!("ENew({}, {})", list(locals)?, term(body)?),
        NodeKind::Method { name, args, body } => {
            format!("EMethod({}, {}, {})", quote(name), name_list(&formal_names(args)?), term(body)?)
        }
        NodeKind::Assign { lhs, rhs } => format!("EAssign({}, {})", term(lhs)?, term(rhs)?),
        NodeKind::Call { obj, name, args } => {
            format!("ECall({}, {}, {})", term(obj)?, quote(name), list(args)?)
        }
        NodeKind::Ite { cond, then, els } => {
            format!("EITE({}, {}, {})", term(cond)?, term(then)?, term(els)?)
        }
        NodeKind::Nop => "ENop()".to_string(),
        NodeKind::TopLevel(_) | NodeKind::Proof { .. } | NodeKind::Assert(_) | NodeKind::Assume(_) => {
            return Err(CodegenError::new(format!(
                "{} cannot appear inside an expression: {node}",
                node.tag().name()
            )));
        }
    })
}

pub(crate) fn formal_names(args: &[Node]) -> Result<Vec<&str>, CodegenError> {
    args.iter()
        .map(|a| {
            a.var_name()
                .ok_or_else(|| CodegenError::new(format!("method parameter must be a name, got {a}")))
        })
        .collect()
}
