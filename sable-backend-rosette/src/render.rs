#![forbid(unsafe_code)]

use sable_ast::{Node, NodeKind, Value, VarType};
use sable_codegen::CodegenError;

pub fn value(v: &Value) -> String {
    match v {
        Value::Int(n) => format!("(Int {n})"),
        Value::Nil => "(Nil)".to_string(),
    }
}

fn var_type(ty: &VarType) -> String {
    match ty {
        VarType::Value => "'value".to_string(),
        VarType::Tuple(items) => {
            let items: Vec<String> = items.iter().map(var_type).collect();
            format!("(list {})", items.join(" "))
        }
    }
}

/// `(list a b ...)`; an empty list is `(list)`.
pub fn list<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::from("(list");
    for item in items {
        out.push(' ');
        out.push_str(item.as_ref());
    }
    out.push(')');
    out
}

/// Racket quotes `|` inside symbols by doubling it.
fn symbol(name: &str) -> String {
    format!("'{}", name.replace('|', "||"))
}

/// S-expression constructors of the Rosette language model.
pub fn term(node: &Node) -> Result<String, CodegenError> {
    let terms = |nodes: &[Node]| -> Result<String, CodegenError> {
        let items = nodes.iter().map(term).collect::<Result<Vec<_>, _>>()?;
        Ok(list(&items))
    };

    Ok(match &node.kind {
        NodeKind::Const(v) => format!("(EConst {})", value(v)),
        NodeKind::Var { name, ty: None } => format!("(EVar '{name})"),
        NodeKind::Var { name, ty: Some(ty) } => format!("(EVar '{name} {})", var_type(ty)),
        NodeKind::Tuple(items) => format!("(ETuple {})", terms(items)?),
        NodeKind::Seq(a, b) => format!("(ESeq {} {})", term(a)?, term(b)?),
        NodeKind::CompoundVar { obj, name, idx } => {
            format!("(ECVar {} '{name} {})", term(obj)?, term(idx)?)
        }
        NodeKind::Init {
            name,
            val,
            immutable,
        } => format!(
            "(Init '{name} {} {})",
            term(val)?,
            if *immutable { "#t" } else { "#f" }
        ),
        NodeKind::New { locals, body } => format!("(ENew {} {})", terms(locals)?, term(body)?),
        NodeKind::Method { name, args, body } => {
            format!("(EMethod '{name} {} {})", terms(args)?, term(body)?)
        }
        NodeKind::Assign { lhs, rhs } => format!("(EAssign {} {})", term(lhs)?, term(rhs)?),
        NodeKind::Call { obj, name, args } => {
            format!("(ECall {} {} {})", term(obj)?, symbol(name), terms(args)?)
        }
        NodeKind::Ite { cond, then, els } => {
            format!("(EITE {} {} {})", term(cond)?, term(then)?, term(els)?)
        }
        NodeKind::Nop => "(ENop)".to_string(),
        NodeKind::TopLevel(_) | NodeKind::Proof { .. } | NodeKind::Assert(_) | NodeKind::Assume(_) => {
            return Err(CodegenError::new(format!(
                "{} cannot appear inside an expression: {node}",
                node.tag().name()
            )));
        }
    })
}
