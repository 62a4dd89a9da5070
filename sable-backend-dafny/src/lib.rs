#![forbid(unsafe_code)]

//! Dafny rendering of proof obligations.
//!
//! Generated programs include the Dafny language model (`Lang.dfy` and
//! friends) from a configurable root directory and run every top-level
//! method from `Main`.

pub mod render;

use std::path::{Path, PathBuf};

use sable_ast::Node;
use sable_codegen::{
    invariant_params, CodeBuilder, CodegenError, DefKind, Definition, Delimiters, Dialect, EquivalenceStyle, LemmaSyntax,
    Templates,
};
use sable_proof::{Invariant, Seed, Side};

const INCLUDES: [&str; 3] = ["Lang.dfy", "Indistinguishable.dfy", "Refl.dfy"];
const EQUIVALENCE_TEMPLATE: &str = include_str!("../templates/equivalence.dfy");

pub struct Dafny {
    root: PathBuf,
    templates: Templates,
}

impl Dafny {
    /// `root` is the directory holding the Dafny language model.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CodegenError> {
        let root = root.into();
        let templates = Templates::parse(EQUIVALENCE_TEMPLATE, Delimiters::SLASHES)?;
        tracing::debug!(root = %root.display(), snippets = templates.names().count(), "dafny backend ready");
        Ok(Self { root, templates })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn invariant_function(&self, out: &mut CodeBuilder, lines: Vec<String>) -> Result<String, CodegenError> {
        out.begin(DefKind::Function, "invariant", invariant_params(), Some("bool"))?;
        out.emit(lines)?;
        out.end(false)
    }
}

fn side_args(side: Side) -> (&'static str, &'static str) {
    match side {
        Side::Lhs => ("ctx1", "addr1"),
        Side::Rhs => ("ctx2", "addr2"),
    }
}

/// Evaluate `expr` as a method of one side's object, then test the result.
fn side_check(side: Side, expr: &Node, test: &str) -> Result<Vec<String>, CodegenError> {
    let (ctx, addr) = side_args(side);
    Ok(vec![
        format!("var ctx := {ctx}.(ths := {addr});"),
        format!("var ret := Eval({}, ctx, FUEL).0;", render::term(expr)?),
        test.to_string(),
    ])
}

impl Dialect for Dafny {
    fn name(&self) -> &'static str {
        "dafny"
    }

    fn extension(&self) -> &'static str {
        "dfy"
    }

    fn term(&self, node: &Node) -> Result<String, CodegenError> {
        render::term(node)
    }

    fn empty_context(&self) -> String {
        "EmptyContext()".to_string()
    }

    fn seeded_context(&self, seed: &Seed) -> String {
        format!(
            "EmptyContext().(objs := AssocSet(EmptyContext().objs, 0, Object(Cons(Pair(\"{}\", Int({})), LNil))))",
            seed.name, seed.value
        )
    }

    fn bind(&self, name: &str, value: &str) -> String {
        format!("var {name} := {value};")
    }

    fn eval(&self, ret: Option<&str>, ctx_out: Option<&str>, expr: &str, ctx: &str) -> String {
        match (ret, ctx_out) {
            (Some(ret), None) => format!("var {ret} := Eval({expr}, {ctx}, FUEL).0;"),
            (ret, ctx_out) => format!(
                "var ({}, {}) := Eval({expr}, {ctx}, FUEL);",
                ret.unwrap_or("_"),
                ctx_out.unwrap_or("_")
            ),
        }
    }

    fn assert_int(&self, value: &str, n: i64) -> String {
        format!("assert {value} == Int({n});")
    }

    fn assert_kind(&self, value: &str, kind: &str) -> String {
        format!("assert {value}.{kind}?;")
    }

    fn trace(&self, expr: &str, value: &str) -> Vec<String> {
        vec![format!(
            "Reflect_Expr({expr}); print \" ==> \"; Reflect_Value({value}); print \"\\n\";"
        )]
    }

    fn admit(&self, _lhs: &str, _rhs: &str) -> Vec<String> {
        vec!["// this goal is admitted".to_string(), "assert true;".to_string()]
    }

    fn valid_rewrite(&self, ctx: &str, lhs: &str, rhs: &str, e1: &str, e2: &str, assumptions: &str) -> String {
        format!("assert ValidRewrite({ctx}, {lhs}, {rhs}, {e1}, {e2}, {assumptions});")
    }

    fn pair_list(&self, pairs: &[(String, String)]) -> String {
        let items: Vec<String> = pairs.iter().map(|(l, r)| format!("({l}, {r})")).collect();
        format!("[{}]", items.join(", "))
    }

    fn invariant(&self, out: &mut CodeBuilder, inv: &Invariant) -> Result<String, CodegenError> {
        let lines = match inv {
            Invariant::True => vec!["true".to_string()],
            Invariant::False => vec!["false".to_string()],
            Invariant::Equal { lhs, rhs } => vec![
                "var ctx1' := ctx1.(scope := Cons(Pair(\"_lhs\", Ref(addr1)), ctx1.scope));".to_string(),
                "var ctx2' := ctx2.(scope := Cons(Pair(\"_rhs\", Ref(addr2)), ctx2.scope));".to_string(),
                format!("var (lhs', _) := Eval({}, ctx1', FUEL);", render::term(lhs)?),
                format!("var (rhs', _) := Eval({}, ctx2', FUEL);", render::term(rhs)?),
                "lhs' == rhs'".to_string(),
            ],
            Invariant::Valid { side, expr } => side_check(*side, expr, "!ret.Error?")?,
            Invariant::Ref { side, expr } => side_check(*side, expr, "ret.Ref?")?,
            Invariant::Int { side, expr } => side_check(*side, expr, "ret.Int?")?,
            Invariant::Universal { .. } => {
                return Err(CodegenError::new(
                    "universal invariants are not supported by the dafny backend",
                ));
            }
        };
        self.invariant_function(out, lines)
    }

    fn equivalence_style(&self) -> EquivalenceStyle<'_> {
        EquivalenceStyle::MethodLemmas(self)
    }

    fn frame(&self, def: &Definition) -> String {
        let params: Vec<String> = def
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        let ret = def
            .returns
            .as_ref()
            .map(|r| format!(": {r}"))
            .unwrap_or_default();
        let body: Vec<String> = def.lines.iter().map(|l| format!("  {l}")).collect();
        format!(
            "{} {}({}){ret}\n{{\n{}\n}}",
            def.kind.keyword(),
            def.name,
            params.join(", "),
            body.join("\n")
        )
    }

    fn prelude(&self) -> String {
        INCLUDES
            .iter()
            .map(|file| {
                let path = self.root.join(file).display().to_string();
                format!("include \"{}\"", path.replace('\\', "\\\\"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn entry_point(&self, run: &[String]) -> Vec<String> {
        let main = Definition {
            kind: DefKind::Method,
            name: "Main".to_string(),
            params: Vec::new(),
            returns: None,
            lines: run.iter().map(|name| format!("{name}();")).collect(),
        };
        vec![self.frame(&main)]
    }
}

impl LemmaSyntax for Dafny {
    fn templates(&self) -> &Templates {
        &self.templates
    }

    fn conjunction(&self, out: &mut CodeBuilder, names: &[String]) -> Result<String, CodegenError> {
        let calls: Vec<String> = names
            .iter()
            .map(|n| format!("{n}(ctx1, ctx2, addr1, addr2)"))
            .collect();
        self.invariant_function(out, vec![calls.join(" && ")])
    }

    fn binders(&self, vars: &[String]) -> String {
        vars.iter()
            .map(|v| format!("{v}: Value"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn param_tail(&self, vars: &[String]) -> String {
        if vars.is_empty() {
            String::new()
        } else {
            format!(", {}", self.binders(vars))
        }
    }

    fn value_list(&self, vars: &[String]) -> String {
        render::cons_list(vars)
    }

    fn call_args(&self, vars: &[String]) -> String {
        vars.join(", ")
    }
}
