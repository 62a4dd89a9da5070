#![forbid(unsafe_code)]

//! Rosette rendering of proof obligations.

pub mod render;

use std::path::{Path, PathBuf};

use sable_ast::Node;
use sable_codegen::{CodeBuilder, CodegenError, Definition, Dialect, EquivalenceStyle, WholeObjectCheck};
use sable_proof::{Invariant, Seed, Side};

const REQUIRES: [&str; 3] = ["eval.rkt", "indistinguishable.rkt", "print.rkt"];

pub struct Rosette {
    root: PathBuf,
}

impl Rosette {
    /// `root` is the directory holding the Rosette interpreter.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CodegenError> {
        let root = root.into();
        tracing::debug!(root = %root.display(), "rosette backend ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Invariants are global `EquivalenceInvariant` values wrapping a predicate
/// over both contexts and both addresses.
fn invariant_global(out: &mut CodeBuilder, prefix: &str, lines: &[String]) -> String {
    let name = out.fresh(prefix);
    let body: Vec<String> = lines.iter().map(|l| format!("    {l}")).collect();
    out.emit_global(
        format!(
            "(define {name}\n  (EquivalenceInvariant (lambda (ctx1 ctx2 addr1 addr2)\n{})))",
            body.join("\n")
        ),
        None,
    );
    name
}

fn side_check(side: Side, expr: &Node, test: &str) -> Result<Vec<String>, CodegenError> {
    let (ctx, addr) = match side {
        Side::Lhs => ("ctx1", "addr1"),
        Side::Rhs => ("ctx2", "addr2"),
    };
    Ok(vec![
        format!("(define ctx (Context-with-ths {ctx} {addr}))"),
        format!("(match-define (cons ret _) (Eval {} ctx))", render::term(expr)?),
        test.to_string(),
    ])
}

impl Dialect for Rosette {
    fn name(&self) -> &'static str {
        "rosette"
    }

    fn extension(&self) -> &'static str {
        "rkt"
    }

    fn term(&self, node: &Node) -> Result<String, CodegenError> {
        render::term(node)
    }

    fn empty_context(&self) -> String {
        "(EmptyContext)".to_string()
    }

    fn seeded_context(&self, seed: &Seed) -> String {
        format!(
            "(Context-with-objs (EmptyContext) (list (cons 0 (Object (list (cons '{} (Int {})))))))",
            seed.name, seed.value
        )
    }

    fn bind(&self, name: &str, value: &str) -> String {
        format!("(define {name} {value})")
    }

    fn eval(&self, ret: Option<&str>, ctx_out: Option<&str>, expr: &str, ctx: &str) -> String {
        format!(
            "(match-define (cons {} {}) (Eval {expr} {ctx} FUEL))",
            ret.unwrap_or("_"),
            ctx_out.unwrap_or("_")
        )
    }

    fn assert_int(&self, value: &str, n: i64) -> String {
        format!("(check-assert (equal? {value} (Int {n})))")
    }

    fn assert_kind(&self, value: &str, kind: &str) -> String {
        format!("(check-assert ({kind}? {value}))")
    }

    fn trace(&self, expr: &str, value: &str) -> Vec<String> {
        vec![format!(
            "(print-expr {expr}) (display \" ==> \") (print-value {value}) (display \"\\n\")"
        )]
    }

    fn admit(&self, lhs: &str, rhs: &str) -> Vec<String> {
        vec![
            "; this goal is admitted".to_string(),
            format!("(check-proof (AdmitProof {lhs} {rhs}))"),
        ]
    }

    fn valid_rewrite(&self, ctx: &str, lhs: &str, rhs: &str, e1: &str, e2: &str, assumptions: &str) -> String {
        format!("(check-proof (ValidRewrite {lhs} {rhs} {ctx} {e1} {e2} {assumptions}))")
    }

    fn pair_list(&self, pairs: &[(String, String)]) -> String {
        let items: Vec<String> = pairs.iter().map(|(l, r)| format!("(cons {l} {r})")).collect();
        render::list(&items)
    }

    fn invariant(&self, out: &mut CodeBuilder, inv: &Invariant) -> Result<String, CodegenError> {
        let (prefix, lines) = match inv {
            Invariant::True => ("true_invariant", vec!["#t".to_string()]),
            Invariant::False => ("false_invariant", vec!["#f".to_string()]),
            Invariant::Equal { lhs, rhs } => (
                "equal_invariant",
                vec![
                    "(define (extend-with tag val ctx) (Context-with-scope ctx (assoc-set tag val (Context-scope ctx))))"
                        .to_string(),
                    "(define ctx1* (extend-with '_lhs (Ref addr1) ctx1))".to_string(),
                    "(define ctx2* (extend-with '_rhs (Ref addr2) ctx2))".to_string(),
                    format!("(match-define (cons lhs* _) (Eval {} ctx1*))", render::term(lhs)?),
                    format!("(match-define (cons rhs* _) (Eval {} ctx2*))", render::term(rhs)?),
                    "(equal? lhs* rhs*)".to_string(),
                ],
            ),
            Invariant::Valid { side, expr } => ("valid_invariant", side_check(*side, expr, "(not (Error? ret))")?),
            Invariant::Ref { side, expr } => ("ref_invariant", side_check(*side, expr, "(Ref? ret)")?),
            Invariant::Int { side, expr } => ("int_invariant", side_check(*side, expr, "(Int? ret)")?),
            Invariant::Universal { args, body } => {
                let formals = args.iter().map(render::term).collect::<Result<Vec<_>, _>>()?;
                let params = out.fresh("args");
                let scope = out.fresh("scope");
                out.emit_global(format!("(define {params} {})", render::list(&formals)), None);
                out.emit_global(
                    format!("(define {scope} (for/list ([v {params}]) (cons (EVar-name v) (HavocArg v))))"),
                    None,
                );
                (
                    "invariant",
                    vec![
                        format!("(define body {})", render::term(body)?),
                        format!("(define qvs (symbolics {scope}))"),
                        format!("(match-define (cons retL _) (Call_With_Scope body ctx1 {scope} addr1 FUEL))"),
                        format!("(match-define (cons retR _) (Call_With_Scope body ctx2 {scope} addr2 FUEL))"),
                        "(forall qvs (and (not (Error? retL)) (not (Error? retR))))".to_string(),
                    ],
                )
            }
        };
        Ok(invariant_global(out, prefix, &lines))
    }

    fn equivalence_style(&self) -> EquivalenceStyle<'_> {
        EquivalenceStyle::WholeObject(self)
    }

    fn frame(&self, def: &Definition) -> String {
        let params: String = def.params.iter().map(|p| format!(" {}", p.name)).collect();
        let body: Vec<String> = def.lines.iter().map(|l| format!("  {l}")).collect();
        format!("(define ({}{params})\n{})", def.name, body.join("\n"))
    }

    fn prelude(&self) -> String {
        let requires: Vec<String> = REQUIRES
            .iter()
            .map(|file| {
                let path = self.root.join(file).display().to_string();
                format!("(require (file \"{}\"))", path.replace('\\', "\\\\"))
            })
            .collect();
        format!("#lang rosette\n\n{}", requires.join("\n"))
    }

    fn entry_point(&self, run: &[String]) -> Vec<String> {
        run.iter().map(|name| format!("({name})")).collect()
    }
}

/// The interpreter's `Equivalent` check havocs both objects itself.
impl WholeObjectCheck for Rosette {
    fn equivalent(&self, ctx: &str, lhs: &str, rhs: &str, invariants: &[String]) -> Vec<String> {
        vec![
            format!("(define invariants {})", render::list(invariants)),
            format!("(check-proof (Equivalent {ctx} {lhs} {rhs} invariants))"),
        ]
    }
}
