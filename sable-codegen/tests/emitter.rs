use sable_ast::Node;
use sable_codegen::{
    compile, invariant_params, CodeBuilder, CodegenError, DefKind, Definition, Delimiters, Dialect,
    EquivalenceStyle, LemmaSyntax, Templates, WholeObjectCheck,
};
use sable_proof::{Expectation, Invariant, Obligation, Program, Seed};

const TEMPLATES: &str = "\
///< START method_proof
lemma $proof($args) inv=$invariant call=$method($cons_args) body=[$body]
///< END method_proof
///< START lemma_use_noargs
use $proof
///< END lemma_use_noargs
///< START lemma_use_args
forall $bvs use $proof($args)
///< END lemma_use_args
///< START equivalence_proof
proof $proof: $lhs ~ $rhs after $prefix under $invariant {
$body
}
///< END equivalence_proof
";

/// Line-per-statement pseudo syntax that shows exactly what was emitted.
struct Plain {
    templates: Templates,
    whole_object: bool,
}

impl Plain {
    fn new() -> Self {
        Self {
            templates: Templates::parse(TEMPLATES, Delimiters::SLASHES).expect("templates"),
            whole_object: false,
        }
    }

    fn whole_object() -> Self {
        Self {
            whole_object: true,
            ..Self::new()
        }
    }
}

impl Dialect for Plain {
    fn name(&self) -> &'static str {
        "plain"
    }
    fn extension(&self) -> &'static str {
        "txt"
    }
    fn term(&self, node: &Node) -> Result<String, CodegenError> {
        Ok(node.to_string())
    }
    fn empty_context(&self) -> String {
        "empty".to_string()
    }
    fn seeded_context(&self, seed: &Seed) -> String {
        format!("empty[{}={}]", seed.name, seed.value)
    }
    fn bind(&self, name: &str, value: &str) -> String {
        format!("let {name} = {value}")
    }
    fn eval(&self, ret: Option<&str>, ctx_out: Option<&str>, expr: &str, ctx: &str) -> String {
        format!("eval {} {} <- {expr} in {ctx}", ret.unwrap_or("_"), ctx_out.unwrap_or("_"))
    }
    fn assert_int(&self, value: &str, n: i64) -> String {
        format!("assert {value} == {n}")
    }
    fn assert_kind(&self, value: &str, kind: &str) -> String {
        format!("assert {value} is {kind}")
    }
    fn trace(&self, expr: &str, value: &str) -> Vec<String> {
        vec![format!("trace {expr} {value}")]
    }
    fn admit(&self, lhs: &str, rhs: &str) -> Vec<String> {
        vec![format!("admit {lhs} {rhs}")]
    }
    fn valid_rewrite(&self, ctx: &str, lhs: &str, rhs: &str, e1: &str, e2: &str, assumptions: &str) -> String {
        format!("rewrite {ctx} {lhs} {rhs} {e1} {e2} {assumptions}")
    }
    fn pair_list(&self, pairs: &[(String, String)]) -> String {
        let items: Vec<String> = pairs.iter().map(|(a, b)| format!("({a}, {b})")).collect();
        format!("[{}]", items.join(", "))
    }
    fn invariant(&self, out: &mut CodeBuilder, inv: &Invariant) -> Result<String, CodegenError> {
        out.begin(DefKind::Function, "invariant", invariant_params(), Some("bool"))?;
        out.emit([inv.kind_name()])?;
        out.end(false)
    }
    fn equivalence_style(&self) -> EquivalenceStyle<'_> {
        if self.whole_object {
            EquivalenceStyle::WholeObject(self)
        } else {
            EquivalenceStyle::MethodLemmas(self)
        }
    }
    fn frame(&self, def: &Definition) -> String {
        format!("{} {}:\n  {}", def.kind.keyword(), def.name, def.lines.join("\n  "))
    }
    fn prelude(&self) -> String {
        "prelude".to_string()
    }
    fn entry_point(&self, run: &[String]) -> Vec<String> {
        vec![format!("main: {}", run.join(" "))]
    }
}

impl LemmaSyntax for Plain {
    fn templates(&self) -> &Templates {
        &self.templates
    }
    fn conjunction(&self, out: &mut CodeBuilder, names: &[String]) -> Result<String, CodegenError> {
        out.begin(DefKind::Function, "invariant", invariant_params(), Some("bool"))?;
        out.emit([names.join(" && ")])?;
        out.end(false)
    }
    fn binders(&self, vars: &[String]) -> String {
        vars.join(" ")
    }
    fn param_tail(&self, vars: &[String]) -> String {
        vars.join(", ")
    }
    fn value_list(&self, vars: &[String]) -> String {
        vars.join(", ")
    }
    fn call_args(&self, vars: &[String]) -> String {
        vars.join(", ")
    }
}

impl WholeObjectCheck for Plain {
    fn equivalent(&self, ctx: &str, lhs: &str, rhs: &str, invariants: &[String]) -> Vec<String> {
        vec![format!("equivalent {ctx} {lhs} {rhs} [{}]", invariants.join(", "))]
    }
}

fn proofs(src: &str) -> String {
    let obs = Program::parse(src)
        .expect("parse")
        .proof_obligations()
        .expect("obligations");
    compile(Plain::new(), &obs).expect("compile")
}

#[test]
fn assertion_runs_context_then_checks_condition() {
    let out = proofs("x = 6; assert x == 6");
    assert_eq!(
        out,
        "prelude\n\n\
         method assertion0:\n  \
         let prog0 = (= x 6)\n  \
         eval _ ctx0 <- prog0 in empty\n  \
         let cond0 = (call nil == x 6)\n  \
         eval ret0 _ <- cond0 in ctx0\n  \
         assert ret0 == 1\n\n\
         main: assertion0"
    );
}

#[test]
fn identical_source_compiles_to_identical_text() {
    let src = "A() { new(x=1) { get() { x } put(v) { x = v } } }\nassume a ~ b\nA() ~ A() ~ [Rewrite(a, b)] A()\nassert 1 == 1";
    assert_eq!(proofs(src), proofs(src));
}

#[test]
fn rewrite_lists_every_assumption_in_both_directions() {
    let out = proofs("assume a ~ b\np ~ [Rewrite(a, b)] q");
    assert!(
        out.contains("let assumptions0 = [(a, b), (b, a)]"),
        "{out}"
    );
    assert!(out.contains("rewrite ctx0 lhs0 rhs0 a b assumptions0"), "{out}");
}

#[test]
fn run_without_expectation_traces_each_term_and_asserts_nothing() {
    let obs = Program::parse("5+6; 7+8").expect("parse").evaluate_obligations();
    let out = compile(Plain::new(), &obs).expect("compile");
    assert_eq!(out.matches("trace ").count(), 2);
    assert!(!out.contains("assert"), "{out}");
    assert!(out.contains("eval ret1 ctx1 <- expr1 in ctx0"), "{out}");
}

#[test]
fn run_checks_expectation_against_last_value() {
    let obs = vec![Obligation::Run {
        terms: vec![Node::int(1), Node::int(2)],
        seed: Some(Seed {
            name: "k".to_string(),
            value: 4,
        }),
        expect: Some(Expectation::Kind("Error".to_string())),
    }];
    let out = compile(Plain::new(), &obs).expect("compile");
    assert!(out.contains("let initctx0 = empty[k=4]"), "{out}");
    assert!(out.ends_with("assert ret1 is Error\n\nmain: run0"), "{out}");
}

#[test]
fn equivalence_emits_sorted_lemmas_for_shared_methods() {
    let src = "\
A() { new(x=1) { zed() { x } get() { x } put(v) { x = v } only() { 0 } } }
B() { new(x=1) { put(w) { x = w } get() { x } zed(a) { a } } }
A() ~ B()";
    let out = proofs(src);
    let get = out.find("lemma equivalent0_get").expect("get lemma");
    let put = out.find("lemma equivalent0_put").expect("put lemma");
    assert!(get < put);
    assert!(!out.contains("equivalent0_zed"), "arity differs: {out}");
    assert!(!out.contains("equivalent0_only"), "{out}");
    assert!(out.contains("lemma equivalent0_put(v0) inv=invariant0 call=put(v0) body=[]"), "{out}");
    assert!(out.contains("use equivalent0_get\nforall v0 use equivalent0_put(v0)"), "{out}");
    assert!(out.ends_with("main: equivalent0"), "{out}");
}

#[test]
fn scenario_b_yields_true_invariant_and_one_lemma() {
    let src = "FooA() { new(x=1) { bar(z) { x } } }\nFooB(x) { new() { bar(z) { x } } }\nFooA() ~ FooB(1)";
    let out = proofs(src);
    assert!(out.contains("function invariant0:\n  true"), "{out}");
    assert_eq!(out.matches("lemma equivalent0_").count(), 1);
    assert!(out.contains("lemma equivalent0_bar(v0)"), "{out}");
}

#[test]
fn several_invariants_are_conjoined() {
    let out = proofs("a ~ [Equal(_lhs.x, _rhs.x) & Valid(_lhs, x)] b");
    assert!(out.contains("function invariant2:\n  invariant0 && invariant1"), "{out}");
    assert!(out.contains("under invariant2"), "{out}");
}

#[test]
fn whole_object_check_binds_both_sides_and_lists_invariants() {
    let obs = Program::parse("y = 1\na ~ [Equal(_lhs.x, _rhs.x) & Valid(_lhs, x)] b")
        .expect("parse")
        .proof_obligations()
        .expect("obligations");
    let out = compile(Plain::whole_object(), &obs).expect("compile");
    assert!(!out.contains("lemma"), "{out}");
    assert!(!out.contains("invariant2"), "{out}");
    assert!(
        out.contains(
            "method equivalent0:\n  \
             let ctx0 = (= y 1)\n  \
             let lhs0 = a\n  \
             let rhs0 = b\n  \
             equivalent ctx0 lhs0 rhs0 [invariant0, invariant1]"
        ),
        "{out}"
    );
    assert!(out.ends_with("main: equivalent0"), "{out}");
}

#[test]
fn whole_object_check_falls_back_to_true_invariant() {
    let obs = Program::parse("a ~ b").expect("parse").proof_obligations().expect("obligations");
    let out = compile(Plain::whole_object(), &obs).expect("compile");
    assert!(out.contains("function invariant0:\n  true"), "{out}");
    assert!(out.contains("equivalent ctx0 lhs0 rhs0 [invariant0]"), "{out}");
}

#[test]
fn admitted_goal_keeps_context_and_runs() {
    let out = proofs("y = 1\na ~ [Admit] b");
    assert!(out.contains("let lhs0 = (seq (= y 1) a)"), "{out}");
    assert!(out.contains("admit lhs0 rhs0"), "{out}");
    assert!(out.ends_with("main: admitted0"), "{out}");
}
