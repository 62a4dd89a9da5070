#![forbid(unsafe_code)]

use sable_analysis::ObjectInfo;
use sable_ast::{Node, NodeKind};
use sable_proof::{Equivalence, Expectation, Invariant, Obligation, Seed};

use crate::builder::{CodeBuilder, DefKind};
use crate::dialect::{Dialect, EquivalenceStyle, LemmaSyntax};
use crate::error::CodegenError;

/// Translates obligations into definitions, one compile at a time.
///
/// Every backend goes through the same mapping here, so the facts a program
/// asserts do not depend on the dialect it is written in.
pub struct ObligationEmitter<D: Dialect> {
    dialect: D,
    out: CodeBuilder,
}

impl<D: Dialect> ObligationEmitter<D> {
    pub fn new(dialect: D) -> Self {
        Self {
            dialect,
            out: CodeBuilder::new(),
        }
    }

    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    pub fn emit(&mut self, ob: &Obligation) -> Result<(), CodegenError> {
        tracing::debug!(backend = self.dialect.name(), kind = ob.kind_name(), "emit obligation");
        match ob {
            Obligation::Assertion { program, condition } => self.assertion(program, condition),
            Obligation::Equivalence(eq) => self.equivalence(eq),
            Obligation::Admit { lhs, rhs, context } => self.admit(lhs, rhs, context),
            Obligation::Rewrite {
                lhs,
                rhs,
                context,
                e1,
                e2,
                assumptions,
            } => self.rewrite(lhs, rhs, context, e1, e2, assumptions),
            Obligation::Run {
                terms,
                seed,
                expect,
            } => self.run(terms, seed.as_ref(), expect.as_ref()),
        }
    }

    pub fn emit_all(&mut self, obs: &[Obligation]) -> Result<(), CodegenError> {
        obs.iter().try_for_each(|ob| self.emit(ob))
    }

    /// The assembled program text.
    pub fn finish(self) -> Result<String, CodegenError> {
        self.out.assemble(&self.dialect)
    }

    fn assertion(&mut self, program: &Node, condition: &Node) -> Result<(), CodegenError> {
        let d = &self.dialect;
        let prog = self.out.fresh("prog");
        let ctx = self.out.fresh("ctx");
        let ret = self.out.fresh("ret");
        let cond = self.out.fresh("cond");
        self.out.begin(DefKind::Method, "assertion", vec![], None)?;
        self.out.emit([
            d.bind(&prog, &d.term(program)?),
            d.eval(None, Some(&ctx), &prog, &d.empty_context()),
            d.bind(&cond, &d.term(condition)?),
            d.eval(Some(&ret), None, &cond, &ctx),
            d.assert_int(&ret, 1),
        ])?;
        self.out.end(true)?;
        Ok(())
    }

    fn equivalence(&mut self, eq: &Equivalence) -> Result<(), CodegenError> {
        let d = &self.dialect;
        let mut names = Vec::with_capacity(eq.invariants.len().max(1));
        for inv in &eq.invariants {
            names.push(d.invariant(&mut self.out, inv)?);
        }
        if names.is_empty() {
            names.push(d.invariant(&mut self.out, &Invariant::True)?);
        }

        match d.equivalence_style() {
            EquivalenceStyle::MethodLemmas(syntax) => method_lemmas(&mut self.out, d, syntax, eq, names),
            EquivalenceStyle::WholeObject(check) => {
                self.out.begin(DefKind::Method, "equivalent", vec![], None)?;
                let ctx = self.out.fresh("ctx");
                let lhs = self.out.fresh("lhs");
                let rhs = self.out.fresh("rhs");
                self.out.emit([
                    d.bind(&ctx, &d.term(&eq.context)?),
                    d.bind(&lhs, &d.term(&eq.lhs)?),
                    d.bind(&rhs, &d.term(&eq.rhs)?),
                ])?;
                self.out.emit(eq.verbatim.lines().filter(|l| !l.trim().is_empty()))?;
                self.out.emit(check.equivalent(&ctx, &lhs, &rhs, &names))?;
                self.out.end(true)?;
                Ok(())
            }
        }
    }

    fn admit(&mut self, lhs: &Node, rhs: &Node, context: &Node) -> Result<(), CodegenError> {
        let d = &self.dialect;
        self.out.begin(DefKind::Method, "admitted", vec![], None)?;
        let l = self.out.fresh("lhs");
        let r = self.out.fresh("rhs");
        let lhs_prog = Node::seq(context.clone(), lhs.clone());
        let rhs_prog = Node::seq(context.clone(), rhs.clone());
        self.out.emit([d.bind(&l, &d.term(&lhs_prog)?), d.bind(&r, &d.term(&rhs_prog)?)])?;
        self.out.emit(d.admit(&l, &r))?;
        self.out.end(true)?;
        Ok(())
    }

    fn rewrite(
        &mut self,
        lhs: &Node,
        rhs: &Node,
        context: &Node,
        e1: &Node,
        e2: &Node,
        assumptions: &[(Node, Node)],
    ) -> Result<(), CodegenError> {
        let d = &self.dialect;
        self.out.begin(DefKind::Method, "validrewrite", vec![], None)?;
        let ctx = self.out.fresh("ctx");
        let l = self.out.fresh("lhs");
        let r = self.out.fresh("rhs");
        let assumed = self.out.fresh("assumptions");

        // An assumption holds in both directions.
        let mut pairs = Vec::with_capacity(assumptions.len() * 2);
        for (a, b) in assumptions {
            pairs.push((d.term(a)?, d.term(b)?));
        }
        for (a, b) in assumptions {
            pairs.push((d.term(b)?, d.term(a)?));
        }

        self.out.emit([
            d.bind(&ctx, &d.term(context)?),
            d.bind(&l, &d.term(lhs)?),
            d.bind(&r, &d.term(rhs)?),
            d.bind(&assumed, &d.pair_list(&pairs)),
            d.valid_rewrite(&ctx, &l, &r, &d.term(e1)?, &d.term(e2)?, &assumed),
        ])?;
        self.out.end(true)?;
        Ok(())
    }

    fn run(&mut self, terms: &[Node], seed: Option<&Seed>, expect: Option<&Expectation>) -> Result<(), CodegenError> {
        let d = &self.dialect;
        let initial = match seed {
            Some(seed) => d.seeded_context(seed),
            None => d.empty_context(),
        };

        self.out.begin(DefKind::Method, "run", vec![], None)?;
        let mut ctx = self.out.fresh("initctx");
        self.out.emit([d.bind(&ctx, &initial)])?;

        let mut last = None;
        for term in terms {
            let expr = self.out.fresh("expr");
            let ret = self.out.fresh("ret");
            let next = self.out.fresh("ctx");
            self.out.emit([d.bind(&expr, &d.term(term)?), d.eval(Some(&ret), Some(&next), &expr, &ctx)])?;
            self.out.emit(d.trace(&expr, &ret))?;
            ctx = next;
            last = Some(ret);
        }

        match (expect, last) {
            (Some(Expectation::Int(n)), Some(ret)) => self.out.emit([d.assert_int(&ret, *n)])?,
            (Some(Expectation::Kind(kind)), Some(ret)) => self.out.emit([d.assert_kind(&ret, kind)])?,
            (Some(expect), None) => {
                tracing::warn!(%expect, "run has no terms; expectation not checked");
            }
            (None, _) => {}
        }
        self.out.end(true)?;
        Ok(())
    }
}

/// One lemma per method both sides share with equal arity, then a proof that
/// uses them all under the conjunction of `names`.
fn method_lemmas<D: Dialect>(
    out: &mut CodeBuilder,
    d: &D,
    syntax: &dyn LemmaSyntax,
    eq: &Equivalence,
    mut names: Vec<String>,
) -> Result<(), CodegenError> {
    let info = ObjectInfo::gather(&[&eq.context, &eq.lhs, &eq.rhs])?;
    let proof = out.fresh("equivalent");
    let prefix = d.term(&eq.context)?;
    let lhs = d.term(&eq.lhs)?;
    let rhs = d.term(&eq.rhs)?;
    let invariant = if names.len() == 1 {
        names.remove(0)
    } else {
        syntax.conjunction(out, &names)?
    };

    let templates = syntax.templates();
    let mut uses = Vec::new();
    if let (Some(left), Some(right)) = (info.methods_of(&eq.lhs), info.methods_of(&eq.rhs)) {
        // BTreeMap iteration keeps lemma names sorted by method.
        for (method, decl) in left {
            let count = arity(decl);
            if right.get(method).map(arity) != Some(count) {
                tracing::debug!(%method, "method not shared with matching arity; no lemma");
                continue;
            }
            let lemma = format!("{proof}_{method}");
            let vars: Vec<String> = (0..count).map(|_| out.fresh("v")).collect();
            let binders = syntax.binders(&vars);
            let values = syntax.value_list(&vars);
            let tail = syntax.param_tail(&vars);
            let call_args = syntax.call_args(&vars);

            let text = templates.get("method_proof")?.substitute(&[
                ("proof", lemma.as_str()),
                ("method", method.as_str()),
                ("prefix", prefix.as_str()),
                ("lhs", lhs.as_str()),
                ("rhs", rhs.as_str()),
                ("cons_args", values.as_str()),
                ("args", tail.as_str()),
                ("invariant", invariant.as_str()),
                ("body", eq.verbatim.as_str()),
            ])?;
            out.emit_global(text, None);

            let snippet = if vars.is_empty() {
                "lemma_use_noargs"
            } else {
                "lemma_use_args"
            };
            uses.push(templates.get(snippet)?.substitute(&[
                ("proof", lemma.as_str()),
                ("method", method.as_str()),
                ("bvs", binders.as_str()),
                ("cons_args", values.as_str()),
                ("args", call_args.as_str()),
                ("invariant", invariant.as_str()),
            ])?);
        }
    }

    let body = uses.join("\n");
    let text = templates.get("equivalence_proof")?.substitute(&[
        ("proof", proof.as_str()),
        ("prefix", prefix.as_str()),
        ("lhs", lhs.as_str()),
        ("rhs", rhs.as_str()),
        ("invariant", invariant.as_str()),
        ("body", body.as_str()),
    ])?;
    out.emit_global(text, Some(&proof));
    Ok(())
}

/// Compile `obs` in order into one program.
pub fn compile<D: Dialect>(dialect: D, obs: &[Obligation]) -> Result<String, CodegenError> {
    let mut emitter = ObligationEmitter::new(dialect);
    emitter.emit_all(obs)?;
    emitter.finish()
}

fn arity(method: &Node) -> usize {
    match &method.kind {
        NodeKind::Method { args, .. } => args.len(),
        _ => 0,
    }
}
