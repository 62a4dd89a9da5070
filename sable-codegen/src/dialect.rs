#![forbid(unsafe_code)]

use sable_ast::Node;
use sable_proof::{Invariant, Seed};

use crate::builder::{CodeBuilder, Definition};
use crate::error::CodegenError;
use crate::template::Templates;

/// Target syntax for one verifier backend.
///
/// A dialect only renders text. Which definitions exist and what they assert
/// is decided by [`crate::ObligationEmitter`].
pub trait Dialect {
    /// Backend name as used on the command line, e.g. `dafny`.
    fn name(&self) -> &'static str;

    /// Extension of the generated program file, without the dot.
    fn extension(&self) -> &'static str;

    // Terms.
    /// Render an expression; surface nodes have no rendering and are an error.
    fn term(&self, node: &Node) -> Result<String, CodegenError>;
    fn empty_context(&self) -> String;
    fn seeded_context(&self, seed: &Seed) -> String;

    // Statements.
    fn bind(&self, name: &str, value: &str) -> String;
    /// Evaluate `expr` in `ctx`, binding the result and/or the new context.
    fn eval(&self, ret: Option<&str>, ctx_out: Option<&str>, expr: &str, ctx: &str) -> String;
    fn assert_int(&self, value: &str, n: i64) -> String;
    fn assert_kind(&self, value: &str, kind: &str) -> String;
    /// Print `expr ==> value`.
    fn trace(&self, expr: &str, value: &str) -> Vec<String>;
    fn admit(&self, lhs: &str, rhs: &str) -> Vec<String>;
    fn valid_rewrite(&self, ctx: &str, lhs: &str, rhs: &str, e1: &str, e2: &str, assumptions: &str) -> String;
    fn pair_list(&self, pairs: &[(String, String)]) -> String;

    // Invariants.
    /// Emit one invariant predicate and return its name.
    fn invariant(&self, out: &mut CodeBuilder, inv: &Invariant) -> Result<String, CodegenError>;

    /// How equivalence obligations are discharged in this backend.
    fn equivalence_style(&self) -> EquivalenceStyle<'_>;

    // Program structure.
    fn frame(&self, def: &Definition) -> String;
    fn prelude(&self) -> String;
    /// Items appended after every definition that execute the run list.
    fn entry_point(&self, run: &[String]) -> Vec<String>;
}

pub enum EquivalenceStyle<'a> {
    /// One lemma per shared method, instantiated from template snippets, and a
    /// final proof that uses every lemma.
    MethodLemmas(&'a dyn LemmaSyntax),
    /// A single library check over both objects and the list of invariants.
    WholeObject(&'a dyn WholeObjectCheck),
}

/// What the per-method lemma style needs beyond [`Dialect`].
pub trait LemmaSyntax {
    fn templates(&self) -> &Templates;

    /// Emit a predicate that holds when every named invariant holds.
    fn conjunction(&self, out: &mut CodeBuilder, names: &[String]) -> Result<String, CodegenError>;

    // Lemma arguments, for template substitution.
    /// Binders that quantify over `vars`.
    fn binders(&self, vars: &[String]) -> String;
    /// `vars` appended to a parameter list that already has parameters.
    fn param_tail(&self, vars: &[String]) -> String;
    /// `vars` as a target-language list value.
    fn value_list(&self, vars: &[String]) -> String;
    /// `vars` as call arguments.
    fn call_args(&self, vars: &[String]) -> String;
}

pub trait WholeObjectCheck {
    /// Lines asserting that `lhs` and `rhs`, each run after `ctx`, are
    /// equivalent under every named invariant.
    fn equivalent(&self, ctx: &str, lhs: &str, rhs: &str, invariants: &[String]) -> Vec<String>;
}
