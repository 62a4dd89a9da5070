#![forbid(unsafe_code)]

use sable_analysis::annotate_immutable;
use sable_ast::{Node, NodeKind};

use crate::error::ProofError;
use crate::invariant::interpret;
use crate::obligation::{Equivalence, Expectation, Obligation, Seed};

/// An annotated script, ready to be turned into obligations.
#[derive(Clone, Debug)]
pub struct Program {
    items: Vec<Node>,
    seed: Option<Seed>,
    expect: Option<Expectation>,
}

impl Program {
    /// Parse and annotate a script.
    pub fn parse(src: &str) -> miette::Result<Self> {
        let ast = sable_parse::parse_source(src)?;
        Ok(Self::from_ast(ast)?)
    }

    /// Annotate an already parsed `TopLevel` node.
    pub fn from_ast(ast: Node) -> Result<Self, ProofError> {
        let span = ast.span;
        match annotate_immutable(ast)?.kind {
            NodeKind::TopLevel(items) => Ok(Self {
                items,
                seed: None,
                expect: None,
            }),
            other => Err(ProofError {
                message: format!("expected a top-level script, got {}", other.tag().name()),
                span,
            }),
        }
    }

    pub fn with_seed(mut self, seed: Option<Seed>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_expectation(mut self, expect: Option<Expectation>) -> Self {
        self.expect = expect;
        self
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    /// Obligations for proof mode, in source order.
    ///
    /// Every non-surface statement extends the context program; assumptions
    /// accumulate and are captured by later rewrite obligations.
    pub fn proof_obligations(&self) -> Result<Vec<Obligation>, ProofError> {
        let mut context = Node::nop();
        let mut assumptions: Vec<(Node, Node)> = Vec::new();
        let mut out = Vec::new();

        for item in &self.items {
            match &item.kind {
                NodeKind::Proof {
                    terms,
                    hints,
                    verbatims,
                } => {
                    if terms.len() < 2 || hints.len() != terms.len() || verbatims.len() != terms.len() {
                        return Err(ProofError {
                            message: format!(
                                "proof chain needs at least two terms and one annotation slot per term (terms: {}, hints: {}, verbatims: {})",
                                terms.len(),
                                hints.len(),
                                verbatims.len()
                            ),
                            span: item.span,
                        });
                    }
                    for (i, pair) in terms.windows(2).enumerate() {
                        let ob = arrow_obligation(
                            &context,
                            &pair[0],
                            &pair[1],
                            hints[i].as_ref(),
                            &verbatims[i],
                            &assumptions,
                        )?;
                        tracing::debug!(kind = ob.kind_name(), step = i, "obligation");
                        out.push(ob);
                    }
                }
                NodeKind::Assert(cond) => {
                    out.push(Obligation::Assertion {
                        program: context.clone(),
                        condition: (**cond).clone(),
                    });
                }
                NodeKind::Assume(proof) => match &proof.kind {
                    NodeKind::Proof { terms, .. } if terms.len() == 2 => {
                        assumptions.push((terms[0].clone(), terms[1].clone()));
                    }
                    _ => {
                        return Err(ProofError {
                            message: format!("assumption must relate exactly two terms: {proof}"),
                            span: item.span,
                        });
                    }
                },
                NodeKind::TopLevel(_) => {
                    return Err(ProofError {
                        message: "nested top-level container".to_string(),
                        span: item.span,
                    });
                }
                _ => context = context.then(item.clone()),
            }
        }
        Ok(out)
    }

    /// Obligations for evaluation mode: assertions in order, then one run
    /// obligation over every non-surface statement.
    pub fn evaluate_obligations(&self) -> Vec<Obligation> {
        let mut context = Node::nop();
        let mut terms = Vec::new();
        let mut out = Vec::new();

        for item in &self.items {
            match &item.kind {
                NodeKind::Assert(cond) => out.push(Obligation::Assertion {
                    program: context.clone(),
                    condition: (**cond).clone(),
                }),
                _ if item.is_surface() => {
                    tracing::debug!(tag = item.tag().name(), "ignored in evaluation mode");
                }
                _ => {
                    terms.push(item.clone());
                    context = context.then(item.clone());
                }
            }
        }

        out.push(Obligation::Run {
            terms,
            seed: self.seed.clone(),
            expect: self.expect.clone(),
        });
        out
    }
}

/// Pick the obligation for one arrow `lhs ~ [hint] rhs`.
fn arrow_obligation(
    context: &Node,
    lhs: &Node,
    rhs: &Node,
    hint: Option<&Node>,
    verbatim: &str,
    assumptions: &[(Node, Node)],
) -> Result<Obligation, ProofError> {
    if let Some(hint) = hint {
        match &hint.kind {
            NodeKind::Call { name, args, .. } if name == "Rewrite" && args.len() == 2 => {
                return Ok(Obligation::Rewrite {
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                    context: context.clone(),
                    e1: args[0].clone(),
                    e2: args[1].clone(),
                    assumptions: assumptions.to_vec(),
                });
            }
            NodeKind::Var { name, .. } if name == "Admit" => {
                return Ok(Obligation::Admit {
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                    context: context.clone(),
                });
            }
            _ => {}
        }
    }

    let invariants = interpret(hint, context, lhs, rhs)?;
    Ok(Obligation::Equivalence(Equivalence {
        lhs: lhs.clone(),
        rhs: rhs.clone(),
        context: context.clone(),
        invariants,
        verbatim: verbatim.to_string(),
    }))
}
