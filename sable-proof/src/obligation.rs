#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use sable_ast::{span, Node};

use crate::error::ProofError;
use crate::invariant::Invariant;

/// One fact a backend program must state and the verifier must discharge.
#[derive(Clone, Debug, PartialEq)]
pub enum Obligation {
    /// After running `program` from an empty context, `condition` evaluates to 1.
    Assertion { program: Node, condition: Node },
    Equivalence(Equivalence),
    /// Deliberately unproven goal.
    Admit { lhs: Node, rhs: Node, context: Node },
    /// `lhs` rewrites to `rhs` by replacing `e1` with `e2`.
    Rewrite {
        lhs: Node,
        rhs: Node,
        context: Node,
        e1: Node,
        e2: Node,
        /// Standing assumptions in declaration order, one orientation each.
        assumptions: Vec<(Node, Node)>,
    },
    /// Evaluate `terms` in order and trace each result.
    Run {
        terms: Vec<Node>,
        seed: Option<Seed>,
        expect: Option<Expectation>,
    },
}

impl Obligation {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Obligation::Assertion { .. } => "assertion",
            Obligation::Equivalence(_) => "equivalence",
            Obligation::Admit { .. } => "admit",
            Obligation::Rewrite { .. } => "rewrite",
            Obligation::Run { .. } => "run",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Equivalence {
    pub lhs: Node,
    pub rhs: Node,
    pub context: Node,
    pub invariants: Vec<Invariant>,
    /// Backend proof text copied through unmodified.
    pub verbatim: String,
}

/// A single named integer placed in the initial execution context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seed {
    pub name: String,
    pub value: i64,
}

impl FromStr for Seed {
    type Err = ProofError;

    /// `name = value`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |message: String| ProofError {
            message,
            span: span(0, s.len()),
        };
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| bad(format!("context seed `{s}` must look like `name = value`")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(bad(format!("context seed `{s}` has no name")));
        }
        let value = value
            .trim()
            .parse::<i64>()
            .map_err(|_| bad(format!("context seed value in `{s}` is not an integer")))?;
        Ok(Seed {
            name: name.to_string(),
            value,
        })
    }
}

/// Expected result of a run: a literal integer, or a value kind such as `Error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    Int(i64),
    Kind(String),
}

impl Expectation {
    /// `None` (or an empty string) means no expectation.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s == "None" {
            return None;
        }
        Some(match s.parse::<i64>() {
            Ok(n) => Expectation::Int(n),
            Err(_) => Expectation::Kind(s.to_string()),
        })
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Int(n) => write!(f, "{n}"),
            Expectation::Kind(k) => f.write_str(k),
        }
    }
}
