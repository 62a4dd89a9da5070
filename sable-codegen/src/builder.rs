#![forbid(unsafe_code)]

use crate::dialect::Dialect;
use crate::error::CodegenError;
use crate::ident::IdGen;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefKind {
    Method,
    Function,
    Lemma,
}

impl DefKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DefKind::Method => "method",
            DefKind::Function => "function",
            DefKind::Lemma => "lemma",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// The four arguments every invariant predicate takes.
pub fn invariant_params() -> Vec<Param> {
    vec![
        Param::new("ctx1", "Context"),
        Param::new("ctx2", "Context"),
        Param::new("addr1", "Addr"),
        Param::new("addr2", "Addr"),
    ]
}

/// A named definition with a line-oriented body; dialects decide how to frame it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    pub kind: DefKind,
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Option<String>,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug)]
enum Item {
    Definition(Definition),
    Global(String),
}

/// Collects definitions for one compile.
///
/// At most one definition is open at a time. Finished definitions and global
/// text keep their emission order, and so does the run list.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    ids: IdGen,
    items: Vec<Item>,
    run: Vec<String>,
    open: Option<Definition>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        self.ids.fresh(prefix)
    }

    /// Open a definition named by a fresh identifier built from `prefix`.
    pub fn begin(
        &mut self,
        kind: DefKind,
        prefix: &str,
        params: Vec<Param>,
        returns: Option<&str>,
    ) -> Result<String, CodegenError> {
        if let Some(open) = &self.open {
            return Err(CodegenError::new(format!(
                "cannot begin a new {} while `{}` is still open",
                kind.keyword(),
                open.name
            )));
        }
        let name = self.ids.fresh(prefix);
        self.open = Some(Definition {
            kind,
            name: name.clone(),
            params,
            returns: returns.map(str::to_string),
            lines: Vec::new(),
        });
        Ok(name)
    }

    pub fn emit<I, S>(&mut self, lines: I) -> Result<(), CodegenError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| CodegenError::new("emit called with no open definition"))?;
        open.lines.extend(lines.into_iter().map(Into::into));
        Ok(())
    }

    /// Close the open definition; with `run`, also schedule it for execution.
    pub fn end(&mut self, run: bool) -> Result<String, CodegenError> {
        let def = self
            .open
            .take()
            .ok_or_else(|| CodegenError::new("end called with no open definition"))?;
        if run && !def.params.is_empty() {
            return Err(CodegenError::new(format!(
                "cannot run `{}` at top level: it takes arguments",
                def.name
            )));
        }
        let name = def.name.clone();
        if run {
            self.run.push(name.clone());
        }
        self.items.push(Item::Definition(def));
        Ok(name)
    }

    /// Append ready-made text, optionally scheduling `run` for execution.
    pub fn emit_global(&mut self, text: impl Into<String>, run: Option<&str>) {
        self.items.push(Item::Global(text.into()));
        if let Some(name) = run {
            self.run.push(name.to_string());
        }
    }

    pub fn run_list(&self) -> &[String] {
        &self.run
    }

    /// Prelude, every finished item in order, then the dialect's entry point.
    pub fn assemble<D: Dialect + ?Sized>(&self, dialect: &D) -> Result<String, CodegenError> {
        if let Some(open) = &self.open {
            return Err(CodegenError::new(format!(
                "cannot assemble while `{}` is still open",
                open.name
            )));
        }
        let mut parts = vec![dialect.prelude()];
        for item in &self.items {
            parts.push(match item {
                Item::Definition(def) => dialect.frame(def),
                Item::Global(text) => text.clone(),
            });
        }
        parts.extend(dialect.entry_point(&self.run));
        Ok(parts.join("\n\n"))
    }
}
