#![forbid(unsafe_code)]

//! Named snippets cut out of a backend template file.
//!
//! ```text
//! //// comment lines are dropped
//! ///< START name
//! snippet text with $key or ${key} placeholders, $$ for a dollar
//! ///< END name
//! ```

use std::collections::BTreeMap;

use crate::error::CodegenError;

/// Comment and delimiter prefixes of a template file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimiters {
    pub comment: &'static str,
    pub snippet: &'static str,
}

impl Delimiters {
    pub const SLASHES: Delimiters = Delimiters {
        comment: "////",
        snippet: "///<",
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    text: String,
}

impl Snippet {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace every placeholder; a placeholder with no value is an error.
    pub fn substitute(&self, vars: &[(&str, &str)]) -> Result<String, CodegenError> {
        let lookup = |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(|| CodegenError::new(format!("template has no value for `${key}`")))
        };

        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            rest = &rest[pos + 1..];
            if let Some(after) = rest.strip_prefix('$') {
                out.push('$');
                rest = after;
            } else if let Some(braced) = rest.strip_prefix('{') {
                let close = braced
                    .find('}')
                    .ok_or_else(|| CodegenError::new("unterminated `${` placeholder in template"))?;
                let key = &braced[..close];
                if !is_identifier(key) {
                    return Err(CodegenError::new(format!("invalid placeholder `${{{key}}}` in template")));
                }
                out.push_str(lookup(key)?);
                rest = &braced[close + 1..];
            } else {
                let len = identifier_len(rest);
                if len == 0 {
                    return Err(CodegenError::new("`$` must be followed by a name or another `$`"));
                }
                out.push_str(lookup(&rest[..len])?);
                rest = &rest[len..];
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn identifier_len(s: &str) -> usize {
    let mut len = 0;
    for (i, c) in s.char_indices() {
        let ok = c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit());
        if !ok {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && identifier_len(s) == s.len()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Templates {
    snippets: BTreeMap<String, Snippet>,
}

impl Templates {
    pub fn parse(src: &str, delims: Delimiters) -> Result<Self, CodegenError> {
        let mut snippets = BTreeMap::new();
        let mut open: Option<(String, Vec<&str>)> = None;

        for (lineno, line) in src.lines().enumerate() {
            if line.starts_with(delims.comment) {
                continue;
            }
            if let Some(rest) = line.strip_prefix(delims.snippet) {
                let bad = || {
                    CodegenError::new(format!(
                        "line {}: unrecognized template delimiter `{line}`",
                        lineno + 1
                    ))
                };
                let rest = rest.strip_prefix(' ').ok_or_else(bad)?;
                let (marker, name) = rest.split_once(' ').ok_or_else(bad)?;
                let name = name.trim_end();
                if !is_identifier(name) {
                    return Err(bad());
                }
                match (marker, open.take()) {
                    ("START", None) => open = Some((name.to_string(), Vec::new())),
                    ("START", Some((outer, _))) => {
                        return Err(CodegenError::new(format!(
                            "line {}: snippet `{name}` starts inside `{outer}`",
                            lineno + 1
                        )));
                    }
                    ("END", Some((current, lines))) if current == name => {
                        snippets.insert(current, Snippet { text: lines.join("\n") });
                    }
                    ("END", _) => {
                        return Err(CodegenError::new(format!(
                            "line {}: `END {name}` does not close an open snippet",
                            lineno + 1
                        )));
                    }
                    _ => return Err(bad()),
                }
            } else if let Some((_, lines)) = open.as_mut() {
                lines.push(line);
            }
        }

        if let Some((name, _)) = open {
            return Err(CodegenError::new(format!("snippet `{name}` is never closed")));
        }
        Ok(Self { snippets })
    }

    pub fn get(&self, name: &str) -> Result<&Snippet, CodegenError> {
        self.snippets
            .get(name)
            .ok_or_else(|| CodegenError::new(format!("unknown template snippet `{name}`")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.snippets.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "//// header comment\nignored\n///< START greet\nhello $who,\n  ${who}s pay $$5\n///< END greet\n///< START empty\n///< END empty\n";

    #[test]
    fn snippets_are_cut_between_delimiters() {
        let t = Templates::parse(SRC, Delimiters::SLASHES).expect("parse");
        assert_eq!(t.names().collect::<Vec<_>>(), vec!["empty", "greet"]);
        assert_eq!(t.get("empty").expect("empty").text(), "");
        let greet = t.get("greet").expect("greet");
        assert_eq!(
            greet.substitute(&[("who", "bob")]).expect("substitute"),
            "hello bob,\n  bobs pay $5"
        );
    }

    #[test]
    fn missing_values_and_snippets_are_errors() {
        let t = Templates::parse(SRC, Delimiters::SLASHES).expect("parse");
        let err = t.get("greet").expect("greet").substitute(&[]).unwrap_err();
        assert!(err.message.contains("`$who`"), "{err}");
        assert!(t.get("nope").unwrap_err().message.contains("unknown template snippet"));
    }

    #[test]
    fn nesting_and_mismatched_ends_are_rejected() {
        let nested = "///< START a\n///< START b\n///< END b\n///< END a\n";
        assert!(Templates::parse(nested, Delimiters::SLASHES).is_err());
        let mismatched = "///< START a\n///< END b\n";
        assert!(Templates::parse(mismatched, Delimiters::SLASHES).is_err());
        let unclosed = "///< START a\nx\n";
        assert!(Templates::parse(unclosed, Delimiters::SLASHES)
            .unwrap_err()
            .message
            .contains("never closed"));
        assert!(Templates::parse("///< BEGIN a\n", Delimiters::SLASHES).is_err());
    }

    #[test]
    fn lone_dollar_is_an_error() {
        let t = Templates::parse("///< START s\ncost: $ 5\n///< END s", Delimiters::SLASHES)
            .expect("parse");
        assert!(t.get("s").expect("s").substitute(&[]).is_err());
    }
}
