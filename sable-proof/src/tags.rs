#![forbid(unsafe_code)]

//! `// TAG: value` comment lines that configure how a script is checked.
//!
//! | tag | meaning |
//! |---|---|
//! | `EXPECT` | expected result of a run |
//! | `CONTEXT` | `name = value` seed for a run |
//! | `XFAIL` | backend name (or `*`) expected to fail |
//! | `SKIP` | backend name (or `*`) to skip |

use std::collections::BTreeMap;

use crate::error::ProofError;
use crate::obligation::{Expectation, Seed};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptTags {
    tags: BTreeMap<String, String>,
}

impl ScriptTags {
    /// Later occurrences of a tag replace earlier ones.
    pub fn parse(src: &str) -> Self {
        let mut tags = BTreeMap::new();
        for line in src.lines() {
            if let Some((tag, value)) = parse_tag_line(line) {
                tags.insert(tag.to_string(), value.to_string());
            }
        }
        Self { tags }
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    pub fn expect(&self) -> Option<Expectation> {
        self.get("EXPECT").and_then(Expectation::parse)
    }

    pub fn context(&self) -> Result<Option<Seed>, ProofError> {
        self.get("CONTEXT").map(str::parse).transpose()
    }

    pub fn is_xfail(&self, backend: &str) -> bool {
        self.get("XFAIL").is_some_and(|v| applies(v, backend))
    }

    pub fn is_skipped(&self, backend: &str) -> bool {
        self.get("SKIP").is_some_and(|v| applies(v, backend))
    }
}

fn applies(value: &str, backend: &str) -> bool {
    let value = value.trim();
    value == "*" || value.eq_ignore_ascii_case(backend)
}

/// `//<ws>TAG:<ws>value` at the very start of a line; `TAG` is uppercase ASCII.
fn parse_tag_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("//")?.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let (tag, rest) = rest.split_at(end);
    let value = rest.strip_prefix(':')?;
    Some((tag, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_tags_from_comment_lines() {
        let src = "// EXPECT: 11\n//CONTEXT: k = 4\n// XFAIL: rosette\nx = 5 // TRAILING: no\n  // INDENTED: no\n";
        let tags = ScriptTags::parse(src);
        assert_eq!(tags.expect(), Some(Expectation::Int(11)));
        assert_eq!(
            tags.context().expect("seed"),
            Some(Seed {
                name: "k".to_string(),
                value: 4
            })
        );
        assert!(tags.is_xfail("rosette"));
        assert!(!tags.is_xfail("dafny"));
        assert!(tags.get("TRAILING").is_none());
        assert!(tags.get("INDENTED").is_none());
    }

    #[test]
    fn star_applies_to_every_backend() {
        let tags = ScriptTags::parse("// SKIP: *");
        assert!(tags.is_skipped("dafny") && tags.is_skipped("rosette"));
    }

    #[test]
    fn plain_comments_are_not_tags() {
        let tags = ScriptTags::parse("// just a note: hi\n// lowercase: x");
        assert_eq!(tags, ScriptTags::default());
    }
}
