#![forbid(unsafe_code)]

use std::collections::HashMap;

/// Per-prefix counters for collision-free temporaries: `v0`, `v1`, `ctx0`, ...
#[derive(Debug, Default)]
pub struct IdGen {
    counters: HashMap<String, u32>,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        let next = self.counters.entry(prefix.to_string()).or_insert(0);
        let name = format!("{prefix}{next}");
        *next += 1;
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent_per_prefix() {
        let mut ids = IdGen::new();
        assert_eq!(ids.fresh("v"), "v0");
        assert_eq!(ids.fresh("ctx"), "ctx0");
        assert_eq!(ids.fresh("v"), "v1");
        assert_eq!(IdGen::new().fresh("v"), "v0");
    }
}
