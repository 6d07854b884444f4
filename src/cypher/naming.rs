// src/cypher/naming.rs

/// Hands out fresh Cypher variable names (`this0`, `var1`, ...) for one
/// compilation. A single counter is shared by every prefix so names never
/// repeat, whichever prefix they carry.
#[derive(Debug, Clone, Default)]
pub struct VariableGenerator {
    next: usize,
}

impl VariableGenerator {
    pub fn new() -> Self {
        VariableGenerator::default()
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.next);
        self.next += 1;
        name
    }

    /// Variable for a matched node or relationship
    pub fn node(&mut self) -> String {
        self.fresh("this")
    }

    /// Variable for a hoisted value or a list-predicate binding
    pub fn value(&mut self) -> String {
        self.fresh("var")
    }
}
