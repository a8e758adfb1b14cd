use std::fmt::Display;

use indexmap::{map::Entry, IndexMap};

/// Label to address, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: IndexMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: IndexMap::new(),
        }
    }

    /// Records `label` at `address` unless it is already defined. Returns
    /// whether the definition was taken.
    pub fn define(&mut self, label: &str, address: u32) -> bool {
        match self.symbols.entry(label.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(address);
                true
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.symbols.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.symbols.contains_key(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.symbols
            .iter()
            .map(|(label, address)| (label.as_str(), *address))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, address) in self.iter() {
            writeln!(f, "{}\t{:X}", label, address)?;
        }
        Ok(())
    }
}
