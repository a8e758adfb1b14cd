use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
pub use serde_json::Error;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SdbLine {
    pub address: u32,
    pub text: String,
    pub line_number: usize,
}

/// Debug sidecar written next to an assembled object program.
///
/// Maps every listing row back to the source line it came from and keeps the
/// symbol table in definition order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Sdb {
    pub name: String,
    pub start: u32,
    pub length: u32,
    pub lines: Vec<SdbLine>,
    pub labels: IndexMap<String, u32>,
}

impl Sdb {
    pub fn new(name: &str, start: u32, length: u32) -> Self {
        Sdb {
            name: name.into(),
            start,
            length,
            lines: Vec::new(),
            labels: IndexMap::new(),
        }
    }

    pub fn to_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn add_label(&mut self, label: String, address: u32) {
        self.labels.insert(label, address);
    }

    pub fn add_line(&mut self, address: u32, text: String, line_number: usize) {
        self.lines.push(SdbLine {
            address,
            text,
            line_number,
        });
    }

    /// First listing line at `address`, if any.
    pub fn line_at(&self, address: u32) -> Option<&SdbLine> {
        self.lines.iter().find(|line| line.address == address)
    }

    pub fn from_string(dbg: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(dbg)
    }
}
