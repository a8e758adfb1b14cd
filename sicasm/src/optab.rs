use std::{collections::HashMap, str::FromStr};

use once_cell::sync::Lazy;

use crate::error::{AsmError, Result};

static SIC_OPCODES: Lazy<OpcodeTable> = Lazy::new(|| {
    [
        ("ADD", 0x18u8),
        ("AND", 0x40),
        ("COMP", 0x28),
        ("DIV", 0x24),
        ("J", 0x3C),
        ("JEQ", 0x30),
        ("JGT", 0x34),
        ("JLT", 0x38),
        ("JSUB", 0x48),
        ("LDA", 0x00),
        ("LDCH", 0x50),
        ("LDL", 0x08),
        ("LDX", 0x04),
        ("MUL", 0x20),
        ("OR", 0x44),
        ("RD", 0xD8),
        ("RSUB", 0x4C),
        ("STA", 0x0C),
        ("STCH", 0x54),
        ("STL", 0x14),
        ("STSW", 0xE8),
        ("STX", 0x10),
        ("SUB", 0x1C),
        ("TD", 0xE0),
        ("TIX", 0x2C),
        ("WD", 0xDC),
    ]
    .into_iter()
    .collect()
});

/// Mnemonic to operation code. Lookups are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpcodeTable {
    opcodes: HashMap<String, u8>,
}

impl OpcodeTable {
    /// The standard SIC instruction set.
    pub fn sic() -> Self {
        SIC_OPCODES.clone()
    }

    pub fn get(&self, mnemonic: &str) -> Option<u8> {
        self.opcodes.get(mnemonic).copied()
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        self.opcodes.contains_key(mnemonic)
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u8)> for OpcodeTable {
    fn from_iter<T: IntoIterator<Item = (S, u8)>>(iter: T) -> Self {
        Self {
            opcodes: iter
                .into_iter()
                .map(|(mnemonic, opcode)| (mnemonic.into(), opcode))
                .collect(),
        }
    }
}

/// Parses `MNEMONIC HEX` lines. Blank lines and `.` comments are skipped,
/// columns after the opcode are ignored.
impl FromStr for OpcodeTable {
    type Err = AsmError;

    fn from_str(s: &str) -> Result<Self> {
        let mut opcodes = HashMap::new();

        for (line_no, line) in s.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(mnemonic) = parts.next().filter(|m| !m.starts_with('.')) else {
                continue;
            };

            let malformed = || AsmError::MalformedOpcodeTable {
                line: line_no + 1,
                text: line.to_owned(),
            };

            let hex = parts.next().ok_or_else(malformed)?;
            if hex.len() > 2 {
                return Err(malformed());
            }
            let opcode = u8::from_str_radix(hex, 16).map_err(|_| malformed())?;

            opcodes.insert(mnemonic.to_owned(), opcode);
        }

        Ok(Self { opcodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn parse_table() -> Result<()> {
        let table: OpcodeTable = "
. standard loads
LDA   00
STA\t0C   store accumulator

JSUB  48
"
        .parse()?;

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("LDA"), Some(0x00));
        assert_eq!(table.get("STA"), Some(0x0C));
        assert_eq!(table.get("JSUB"), Some(0x48));
        assert_eq!(table.get("lda"), None);

        Ok(())
    }

    #[test]
    fn reject_bad_opcode() {
        let err = "LDA 00\nSTA ZZ".parse::<OpcodeTable>().unwrap_err();
        assert_eq!(
            err,
            AsmError::MalformedOpcodeTable {
                line: 2,
                text: "STA ZZ".into()
            }
        );

        assert!("LDA".parse::<OpcodeTable>().is_err());
        assert!("LDA 100".parse::<OpcodeTable>().is_err());
    }

    #[test]
    fn empty_table() -> Result<()> {
        let table: OpcodeTable = "\n  \n. nothing here\n".parse()?;
        assert!(table.is_empty());
        Ok(())
    }

    #[test]
    fn builtin_table() {
        let table = OpcodeTable::sic();
        assert_eq!(table.len(), 26);
        assert_eq!(table.get("RSUB"), Some(0x4C));
        assert!(!table.contains("WORD"));
    }
}
