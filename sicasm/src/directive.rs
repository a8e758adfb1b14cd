use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::optab::OpcodeTable;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Assembler {
    START,
    END,
    BYTE,
    WORD,
    RESW,
    RESB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Assembler(Assembler),
    Instruction,
}

impl Directive {
    /// Assembler directives take precedence over the opcode table. Any mnemonic
    /// beginning with `BYTE` is a `BYTE` directive.
    pub fn classify(mnemonic: &str, optab: &OpcodeTable) -> Option<Self> {
        if let Ok(asm) = Assembler::from_str(mnemonic) {
            Some(Self::Assembler(asm))
        } else if mnemonic.starts_with("BYTE") {
            Some(Self::Assembler(Assembler::BYTE))
        } else if optab.contains(mnemonic) {
            Some(Self::Instruction)
        } else {
            None
        }
    }
}

/// Operand of a `BYTE` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// `C'EOF'`, one byte per ASCII character.
    Chars(String),
    /// `X'F1'`, one byte per pair of hex digits.
    Hex(String),
}

impl Constant {
    pub fn parse(operand: &str) -> Option<Self> {
        if let Some(chars) = quoted(operand, "C'") {
            (!chars.is_empty() && chars.is_ascii()).then(|| Self::Chars(chars.to_owned()))
        } else if let Some(digits) = quoted(operand, "X'") {
            (!digits.is_empty()
                && digits.len() % 2 == 0
                && digits.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| Self::Hex(digits.to_owned()))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Constant::Chars(chars) => chars.len(),
            Constant::Hex(digits) => digits.len() / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Constant::Chars(chars) => chars.bytes().collect(),
            Constant::Hex(digits) => digits
                .as_bytes()
                .chunks(2)
                .filter_map(|pair| std::str::from_utf8(pair).ok())
                .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
                .collect(),
        }
    }
}

fn quoted<'a>(operand: &'a str, prefix: &str) -> Option<&'a str> {
    operand.strip_prefix(prefix)?.strip_suffix('\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify() {
        let optab = OpcodeTable::sic();
        assert_eq!(
            Directive::classify("RESW", &optab),
            Some(Directive::Assembler(Assembler::RESW))
        );
        assert_eq!(
            Directive::classify("BYTE", &optab),
            Some(Directive::Assembler(Assembler::BYTE))
        );
        assert_eq!(
            Directive::classify("BYTEC", &optab),
            Some(Directive::Assembler(Assembler::BYTE))
        );
        assert_eq!(
            Directive::classify("LDA", &optab),
            Some(Directive::Instruction)
        );
        assert_eq!(Directive::classify("lda", &optab), None);
        assert_eq!(Directive::classify("FLOAT", &optab), None);
    }

    #[test]
    fn constants() {
        let eof = Constant::parse("C'EOF'").unwrap();
        assert_eq!(eof.len(), 3);
        assert_eq!(eof.to_bytes(), vec![0x45, 0x4F, 0x46]);

        let device = Constant::parse("X'F1'").unwrap();
        assert_eq!(device.len(), 1);
        assert_eq!(device.to_bytes(), vec![0xF1]);

        assert_eq!(
            Constant::parse("X'0a0B'").map(|c| c.to_bytes()),
            Some(vec![0x0A, 0x0B])
        );
    }

    #[test]
    fn malformed_constants() {
        for operand in ["C''", "X''", "X'ABC'", "X'GG'", "'EOF'", "C'EOF", "1A", "-"] {
            assert_eq!(Constant::parse(operand), None, "{}", operand);
        }
    }
}
