//! Compatibility and leniency switches for an assembly run.

use clap::ValueEnum;

/// How a source line is split into label, mnemonic and operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Tokenizer {
    /// A label is present only when the line starts in column 0.
    #[default]
    Columns,
    /// Three or more tokens mean `LABEL MNEMONIC OPERAND`, fewer mean
    /// `MNEMONIC [OPERAND]`. A labeled line without operand is misread.
    Positional,
}

/// How the start address of each Text record is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TextAddressing {
    /// Records start at their first fragment's address and reservations
    /// close the pending record.
    #[default]
    Tracked,
    /// First record starts at the program start, every flush moves the next
    /// record's address forward by 3.
    FixedIncrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SymbolPolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssemblerOptions {
    pub tokenizer: Tokenizer,
    pub text_addressing: TextAddressing,
    /// Lenient resolves unknown operand symbols to address 0.
    pub undefined_symbols: SymbolPolicy,
    /// Lenient keeps the first definition and ignores the rest.
    pub duplicate_labels: SymbolPolicy,
}

impl AssemblerOptions {
    /// Positional tokens, a fixed 3 byte step between Text records and
    /// lenient symbol handling. Records still flush before a fragment would
    /// overflow them, and operand addresses are padded to 4 digits.
    pub fn compatible() -> Self {
        Self {
            tokenizer: Tokenizer::Positional,
            text_addressing: TextAddressing::FixedIncrement,
            undefined_symbols: SymbolPolicy::Lenient,
            duplicate_labels: SymbolPolicy::Lenient,
        }
    }

    pub fn strict() -> Self {
        Self {
            undefined_symbols: SymbolPolicy::Strict,
            duplicate_labels: SymbolPolicy::Strict,
            ..Self::default()
        }
    }
}
