use thiserror::Error;

/// Everything that aborts an assembly run.
///
/// Line numbers are 1-based positions in the source text. Any of these stops
/// the run before an object program is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Invalid opcode {mnemonic} on line {line}")]
    InvalidOpcode { mnemonic: String, line: usize },
    #[error("Cannot run assembler: opcode table is not loaded")]
    OpcodeTableUnavailable,
    #[error("Malformed {field} field {value:?} on line {line}")]
    MalformedNumericField {
        field: &'static str,
        value: String,
        line: usize,
    },
    #[error("Malformed opcode table entry {text:?} on line {line}")]
    MalformedOpcodeTable { line: usize, text: String },
    /// A `BYTE` operand that is not `C'..'` with at least one ASCII character
    /// or `X'..'` with an even, non-zero number of hex digits. Such operands
    /// would otherwise get a size that disagrees with the bytes emitted.
    #[error("Malformed BYTE constant {operand} on line {line}")]
    MalformedConstant { operand: String, line: usize },
    #[error("Undefined symbol {symbol} on line {line}")]
    UndefinedSymbol { symbol: String, line: usize },
    #[error("Duplicate label {label} on line {line}")]
    DuplicateLabel { label: String, line: usize },
    #[error("Address {address:X} out of range on line {line}")]
    AddressOutOfRange { address: u64, line: usize },
}

pub type Result<T, E = AsmError> = std::result::Result<T, E>;
