use std::fmt::Display;

use log::{debug, trace, warn};

use crate::{
    directive::{Assembler, Constant, Directive},
    error::{AsmError, Result},
    line::SourceLine,
    optab::OpcodeTable,
    options::{AssemblerOptions, SymbolPolicy},
    symbols::SymbolTable,
};

/// Name written to the Header record.
pub static PROGRAM_NAME: &str = "COPY";
/// Highest address a 6 hex digit field can hold.
pub static MAX_ADDRESS: u32 = 0xFF_FFFF;

/// One processed source line with the location counter it was assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateRecord {
    pub line_no: usize,
    pub address: u32,
    pub label: Option<String>,
    pub mnemonic: String,
    pub operand: Option<String>,
    pub directive: Directive,
}

impl IntermediateRecord {
    /// The operand, or an error naming `field` when it is missing.
    pub fn expect_operand(&self, field: &'static str) -> Result<&str> {
        self.operand
            .as_deref()
            .ok_or_else(|| AsmError::MalformedNumericField {
                field,
                value: "-".into(),
                line: self.line_no,
            })
    }
}

/// Tab separated `address label mnemonic operand`, `-` for absent fields.
impl Display for IntermediateRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = self.label.as_deref().unwrap_or("-");
        let operand = self.operand.as_deref().unwrap_or("-");
        match self.directive {
            Directive::Assembler(Assembler::START) => {
                write!(f, "-\t{}\t{}\t{}", label, self.mnemonic, operand)
            }
            Directive::Assembler(Assembler::END) => write!(f, "{:X}\t-\tEND\t-", self.address),
            _ => write!(
                f,
                "{:X}\t{}\t{}\t{}",
                self.address, label, self.mnemonic, operand
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramMetadata {
    pub name: String,
    pub start: u32,
    pub length: u32,
    /// Whether an END directive closed the program.
    pub terminated: bool,
}

#[derive(Debug, Clone)]
pub struct PassOne {
    pub records: Vec<IntermediateRecord>,
    pub symbols: SymbolTable,
    pub program: ProgramMetadata,
}

impl PassOne {
    /// The intermediate listing, one row per record.
    pub fn listing(&self) -> String {
        self.records
            .iter()
            .map(|record| format!("{}\n", record))
            .collect()
    }
}

pub struct FirstPass<'a> {
    optab: &'a OpcodeTable,
    options: AssemblerOptions,
    cur_offset: u32,
    start: u32,
    symbols: SymbolTable,
    records: Vec<IntermediateRecord>,
}

impl<'a> FirstPass<'a> {
    fn new(optab: &'a OpcodeTable, options: AssemblerOptions) -> Self {
        Self {
            optab,
            options,
            cur_offset: 0,
            start: 0,
            symbols: SymbolTable::new(),
            records: Vec::new(),
        }
    }

    pub fn parse_lines(
        lines: &[&str],
        optab: &OpcodeTable,
        options: AssemblerOptions,
    ) -> Result<PassOne> {
        if optab.is_empty() {
            return Err(AsmError::OpcodeTableUnavailable);
        }

        let mut pass = FirstPass::new(optab, options);
        let mut terminated = false;

        for (line_no, line) in lines.iter().enumerate() {
            let Some(tokens) = SourceLine::tokenize(line, options.tokenizer) else {
                continue;
            };
            if pass.parse_line(line_no + 1, tokens)? == Flow::End {
                terminated = true;
                break;
            }
        }

        if !terminated {
            warn!("No END directive, program ends at {:X}", pass.cur_offset);
        }

        let program = ProgramMetadata {
            name: PROGRAM_NAME.to_owned(),
            start: pass.start,
            length: pass.cur_offset.saturating_sub(pass.start),
            terminated,
        };

        debug!(
            "Pass one: {} records, {} symbols, start {:X}, length {:X}",
            pass.records.len(),
            pass.symbols.len(),
            program.start,
            program.length
        );

        Ok(PassOne {
            records: pass.records,
            symbols: pass.symbols,
            program,
        })
    }

    fn parse_line(&mut self, line_no: usize, tokens: SourceLine<'_>) -> Result<Flow> {
        let directive = Directive::classify(tokens.mnemonic, self.optab).ok_or_else(|| {
            AsmError::InvalidOpcode {
                mnemonic: tokens.mnemonic.to_owned(),
                line: line_no,
            }
        })?;

        let record = IntermediateRecord {
            line_no,
            address: self.cur_offset,
            label: tokens.label.map(str::to_owned),
            mnemonic: tokens.mnemonic.to_owned(),
            operand: tokens.operand.map(str::to_owned),
            directive,
        };

        trace!("{:>4}: {}", line_no, record);

        match directive {
            Directive::Assembler(Assembler::START) => {
                let operand = record.expect_operand("START address")?;
                let start = u32::from_str_radix(operand, 16).map_err(|_| {
                    AsmError::MalformedNumericField {
                        field: "START address",
                        value: operand.to_owned(),
                        line: line_no,
                    }
                })?;
                if start > MAX_ADDRESS {
                    return Err(AsmError::AddressOutOfRange {
                        address: start.into(),
                        line: line_no,
                    });
                }
                self.start = start;
                self.cur_offset = start;
                self.records.push(IntermediateRecord {
                    address: start,
                    ..record
                });
                Ok(Flow::Continue)
            }
            // END only closes the program as the first token of a line
            Directive::Assembler(Assembler::END) if record.label.is_some() => {
                Err(AsmError::InvalidOpcode {
                    mnemonic: record.mnemonic,
                    line: line_no,
                })
            }
            Directive::Assembler(Assembler::END) => {
                self.records.push(record);
                Ok(Flow::End)
            }
            _ => {
                if let Some(label) = tokens.label {
                    self.define(label, line_no)?;
                }
                let size = self.size(&record)?;
                self.advance(size, line_no)?;
                self.records.push(record);
                Ok(Flow::Continue)
            }
        }
    }

    fn define(&mut self, label: &str, line_no: usize) -> Result<()> {
        if self.symbols.define(label, self.cur_offset) {
            return Ok(());
        }

        match self.options.duplicate_labels {
            SymbolPolicy::Lenient => {
                warn!("Label {} redefined on line {}, keeping first", label, line_no);
                Ok(())
            }
            SymbolPolicy::Strict => Err(AsmError::DuplicateLabel {
                label: label.to_owned(),
                line: line_no,
            }),
        }
    }

    fn size(&self, record: &IntermediateRecord) -> Result<u64> {
        Ok(match record.directive {
            Directive::Assembler(Assembler::WORD) | Directive::Instruction => 3,
            Directive::Assembler(Assembler::RESW) => 3 * decimal(record, "RESW count")?,
            Directive::Assembler(Assembler::RESB) => decimal(record, "RESB count")?,
            Directive::Assembler(Assembler::BYTE) => byte_constant(record)?.len() as u64,
            Directive::Assembler(Assembler::START | Assembler::END) => 0,
        })
    }

    fn advance(&mut self, size: u64, line_no: usize) -> Result<()> {
        let next = u64::from(self.cur_offset) + size;
        // The location counter may sit one past the last addressable byte
        if next > u64::from(MAX_ADDRESS) + 1 {
            return Err(AsmError::AddressOutOfRange {
                address: next,
                line: line_no,
            });
        }
        self.cur_offset = next as u32;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    End,
}

fn decimal(record: &IntermediateRecord, field: &'static str) -> Result<u64> {
    let operand = record.expect_operand(field)?;
    operand
        .parse::<u32>()
        .map(u64::from)
        .map_err(|_| AsmError::MalformedNumericField {
            field,
            value: operand.to_owned(),
            line: record.line_no,
        })
}

pub fn byte_constant(record: &IntermediateRecord) -> Result<Constant> {
    let operand = record.operand.as_deref().unwrap_or("-");
    Constant::parse(operand).ok_or_else(|| AsmError::MalformedConstant {
        operand: operand.to_owned(),
        line: record.line_no,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Tokenizer;
    use anyhow::Result;

    fn run_pass_one(program: &str, options: AssemblerOptions) -> crate::error::Result<PassOne> {
        let lines = program.lines().collect::<Vec<_>>();
        FirstPass::parse_lines(&lines, &OpcodeTable::sic(), options)
    }

    #[test]
    fn line_addresses() -> Result<()> {
        // Comments after are addresses of the line
        let program = r#"
COPY    START   1000
FIRST   LDA     ALPHA       . 1000
        STA     BETA        . 1003
ALPHA   WORD    5           . 1006
BETA    RESW    2           . 1009
BUF     RESB    7           . 100F
EOF     BYTE    C'EOF'      . 1016
DEV     BYTE    X'F1'       . 1019
        RSUB
        END     FIRST       . 101D
        "#;

        let pass = run_pass_one(program, AssemblerOptions::default())?;

        let addresses = pass.records.iter().map(|r| r.address).collect::<Vec<_>>();
        assert_eq!(
            addresses,
            vec![0x1000, 0x1000, 0x1003, 0x1006, 0x1009, 0x100F, 0x1016, 0x1019, 0x101A, 0x101D]
        );

        assert_eq!(pass.program.start, 0x1000);
        assert_eq!(pass.program.length, 0x1D);
        assert!(pass.program.terminated);

        assert_eq!(pass.symbols.get("FIRST"), Some(0x1000));
        assert_eq!(pass.symbols.get("BETA"), Some(0x1009));
        assert_eq!(pass.symbols.get("DEV"), Some(0x1019));
        // Program name is not a symbol
        assert_eq!(pass.symbols.get("COPY"), None);

        Ok(())
    }

    #[test]
    fn listing_rows() -> Result<()> {
        let program = "COPY START 1000\nFIRST LDA ALPHA\n RSUB\nALPHA WORD 5\n END FIRST";

        let pass = run_pass_one(program, AssemblerOptions::default())?;

        assert_eq!(
            pass.listing(),
            "-\tCOPY\tSTART\t1000\n\
             1000\tFIRST\tLDA\tALPHA\n\
             1003\t-\tRSUB\t-\n\
             1006\tALPHA\tWORD\t5\n\
             1009\t-\tEND\t-\n"
        );

        Ok(())
    }

    #[test]
    fn stop_at_end() -> Result<()> {
        let program = "COPY START 0\n LDA ALPHA\n END\n BOGUS LINE\nALPHA WORD 1";

        let pass = run_pass_one(program, AssemblerOptions::default())?;

        assert_eq!(pass.records.len(), 3);
        assert_eq!(pass.program.length, 3);
        assert!(pass.symbols.is_empty());

        Ok(())
    }

    #[test]
    fn end_in_first_column() -> Result<()> {
        let program = "COPY START 1000\nFIRST LDA ALPHA\nEND FIRST\nALPHA WORD 1";

        let pass = run_pass_one(program, AssemblerOptions::default())?;

        assert_eq!(pass.records.len(), 3);
        assert_eq!(pass.records[2].directive, Directive::Assembler(Assembler::END));
        assert_eq!(pass.records[2].operand.as_deref(), Some("FIRST"));
        assert_eq!(pass.program.length, 3);
        assert!(pass.program.terminated);

        Ok(())
    }

    #[test]
    fn labeled_end() {
        let program = "COPY START 1000\n LDA ALPHA\nLBL END FIRST";

        for options in [AssemblerOptions::default(), AssemblerOptions::compatible()] {
            let err = run_pass_one(program, options).unwrap_err();
            assert_eq!(
                err,
                AsmError::InvalidOpcode {
                    mnemonic: "END".into(),
                    line: 3
                }
            );
        }
    }

    #[test]
    fn missing_start_and_end() -> Result<()> {
        let program = " LDA ALPHA\nALPHA RESW 4";

        let pass = run_pass_one(program, AssemblerOptions::default())?;

        assert_eq!(pass.program.start, 0);
        assert_eq!(pass.program.length, 15);
        assert!(!pass.program.terminated);
        assert_eq!(pass.symbols.get("ALPHA"), Some(3));

        Ok(())
    }

    #[test]
    fn duplicate_labels() -> Result<()> {
        let program = "COPY START 200\nLOOP LDA ONE\nLOOP STA ONE\nONE WORD 1\n END";

        let pass = run_pass_one(program, AssemblerOptions::default())?;
        assert_eq!(pass.symbols.get("LOOP"), Some(0x200));

        let err = run_pass_one(program, AssemblerOptions::strict()).unwrap_err();
        assert_eq!(
            err,
            AsmError::DuplicateLabel {
                label: "LOOP".into(),
                line: 3
            }
        );

        Ok(())
    }

    #[test]
    fn invalid_opcode() {
        let err = run_pass_one("COPY START 0\n FLOAT\n END", AssemblerOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            AsmError::InvalidOpcode {
                mnemonic: "FLOAT".into(),
                line: 2
            }
        );
    }

    #[test]
    fn malformed_numbers() {
        let options = AssemblerOptions::default();

        let err = run_pass_one("COPY START 1000\nBUF RESW many\n END", options).unwrap_err();
        assert_eq!(
            err,
            AsmError::MalformedNumericField {
                field: "RESW count",
                value: "many".into(),
                line: 2
            }
        );

        let err = run_pass_one("COPY START 10G0\n END", options).unwrap_err();
        assert!(matches!(err, AsmError::MalformedNumericField { line: 1, .. }));

        let err = run_pass_one("COPY START 0\nBUF RESB\n END", options).unwrap_err();
        assert!(matches!(err, AsmError::MalformedNumericField { line: 2, .. }));

        let err = run_pass_one("COPY START 0\nBAD BYTE X'ABC'\n END", options).unwrap_err();
        assert!(matches!(err, AsmError::MalformedConstant { line: 2, .. }));
    }

    #[test]
    fn address_space() {
        let program = "COPY START FFFFFD\nA WORD 1\nB WORD 2\n END";
        let err = run_pass_one(program, AssemblerOptions::default()).unwrap_err();
        assert!(matches!(err, AsmError::AddressOutOfRange { line: 3, .. }));
    }

    #[test]
    fn tokenizer_modes() -> Result<()> {
        let program = "COPY START 0\nLOOP RSUB\n END";

        let pass = run_pass_one(program, AssemblerOptions::default())?;
        assert_eq!(pass.symbols.get("LOOP"), Some(0));

        let positional = AssemblerOptions {
            tokenizer: Tokenizer::Positional,
            ..AssemblerOptions::default()
        };
        let err = run_pass_one(program, positional).unwrap_err();
        assert!(matches!(err, AsmError::InvalidOpcode { ref mnemonic, .. } if mnemonic == "LOOP"));

        Ok(())
    }
}
