use log::{debug, trace, warn};

use crate::{
    directive::{Assembler, Directive},
    error::{AsmError, Result},
    optab::OpcodeTable,
    options::{AssemblerOptions, SymbolPolicy, TextAddressing},
    pass_one::{byte_constant, IntermediateRecord, PassOne, ProgramMetadata},
    record::{Data, Record, Text, MAX_TEXT_LEN},
    symbols::SymbolTable,
};

/// Address step between Text records in [`TextAddressing::FixedIncrement`] mode.
static FIXED_TEXT_INCREMENT: u32 = 3;

struct SecondPass<'a> {
    optab: &'a OpcodeTable,
    symbols: &'a SymbolTable,
    program: &'a ProgramMetadata,
    options: AssemblerOptions,
    cur_text: Option<Text>,
    next_text_address: u32,
    records: Vec<Record>,
}

impl<'a> SecondPass<'a> {
    fn new(
        optab: &'a OpcodeTable,
        symbols: &'a SymbolTable,
        program: &'a ProgramMetadata,
        options: AssemblerOptions,
    ) -> Self {
        let records = vec![Record::Header {
            name: program.name.clone(),
            start: program.start,
            length: program.length,
        }];

        Self {
            optab,
            symbols,
            program,
            options,
            cur_text: None,
            next_text_address: program.start,
            records,
        }
    }

    fn assemble_lines(mut self, lines: &[IntermediateRecord]) -> Result<Vec<Record>> {
        let mut ended = false;
        for line in lines {
            trace!("{:>4}: {}", line.line_no, line);
            if self.assemble_line(line)? {
                ended = true;
                break;
            }
        }

        if !ended {
            warn!("No END record, closing object program");
            self.end();
        }

        debug!(
            "Pass two: {} records ({} text)",
            self.records.len(),
            self.records
                .iter()
                .filter(|r| matches!(r, Record::Text(_)))
                .count()
        );

        Ok(self.records)
    }

    /// Returns true once the END record has been written.
    fn assemble_line(&mut self, line: &IntermediateRecord) -> Result<bool> {
        match line.directive {
            Directive::Assembler(asm) => match asm {
                Assembler::START | Assembler::RESW | Assembler::RESB => {
                    if self.options.text_addressing == TextAddressing::Tracked {
                        self.close_text();
                    }
                }
                Assembler::END => {
                    self.end();
                    return Ok(true);
                }
                Assembler::WORD => {
                    let value = word_value(line)?;
                    self.add_data(line.address, Data::Word(value));
                }
                Assembler::BYTE => {
                    let bytes = byte_constant(line)?.to_bytes();
                    self.add_data(line.address, Data::Byte(bytes));
                }
            },
            Directive::Instruction => {
                let opcode = self.optab.get(&line.mnemonic).ok_or_else(|| {
                    AsmError::InvalidOpcode {
                        mnemonic: line.mnemonic.clone(),
                        line: line.line_no,
                    }
                })?;
                let address = self.operand_address(line)?;
                self.add_data(line.address, Data::Instruction { opcode, address });
            }
        }

        Ok(false)
    }

    fn operand_address(&self, line: &IntermediateRecord) -> Result<u16> {
        let Some(symbol) = line.operand.as_deref() else {
            return Ok(0);
        };

        let address = match (self.symbols.get(symbol), self.options.undefined_symbols) {
            (Some(address), _) => address,
            (None, SymbolPolicy::Lenient) => {
                warn!("Undefined symbol {} on line {}", symbol, line.line_no);
                0
            }
            (None, SymbolPolicy::Strict) => {
                return Err(AsmError::UndefinedSymbol {
                    symbol: symbol.to_owned(),
                    line: line.line_no,
                })
            }
        };

        u16::try_from(address).map_err(|_| AsmError::AddressOutOfRange {
            address: address.into(),
            line: line.line_no,
        })
    }

    fn add_data(&mut self, address: u32, data: Data) {
        match self.options.text_addressing {
            TextAddressing::Tracked => self.add_tracked(address, data),
            TextAddressing::FixedIncrement => self.add_fixed(data),
        }
    }

    fn add_tracked(&mut self, address: u32, data: Data) {
        let mut text = self
            .cur_text
            .take()
            .unwrap_or_else(|| Text::new(address));

        if !text.is_empty() && text.len() + data.len() > MAX_TEXT_LEN {
            self.records.push(Record::Text(text));
            text = Text::new(address);
        }

        if let Data::Byte(mut bytes) = data {
            // Only a constant larger than a whole record is split
            let mut address = address;
            while bytes.len() > MAX_TEXT_LEN {
                let rest = bytes.split_off(MAX_TEXT_LEN);
                address += MAX_TEXT_LEN as u32;
                text.data.push(Data::Byte(bytes));
                self.records.push(Record::Text(text));
                text = Text::new(address);
                bytes = rest;
            }
            text.data.push(Data::Byte(bytes));
        } else {
            text.data.push(data);
        }

        self.cur_text = Some(text);
    }

    fn add_fixed(&mut self, data: Data) {
        let mut text = self
            .cur_text
            .take()
            .unwrap_or_else(|| Text::new(self.next_text_address));

        if !text.is_empty() && text.len() + data.len() > MAX_TEXT_LEN {
            self.records.push(Record::Text(text));
            self.next_text_address += FIXED_TEXT_INCREMENT;
            text = Text::new(self.next_text_address);
        }

        text.data.push(data);
        self.cur_text = Some(text);
    }

    fn close_text(&mut self) {
        if let Some(text) = self.cur_text.take().filter(|t| !t.is_empty()) {
            self.records.push(Record::Text(text));
        }
    }

    fn end(&mut self) {
        self.close_text();
        self.records.push(Record::End {
            first_instruction: self.program.start,
        });
    }
}

/// Decimal operand of a WORD directive as a 24-bit two's complement value.
fn word_value(line: &IntermediateRecord) -> Result<u32> {
    let operand = line.expect_operand("WORD value")?;
    let malformed = || AsmError::MalformedNumericField {
        field: "WORD value",
        value: operand.to_owned(),
        line: line.line_no,
    };

    let value = operand.parse::<i64>().map_err(|_| malformed())?;
    if !(-0x80_0000..=0xFF_FFFF).contains(&value) {
        return Err(malformed());
    }

    Ok((value & 0xFF_FFFF) as u32)
}

pub fn run(
    lines: &[IntermediateRecord],
    optab: &OpcodeTable,
    symbols: &SymbolTable,
    program: &ProgramMetadata,
    options: AssemblerOptions,
) -> Result<Vec<Record>> {
    if optab.is_empty() {
        return Err(AsmError::OpcodeTableUnavailable);
    }

    SecondPass::new(optab, symbols, program, options).assemble_lines(lines)
}

pub fn pass_two(
    pass_one: &PassOne,
    optab: &OpcodeTable,
    options: AssemblerOptions,
) -> Result<Vec<Record>> {
    run(
        &pass_one.records,
        optab,
        &pass_one.symbols,
        &pass_one.program,
        options,
    )
}
