use std::fmt::Write;

use anyhow::Context;
use log::debug;
use sicdbg::Sdb;

pub mod directive;
pub mod error;
pub mod line;
pub mod optab;
pub mod options;
pub mod pass_one;
pub mod pass_two;
pub mod record;
pub mod symbols;

pub use error::AsmError;
pub use optab::OpcodeTable;
pub use options::{AssemblerOptions, SymbolPolicy, TextAddressing, Tokenizer};
pub use pass_one::{FirstPass, IntermediateRecord, PassOne, ProgramMetadata};
pub use record::Record;
pub use symbols::SymbolTable;

/// Output of both passes over one program.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub pass_one: PassOne,
    pub records: Vec<Record>,
}

impl Assembly {
    pub fn listing(&self) -> String {
        self.pass_one.listing()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.pass_one.symbols
    }

    pub fn program(&self) -> &ProgramMetadata {
        &self.pass_one.program
    }

    /// Object program text, one record per line.
    pub fn object_program(&self) -> String {
        let mut assembled = String::new();
        for record in &self.records {
            // Writing to a String can't fail
            let _ = writeln!(&mut assembled, "{}", record);
        }
        assembled
    }

    /// Debug sidecar mapping listing rows back to `source` lines.
    pub fn debug_info(&self, source: &str) -> Sdb {
        let program = self.program();
        let mut sdb = Sdb::new(&program.name, program.start, program.length);
        let lines = source.lines().collect::<Vec<_>>();

        for record in &self.pass_one.records {
            let text = lines
                .get(record.line_no - 1)
                .map_or_else(String::new, |l| l.trim_end().to_owned());
            sdb.add_line(record.address, text, record.line_no);
        }
        for (label, address) in self.symbols().iter() {
            sdb.add_label(label.to_owned(), address);
        }

        sdb
    }
}

/// Run both passes over `source`.
///
/// # Errors
///
/// If the opcode table is empty or there's an error in the assembly code. No
/// partial output is returned.
pub fn assemble(
    source: &str,
    optab: &OpcodeTable,
    options: AssemblerOptions,
) -> Result<Assembly, AsmError> {
    if optab.is_empty() {
        return Err(AsmError::OpcodeTableUnavailable);
    }

    debug!("Assembling with {:?}", options);

    let lines = source.lines().collect::<Vec<_>>();
    let pass_one = FirstPass::parse_lines(&lines, optab, options)?;
    let records = pass_two::pass_two(&pass_one, optab, options)?;

    Ok(Assembly { pass_one, records })
}

/// Assemble a SIC program from text with the default options.
///
/// # Errors
///
/// If there's an error in the assembly code
pub fn assemble_program(program_text: &str, optab: &OpcodeTable) -> anyhow::Result<String> {
    Ok(assemble(program_text, optab, AssemblerOptions::default())?.object_program())
}

/// The object program and its serialized debug sidecar.
pub fn assemble_with_debug(
    program_text: &str,
    optab: &OpcodeTable,
    options: AssemblerOptions,
) -> anyhow::Result<(String, String)> {
    let assembly = assemble(program_text, optab, options)?;
    let debug = assembly
        .debug_info(program_text)
        .to_string()
        .context("serializing debug info")?;

    Ok((assembly.object_program(), debug))
}
