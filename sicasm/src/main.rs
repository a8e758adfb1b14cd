use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::info;
use sicasm::{assemble, AssemblerOptions, OpcodeTable, SymbolPolicy, TextAddressing, Tokenizer};

#[derive(Debug, Parser)]
#[clap(author, version, about = "Two-pass assembler for SIC programs")]
struct Args {
    /// Assembly source file
    source: PathBuf,

    /// Output base name; writes <OUTPUT>.ebj, <OUTPUT>.lst and <OUTPUT>.sdb
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Opcode table file, one `MNEMONIC HEX` per line. Built-in SIC table when absent
    #[clap(long, env = "SICASM_OPTAB")]
    optab: Option<PathBuf>,

    #[clap(long, env = "SICASM_TOKENIZER", value_enum, default_value_t)]
    tokenizer: Tokenizer,

    #[clap(long, env = "SICASM_TEXT_ADDRESSING", value_enum, default_value_t)]
    text_addressing: TextAddressing,

    #[clap(long, env = "SICASM_UNDEFINED_SYMBOLS", value_enum, default_value_t)]
    undefined_symbols: SymbolPolicy,

    #[clap(long, env = "SICASM_DUPLICATE_LABELS", value_enum, default_value_t)]
    duplicate_labels: SymbolPolicy,

    /// Positional tokens, fixed Text record increments and lenient symbols
    #[clap(long, env = "SICASM_COMPAT")]
    compat: bool,

    /// Print the listing and object program instead of writing files
    #[clap(short, long)]
    print: bool,

    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> AssemblerOptions {
        if self.compat {
            AssemblerOptions::compatible()
        } else {
            AssemblerOptions {
                tokenizer: self.tokenizer,
                text_addressing: self.text_addressing,
                undefined_symbols: self.undefined_symbols,
                duplicate_labels: self.duplicate_labels,
            }
        }
    }

    fn optab(&self) -> Result<OpcodeTable> {
        let Some(path) = &self.optab else {
            return Ok(OpcodeTable::sic());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading opcode table {}", path.display()))?;
        Ok(text.parse()?)
    }
}

/// `<base>.<extension>`, keeping any extension already on `base`.
fn output_file(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let optab = args.optab()?;
    let program_text = fs::read_to_string(&args.source)
        .with_context(|| format!("reading {}", args.source.display()))?;

    let assembly = assemble(&program_text, &optab, args.options())?;

    if args.print {
        println!("Pass 1 Output:\n{}", assembly.listing());
        println!("Pass 2 Output:\n{}", assembly.object_program());
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.source.with_extension(""));
    let debug = assembly.debug_info(&program_text).to_string()?;

    fs::write(output_file(&output, "ebj"), assembly.object_program())?;
    fs::write(output_file(&output, "lst"), assembly.listing())?;
    fs::write(output_file(&output, "sdb"), debug)?;

    info!(
        "Wrote {} records for {} to {}.ebj",
        assembly.records.len(),
        assembly.program().name,
        output.display()
    );

    Ok(())
}
