use once_cell::sync::OnceCell;
use regex::Regex;

use crate::options::Tokenizer;

static LINE_REGEX: OnceCell<Regex> = OnceCell::new();
static LINE_REGEX_PATTERN: &str =
    r#"^(?P<label>[^.\s]\S*)?\s+(?P<mnemonic>\S+)(?:\s+(?P<operand>\S+))?"#;

fn line_regex() -> &'static Regex {
    LINE_REGEX.get_or_init(|| Regex::new(LINE_REGEX_PATTERN).expect("Invalid line regex"))
}

/// The label, mnemonic and operand fields of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub label: Option<&'a str>,
    pub mnemonic: &'a str,
    pub operand: Option<&'a str>,
}

impl<'a> SourceLine<'a> {
    /// Splits `line` into fields. Blank lines and `.` comment lines give `None`.
    /// A line whose first token is `END` is always the END directive, wherever
    /// it starts.
    pub fn tokenize(line: &'a str, tokenizer: Tokenizer) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next()?;
        if first.starts_with('.') {
            return None;
        }

        if first == "END" {
            return Some(Self {
                label: None,
                mnemonic: first,
                operand: tokens.next(),
            });
        }

        match tokenizer {
            Tokenizer::Columns => Some(Self::columns(line, first)),
            Tokenizer::Positional => Some(Self::positional(line)),
        }
    }

    fn columns(line: &'a str, first: &'a str) -> Self {
        if let Some(captures) = line_regex().captures(line) {
            return Self {
                label: captures.name("label").map(|m| m.as_str()),
                // The pattern can't match without a mnemonic
                mnemonic: captures.name("mnemonic").map_or(first, |m| m.as_str()),
                operand: captures.name("operand").map(|m| m.as_str()),
            };
        }

        // A lone word in column 0, e.g. `END` or `RSUB`
        Self {
            label: None,
            mnemonic: first,
            operand: None,
        }
    }

    fn positional(line: &'a str) -> Self {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() > 2 {
            Self {
                label: Some(tokens[0]),
                mnemonic: tokens[1],
                operand: Some(tokens[2]),
            }
        } else {
            Self {
                label: None,
                mnemonic: tokens[0],
                operand: tokens.get(1).copied(),
            }
        }
    }
}
