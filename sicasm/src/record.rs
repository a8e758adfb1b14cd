use std::fmt::Display;

/// Payload limit of a single Text record, in bytes.
pub static MAX_TEXT_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Instruction { opcode: u8, address: u16 },
    Byte(Vec<u8>),
    Word(u32),
}

impl Data {
    pub fn len(&self) -> usize {
        match self {
            Data::Instruction { .. } | Data::Word(_) => 3,
            Data::Byte(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Data::Instruction { opcode, address } => write!(f, "{:0>2X}{:0>4X}", opcode, address),
            Data::Byte(bytes) => {
                for byte in bytes {
                    write!(f, "{:0>2X}", byte)?;
                }
                Ok(())
            }
            Data::Word(word) => write!(f, "{:0>6X}", word & 0xFF_FFFF),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub address: u32,
    pub data: Vec<Data>,
}

impl Text {
    pub fn new(address: u32) -> Self {
        Self {
            address,
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.iter().map(Data::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Header {
        name: String,
        start: u32,
        length: u32,
    },
    Text(Text),
    End {
        first_instruction: u32,
    },
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Record::Header {
                name,
                start,
                length,
            } => write!(f, "H^{}^{:0>6X}^{:0>6X}", name, start, length),
            Record::Text(text) => {
                write!(f, "T^{:0>6X}", text.address)?;
                for data in &text.data {
                    write!(f, "^{}", data)?;
                }
                Ok(())
            }
            Record::End { first_instruction } => write!(f, "E^{:0>6X}", first_instruction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_records() {
        let header = Record::Header {
            name: "COPY".into(),
            start: 0x1000,
            length: 0x107A,
        };
        assert_eq!(header.to_string(), "H^COPY^001000^00107A");

        let text = Record::Text(Text {
            address: 0x1000,
            data: vec![
                Data::Instruction {
                    opcode: 0x14,
                    address: 0x1033,
                },
                Data::Word(5),
                Data::Byte(vec![0x45, 0x4F, 0x46]),
                Data::Word(-1i32 as u32),
            ],
        });
        assert_eq!(text.to_string(), "T^001000^141033^000005^454F46^FFFFFF");

        let end = Record::End {
            first_instruction: 0x1000,
        };
        assert_eq!(end.to_string(), "E^001000");
    }

    #[test]
    fn text_length() {
        let mut text = Text::new(0);
        assert!(text.is_empty());
        text.data.push(Data::Byte(vec![0xF1]));
        text.data.push(Data::Word(3));
        assert_eq!(text.len(), 4);
    }
}
